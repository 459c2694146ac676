//! Persisted reaction prompts.
//!
//! A command registers a [`ReactionHandler`] on a message it sent. Reactions
//! matching the handler's emoji and user filters are routed to the listeners
//! subscribed to its event name. Handlers with an expiry are timed out by
//! local timers; a sweep on the primary shard re-arms timers from storage so
//! handlers survive restarts.

use crate::platform::{ChatPlatform, EmojiRef};
use crate::store::Store;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use statpixel_common::{ChannelId, MessageId, Result, UserId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::AbortHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// A persisted "wait for a reaction" prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionHandler {
    /// Handler id.
    pub id: Uuid,
    /// Channel of the watched message.
    pub channel: ChannelId,
    /// The watched message.
    pub message: MessageId,
    /// Event emitted on a matching reaction and on expiry.
    pub event: String,
    /// Event emitted when a matching reaction is removed.
    pub remove_event: Option<String>,
    /// Emoji names or custom emoji ids that trigger the handler.
    pub emojis: Vec<String>,
    /// Users allowed to trigger the handler; empty means anyone.
    pub users: Vec<UserId>,
    /// Data handed back to listeners.
    pub payload: serde_json::Value,
    /// When the handler times out.
    pub expires_at: Option<DateTime<Utc>>,
    /// Whether the triggering reaction is stripped after firing.
    pub auto_remove: bool,
}

impl ReactionHandler {
    /// A handler on `message` emitting `event`, with no filters and no expiry.
    pub fn new(channel: ChannelId, message: MessageId, event: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel,
            message,
            event: event.into(),
            remove_event: None,
            emojis: Vec::new(),
            users: Vec::new(),
            payload: serde_json::Value::Null,
            expires_at: None,
            auto_remove: true,
        }
    }

    /// Set the emoji filter.
    #[must_use]
    pub fn with_emojis<I, S>(mut self, emojis: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.emojis = emojis.into_iter().map(Into::into).collect();
        self
    }

    /// Restrict the handler to `users`.
    #[must_use]
    pub fn with_users(mut self, users: impl IntoIterator<Item = UserId>) -> Self {
        self.users = users.into_iter().collect();
        self
    }

    /// Attach a payload.
    #[must_use]
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Also emit `event` when a matching reaction is removed. Such handlers
    /// outlive their first reaction.
    #[must_use]
    pub fn with_remove_event(mut self, event: impl Into<String>) -> Self {
        self.remove_event = Some(event.into());
        self
    }

    /// Time the handler out at `at`.
    #[must_use]
    pub const fn expiring_at(mut self, at: DateTime<Utc>) -> Self {
        self.expires_at = Some(at);
        self
    }

    /// Leave triggering reactions in place.
    #[must_use]
    pub const fn keep_reactions(mut self) -> Self {
        self.auto_remove = false;
        self
    }

    /// Whether `user` passes the user filter.
    #[must_use]
    pub fn accepts_user(&self, user: UserId) -> bool {
        self.users.is_empty() || self.users.contains(&user)
    }
}

/// Why a listener is being called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionEventKind {
    /// A matching reaction was added.
    Added,
    /// A matching reaction was removed.
    Removed,
    /// The handler timed out.
    Expired,
}

/// Delivered to listeners.
#[derive(Debug, Clone)]
pub struct ReactionEvent {
    /// What happened.
    pub kind: ReactionEventKind,
    /// The handler, as persisted.
    pub handler: ReactionHandler,
    /// Reacting user; `None` on expiry.
    pub user: Option<UserId>,
    /// Reaction emoji; `None` on expiry.
    pub emoji: Option<EmojiRef>,
}

/// What listeners can reach.
#[derive(Clone)]
pub struct ReactionContext {
    /// Chat platform.
    pub platform: Arc<dyn ChatPlatform>,
    /// Store.
    pub store: Arc<dyn Store>,
}

/// Receives reaction events by name.
#[async_trait]
pub trait ReactionListener: Send + Sync {
    /// Handle one event.
    async fn handle(&self, ctx: &ReactionContext, event: ReactionEvent) -> anyhow::Result<()>;
}

/// Event name to listener table, built when commands are registered.
#[derive(Default)]
pub struct EventRouter {
    routes: HashMap<String, Vec<Arc<dyn ReactionListener>>>,
}

impl EventRouter {
    /// Subscribe `listener` to `event`.
    pub fn register(&mut self, event: impl Into<String>, listener: Arc<dyn ReactionListener>) {
        self.routes.entry(event.into()).or_default().push(listener);
    }

    /// Number of listeners on `event`.
    #[must_use]
    pub fn listeners(&self, event: &str) -> usize {
        self.routes.get(event).map_or(0, Vec::len)
    }

    /// Deliver `event` to every listener on `name`; returns how many ran.
    pub async fn emit(&self, ctx: &ReactionContext, name: &str, event: ReactionEvent) -> usize {
        let Some(listeners) = self.routes.get(name) else {
            debug!(event = name, "No listeners for reaction event");
            return 0;
        };

        for listener in listeners {
            if let Err(e) = listener.handle(ctx, event.clone()).await {
                error!(event = name, error = ?e, "Reaction listener failed");
            }
        }
        listeners.len()
    }
}

/// A reaction as reported by the gateway.
#[derive(Debug, Clone)]
pub struct ReactionInput {
    /// Channel of the message.
    pub channel: ChannelId,
    /// Reacted message.
    pub message: MessageId,
    /// Reacting user.
    pub user: UserId,
    /// Whether the reacting user is a bot.
    pub user_is_bot: bool,
    /// Whether the message is in a direct message channel.
    pub in_dm: bool,
    /// The emoji.
    pub emoji: EmojiRef,
}

struct SchedulerInner {
    ctx: ReactionContext,
    router: EventRouter,
    interval: Duration,
    horizon_ms: AtomicI64,
    armed: DashMap<Uuid, AbortHandle>,
}

/// Registers, arms, fires and routes reaction handlers.
#[derive(Clone)]
pub struct ReactionScheduler {
    inner: Arc<SchedulerInner>,
}

impl ReactionScheduler {
    /// Create a scheduler sweeping every `interval`.
    #[must_use]
    pub fn new(ctx: ReactionContext, router: EventRouter, interval: Duration) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                ctx,
                router,
                interval,
                horizon_ms: AtomicI64::new(0),
                armed: DashMap::new(),
            }),
        }
    }

    /// Listener table.
    #[must_use]
    pub fn router(&self) -> &EventRouter {
        &self.inner.router
    }

    /// End of the current sweep window; `None` before the first sweep.
    #[must_use]
    pub fn horizon(&self) -> Option<DateTime<Utc>> {
        match self.inner.horizon_ms.load(Ordering::Acquire) {
            0 => None,
            ms => DateTime::from_timestamp_millis(ms),
        }
    }

    /// Whether a local timer is pending for `id`.
    #[must_use]
    pub fn is_armed(&self, id: Uuid) -> bool {
        self.inner.armed.contains_key(&id)
    }

    /// Number of pending local timers.
    #[must_use]
    pub fn armed_count(&self) -> usize {
        self.inner.armed.len()
    }

    /// Persist `handler`, arming it at once if it expires inside the current
    /// sweep window. Returns whether a timer was armed.
    pub async fn register(&self, handler: ReactionHandler) -> Result<bool> {
        self.inner.ctx.store.insert_reaction(&handler).await?;
        debug!(id = %handler.id, event = %handler.event, "Registered reaction handler");

        let within_horizon = match (handler.expires_at, self.horizon()) {
            (Some(at), Some(horizon)) => at < horizon,
            _ => false,
        };
        if within_horizon {
            self.arm(&handler);
        }
        Ok(within_horizon)
    }

    /// Advance the horizon to `now + interval` and arm every persisted handler
    /// expiring before it. Returns how many timers were newly armed.
    pub async fn sweep_once(&self) -> Result<usize> {
        let horizon = Utc::now()
            + chrono::Duration::from_std(self.inner.interval)
                .unwrap_or_else(|_| chrono::Duration::weeks(1));
        self.inner
            .horizon_ms
            .store(horizon.timestamp_millis(), Ordering::Release);

        let expiring = self
            .inner
            .ctx
            .store
            .reactions_expiring_before(horizon)
            .await?;

        let mut armed = 0;
        for handler in &expiring {
            if !self.is_armed(handler.id) {
                self.arm(handler);
                armed += 1;
            }
        }

        debug!(armed, pending = expiring.len(), "Reaction sweep complete");
        Ok(armed)
    }

    /// Sweep until `token` is cancelled. Each iteration sleeps until the
    /// horizon it set, so slow sweeps push later ones back.
    pub async fn run(self, token: CancellationToken) {
        info!(interval = ?self.inner.interval, "Starting reaction sweep loop");

        loop {
            if let Err(e) = self.sweep_once().await {
                warn!(error = %e, "Reaction sweep failed");
            }

            let wait = self
                .horizon()
                .map_or(self.inner.interval, |horizon| {
                    (horizon - Utc::now()).to_std().unwrap_or(Duration::ZERO)
                });

            tokio::select! {
                () = token.cancelled() => break,
                () = tokio::time::sleep(wait) => {}
            }
        }

        self.disarm_all();
        info!("Reaction sweep loop stopped");
    }

    fn arm(&self, handler: &ReactionHandler) {
        let Some(expires_at) = handler.expires_at else {
            return;
        };
        let delay = (expires_at - Utc::now()).to_std().unwrap_or(Duration::ZERO);
        let id = handler.id;
        let scheduler = self.clone();

        // Holding the slot keeps an immediate `fire` from removing it before
        // the handle is stored.
        let slot = self.inner.armed.entry(id);
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = scheduler.fire(id).await {
                warn!(%id, error = %e, "Failed to expire reaction handler");
            }
        });
        if let Entry::Occupied(previous) = &slot {
            previous.get().abort();
        }
        slot.insert(task.abort_handle());
        debug!(%id, ?delay, "Armed reaction handler");
    }

    fn disarm(&self, id: Uuid) {
        if let Some((_, handle)) = self.inner.armed.remove(&id) {
            handle.abort();
        }
    }

    /// Abort every pending local timer. Persisted handlers are untouched.
    pub fn disarm_all(&self) {
        self.inner.armed.retain(|_, handle| {
            handle.abort();
            false
        });
    }

    /// Expire handler `id`: delete it and emit its event as
    /// [`ReactionEventKind::Expired`]. Returns `false`, emitting nothing, if
    /// the handler was already gone.
    pub async fn fire(&self, id: Uuid) -> Result<bool> {
        self.inner.armed.remove(&id);

        let Some(handler) = self.inner.ctx.store.take_reaction(id).await? else {
            debug!(%id, "Reaction handler already resolved");
            return Ok(false);
        };

        let name = handler.event.clone();
        let event = ReactionEvent {
            kind: ReactionEventKind::Expired,
            handler,
            user: None,
            emoji: None,
        };
        self.inner.router.emit(&self.inner.ctx, &name, event).await;
        Ok(true)
    }

    /// Route a reaction add. Returns whether a handler fired.
    pub async fn on_reaction_add(&self, input: ReactionInput) -> Result<bool> {
        if input.user_is_bot || input.in_dm {
            return Ok(false);
        }

        let Some(handler) = self
            .inner
            .ctx
            .store
            .find_reaction(input.message, &input.emoji, false)
            .await?
        else {
            return Ok(false);
        };
        if !handler.accepts_user(input.user) {
            return Ok(false);
        }

        let keep_handler = handler.remove_event.is_some();
        let handler = if keep_handler {
            handler
        } else {
            // Only the caller that deletes the handler may resolve it.
            let Some(taken) = self.inner.ctx.store.take_reaction(handler.id).await? else {
                debug!(id = %handler.id, "Reaction handler already resolved");
                return Ok(false);
            };
            self.disarm(taken.id);
            taken
        };
        let strip = !keep_handler && handler.auto_remove;
        let name = handler.event.clone();

        let event = ReactionEvent {
            kind: ReactionEventKind::Added,
            handler,
            user: Some(input.user),
            emoji: Some(input.emoji.clone()),
        };
        self.inner.router.emit(&self.inner.ctx, &name, event).await;

        if strip {
            if let Err(e) = self
                .inner
                .ctx
                .platform
                .remove_reaction(input.channel, input.message, input.user, &input.emoji)
                .await
            {
                debug!(error = %e, "Could not strip reaction");
            }
        }
        Ok(true)
    }

    /// Route a reaction removal to handlers that declared a remove event.
    pub async fn on_reaction_remove(&self, input: ReactionInput) -> Result<bool> {
        if input.user_is_bot || input.in_dm {
            return Ok(false);
        }

        let Some(handler) = self
            .inner
            .ctx
            .store
            .find_reaction(input.message, &input.emoji, true)
            .await?
        else {
            return Ok(false);
        };
        if !handler.accepts_user(input.user) {
            return Ok(false);
        }
        let Some(name) = handler.remove_event.clone() else {
            return Ok(false);
        };

        let event = ReactionEvent {
            kind: ReactionEventKind::Removed,
            handler,
            user: Some(input.user),
            emoji: Some(input.emoji),
        };
        self.inner.router.emit(&self.inner.ctx, &name, event).await;
        Ok(true)
    }

    /// Drop handlers of a deleted message.
    pub async fn on_message_deleted(&self, channel: ChannelId, message: MessageId) -> Result<usize> {
        let removed = self
            .inner
            .ctx
            .store
            .delete_reactions_for_message(channel, message)
            .await?;
        for id in &removed {
            self.disarm(*id);
        }
        Ok(removed.len())
    }

    /// Drop handlers of a deleted channel.
    pub async fn on_channel_deleted(&self, channel: ChannelId) -> Result<usize> {
        let removed = self
            .inner
            .ctx
            .store
            .delete_reactions_for_channel(channel)
            .await?;
        for id in &removed {
            self.disarm(*id);
        }
        Ok(removed.len())
    }
}
