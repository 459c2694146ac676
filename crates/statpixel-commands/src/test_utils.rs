//! Fakes and fixtures for exercising the engine without Discord.

use crate::context::{Data, GuildContext, Invocation};
use crate::definition::CommandDefinition;
use crate::dispatch::{InteractionEvent, MessageEvent};
use crate::platform::{ChatPlatform, EmojiRef, Origin, PlatformUser};
use crate::reply::{CommandOutput, Reply};
use crate::store::MemoryStore;
use async_trait::async_trait;
use dashmap::DashMap;
use statpixel_common::test_utils::discord_fixtures::{
    test_admin_id, test_bot_id, test_channel_id, test_guild_id, test_guild_owner_id,
    test_message_id, test_user_id,
};
use statpixel_common::{ChannelId, InteractionId, MessageId, Result, UserId};
use statpixel_config::Config;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// One outbound call made through [`RecordingPlatform`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformCall {
    /// Typing indicator or deferred response.
    Acknowledge(Origin),
    /// Reply to an invocation.
    Respond(Origin, Reply),
    /// Message sent to a channel.
    Send(ChannelId, Reply),
    /// Direct message.
    SendDm(UserId, Reply),
    /// The bot reacted.
    React(MessageId, String),
    /// A user's reaction was stripped.
    RemoveReaction(MessageId, UserId, EmojiRef),
    /// A message was deleted.
    DeleteMessage(ChannelId, MessageId),
}

/// A [`ChatPlatform`] that records every call and knows a fixed set of users.
pub struct RecordingPlatform {
    calls: Mutex<Vec<PlatformCall>>,
    users: DashMap<UserId, PlatformUser>,
    next_message: AtomicU64,
}

impl Default for RecordingPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingPlatform {
    /// A platform that knows no users.
    #[must_use]
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            users: DashMap::new(),
            next_message: AtomicU64::new(900_000_000_000_000_000),
        }
    }

    /// Make `user` resolvable through `fetch_user`.
    pub fn add_user(&self, user: PlatformUser) {
        self.users.insert(user.id, user);
    }

    fn push(&self, call: PlatformCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    /// Every call so far.
    #[must_use]
    pub fn calls(&self) -> Vec<PlatformCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replies to invocations, in order.
    #[must_use]
    pub fn replies(&self) -> Vec<Reply> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                PlatformCall::Respond(_, reply) => Some(reply),
                _ => None,
            })
            .collect()
    }

    /// Messages sent to channels, in order.
    #[must_use]
    pub fn sent(&self) -> Vec<(ChannelId, Reply)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                PlatformCall::Send(channel, reply) => Some((channel, reply)),
                _ => None,
            })
            .collect()
    }

    /// Direct messages, in order.
    #[must_use]
    pub fn direct_messages(&self) -> Vec<(UserId, Reply)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                PlatformCall::SendDm(user, reply) => Some((user, reply)),
                _ => None,
            })
            .collect()
    }

    /// Replies, channel messages and direct messages combined.
    #[must_use]
    pub fn outbound_messages(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| {
                matches!(
                    call,
                    PlatformCall::Respond(..) | PlatformCall::Send(..) | PlatformCall::SendDm(..)
                )
            })
            .count()
    }

    /// Number of stripped reactions.
    #[must_use]
    pub fn removed_reactions(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, PlatformCall::RemoveReaction(..)))
            .count()
    }
}

#[async_trait]
impl ChatPlatform for RecordingPlatform {
    async fn acknowledge(&self, origin: &Origin) -> Result<()> {
        self.push(PlatformCall::Acknowledge(origin.clone()));
        Ok(())
    }

    async fn respond(&self, origin: &Origin, reply: Reply) -> Result<()> {
        self.push(PlatformCall::Respond(origin.clone(), reply));
        Ok(())
    }

    async fn send(&self, channel: ChannelId, reply: Reply) -> Result<MessageId> {
        self.push(PlatformCall::Send(channel, reply));
        Ok(MessageId(self.next_message.fetch_add(1, Ordering::SeqCst)))
    }

    async fn send_dm(&self, user: UserId, reply: Reply) -> Result<()> {
        self.push(PlatformCall::SendDm(user, reply));
        Ok(())
    }

    async fn react(&self, _channel: ChannelId, message: MessageId, emoji: &str) -> Result<()> {
        self.push(PlatformCall::React(message, emoji.to_string()));
        Ok(())
    }

    async fn remove_reaction(
        &self,
        _channel: ChannelId,
        message: MessageId,
        user: UserId,
        emoji: &EmojiRef,
    ) -> Result<()> {
        self.push(PlatformCall::RemoveReaction(message, user, emoji.clone()));
        Ok(())
    }

    async fn delete_message(&self, channel: ChannelId, message: MessageId) -> Result<()> {
        self.push(PlatformCall::DeleteMessage(channel, message));
        Ok(())
    }

    async fn fetch_user(&self, id: UserId) -> Result<Option<PlatformUser>> {
        Ok(self.users.get(&id).map(|u| u.clone()))
    }
}

/// Configuration used by [`TestHarness`]: one admin and a bug report channel.
#[must_use]
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.discord.token = "test-token".into();
    config.discord.admin_ids = vec![test_admin_id()];
    config.discord.bug_report_channel = Some(ChannelId(444_444_444_444_444_444));
    config
}

/// The guild used by guild-scoped events.
#[must_use]
pub fn test_guild() -> GuildContext {
    GuildContext {
        id: test_guild_id(),
        owner_id: test_guild_owner_id(),
        name: Some("Test Guild".into()),
    }
}

/// Let spawned background work, such as usage increments, run.
pub async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

/// A fully wired engine over [`MemoryStore`] and [`RecordingPlatform`].
///
/// A `noop` command is always appended so [`Self::invocation`] has a
/// node to point at.
pub struct TestHarness {
    /// Shared state.
    pub data: Arc<Data>,
    /// The recording platform.
    pub platform: Arc<RecordingPlatform>,
    /// The in-memory store.
    pub store: Arc<MemoryStore>,
}

impl TestHarness {
    /// Harness over [`test_config`].
    ///
    /// # Panics
    ///
    /// Panics if the engine cannot be built.
    pub async fn new(definitions: Vec<CommandDefinition>) -> Self {
        Self::with_store(test_config(), Arc::new(MemoryStore::new()), definitions).await
    }

    /// Harness over an existing store, as after a restart.
    ///
    /// # Panics
    ///
    /// Panics if the engine cannot be built.
    pub async fn with_store(
        config: Config,
        store: Arc<MemoryStore>,
        mut definitions: Vec<CommandDefinition>,
    ) -> Self {
        definitions.push(
            CommandDefinition::new("noop").run_with(|_, _| Ok(CommandOutput::None)),
        );

        let platform = Arc::new(RecordingPlatform::new());
        for id in [test_user_id(), test_admin_id(), test_guild_owner_id()] {
            platform.add_user(PlatformUser::new(id, format!("user{}", id.get() % 1000)));
        }

        let data = Data::new(config, store.clone(), platform.clone(), definitions)
            .await
            .expect("engine should build");
        data.set_bot_id(test_bot_id());

        Self {
            data,
            platform,
            store,
        }
    }

    /// An invocation of `noop` by the test user in a direct message.
    ///
    /// # Panics
    ///
    /// Panics if `noop` is missing from the tree.
    #[must_use]
    pub fn invocation(&self) -> Invocation {
        let node = self.data.registry.find(&["noop"]).expect("noop command");
        Invocation {
            data: Arc::clone(&self.data),
            origin: Origin::Message {
                channel: test_channel_id(),
                message: test_message_id(),
            },
            author: PlatformUser::new(test_user_id(), "tester"),
            guild: None,
            settings: self.data.config.commands.default_settings.clone(),
            node,
        }
    }

    /// A message from `author` in the test guild.
    #[must_use]
    pub fn guild_message(&self, author: UserId, content: &str) -> MessageEvent {
        MessageEvent {
            channel: test_channel_id(),
            message: test_message_id(),
            author: PlatformUser::new(author, "author"),
            guild: Some(test_guild()),
            content: content.to_string(),
        }
    }

    /// A direct message from `author`.
    #[must_use]
    pub fn direct_message(&self, author: UserId, content: &str) -> MessageEvent {
        MessageEvent {
            guild: None,
            ..self.guild_message(author, content)
        }
    }

    /// A slash interaction from `author` in the test guild.
    #[must_use]
    pub fn interaction(
        &self,
        author: UserId,
        path: &[&str],
        options: &[(&str, &str)],
    ) -> InteractionEvent {
        InteractionEvent {
            channel: test_channel_id(),
            id: InteractionId(666_666_666_666_666_666),
            token: "interaction-token".into(),
            author: PlatformUser::new(author, "author"),
            guild: Some(test_guild()),
            path: path.iter().map(ToString::to_string).collect(),
            options: options
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect::<HashMap<_, _>>(),
        }
    }
}
