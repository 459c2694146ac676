//! In-memory store for tests.

use super::{
    BanExpiry, CommandStateStore, CounterStore, MetricsStore, ModerationRecord, ModerationStore,
    ReactionStore, SettingsStore, UsageEntry,
};
use crate::platform::EmojiRef;
use crate::reactions::ReactionHandler;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use statpixel_common::{ChannelId, GuildId, MessageId, Result, UserId};
use statpixel_config::GuildSettings;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

/// A [`Store`](super::Store) kept entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    disabled: Mutex<Vec<String>>,
    usage: DashMap<String, u64>,
    user_usage: DashMap<(String, UserId, u64), u64>,
    moderation: DashMap<UserId, ModerationRecord>,
    settings: DashMap<GuildId, GuildSettings>,
    reactions: Mutex<Vec<ReactionHandler>>,
    counters: DashMap<String, u64>,
    yield_on_lookup: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Yield to the runtime after every reaction handler lookup, so
    /// concurrent callers interleave between lookup and removal.
    #[must_use]
    pub fn yielding_lookups(self) -> Self {
        self.yield_on_lookup.store(true, Ordering::Relaxed);
        self
    }

    /// Global count for `path`, zero if never used.
    #[must_use]
    pub fn usage_of(&self, path: &str) -> u64 {
        self.usage.get(path).map_or(0, |v| *v)
    }

    /// Total number of global and per-user increments recorded.
    #[must_use]
    pub fn total_increments(&self) -> u64 {
        self.usage.iter().map(|e| *e.value()).sum::<u64>()
            + self.user_usage.iter().map(|e| *e.value()).sum::<u64>()
    }

    /// Number of persisted reaction handlers.
    #[must_use]
    pub fn reaction_count(&self) -> usize {
        self.reactions.lock().map_or(0, |r| r.len())
    }

    fn with_reactions<T>(&self, f: impl FnOnce(&mut Vec<ReactionHandler>) -> T) -> T {
        let mut guard = self
            .reactions
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut guard)
    }
}

#[async_trait]
impl CommandStateStore for MemoryStore {
    async fn disabled_commands(&self) -> Result<Vec<String>> {
        Ok(self
            .disabled
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone())
    }

    async fn set_command_disabled(&self, path: &str, disabled: bool) -> Result<()> {
        let mut list = self
            .disabled
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        list.retain(|p| p != path);
        if disabled {
            list.push(path.to_string());
        }
        Ok(())
    }
}

#[async_trait]
impl MetricsStore for MemoryStore {
    async fn increment_usage(&self, path: &str) -> Result<u64> {
        let mut entry = self.usage.entry(path.to_string()).or_insert(0);
        *entry += 1;
        Ok(*entry)
    }

    async fn increment_user_usage(&self, path: &str, user: UserId, scope: u64) -> Result<u64> {
        let mut entry = self
            .user_usage
            .entry((path.to_string(), user, scope))
            .or_insert(0);
        *entry += 1;
        Ok(*entry)
    }

    async fn usage_leaderboard(&self) -> Result<Vec<UsageEntry>> {
        let mut entries: Vec<UsageEntry> = self
            .usage
            .iter()
            .map(|e| UsageEntry {
                path: e.key().clone(),
                uses: *e.value(),
            })
            .collect();
        entries.sort_by(|a, b| b.uses.cmp(&a.uses).then_with(|| a.path.cmp(&b.path)));
        Ok(entries)
    }

    async fn user_usage(&self, path: &str, user: UserId, scope: u64) -> Result<u64> {
        Ok(self
            .user_usage
            .get(&(path.to_string(), user, scope))
            .map_or(0, |v| *v))
    }

    async fn remove_user_usage(&self, user: UserId, scope: u64) -> Result<usize> {
        let before = self.user_usage.len();
        self.user_usage
            .retain(|(_, u, s), _| !(*u == user && *s == scope));
        Ok(before - self.user_usage.len())
    }
}

#[async_trait]
impl ModerationStore for MemoryStore {
    async fn moderation(&self, user: UserId) -> Result<Option<ModerationRecord>> {
        Ok(self.moderation.get(&user).map(|r| r.clone()))
    }

    async fn set_ban(
        &self,
        user: UserId,
        until: Option<BanExpiry>,
        reason: Option<String>,
    ) -> Result<()> {
        self.moderation.insert(
            user,
            ModerationRecord {
                user,
                banned_until: until,
                reason,
            },
        );
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn load_settings(&self, guild: GuildId) -> Result<Option<GuildSettings>> {
        Ok(self.settings.get(&guild).map(|s| s.clone()))
    }

    async fn save_settings(&self, guild: GuildId, settings: &GuildSettings) -> Result<()> {
        self.settings.insert(guild, settings.clone());
        Ok(())
    }
}

#[async_trait]
impl ReactionStore for MemoryStore {
    async fn insert_reaction(&self, handler: &ReactionHandler) -> Result<()> {
        self.with_reactions(|r| r.push(handler.clone()));
        Ok(())
    }

    async fn find_reaction(
        &self,
        message: MessageId,
        emoji: &EmojiRef,
        with_remove_event: bool,
    ) -> Result<Option<ReactionHandler>> {
        let found = self.with_reactions(|r| {
            r.iter()
                .find(|h| {
                    h.message == message
                        && emoji.matches(&h.emojis)
                        && (!with_remove_event || h.remove_event.is_some())
                })
                .cloned()
        });
        if self.yield_on_lookup.load(Ordering::Relaxed) {
            tokio::task::yield_now().await;
        }
        Ok(found)
    }

    async fn take_reaction(&self, id: Uuid) -> Result<Option<ReactionHandler>> {
        Ok(self.with_reactions(|r| {
            r.iter()
                .position(|h| h.id == id)
                .map(|index| r.remove(index))
        }))
    }

    async fn delete_reactions_for_message(
        &self,
        channel: ChannelId,
        message: MessageId,
    ) -> Result<Vec<Uuid>> {
        Ok(self.with_reactions(|r| {
            let (removed, kept): (Vec<_>, Vec<_>) = r
                .drain(..)
                .partition(|h| h.channel == channel && h.message == message);
            *r = kept;
            removed.into_iter().map(|h| h.id).collect()
        }))
    }

    async fn delete_reactions_for_channel(&self, channel: ChannelId) -> Result<Vec<Uuid>> {
        Ok(self.with_reactions(|r| {
            let (removed, kept): (Vec<_>, Vec<_>) = r.drain(..).partition(|h| h.channel == channel);
            *r = kept;
            removed.into_iter().map(|h| h.id).collect()
        }))
    }

    async fn reactions_expiring_before(&self, horizon: DateTime<Utc>) -> Result<Vec<ReactionHandler>> {
        Ok(self.with_reactions(|r| {
            r.iter()
                .filter(|h| h.expires_at.is_some_and(|at| at < horizon))
                .cloned()
                .collect()
        }))
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn next_counter(&self, name: &str) -> Result<u64> {
        let mut entry = self.counters.entry(name.to_string()).or_insert(0);
        *entry += 1;
        Ok(*entry)
    }
}
