//! Persistence of command state, usage metrics, moderation, settings,
//! reaction handlers and counters.
//!
//! [`Store`] is implemented by [`SledStore`] for production and, with the
//! `testing` feature, by an in-memory `MemoryStore`.

use crate::platform::EmojiRef;
use crate::reactions::ReactionHandler;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use statpixel_common::{ChannelId, GuildId, MessageId, Result, UserId};
use statpixel_config::GuildSettings;
use uuid::Uuid;

mod sled_store;
pub use sled_store::SledStore;

#[cfg(any(test, feature = "testing"))]
mod memory;
#[cfg(any(test, feature = "testing"))]
pub use memory::MemoryStore;

/// Global usage count of one command path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageEntry {
    /// Dotted command path.
    pub path: String,
    /// Number of allowed invocations.
    pub uses: u64,
}

/// When a ban ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BanExpiry {
    /// The ban lifts at this instant.
    Until(DateTime<Utc>),
    /// The ban never lifts.
    Permanent,
}

/// Moderation state of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationRecord {
    /// The user.
    pub user: UserId,
    /// Ban end, if the user has been banned.
    pub banned_until: Option<BanExpiry>,
    /// Reason given for the ban.
    pub reason: Option<String>,
}

impl ModerationRecord {
    /// The ban still in force at `now`, if any.
    #[must_use]
    pub fn active_ban(&self, now: DateTime<Utc>) -> Option<BanExpiry> {
        match self.banned_until {
            Some(BanExpiry::Until(until)) if until > now => Some(BanExpiry::Until(until)),
            Some(BanExpiry::Permanent) => Some(BanExpiry::Permanent),
            _ => None,
        }
    }
}

/// The disabled command list.
#[async_trait]
pub trait CommandStateStore {
    /// Dotted paths of disabled commands.
    async fn disabled_commands(&self) -> Result<Vec<String>>;

    /// Add `path` to, or remove it from, the disabled list.
    async fn set_command_disabled(&self, path: &str, disabled: bool) -> Result<()>;
}

/// Upsert-increment usage counters.
#[async_trait]
pub trait MetricsStore {
    /// Increment the global counter for `path`.
    async fn increment_usage(&self, path: &str) -> Result<u64>;

    /// Increment the counter for `path` used by `user` in `scope` (a guild id,
    /// or the bot's own id outside guilds).
    async fn increment_user_usage(&self, path: &str, user: UserId, scope: u64) -> Result<u64>;

    /// Global counters ordered by uses descending, then path.
    async fn usage_leaderboard(&self) -> Result<Vec<UsageEntry>>;

    /// Per-user count, zero if never used.
    async fn user_usage(&self, path: &str, user: UserId, scope: u64) -> Result<u64>;

    /// Drop every per-user counter of `user` in `scope`; returns how many.
    async fn remove_user_usage(&self, user: UserId, scope: u64) -> Result<usize>;
}

/// User bans.
#[async_trait]
pub trait ModerationStore {
    /// Moderation record of `user`.
    async fn moderation(&self, user: UserId) -> Result<Option<ModerationRecord>>;

    /// Set or clear the ban of `user`.
    async fn set_ban(
        &self,
        user: UserId,
        until: Option<BanExpiry>,
        reason: Option<String>,
    ) -> Result<()>;
}

/// Per-guild settings.
#[async_trait]
pub trait SettingsStore {
    /// Stored settings of `guild`.
    async fn load_settings(&self, guild: GuildId) -> Result<Option<GuildSettings>>;

    /// Upsert the settings of `guild`.
    async fn save_settings(&self, guild: GuildId, settings: &GuildSettings) -> Result<()>;
}

/// Persisted reaction handlers.
#[async_trait]
pub trait ReactionStore {
    /// Persist a handler.
    async fn insert_reaction(&self, handler: &ReactionHandler) -> Result<()>;

    /// First handler on `message` whose filter names `emoji`. With
    /// `with_remove_event`, only handlers that also serve removals match.
    async fn find_reaction(
        &self,
        message: MessageId,
        emoji: &EmojiRef,
        with_remove_event: bool,
    ) -> Result<Option<ReactionHandler>>;

    /// Delete a handler and return it; `None` if it was already gone.
    async fn take_reaction(&self, id: Uuid) -> Result<Option<ReactionHandler>>;

    /// Delete the handlers of a message; returns their ids.
    async fn delete_reactions_for_message(
        &self,
        channel: ChannelId,
        message: MessageId,
    ) -> Result<Vec<Uuid>>;

    /// Delete the handlers of a channel; returns their ids.
    async fn delete_reactions_for_channel(&self, channel: ChannelId) -> Result<Vec<Uuid>>;

    /// Handlers that expire before `horizon`.
    async fn reactions_expiring_before(&self, horizon: DateTime<Utc>) -> Result<Vec<ReactionHandler>>;
}

/// Named monotonically increasing counters.
#[async_trait]
pub trait CounterStore {
    /// Increment `name` and return the new value, starting at 1.
    async fn next_counter(&self, name: &str) -> Result<u64>;
}

/// Everything the engine persists.
pub trait Store:
    CommandStateStore
    + MetricsStore
    + ModerationStore
    + SettingsStore
    + ReactionStore
    + CounterStore
    + Send
    + Sync
    + 'static
{
}

impl<T> Store for T where
    T: CommandStateStore
        + MetricsStore
        + ModerationStore
        + SettingsStore
        + ReactionStore
        + CounterStore
        + Send
        + Sync
        + 'static
{
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_active_ban() {
        let now = Utc::now();
        let record = |until| ModerationRecord {
            user: UserId(1),
            banned_until: until,
            reason: None,
        };

        assert_eq!(record(None).active_ban(now), None);
        assert_eq!(
            record(Some(BanExpiry::Permanent)).active_ban(now),
            Some(BanExpiry::Permanent)
        );
        assert_eq!(
            record(Some(BanExpiry::Until(now - Duration::hours(1)))).active_ban(now),
            None
        );
        assert!(record(Some(BanExpiry::Until(now + Duration::hours(1))))
            .active_ban(now)
            .is_some());
    }
}
