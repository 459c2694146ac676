//! Sled-backed store.
//!
//! Each document kind has its own tree. Counters are big-endian `u64`
//! values updated atomically; documents are stored as JSON.

use super::{
    BanExpiry, CommandStateStore, CounterStore, MetricsStore, ModerationRecord, ModerationStore,
    ReactionStore, SettingsStore, UsageEntry,
};
use crate::platform::EmojiRef;
use crate::reactions::ReactionHandler;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use statpixel_common::{ChannelId, GuildId, MessageId, Result, StatError, UserId};
use statpixel_config::GuildSettings;
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

const DISABLED_KEY: &[u8] = b"disabled";

/// Store backed by an embedded sled database.
#[derive(Debug, Clone)]
pub struct SledStore {
    db: sled::Db,
    commands: sled::Tree,
    usage: sled::Tree,
    user_usage: sled::Tree,
    moderation: sled::Tree,
    settings: sled::Tree,
    reactions: sled::Tree,
    counters: sled::Tree,
}

fn storage(context: &'static str) -> impl FnOnce(sled::Error) -> StatError {
    move |e| StatError::storage_with_source(context, e)
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(bytes)?)
}

fn read_u64(bytes: &[u8]) -> u64 {
    bytes
        .try_into()
        .map(u64::from_be_bytes)
        .unwrap_or_default()
}

fn increment(old: Option<&[u8]>) -> Option<Vec<u8>> {
    let next = old.map_or(0, read_u64) + 1;
    Some(next.to_be_bytes().to_vec())
}

fn user_usage_prefix(user: UserId, scope: u64) -> String {
    format!("{user}:{scope}:")
}

impl SledStore {
    /// Open or create the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        info!("Opening database at {}", path.as_ref().display());

        let db = sled::Config::default()
            .path(path.as_ref())
            .cache_capacity(64 * 1024 * 1024)
            .flush_every_ms(Some(1000))
            .open()
            .map_err(storage("failed to open database"))?;

        Self::from_db(db)
    }

    /// Open a throwaway database that is removed on drop.
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::default()
            .temporary(true)
            .open()
            .map_err(storage("failed to open temporary database"))?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> Result<Self> {
        let tree = |name: &'static str| db.open_tree(name).map_err(storage("failed to open tree"));
        Ok(Self {
            commands: tree("commands")?,
            usage: tree("usage")?,
            user_usage: tree("user_usage")?,
            moderation: tree("moderation")?,
            settings: tree("settings")?,
            reactions: tree("reactions")?,
            counters: tree("counters")?,
            db,
        })
    }

    /// Flush pending writes to disk.
    pub async fn flush(&self) -> Result<()> {
        self.db
            .flush_async()
            .await
            .map_err(storage("failed to flush database"))?;
        Ok(())
    }

    fn reactions(&self) -> impl Iterator<Item = Result<ReactionHandler>> + '_ {
        self.reactions.iter().values().map(|value| {
            let bytes = value.map_err(storage("failed to read reaction handler"))?;
            decode(&bytes)
        })
    }

    fn delete_reactions_where<F>(&self, predicate: F) -> Result<Vec<Uuid>>
    where
        F: Fn(&ReactionHandler) -> bool,
    {
        let mut removed = Vec::new();
        for handler in self.reactions() {
            let handler = handler?;
            if predicate(&handler) {
                self.reactions
                    .remove(handler.id.as_bytes())
                    .map_err(storage("failed to delete reaction handler"))?;
                removed.push(handler.id);
            }
        }
        Ok(removed)
    }
}

#[async_trait]
impl CommandStateStore for SledStore {
    async fn disabled_commands(&self) -> Result<Vec<String>> {
        match self
            .commands
            .get(DISABLED_KEY)
            .map_err(storage("failed to read disabled commands"))?
        {
            Some(bytes) => decode(&bytes),
            None => Ok(Vec::new()),
        }
    }

    async fn set_command_disabled(&self, path: &str, disabled: bool) -> Result<()> {
        let mut list = self.disabled_commands().await?;
        list.retain(|p| p != path);
        if disabled {
            list.push(path.to_string());
        }

        self.commands
            .insert(DISABLED_KEY, encode(&list)?)
            .map_err(storage("failed to write disabled commands"))?;
        self.commands
            .flush_async()
            .await
            .map_err(storage("failed to flush disabled commands"))?;

        debug!(path, disabled, "Persisted command state");
        Ok(())
    }
}

#[async_trait]
impl MetricsStore for SledStore {
    async fn increment_usage(&self, path: &str) -> Result<u64> {
        let value = self
            .usage
            .update_and_fetch(path.as_bytes(), increment)
            .map_err(storage("failed to increment usage"))?;
        Ok(value.as_deref().map_or(0, read_u64))
    }

    async fn increment_user_usage(&self, path: &str, user: UserId, scope: u64) -> Result<u64> {
        let key = format!("{}{path}", user_usage_prefix(user, scope));
        let value = self
            .user_usage
            .update_and_fetch(key.as_bytes(), increment)
            .map_err(storage("failed to increment user usage"))?;
        Ok(value.as_deref().map_or(0, read_u64))
    }

    async fn usage_leaderboard(&self) -> Result<Vec<UsageEntry>> {
        let mut entries = self
            .usage
            .iter()
            .map(|item| {
                let (key, value) = item.map_err(storage("failed to read usage"))?;
                Ok(UsageEntry {
                    path: String::from_utf8_lossy(&key).into_owned(),
                    uses: read_u64(&value),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        entries.sort_by(|a, b| b.uses.cmp(&a.uses).then_with(|| a.path.cmp(&b.path)));
        Ok(entries)
    }

    async fn user_usage(&self, path: &str, user: UserId, scope: u64) -> Result<u64> {
        let key = format!("{}{path}", user_usage_prefix(user, scope));
        let value = self
            .user_usage
            .get(key.as_bytes())
            .map_err(storage("failed to read user usage"))?;
        Ok(value.as_deref().map_or(0, read_u64))
    }

    async fn remove_user_usage(&self, user: UserId, scope: u64) -> Result<usize> {
        let prefix = user_usage_prefix(user, scope);
        let keys = self
            .user_usage
            .scan_prefix(prefix.as_bytes())
            .keys()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(storage("failed to scan user usage"))?;

        for key in &keys {
            self.user_usage
                .remove(key)
                .map_err(storage("failed to delete user usage"))?;
        }
        Ok(keys.len())
    }
}

#[async_trait]
impl ModerationStore for SledStore {
    async fn moderation(&self, user: UserId) -> Result<Option<ModerationRecord>> {
        self.moderation
            .get(user.get().to_be_bytes())
            .map_err(storage("failed to read moderation record"))?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    async fn set_ban(
        &self,
        user: UserId,
        until: Option<BanExpiry>,
        reason: Option<String>,
    ) -> Result<()> {
        let record = ModerationRecord {
            user,
            banned_until: until,
            reason,
        };
        self.moderation
            .insert(user.get().to_be_bytes(), encode(&record)?)
            .map_err(storage("failed to write moderation record"))?;
        self.moderation
            .flush_async()
            .await
            .map_err(storage("failed to flush moderation record"))?;
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for SledStore {
    async fn load_settings(&self, guild: GuildId) -> Result<Option<GuildSettings>> {
        self.settings
            .get(guild.get().to_be_bytes())
            .map_err(storage("failed to read guild settings"))?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    async fn save_settings(&self, guild: GuildId, settings: &GuildSettings) -> Result<()> {
        self.settings
            .insert(guild.get().to_be_bytes(), encode(settings)?)
            .map_err(storage("failed to write guild settings"))?;
        self.settings
            .flush_async()
            .await
            .map_err(storage("failed to flush guild settings"))?;
        Ok(())
    }
}

#[async_trait]
impl ReactionStore for SledStore {
    async fn insert_reaction(&self, handler: &ReactionHandler) -> Result<()> {
        self.reactions
            .insert(handler.id.as_bytes(), encode(handler)?)
            .map_err(storage("failed to write reaction handler"))?;
        self.reactions
            .flush_async()
            .await
            .map_err(storage("failed to flush reaction handler"))?;
        Ok(())
    }

    async fn find_reaction(
        &self,
        message: MessageId,
        emoji: &EmojiRef,
        with_remove_event: bool,
    ) -> Result<Option<ReactionHandler>> {
        for handler in self.reactions() {
            let handler = handler?;
            if handler.message == message
                && emoji.matches(&handler.emojis)
                && (!with_remove_event || handler.remove_event.is_some())
            {
                return Ok(Some(handler));
            }
        }
        Ok(None)
    }

    async fn take_reaction(&self, id: Uuid) -> Result<Option<ReactionHandler>> {
        self.reactions
            .remove(id.as_bytes())
            .map_err(storage("failed to delete reaction handler"))?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    async fn delete_reactions_for_message(
        &self,
        channel: ChannelId,
        message: MessageId,
    ) -> Result<Vec<Uuid>> {
        self.delete_reactions_where(|h| h.channel == channel && h.message == message)
    }

    async fn delete_reactions_for_channel(&self, channel: ChannelId) -> Result<Vec<Uuid>> {
        self.delete_reactions_where(|h| h.channel == channel)
    }

    async fn reactions_expiring_before(&self, horizon: DateTime<Utc>) -> Result<Vec<ReactionHandler>> {
        let mut expiring = Vec::new();
        for handler in self.reactions() {
            let handler = handler?;
            if handler.expires_at.is_some_and(|at| at < horizon) {
                expiring.push(handler);
            }
        }
        Ok(expiring)
    }
}

#[async_trait]
impl CounterStore for SledStore {
    async fn next_counter(&self, name: &str) -> Result<u64> {
        let value = self
            .counters
            .update_and_fetch(name.as_bytes(), increment)
            .map_err(storage("failed to increment counter"))?;
        Ok(value.as_deref().map_or(0, read_u64))
    }
}
