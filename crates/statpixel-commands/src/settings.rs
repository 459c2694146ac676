//! Cached guild settings.

use crate::store::Store;
use dashmap::DashMap;
use statpixel_common::{GuildId, Result};
use statpixel_config::GuildSettings;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Guild settings cache with a fixed time-to-live, refreshed from the store
/// on miss. Direct messages use the configured defaults.
pub struct SettingsCache {
    store: Arc<dyn Store>,
    defaults: GuildSettings,
    ttl: Duration,
    entries: DashMap<GuildId, (GuildSettings, Instant)>,
}

impl SettingsCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, defaults: GuildSettings, ttl: Duration) -> Self {
        Self {
            store,
            defaults,
            ttl,
            entries: DashMap::new(),
        }
    }

    /// Settings used outside guilds and for guilds with nothing stored.
    #[must_use]
    pub const fn defaults(&self) -> &GuildSettings {
        &self.defaults
    }

    /// Settings of `guild`, or the defaults for `None`.
    pub async fn get(&self, guild: Option<GuildId>) -> Result<GuildSettings> {
        let Some(guild) = guild else {
            return Ok(self.defaults.clone());
        };

        if let Some(entry) = self.entries.get(&guild) {
            let (settings, fetched_at) = entry.value();
            if fetched_at.elapsed() < self.ttl {
                return Ok(settings.clone());
            }
        }

        let settings = self
            .store
            .load_settings(guild)
            .await?
            .unwrap_or_else(|| self.defaults.clone());
        debug!(%guild, "Refreshed guild settings");

        self.entries.insert(guild, (settings.clone(), Instant::now()));
        Ok(settings)
    }

    /// Apply `change` to the settings of `guild`, persist them and refresh the
    /// cached entry.
    pub async fn update<F>(&self, guild: GuildId, change: F) -> Result<GuildSettings>
    where
        F: FnOnce(&mut GuildSettings) + Send,
    {
        let mut settings = self
            .store
            .load_settings(guild)
            .await?
            .unwrap_or_else(|| self.defaults.clone());
        change(&mut settings);

        self.store.save_settings(guild, &settings).await?;
        self.entries.insert(guild, (settings.clone(), Instant::now()));
        Ok(settings)
    }

    /// Drop the cached entry of `guild`.
    pub fn invalidate(&self, guild: GuildId) {
        self.entries.remove(&guild);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, SettingsStore};
    use statpixel_config::DisplayMode;

    fn cache(store: &Arc<MemoryStore>) -> SettingsCache {
        SettingsCache::new(store.clone(), GuildSettings::default(), Duration::from_secs(1800))
    }

    #[tokio::test]
    async fn test_direct_messages_use_defaults() {
        let store = Arc::new(MemoryStore::new());
        let settings = cache(&store).get(None).await.unwrap();
        assert_eq!(settings, GuildSettings::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire_after_ttl() {
        let store = Arc::new(MemoryStore::new());
        let cache = cache(&store);
        let guild = GuildId(5);

        assert_eq!(cache.get(Some(guild)).await.unwrap().prefix, "-");

        let changed = GuildSettings {
            prefix: "!".into(),
            ..GuildSettings::default()
        };
        store.save_settings(guild, &changed).await.unwrap();
        assert_eq!(cache.get(Some(guild)).await.unwrap().prefix, "-");

        tokio::time::advance(Duration::from_secs(1801)).await;
        assert_eq!(cache.get(Some(guild)).await.unwrap().prefix, "!");
    }

    #[tokio::test]
    async fn test_update_writes_through() {
        let store = Arc::new(MemoryStore::new());
        let cache = cache(&store);
        let guild = GuildId(5);
        cache.get(Some(guild)).await.unwrap();

        cache
            .update(guild, |s| s.display_mode = s.display_mode.toggled())
            .await
            .unwrap();

        assert_eq!(cache.get(Some(guild)).await.unwrap().display_mode, DisplayMode::Text);
        assert_eq!(
            store.load_settings(guild).await.unwrap().unwrap().display_mode,
            DisplayMode::Text
        );
    }
}
