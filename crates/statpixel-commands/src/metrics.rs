//! Command usage tracking.
//!
//! Every permitted invocation bumps a global counter for the command path
//! and a per-user counter scoped to the guild (or the bot's own id in direct
//! messages). Increments are spawned and never awaited by the dispatcher, so
//! a crash may lose one.

use crate::store::{Store, UsageEntry};
use statpixel_common::{Result, UserId};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::warn;

/// Records command usage in the background.
#[derive(Clone)]
pub struct UsageRecorder {
    store: Arc<dyn Store>,
}

impl UsageRecorder {
    /// Create a recorder writing to `store`.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Spawn both increments for one invocation.
    pub fn record(&self, path: &str, user: UserId, scope: u64) -> JoinHandle<()> {
        let store = Arc::clone(&self.store);
        let path = path.to_string();

        tokio::spawn(async move {
            if let Err(e) = store.increment_usage(&path).await {
                warn!(path = %path, error = %e, "Failed to record command usage");
            }
            if let Err(e) = store.increment_user_usage(&path, user, scope).await {
                warn!(path = %path, %user, error = %e, "Failed to record user command usage");
            }
        })
    }

    /// Global usage ordered by uses.
    pub async fn leaderboard(&self) -> Result<Vec<UsageEntry>> {
        self.store.usage_leaderboard().await
    }

    /// Forget a member's usage in a guild they left.
    pub async fn forget_member(&self, user: UserId, scope: u64) -> Result<usize> {
        self.store.remove_user_usage(user, scope).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, MetricsStore};

    #[tokio::test]
    async fn test_record_bumps_both_counters() {
        let store = Arc::new(MemoryStore::new());
        let recorder = UsageRecorder::new(store.clone());

        recorder.record("text.bedwars", UserId(1), 50).await.unwrap();
        recorder.record("text.bedwars", UserId(2), 50).await.unwrap();

        assert_eq!(store.usage_of("text.bedwars"), 2);
        assert_eq!(store.user_usage("text.bedwars", UserId(1), 50).await.unwrap(), 1);

        let board = recorder.leaderboard().await.unwrap();
        assert_eq!(board.len(), 1);

        assert_eq!(recorder.forget_member(UserId(1), 50).await.unwrap(), 1);
    }
}
