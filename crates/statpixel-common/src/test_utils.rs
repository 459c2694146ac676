//! Test utilities and shared test helpers for StatPixel.
//!
//! Fixture ids, a shared tracing setup and proptest strategies used by the
//! engine, config and bot test suites.

use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize test logging once per test run.
static INIT: Once = Once::new();

/// Initialize logging for tests with a sensible default configuration.
/// This function is safe to call multiple times and will only initialize once.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

        let _ = fmt().with_test_writer().with_env_filter(filter).try_init();
    });
}

/// Temporary directory for sled databases and config files; removed on drop.
#[cfg(feature = "tempfile")]
pub fn create_temp_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temporary directory")
}

/// Discord-related test fixtures.
pub mod discord_fixtures {
    use crate::{ChannelId, GuildId, MessageId, UserId};

    /// A test channel ID.
    pub fn test_channel_id() -> ChannelId {
        ChannelId(123_456_789_012_345_678)
    }

    /// A test guild ID.
    pub fn test_guild_id() -> GuildId {
        GuildId(555_555_555_555_555_555)
    }

    /// A test message ID.
    pub fn test_message_id() -> MessageId {
        MessageId(777_777_777_777_777_777)
    }

    /// A test user ID.
    pub fn test_user_id() -> UserId {
        UserId(987_654_321_098_765_432)
    }

    /// The test bot's own user ID.
    pub fn test_bot_id() -> UserId {
        UserId(111_111_111_111_111_111)
    }

    /// A configured administrator's user ID.
    pub fn test_admin_id() -> UserId {
        UserId(222_222_222_222_222_222)
    }

    /// The owner of [`test_guild_id`].
    pub fn test_guild_owner_id() -> UserId {
        UserId(333_333_333_333_333_333)
    }
}

/// Property-based testing utilities using proptest.
#[cfg(feature = "proptest")]
pub mod property_testing {
    use crate::UserId;
    use proptest::prelude::*;

    /// Strategy for generating valid Discord user IDs.
    pub fn user_id_strategy() -> impl Strategy<Value = UserId> {
        (100_000_000_000_000_000u64..=999_999_999_999_999_999u64).prop_map(UserId)
    }

    /// Strategy for generating bare command tokens (no quotes or whitespace).
    pub fn token_strategy() -> impl Strategy<Value = String> {
        r"[a-zA-Z0-9_\-]{1,12}".prop_map(|s| s.to_string())
    }
}
