//! Configuration schema definitions using serde.

use serde::{Deserialize, Serialize};
use statpixel_common::logging::LoggingConfig;
use statpixel_common::{ChannelId, UserId};
use std::path::PathBuf;

/// Main configuration structure for StatPixel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Discord configuration.
    pub discord: DiscordConfig,
    /// Command dispatch configuration.
    pub commands: CommandsConfig,
    /// Reaction scheduler configuration.
    pub reactions: ReactionsConfig,
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Discord bot configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// Discord bot token.
    pub token: String,
    /// Users allowed to run admin-tier commands and bypass owner checks.
    pub admin_ids: Vec<UserId>,
    /// Channel that receives bug reports.
    pub bug_report_channel: Option<ChannelId>,
    /// Shard that runs the reaction sweep loop.
    pub primary_shard: u32,
}

/// Command dispatch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandsConfig {
    /// Settings used in direct messages and for guilds without stored settings.
    pub default_settings: GuildSettings,
    /// Lifetime of a cached guild settings entry.
    pub settings_ttl_seconds: u64,
    /// Command run when the bot is mentioned without any text.
    pub help_command: String,
    /// Root whose children are the text game-mode shortcuts.
    pub text_root: String,
    /// Root whose children are the image game-mode shortcuts.
    pub image_root: String,
}

/// How game-mode statistics are presented in a guild.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Rendered images, falling back to text where no image exists.
    #[default]
    Image,
    /// Plain text embeds.
    Text,
}

impl DisplayMode {
    /// The other display mode.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Image => Self::Text,
            Self::Text => Self::Image,
        }
    }
}

/// Per-guild settings, persisted and cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuildSettings {
    /// Command prefix.
    pub prefix: String,
    /// Statistics display mode.
    pub display_mode: DisplayMode,
    /// Embed colour as a `#rrggbb` hex string.
    pub colour: String,
    /// Whether charts are attached to statistics.
    pub charts_enabled: bool,
}

impl GuildSettings {
    /// Parses the embed colour into its numeric value.
    #[must_use]
    pub fn colour_value(&self) -> Option<u32> {
        let hex = self.colour.strip_prefix('#')?;
        if hex.len() != 6 {
            return None;
        }
        u32::from_str_radix(hex, 16).ok()
    }
}

/// Reaction scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactionsConfig {
    /// Interval between sweeps of persisted reaction handlers.
    pub sweep_interval_seconds: u64,
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the embedded database directory.
    pub path: PathBuf,
}
