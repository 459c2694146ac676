//! Default values for every configuration section.

use crate::schema::*;
use statpixel_common::logging::LoggingConfig;

impl Default for Config {
    fn default() -> Self {
        Self {
            discord: DiscordConfig::default(),
            commands: CommandsConfig::default(),
            reactions: ReactionsConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            admin_ids: Vec::new(),
            bug_report_channel: None,
            primary_shard: 0,
        }
    }
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            default_settings: GuildSettings::default(),
            settings_ttl_seconds: 1800,
            help_command: "help".to_string(),
            text_root: "text".to_string(),
            image_root: "image".to_string(),
        }
    }
}

impl Default for GuildSettings {
    fn default() -> Self {
        Self {
            prefix: "-".to_string(),
            display_mode: DisplayMode::Image,
            colour: "#006dff".to_string(),
            charts_enabled: false,
        }
    }
}

impl Default for ReactionsConfig {
    fn default() -> Self {
        Self {
            sweep_interval_seconds: 60,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "data/statpixel.db".into(),
        }
    }
}
