//! Runtime validation of a loaded configuration.

use crate::schema::{Config, GuildSettings};
use statpixel_common::{Result, StatError};

/// Longest prefix a guild may configure.
pub const MAX_PREFIX_LENGTH: usize = 16;

impl Config {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.discord.token.is_empty() {
            return Err(StatError::config("Discord token cannot be empty"));
        }

        self.commands.default_settings.validate()?;

        if self.commands.help_command.is_empty() {
            return Err(StatError::config("Help command name cannot be empty"));
        }

        if self.commands.text_root == self.commands.image_root {
            return Err(StatError::config(
                "Text and image shortcut roots must be different commands",
            ));
        }

        if self.commands.settings_ttl_seconds == 0 {
            return Err(StatError::config("Settings TTL must be at least one second"));
        }

        if self.reactions.sweep_interval_seconds == 0 {
            return Err(StatError::config(
                "Reaction sweep interval must be at least one second",
            ));
        }

        Ok(())
    }
}

impl GuildSettings {
    /// Validates a settings record.
    pub fn validate(&self) -> Result<()> {
        if self.prefix.is_empty() || self.prefix.chars().count() > MAX_PREFIX_LENGTH {
            return Err(StatError::config(format!(
                "Prefix must be between 1 and {MAX_PREFIX_LENGTH} characters"
            )));
        }

        if self.colour_value().is_none() {
            return Err(StatError::config(format!(
                "Colour '{}' is not a #rrggbb hex value",
                self.colour
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.discord.token = "token".to_string();
        config
    }

    #[test]
    fn test_default_config_requires_token() {
        assert!(Config::default().validate().is_err());
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_prefix_length_is_bounded() {
        let mut config = valid_config();
        config.commands.default_settings.prefix = "x".repeat(17);
        assert!(config.validate().is_err());

        config.commands.default_settings.prefix = "x".repeat(16);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_colour_must_be_hex() {
        let mut config = valid_config();
        config.commands.default_settings.colour = "blue".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_shortcut_roots_must_differ() {
        let mut config = valid_config();
        config.commands.image_root = "text".to_string();
        assert!(config.validate().is_err());
    }
}
