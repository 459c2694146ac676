//! Configuration loading from TOML, YAML, or JSON files with environment
//! overrides.

use crate::schema::Config;
use statpixel_common::{Result, StatError, UserId};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable holding the bot token.
pub const ENV_TOKEN: &str = "DISCORD_TOKEN";
/// Environment variable holding a comma separated list of admin user ids.
pub const ENV_ADMINS: &str = "STATPIXEL_ADMINS";
/// Environment variable holding the database path.
pub const ENV_DATA_PATH: &str = "STATPIXEL_DATA_PATH";

/// Configuration loader.
pub struct ConfigLoader {
    path: PathBuf,
}

impl ConfigLoader {
    /// Creates a new configuration loader.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path this loader reads from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads configuration from file, falling back to defaults when the file
    /// does not exist, then applies environment overrides.
    pub async fn load(&self) -> Result<Config> {
        let mut config = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => {
                info!("Loading configuration from {}", self.path.display());
                parse_config(&self.path, &contents)?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(
                    "Configuration file {} not found, using defaults",
                    self.path.display()
                );
                Config::default()
            }
            Err(e) => return Err(e.into()),
        };

        apply_overrides(&mut config, |key| std::env::var(key).ok())?;
        Ok(config)
    }
}

/// Parses configuration text, choosing the format from the file extension.
pub fn parse_config(path: &Path, contents: &str) -> Result<Config> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("toml") => toml::from_str(contents)
            .map_err(|e| StatError::config(format!("invalid TOML configuration: {e}"))),
        Some("yaml" | "yml") => serde_yaml::from_str(contents)
            .map_err(|e| StatError::config(format!("invalid YAML configuration: {e}"))),
        Some("json") => Ok(serde_json::from_str(contents)?),
        other => Err(StatError::config(format!(
            "unsupported configuration format: {}",
            other.unwrap_or("<none>")
        ))),
    }
}

/// Applies environment overrides using the given lookup.
pub fn apply_overrides<F>(config: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(token) = lookup(ENV_TOKEN) {
        debug!("Discord token overridden from environment");
        config.discord.token = token;
    }

    if let Some(admins) = lookup(ENV_ADMINS) {
        config.discord.admin_ids = admins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<UserId>()
                    .map_err(|e| StatError::config(format!("invalid admin id '{s}': {e}")))
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(count = config.discord.admin_ids.len(), "Admin ids overridden from environment");
    }

    if let Some(path) = lookup(ENV_DATA_PATH) {
        config.storage.path = path.into();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DisplayMode;
    use std::collections::HashMap;

    #[test]
    fn test_parse_toml() {
        let config = parse_config(
            Path::new("config.toml"),
            r#"
            [discord]
            token = "abc"
            admin_ids = [222222222222222222]

            [commands.default_settings]
            prefix = "!"
            display_mode = "text"
            "#,
        )
        .unwrap();

        assert_eq!(config.discord.token, "abc");
        assert_eq!(config.discord.admin_ids, vec![UserId(222_222_222_222_222_222)]);
        assert_eq!(config.commands.default_settings.prefix, "!");
        assert_eq!(config.commands.default_settings.display_mode, DisplayMode::Text);
        // Untouched sections keep their defaults.
        assert_eq!(config.reactions.sweep_interval_seconds, 60);
        assert_eq!(config.commands.default_settings.colour, "#006dff");
    }

    #[test]
    fn test_parse_yaml() {
        let config = parse_config(
            Path::new("config.yml"),
            "discord:\n  token: yaml-token\nreactions:\n  sweep_interval_seconds: 30\n",
        )
        .unwrap();

        assert_eq!(config.discord.token, "yaml-token");
        assert_eq!(config.reactions.sweep_interval_seconds, 30);
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        assert!(parse_config(Path::new("config.ini"), "").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_TOKEN, "env-token"),
            (ENV_ADMINS, "1, 2,,3"),
            (ENV_DATA_PATH, "/tmp/db"),
        ]);
        let mut config = Config::default();
        apply_overrides(&mut config, |k| env.get(k).map(|v| (*v).to_string())).unwrap();

        assert_eq!(config.discord.token, "env-token");
        assert_eq!(config.discord.admin_ids, vec![UserId(1), UserId(2), UserId(3)]);
        assert_eq!(config.storage.path, PathBuf::from("/tmp/db"));
    }

    #[test]
    fn test_env_override_rejects_bad_admin_id() {
        let mut config = Config::default();
        let result = apply_overrides(&mut config, |k| {
            (k == ENV_ADMINS).then(|| "12,abc".to_string())
        });
        assert!(result.is_err());
    }
}
