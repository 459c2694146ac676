//! Main entry point for StatPixel Bot.

use statpixel_bot::{BotResult, StatPixelBot};
use statpixel_commands::store::SledStore;
use statpixel_common::logging::init_logging;
use statpixel_config::ConfigLoader;
use std::env;
use std::sync::Arc;
use tracing::{error, info};

/// Environment variable naming the configuration file.
const ENV_CONFIG: &str = "STATPIXEL_CONFIG";

#[tokio::main]
async fn main() -> BotResult<()> {
    let path = env::var(ENV_CONFIG).unwrap_or_else(|_| "config.toml".to_string());
    let config = ConfigLoader::new(path).load().await?;
    config.validate()?;

    // Held until exit so buffered log lines are flushed.
    let _log_guard = init_logging(&config.logging)?;
    info!("Starting StatPixel Bot");

    let store = Arc::new(SledStore::open(&config.storage.path)?);

    let bot = StatPixelBot::new(config, store.clone());
    let result = bot.start().await;
    store.flush().await?;

    if let Err(e) = &result {
        error!("Bot stopped with an error: {}", e);
    }
    result
}
