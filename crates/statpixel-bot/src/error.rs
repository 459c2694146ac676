//! Errors surfaced by the binary.

use statpixel_common::StatError;

/// Failure that stops the bot.
#[derive(thiserror::Error, Debug)]
pub enum BotError {
    /// Configuration, storage or engine failure.
    #[error(transparent)]
    Engine(#[from] StatError),

    /// Gateway or REST failure while connecting.
    #[error("Discord error: {0}")]
    Discord(#[from] serenity::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for the bot application.
pub type BotResult<T> = Result<T, BotError>;
