//! Errors raised by command bodies.

use crate::reply::CommandOutput;
use statpixel_common::StatError;
use thiserror::Error;

/// Result returned by a command body.
pub type CommandResult = std::result::Result<CommandOutput, CommandError>;

/// Failure of a command body.
#[derive(Error, Debug)]
pub enum CommandError {
    /// A message meant for the invoking user, shown verbatim.
    #[error("{0}")]
    User(String),

    /// An internal failure; logged and replaced by a generic message.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CommandError {
    /// Create a user-facing error.
    pub fn user(msg: impl Into<String>) -> Self {
        Self::User(msg.into())
    }
}

impl From<StatError> for CommandError {
    fn from(err: StatError) -> Self {
        Self::Internal(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_error_displays_verbatim() {
        let err = CommandError::user("`bedwars` is already enabled.");
        assert_eq!(err.to_string(), "`bedwars` is already enabled.");
    }

    #[test]
    fn test_stat_error_is_internal() {
        let err: CommandError = StatError::storage("tree missing").into();
        assert!(matches!(err, CommandError::Internal(_)));
    }
}
