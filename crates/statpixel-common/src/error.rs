//! Error types and utilities for StatPixel.

use thiserror::Error;

/// Result type alias for StatPixel operations.
pub type Result<T> = std::result::Result<T, StatError>;

/// Main error type for StatPixel operations.
#[derive(Error, Debug)]
pub enum StatError {
    /// Configuration related errors.
    #[error("Configuration error: {message}")]
    Config {
        /// Human readable description.
        message: String,
    },

    /// Persistent storage errors.
    #[error("Storage error: {message}")]
    Storage {
        /// Human readable description.
        message: String,
        /// Underlying cause, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Chat platform (gateway or REST) errors.
    #[error("Platform error: {message}")]
    Platform {
        /// Human readable description.
        message: String,
        /// Underlying cause, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A command path or document that does not exist.
    #[error("Not found: {path}")]
    NotFound {
        /// The path or key that was looked up.
        path: String,
    },

    /// A coerced argument was read back as the wrong type.
    #[error("Argument {index} is not a {expected}")]
    ArgumentType {
        /// Positional index of the argument.
        index: usize,
        /// The type the command body asked for.
        expected: &'static str,
    },

    /// Serialization/deserialization errors.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O related errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StatError {
    /// Create a new configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a new storage error.
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new storage error with source.
    pub fn storage_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Storage {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new platform error.
    pub fn platform(msg: impl Into<String>) -> Self {
        Self::Platform {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new platform error with source.
    pub fn platform_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Platform {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new not-found error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StatError::not_found("text.bedwars");
        assert_eq!(err.to_string(), "Not found: text.bedwars");

        let err = StatError::ArgumentType {
            index: 1,
            expected: "duration",
        };
        assert_eq!(err.to_string(), "Argument 1 is not a duration");
    }

    #[test]
    fn test_error_source_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let err = StatError::storage_with_source("flush failed", io);
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.to_string(), "Storage error: flush failed");
    }
}
