//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for ReelTime
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum ReelTimeError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for ReelTime operations
pub type Result<T> = std::result::Result<T, ReelTimeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let err = ReelTimeError::Database("disk full".into());
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, r#"{"type":"Database","message":"disk full"}"#);
    }

    #[test]
    fn display_includes_category() {
        let err = ReelTimeError::Config("grace_start_secs must be > 0".into());
        assert_eq!(err.to_string(), "Configuration error: grace_start_secs must be > 0");
    }
}
