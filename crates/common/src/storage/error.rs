//! Storage error types

use thiserror::Error;

/// Storage error type
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Database query error: {0}")]
    Query(String),

    #[error("Database migration error: {0}")]
    Migration(String),

    #[error("Connection timeout after {0}s")]
    Timeout(u64),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Rusqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    R2d2(#[from] r2d2::Error),
}

/// Storage result type
pub type StorageResult<T> = Result<T, StorageError>;

impl StorageError {
    /// Check if this error is worth retrying.
    ///
    /// Pool timeouts and SQLite BUSY/LOCKED failures are transient; schema
    /// and configuration problems are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Connection(_) => true,
            Self::Rusqlite(err) => matches!(
                err.sqlite_error_code(),
                Some(rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked)
            ),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeouts_are_retryable() {
        assert!(StorageError::Timeout(5).is_retryable());
        assert!(StorageError::Connection("pool closed".into()).is_retryable());
    }

    #[test]
    fn config_errors_are_not_retryable() {
        assert!(!StorageError::InvalidConfig("max_size = 0".into()).is_retryable());
        assert!(!StorageError::Migration("bad sql".into()).is_retryable());
        assert!(!StorageError::Rusqlite(rusqlite::Error::QueryReturnedNoRows).is_retryable());
    }
}
