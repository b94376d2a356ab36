//! Conversions from external infrastructure errors into domain errors.

use reeltime_common::storage::StorageError;
use reeltime_domain::ReelTimeError;
use rusqlite::Error as SqlError;
use tokio::task::JoinError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub ReelTimeError);

impl From<InfraError> for ReelTimeError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<ReelTimeError> for InfraError {
    fn from(value: ReelTimeError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoReelTimeError {
    fn into_reeltime(self) -> ReelTimeError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → ReelTimeError */
/* -------------------------------------------------------------------------- */

impl IntoReelTimeError for SqlError {
    fn into_reeltime(self) -> ReelTimeError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => {
                        ReelTimeError::Database("database is busy".into())
                    }
                    (ErrorCode::DatabaseLocked, _) => {
                        ReelTimeError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 2067 | 1555) => {
                        ReelTimeError::Database("unique constraint violation".into())
                    }
                    (ErrorCode::ConstraintViolation, 275) => {
                        ReelTimeError::InvalidInput(format!("check constraint failed: {message}"))
                    }
                    (ErrorCode::NotADatabase, _) => {
                        ReelTimeError::Database("file is not a database".into())
                    }
                    _ => ReelTimeError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => ReelTimeError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                ReelTimeError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                ReelTimeError::Database(format!("invalid column type: {ty}"))
            }
            RE::InvalidPath(path) => ReelTimeError::Database(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            other => ReelTimeError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_reeltime())
    }
}

/* -------------------------------------------------------------------------- */
/* StorageError → ReelTimeError */
/* -------------------------------------------------------------------------- */

impl IntoReelTimeError for StorageError {
    fn into_reeltime(self) -> ReelTimeError {
        match self {
            StorageError::Rusqlite(err) => err.into_reeltime(),
            StorageError::InvalidConfig(msg) => ReelTimeError::Config(msg),
            other => ReelTimeError::Database(other.to_string()),
        }
    }
}

impl From<StorageError> for InfraError {
    fn from(value: StorageError) -> Self {
        InfraError(value.into_reeltime())
    }
}

/* -------------------------------------------------------------------------- */
/* tokio::task::JoinError → ReelTimeError */
/* -------------------------------------------------------------------------- */

impl IntoReelTimeError for JoinError {
    fn into_reeltime(self) -> ReelTimeError {
        if self.is_cancelled() {
            ReelTimeError::Internal("blocking task cancelled".into())
        } else {
            ReelTimeError::Internal(format!("blocking task panicked: {self}"))
        }
    }
}

impl From<JoinError> for InfraError {
    fn from(value: JoinError) -> Self {
        InfraError(value.into_reeltime())
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::ffi::{Error as FfiError, ErrorCode};

    use super::*;

    #[test]
    fn sqlite_busy_maps_to_database_error() {
        let err = SqlError::SqliteFailure(
            FfiError { code: ErrorCode::DatabaseBusy, extended_code: 5 },
            Some("database is locked".into()),
        );

        let mapped: ReelTimeError = InfraError::from(err).into();
        match mapped {
            ReelTimeError::Database(msg) => {
                assert!(msg.contains("busy") || msg.contains("locked"));
            }
            other => panic!("expected database error, got {:?}", other),
        }
    }

    #[test]
    fn check_constraint_maps_to_invalid_input() {
        let err = SqlError::SqliteFailure(
            FfiError { code: ErrorCode::ConstraintViolation, extended_code: 275 },
            Some("CHECK constraint failed: ended_at >= started_at".into()),
        );

        let mapped: ReelTimeError = InfraError::from(err).into();
        assert!(matches!(mapped, ReelTimeError::InvalidInput(msg) if msg.contains("ended_at")));
    }

    #[test]
    fn no_rows_maps_to_not_found() {
        let mapped: ReelTimeError = InfraError::from(SqlError::QueryReturnedNoRows).into();
        assert!(matches!(mapped, ReelTimeError::NotFound(_)));
    }

    #[test]
    fn storage_errors_unwrap_sqlite_causes() {
        let storage = StorageError::Rusqlite(SqlError::QueryReturnedNoRows);
        let mapped: ReelTimeError = InfraError::from(storage).into();
        assert!(matches!(mapped, ReelTimeError::NotFound(_)));

        let mapped: ReelTimeError = InfraError::from(StorageError::Timeout(5)).into();
        assert!(matches!(mapped, ReelTimeError::Database(_)));
    }
}
