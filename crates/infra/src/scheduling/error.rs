//! Scheduler error types

use reeltime_domain::ReelTimeError;
use thiserror::Error;

use crate::errors::InfraError;

/// Lifecycle errors of background tasks (router, persister, monitors)
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Task is already running
    #[error("{0} already running")]
    AlreadyRunning(&'static str),

    /// A dependency failed to start
    #[error("Failed to start {component}: {reason}")]
    StartFailed { component: &'static str, reason: String },

    /// Operation timed out
    #[error("Operation timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// Task join failed
    #[error("Task join failed: {0}")]
    TaskJoinFailed(String),
}

impl From<SchedulerError> for InfraError {
    fn from(err: SchedulerError) -> Self {
        let reeltime_err = match err {
            SchedulerError::AlreadyRunning(_) => ReelTimeError::InvalidInput(err.to_string()),
            SchedulerError::StartFailed { .. } => ReelTimeError::Platform(err.to_string()),
            SchedulerError::Timeout { .. } | SchedulerError::TaskJoinFailed(_) => {
                ReelTimeError::Internal(err.to_string())
            }
        };
        InfraError(reeltime_err)
    }
}

impl From<SchedulerError> for ReelTimeError {
    fn from(err: SchedulerError) -> Self {
        InfraError::from(err).into()
    }
}

/// Convenience type alias for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;
