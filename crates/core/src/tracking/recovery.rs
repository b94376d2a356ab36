//! Crash-recovery reconciliation
//!
//! After an ungraceful exit the store may still hold sessions without an end
//! timestamp. Before monitoring resumes every such session of the current
//! user is closed at its last durable checkpoint, so time between the crash
//! and the restart is never attributed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use reeltime_domain::{Result, Session};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::ports::{Clock, SessionRepository};

/// Outcome of a recovery pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Orphans closed, with their final end timestamps
    pub closed: Vec<Session>,
    /// Never-promoted records removed from the store
    pub deleted: Vec<Uuid>,
}

impl RecoveryReport {
    pub fn is_empty(&self) -> bool {
        self.closed.is_empty() && self.deleted.is_empty()
    }
}

/// Closes sessions left open by a previous run
pub struct CrashRecoveryService {
    repository: Arc<dyn SessionRepository>,
    clock: Arc<dyn Clock>,
}

impl CrashRecoveryService {
    pub fn new(repository: Arc<dyn SessionRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Reconcile every open session of `user_id`.
    ///
    /// # Errors
    /// Any store failure is returned unchanged; callers abort startup on it.
    #[instrument(skip(self))]
    pub async fn recover(&self, user_id: &str) -> Result<RecoveryReport> {
        let orphans = self.repository.open_sessions_for_user(user_id).await?;
        let mut report = RecoveryReport::default();
        if orphans.is_empty() {
            return Ok(report);
        }

        let now = self.clock.now();
        for mut session in orphans {
            if session.is_unpromoted() {
                warn!(session_id = %session.id, "Deleting never-promoted session record");
                self.repository.delete(session.id).await?;
                report.deleted.push(session.id);
                continue;
            }

            let end = recovered_end(&session, now);
            session.close(end);
            self.repository.upsert(&session).await?;
            info!(
                session_id = %session.id,
                project = %session.project_name,
                ended_at = %end,
                checkpointed = session.last_flushed_at.is_some(),
                "Recovered orphaned session"
            );
            report.closed.push(session);
        }

        Ok(report)
    }
}

/// Last checkpoint if there is one, otherwise the recovery instant.
fn recovered_end(session: &Session, now: DateTime<Utc>) -> DateTime<Utc> {
    session.last_flushed_at.unwrap_or(now)
}
