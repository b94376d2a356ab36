//! Mock repository implementations for testing

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use reeltime_core::SessionRepository;
use reeltime_domain::{ReelTimeError, Result, Session};
use uuid::Uuid;

/// In-memory `SessionRepository` keyed by session id.
///
/// `fail_reads` makes every query return a database error, for exercising
/// startup failure paths.
#[derive(Default, Clone)]
pub struct InMemorySessionRepository {
    sessions: Arc<Mutex<BTreeMap<Uuid, Session>>>,
    fail_reads: Arc<Mutex<bool>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with `session`.
    pub fn with_session(self, session: Session) -> Self {
        self.sessions.lock().insert(session.id, session);
        self
    }

    pub fn fail_reads(&self) {
        *self.fail_reads.lock() = true;
    }

    pub fn get(&self, id: Uuid) -> Option<Session> {
        self.sessions.lock().get(&id).cloned()
    }

    pub fn all(&self) -> Vec<Session> {
        self.sessions.lock().values().cloned().collect()
    }

    fn check_reads(&self) -> Result<()> {
        if *self.fail_reads.lock() {
            return Err(ReelTimeError::Database("store unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn upsert(&self, session: &Session) -> Result<()> {
        self.sessions.lock().insert(session.id, session.clone());
        Ok(())
    }

    async fn open_sessions_for_user(&self, user_id: &str) -> Result<Vec<Session>> {
        self.check_reads()?;
        Ok(self
            .sessions
            .lock()
            .values()
            .filter(|s| s.user_id == user_id && s.is_open())
            .cloned()
            .collect())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.sessions.lock().remove(&id);
        Ok(())
    }

    async fn sessions_for_user(
        &self,
        user_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Session>> {
        self.check_reads()?;
        let mut sessions: Vec<_> = self
            .sessions
            .lock()
            .values()
            .filter(|s| s.user_id == user_id)
            .filter(|s| match (since, s.ended_at) {
                (Some(since), Some(ended)) => ended > since,
                _ => true,
            })
            .cloned()
            .collect();
        sessions.sort_by_key(|s| s.started_at);
        Ok(sessions)
    }
}
