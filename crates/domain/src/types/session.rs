//! Session records
//!
//! A [`Session`] is the durable unit of tracked work. A [`SessionDraft`] is
//! the in-memory candidate held while a grace-start period is running; it is
//! never persisted.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A tracked interval of work on one project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid, // UUIDv7
    pub user_id: String,
    pub project_name: String,
    pub started_at: DateTime<Utc>,
    /// `None` while the session is still open
    pub ended_at: Option<DateTime<Utc>>,
    /// Last durable checkpoint of an open session
    pub last_flushed_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Start marker of a record that was persisted before promotion.
    ///
    /// Such a record never represented tracked time; crash recovery deletes
    /// it instead of closing it.
    pub const UNPROMOTED_START: DateTime<Utc> = DateTime::<Utc>::UNIX_EPOCH;

    /// Open a new session for `project_name` starting at `started_at`.
    pub fn open(
        user_id: impl Into<String>,
        project_name: impl Into<String>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id: user_id.into(),
            project_name: project_name.into(),
            started_at,
            ended_at: None,
            last_flushed_at: None,
        }
    }

    /// `true` until the session has an end
    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }

    /// `true` for a record carrying the unpromoted start marker
    pub fn is_unpromoted(&self) -> bool {
        self.started_at == Self::UNPROMOTED_START
    }

    /// Close the session at `at`, never earlier than its start.
    pub fn close(&mut self, at: DateTime<Utc>) {
        self.ended_at = Some(at.max(self.started_at));
    }

    /// Elapsed time of the session; open sessions are measured up to `now`.
    pub fn duration(&self, now: DateTime<Utc>) -> Duration {
        let end = self.ended_at.unwrap_or(now);
        (end - self.started_at).max(Duration::zero())
    }
}

/// Provisional session held during grace-start
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDraft {
    pub project_name: String,
    /// Becomes the session start when the draft is promoted
    pub started_at: DateTime<Utc>,
}

impl SessionDraft {
    /// Draft for `project_name` with a provisional start.
    pub fn new(project_name: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self { project_name: project_name.into(), started_at }
    }

    /// Turn the draft into a durable session, backdated to the draft start.
    pub fn promote(self, user_id: impl Into<String>) -> Session {
        Session::open(user_id, self.project_name, self.started_at)
    }
}
