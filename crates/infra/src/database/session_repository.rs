//! Session repository implementation using SQLite
//!
//! Timestamps are stored as Unix milliseconds. Every call runs on the
//! blocking pool so the async callers never wait on SQLite locks.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reeltime_common::storage::{SqliteConnection, StorageError};
use reeltime_core::SessionRepository;
use reeltime_domain::{ReelTimeError, Result as DomainResult, Session};
use rusqlite::types::Type;
use rusqlite::{params, Row};
use tokio::task;
use tracing::debug;
use uuid::Uuid;

use super::manager::{map_storage_error, DbManager};
use crate::errors::InfraError;

const SESSION_COLUMNS: &str =
    "id, user_id, project_name, started_at, ended_at, last_flushed_at";

/// SQLite-backed implementation of `SessionRepository`
pub struct SqliteSessionRepository {
    db: Arc<DbManager>,
}

impl SqliteSessionRepository {
    /// Create a new repository instance
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    /// Fetch a single session by id.
    pub async fn get(&self, id: Uuid) -> DomainResult<Option<Session>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<Option<Session>> {
            let conn = db.get_connection()?;
            let result = conn.query_row(
                &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"),
                params![id.to_string()],
                map_session_row,
            );

            match result {
                Ok(session) => Ok(Some(session)),
                Err(StorageError::Rusqlite(rusqlite::Error::QueryReturnedNoRows)) => Ok(None),
                Err(err) => Err(map_storage_error(err)),
            }
        })
        .await
        .map_err(map_join_error)?
    }
}

#[async_trait]
impl SessionRepository for SqliteSessionRepository {
    async fn upsert(&self, session: &Session) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let session = session.clone();

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            upsert_session(&conn, &session).map_err(map_storage_error)?;
            debug!(session_id = %session.id, open = session.is_open(), "Session upserted");
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn open_sessions_for_user(&self, user_id: &str) -> DomainResult<Vec<Session>> {
        let db = Arc::clone(&self.db);
        let user_id = user_id.to_string();

        task::spawn_blocking(move || -> DomainResult<Vec<Session>> {
            let conn = db.get_connection()?;
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {SESSION_COLUMNS} FROM sessions
                     WHERE user_id = ?1 AND ended_at IS NULL
                     ORDER BY started_at"
                ))
                .map_err(map_storage_error)?;
            stmt.query_map(params![user_id], map_session_row).map_err(map_storage_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn delete(&self, id: Uuid) -> DomainResult<()> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            let removed = conn
                .execute("DELETE FROM sessions WHERE id = ?1", params![id.to_string()])
                .map_err(map_storage_error)?;
            debug!(session_id = %id, removed, "Session deleted");
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn sessions_for_user(
        &self,
        user_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> DomainResult<Vec<Session>> {
        let db = Arc::clone(&self.db);
        let user_id = user_id.to_string();
        let since_ms = since.map_or(i64::MIN, |ts| ts.timestamp_millis());

        task::spawn_blocking(move || -> DomainResult<Vec<Session>> {
            let conn = db.get_connection()?;
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {SESSION_COLUMNS} FROM sessions
                     WHERE user_id = ?1 AND (ended_at IS NULL OR ended_at > ?2)
                     ORDER BY started_at"
                ))
                .map_err(map_storage_error)?;
            stmt.query_map(params![user_id, since_ms], map_session_row).map_err(map_storage_error)
        })
        .await
        .map_err(map_join_error)?
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn upsert_session(conn: &SqliteConnection, session: &Session) -> Result<usize, StorageError> {
    conn.execute(
        "INSERT INTO sessions
            (id, user_id, project_name, started_at, ended_at, last_flushed_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(id) DO UPDATE SET
            user_id = excluded.user_id,
            project_name = excluded.project_name,
            started_at = excluded.started_at,
            ended_at = excluded.ended_at,
            last_flushed_at = excluded.last_flushed_at,
            updated_at = excluded.updated_at",
        params![
            session.id.to_string(),
            session.user_id,
            session.project_name,
            session.started_at.timestamp_millis(),
            session.ended_at.map(|ts| ts.timestamp_millis()),
            session.last_flushed_at.map(|ts| ts.timestamp_millis()),
            Utc::now().timestamp_millis(),
        ],
    )
}

/// Map a row to a Session
fn map_session_row(row: &Row<'_>) -> rusqlite::Result<Session> {
    let id: String = row.get(0)?;
    let id = Uuid::parse_str(&id)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?;

    Ok(Session {
        id,
        user_id: row.get(1)?,
        project_name: row.get(2)?,
        started_at: millis_to_datetime(3, row.get(3)?)?,
        ended_at: row.get::<_, Option<i64>>(4)?.map(|ms| millis_to_datetime(4, ms)).transpose()?,
        last_flushed_at: row
            .get::<_, Option<i64>>(5)?
            .map(|ms| millis_to_datetime(5, ms))
            .transpose()?,
    })
}

fn millis_to_datetime(column: usize, millis: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            column,
            Type::Integer,
            format!("timestamp out of range: {millis}").into(),
        )
    })
}

fn map_join_error(err: task::JoinError) -> ReelTimeError {
    ReelTimeError::from(InfraError::from(err))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use tempfile::TempDir;

    use super::*;

    fn setup() -> (TempDir, SqliteSessionRepository) {
        let temp_dir = TempDir::new().expect("temp dir created");
        let db = DbManager::new(temp_dir.path().join("sessions.db"), 2).expect("manager created");
        db.run_migrations().expect("migrations run");
        (temp_dir, SqliteSessionRepository::new(Arc::new(db)))
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[tokio::test]
    async fn upsert_replaces_existing_record() {
        let (_dir, repo) = setup();
        let mut session = Session::open("editor", "Alpha", at(0));
        repo.upsert(&session).await.unwrap();

        session.last_flushed_at = Some(at(30));
        repo.upsert(&session).await.unwrap();
        session.close(at(60));
        repo.upsert(&session).await.unwrap();

        let stored = repo.get(session.id).await.unwrap().unwrap();
        assert_eq!(stored, session);
        assert!(repo.open_sessions_for_user("editor").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn millisecond_precision_survives_storage() {
        let (_dir, repo) = setup();
        let start = at(0) + chrono::Duration::milliseconds(123);
        let session = Session::open("editor", "Alpha", start);
        repo.upsert(&session).await.unwrap();

        let stored = repo.get(session.id).await.unwrap().unwrap();
        assert_eq!(stored.started_at, start);
    }

    #[tokio::test]
    async fn epoch_sentinel_is_stored_as_zero() {
        let (_dir, repo) = setup();
        let mut draft = Session::open("editor", "Alpha", at(0));
        draft.started_at = Session::UNPROMOTED_START;
        repo.upsert(&draft).await.unwrap();

        let stored = repo.get(draft.id).await.unwrap().unwrap();
        assert!(stored.is_unpromoted());
    }

    #[tokio::test]
    async fn missing_session_is_none() {
        let (_dir, repo) = setup();
        assert!(repo.get(Uuid::now_v7()).await.unwrap().is_none());
        repo.delete(Uuid::now_v7()).await.unwrap();
    }
}
