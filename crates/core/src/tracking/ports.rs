//! Port interfaces for session tracking
//!
//! These traits define the boundaries between core business logic
//! and infrastructure implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reeltime_domain::{MonitorEvent, Result, Session};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Source of wall-clock time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Real system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Durable session storage
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Insert the session or replace the stored record with the same id
    async fn upsert(&self, session: &Session) -> Result<()>;

    /// Sessions of `user_id` with no end timestamp
    async fn open_sessions_for_user(&self, user_id: &str) -> Result<Vec<Session>>;

    /// Delete a session by id; deleting a missing id is not an error
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Sessions of `user_id` that are open or ended after `since`
    /// (all sessions when `since` is `None`), oldest first
    async fn sessions_for_user(
        &self,
        user_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Session>>;
}

/// Watches which project the host application has open and whether it has
/// input focus.
///
/// Implementations emit [`MonitorEvent::ProjectChanged`],
/// [`MonitorEvent::FocusGained`] and [`MonitorEvent::FocusLost`] on edges
/// only.
#[async_trait]
pub trait ProjectMonitor: Send + Sync {
    async fn start(&self, events: mpsc::Sender<MonitorEvent>) -> Result<()>;

    /// Stop polling; stopping a stopped monitor is a no-op
    async fn stop(&self) -> Result<()>;

    /// Latest known project; `None` when no project is open or unknown
    fn current_project(&self) -> Option<String>;

    /// Latest known focus; unknown reads as not focused
    fn is_focused(&self) -> bool;
}

/// Watches whether the user is providing input.
///
/// Implementations emit [`MonitorEvent::UserActive`] and
/// [`MonitorEvent::UserIdle`] on edges only.
#[async_trait]
pub trait ActivityMonitor: Send + Sync {
    async fn start(&self, events: mpsc::Sender<MonitorEvent>) -> Result<()>;

    /// Stop polling; stopping a stopped monitor is a no-op
    async fn stop(&self) -> Result<()>;

    /// Latest known activity; unknown reads as inactive
    fn is_active(&self) -> bool;
}
