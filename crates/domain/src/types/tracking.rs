//! Tracking-state types shared by the state machine, router and callers

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::session::Session;
use crate::impl_domain_status_conversions;

/// Where the session state machine currently stands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingState {
    /// No project is being attributed time
    #[default]
    NotTracking,
    /// A draft exists; no durable session yet
    GraceStart,
    /// Time is attributed to an open session
    Tracking,
    /// Focus or activity was lost; the open session keeps accumulating
    GraceEnd,
}

impl_domain_status_conversions!(TrackingState {
    NotTracking => "not_tracking",
    GraceStart => "grace_start",
    Tracking => "tracking",
    GraceEnd => "grace_end",
});

impl TrackingState {
    /// True while a durable session is open.
    pub fn has_open_session(self) -> bool {
        matches!(self, Self::Tracking | Self::GraceEnd)
    }
}

/// A fresh reading of every input the guards look at
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signals {
    pub project: Option<String>,
    pub focused: bool,
    pub active: bool,
}

impl Signals {
    pub fn new(project: Option<String>, focused: bool, active: bool) -> Self {
        Self { project, focused, active }
    }

    /// A project is open, the host has focus and the user is active.
    pub fn is_trackable(&self) -> bool {
        self.project.is_some() && self.focused && self.active
    }
}

/// Edge-triggered change reported by a monitor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "project", rename_all = "snake_case")]
pub enum MonitorEvent {
    /// `None` means the host has no project open
    ProjectChanged(Option<String>),
    FocusGained,
    FocusLost,
    UserActive,
    UserIdle,
}

/// Session lifecycle notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "session", rename_all = "snake_case")]
pub enum SessionEvent {
    Started(Session),
    /// The open session was durably checkpointed
    Checkpointed(Session),
    Ended(Session),
}

impl SessionEvent {
    pub fn session(&self) -> &Session {
        match self {
            Self::Started(session) | Self::Checkpointed(session) | Self::Ended(session) => session,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Started(_) => "started",
            Self::Checkpointed(_) => "checkpointed",
            Self::Ended(_) => "ended",
        }
    }
}

/// Read-only snapshot of the state machine published after every command
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingStatus {
    pub state: TrackingState,
    pub project: Option<String>,
    pub session: Option<Session>,
    /// Start of the current grace phase (either kind)
    pub grace_started_at: Option<DateTime<Utc>>,
}

impl TrackingStatus {
    /// Time spent in the current grace phase, if one is running.
    pub fn grace_elapsed(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.grace_started_at.map(|start| (now - start).max(Duration::zero()))
    }
}
