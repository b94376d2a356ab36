//! Session state machine
//!
//! Turns monitor signals into sessions. Four states:
//!
//! - `NotTracking`: nothing is attributed
//! - `GraceStart`: a draft waits out the grace-start period; any interruption
//!   discards it without a trace
//! - `Tracking`: an open session accumulates time
//! - `GraceEnd`: focus or activity was lost; the session stays open until the
//!   grace-end period elapses or the user comes back
//!
//! The machine is owned by a single task and every command is synchronous.
//! Lifecycle changes go out on a broadcast channel as [`SessionEvent`]s and a
//! [`TrackingStatus`] snapshot is published on a watch channel after every
//! command.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reeltime_domain::constants::SESSION_EVENT_CAPACITY;
use reeltime_domain::{
    Session, SessionDraft, SessionEvent, Signals, TrackingConfig, TrackingState, TrackingStatus,
};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use super::ports::Clock;

/// Grace-period lengths
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GracePeriods {
    /// Uninterrupted time before a draft becomes a session
    pub grace_start: Duration,
    /// Break tolerated before an open session ends
    pub grace_end: Duration,
}

impl GracePeriods {
    /// Grace periods from explicit lengths.
    pub fn new(grace_start: Duration, grace_end: Duration) -> Self {
        Self { grace_start, grace_end }
    }
}

impl From<&TrackingConfig> for GracePeriods {
    fn from(config: &TrackingConfig) -> Self {
        Self::new(config.grace_start(), config.grace_end())
    }
}

/// Single-writer session state machine
pub struct SessionStateMachine {
    user_id: String,
    grace: GracePeriods,
    clock: Arc<dyn Clock>,
    state: TrackingState,
    signals: Signals,
    draft: Option<SessionDraft>,
    session: Option<Session>,
    grace_end_started_at: Option<DateTime<Utc>>,
    events: broadcast::Sender<SessionEvent>,
    status: watch::Sender<TrackingStatus>,
}

impl SessionStateMachine {
    /// Create a machine in `NotTracking` with no project, unfocused and
    /// inactive.
    pub fn new(user_id: impl Into<String>, grace: GracePeriods, clock: Arc<dyn Clock>) -> Self {
        let (events, _) = broadcast::channel(SESSION_EVENT_CAPACITY);
        let (status, _) = watch::channel(TrackingStatus::default());

        Self {
            user_id: user_id.into(),
            grace,
            clock,
            state: TrackingState::NotTracking,
            signals: Signals::default(),
            draft: None,
            session: None,
            grace_end_started_at: None,
            events,
            status,
        }
    }

    /// Receive lifecycle notifications emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Handle on the status snapshot; readers never contend with commands.
    pub fn status_receiver(&self) -> watch::Receiver<TrackingStatus> {
        self.status.subscribe()
    }

    /// Current tracking state
    pub fn state(&self) -> TrackingState {
        self.state
    }

    /// Project the machine is attributing (or about to attribute) time to
    pub fn current_project(&self) -> Option<&str> {
        match self.state {
            TrackingState::NotTracking => None,
            TrackingState::GraceStart => self.draft.as_ref().map(|d| d.project_name.as_str()),
            TrackingState::Tracking | TrackingState::GraceEnd => {
                self.session.as_ref().map(|s| s.project_name.as_str())
            }
        }
    }

    /// Open session, present in `Tracking` and `GraceEnd`
    pub fn current_session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Time spent in the running grace phase, `None` outside grace states.
    pub fn grace_elapsed(&self) -> Option<chrono::Duration> {
        let now = self.clock.now();
        self.grace_started_at().map(|start| (now - start).max(chrono::Duration::zero()))
    }

    /// The host application switched to `project`, or closed its project.
    pub fn project_changed(&mut self, project: Option<String>) {
        let project = project.filter(|name| !name.trim().is_empty());
        self.apply_project(project, "project_changed");
        self.publish_status();
    }

    pub fn focus_gained(&mut self) {
        self.signals.focused = true;
        self.on_signal_restored("focus_gained");
        self.publish_status();
    }

    pub fn focus_lost(&mut self) {
        self.signals.focused = false;
        self.on_signal_lost("focus_lost");
        self.publish_status();
    }

    pub fn user_active(&mut self) {
        self.signals.active = true;
        self.on_signal_restored("user_active");
        self.publish_status();
    }

    pub fn user_idle(&mut self) {
        self.signals.active = false;
        self.on_signal_lost("user_idle");
        self.publish_status();
    }

    /// Re-check grace deadlines and guards against fresh readings.
    ///
    /// Replaces the cached signals with `signals` in every state, so a missed
    /// edge event is corrected on the next tick.
    pub fn reevaluate(&mut self, signals: Signals) {
        let Signals { project, focused, active } = signals;
        self.signals.focused = focused;
        self.signals.active = active;

        let project = project.filter(|name| !name.trim().is_empty());
        if project != self.signals.project {
            self.apply_project(project, "reevaluate");
        }

        let now = self.clock.now();
        match self.state {
            TrackingState::NotTracking => {
                if self.signals.is_trackable() {
                    self.begin_grace_start(now);
                }
            }
            TrackingState::GraceStart => {
                let elapsed = self.elapsed_since(self.grace_started_at(), now);
                match (elapsed >= self.grace.grace_start, self.signals.is_trackable()) {
                    (true, true) => self.promote_draft(),
                    (true, false) => self.discard_draft("guard failed at grace-start deadline"),
                    (false, false) => self.discard_draft("guard failed during grace start"),
                    (false, true) => {}
                }
            }
            TrackingState::Tracking => {
                if !self.signals.is_trackable() {
                    self.enter_grace_end(now, "reevaluate");
                }
            }
            TrackingState::GraceEnd => {
                if self.elapsed_since(self.grace_end_started_at, now) >= self.grace.grace_end {
                    self.end_session(now);
                } else if self.signals.is_trackable() {
                    self.resume(now);
                }
            }
        }

        self.publish_status();
    }

    /// Checkpoint the open session.
    ///
    /// Stamps `last_flushed_at` and emits [`SessionEvent::Checkpointed`] so
    /// crash recovery can close the session at this instant.
    pub fn flush(&mut self) {
        let now = self.clock.now();
        let Some(session) = self.session.as_mut() else {
            debug!(state = %self.state, "Nothing to flush");
            return;
        };

        session.last_flushed_at = Some(now);
        let session = session.clone();
        debug!(session_id = %session.id, "Session checkpointed");
        self.emit(SessionEvent::Checkpointed(session));
        self.publish_status();
    }

    /// Read-only snapshot of the machine
    pub fn status(&self) -> TrackingStatus {
        TrackingStatus {
            state: self.state,
            project: self.current_project().map(str::to_owned),
            session: self.session.clone(),
            grace_started_at: self.grace_started_at(),
        }
    }

    fn apply_project(&mut self, project: Option<String>, event: &'static str) {
        if project == self.signals.project {
            // Re-opening the tracked project during grace end brings it back.
            if self.state == TrackingState::GraceEnd && project.is_some() {
                self.try_resume(event);
            } else {
                debug!(state = %self.state, event, "Project unchanged");
            }
            return;
        }

        self.signals.project = project;
        let now = self.clock.now();

        match self.state {
            TrackingState::NotTracking => self.try_begin_grace_start(now, event),
            TrackingState::GraceStart => {
                self.discard_draft("project changed");
                self.try_begin_grace_start(now, event);
            }
            TrackingState::Tracking | TrackingState::GraceEnd => {
                let tracked = self.session.as_ref().map(|s| s.project_name.clone());
                match self.signals.project.clone() {
                    None if self.state == TrackingState::Tracking => {
                        self.enter_grace_end(now, "project closed");
                    }
                    None => debug!(event, "Project closed during grace end"),
                    Some(name) if tracked.as_deref() == Some(name.as_str()) => {
                        self.try_resume(event);
                    }
                    Some(_) => {
                        self.end_session(now);
                        self.try_begin_grace_start(now, event);
                    }
                }
            }
        }
    }

    fn on_signal_restored(&mut self, event: &'static str) {
        match self.state {
            TrackingState::NotTracking => {
                let now = self.clock.now();
                self.try_begin_grace_start(now, event);
            }
            TrackingState::GraceEnd => self.try_resume(event),
            TrackingState::GraceStart | TrackingState::Tracking => self.ignore(event),
        }
    }

    fn on_signal_lost(&mut self, event: &'static str) {
        match self.state {
            TrackingState::GraceStart => self.discard_draft(event),
            TrackingState::Tracking => {
                let now = self.clock.now();
                self.enter_grace_end(now, event);
            }
            TrackingState::NotTracking | TrackingState::GraceEnd => self.ignore(event),
        }
    }

    fn try_begin_grace_start(&mut self, now: DateTime<Utc>, event: &'static str) {
        if self.signals.is_trackable() {
            self.begin_grace_start(now);
        } else {
            debug!(
                event,
                project = ?self.signals.project,
                focused = self.signals.focused,
                active = self.signals.active,
                "Guard not met; staying idle"
            );
        }
    }

    fn begin_grace_start(&mut self, now: DateTime<Utc>) {
        let Some(project) = self.signals.project.clone() else {
            return;
        };
        info!(project = %project, "Grace start");
        self.draft = Some(SessionDraft::new(project, now));
        self.state = TrackingState::GraceStart;
    }

    fn discard_draft(&mut self, reason: &str) {
        if let Some(draft) = self.draft.take() {
            info!(project = %draft.project_name, reason, "Draft discarded");
        }
        self.state = TrackingState::NotTracking;
    }

    fn promote_draft(&mut self) {
        let Some(draft) = self.draft.take() else {
            warn!("Grace start without a draft; resetting");
            self.state = TrackingState::NotTracking;
            return;
        };

        let session = draft.promote(self.user_id.clone());
        info!(
            session_id = %session.id,
            project = %session.project_name,
            started_at = %session.started_at,
            "Session started"
        );
        self.session = Some(session.clone());
        self.state = TrackingState::Tracking;
        self.emit(SessionEvent::Started(session));
    }

    fn enter_grace_end(&mut self, now: DateTime<Utc>, reason: &str) {
        info!(reason, "Grace end");
        self.grace_end_started_at = Some(now);
        self.state = TrackingState::GraceEnd;
    }

    fn try_resume(&mut self, event: &'static str) {
        if self.signals.is_trackable() {
            self.resume(self.clock.now());
        } else {
            debug!(event, "Still in grace end; guard not met");
        }
    }

    fn resume(&mut self, now: DateTime<Utc>) {
        let paused = self.elapsed_since(self.grace_end_started_at, now);
        info!(paused_ms = paused.as_millis() as u64, "Tracking resumed");
        self.grace_end_started_at = None;
        self.state = TrackingState::Tracking;
    }

    fn end_session(&mut self, now: DateTime<Utc>) {
        self.grace_end_started_at = None;
        self.state = TrackingState::NotTracking;

        let Some(mut session) = self.session.take() else {
            return;
        };
        session.close(now);
        info!(
            session_id = %session.id,
            project = %session.project_name,
            duration_secs = session.duration(now).num_seconds(),
            "Session ended"
        );
        self.emit(SessionEvent::Ended(session));
    }

    fn ignore(&self, event: &'static str) {
        warn!(state = %self.state, event, "No transition for event; ignored");
    }

    fn emit(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            debug!("No session event subscribers");
        }
    }

    fn publish_status(&self) {
        self.status.send_replace(self.status());
    }

    fn grace_started_at(&self) -> Option<DateTime<Utc>> {
        match self.state {
            TrackingState::GraceStart => self.draft.as_ref().map(|d| d.started_at),
            TrackingState::GraceEnd => self.grace_end_started_at,
            TrackingState::NotTracking | TrackingState::Tracking => None,
        }
    }

    fn elapsed_since(&self, start: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Duration {
        start.and_then(|start| (now - start).to_std().ok()).unwrap_or(Duration::ZERO)
    }
}
