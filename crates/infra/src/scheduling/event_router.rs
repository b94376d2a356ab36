//! Event router: the single consumer feeding the session state machine.
//!
//! Owns the monitors' lifecycles and two tickers. Monitor events, the
//! re-evaluation tick and the flush tick are handled one at a time by a
//! single loop task that owns the [`SessionStateMachine`], so commands apply
//! in arrival order without locking.
//!
//! On stop the router stops both monitors, drains events already queued,
//! then closes the project and checkpoints once more before returning.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use reeltime_core::{GracePeriods, SessionStateMachine, SystemClock};
//! use reeltime_domain::{MonitorConfig, TrackingConfig};
//! use reeltime_infra::platform::{
//!     PollingActivityMonitor, PollingProjectMonitor, ResolveScriptProbe,
//! };
//! use reeltime_infra::scheduling::{EventRouter, EventRouterConfig};
//!
//! # async fn example() -> reeltime_domain::Result<()> {
//! let tracking = TrackingConfig::default();
//! let monitors = MonitorConfig::default();
//! let machine = SessionStateMachine::new(
//!     "local",
//!     GracePeriods::from(&tracking),
//!     Arc::new(SystemClock),
//! );
//! let probe = ResolveScriptProbe::from_config(&monitors, "resolve_bridge.py".into());
//! let mut router = EventRouter::new(
//!     machine,
//!     Arc::new(PollingProjectMonitor::new(Arc::new(probe), monitors.project_poll_interval())),
//!     Arc::new(PollingActivityMonitor::from_config(&monitors)),
//!     EventRouterConfig::from(&tracking),
//! );
//!
//! router.start().await?;
//! // ... application runs ...
//! router.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use reeltime_core::{ActivityMonitor, ProjectMonitor, SessionStateMachine};
use reeltime_domain::constants::MONITOR_EVENT_CAPACITY;
use reeltime_domain::{MonitorEvent, SessionEvent, Signals, TrackingConfig, TrackingStatus};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};

use crate::scheduling::error::{SchedulerError, SchedulerResult};

const COMPONENT: &str = "event router";

/// Configuration for the event router
#[derive(Debug, Clone)]
pub struct EventRouterConfig {
    /// Period of the guard/deadline re-check
    pub reevaluate_interval: Duration,
    /// Period of open-session checkpoints
    pub flush_interval: Duration,
    /// Capacity of the monitor event queue
    pub queue_capacity: usize,
    /// Maximum wait for the loop task on stop
    pub join_timeout: Duration,
}

impl Default for EventRouterConfig {
    fn default() -> Self {
        Self::from(&TrackingConfig::default())
    }
}

impl From<&TrackingConfig> for EventRouterConfig {
    fn from(config: &TrackingConfig) -> Self {
        Self {
            reevaluate_interval: config.reevaluate_interval(),
            flush_interval: config.flush_interval(),
            queue_capacity: MONITOR_EVENT_CAPACITY,
            join_timeout: Duration::from_secs(5),
        }
    }
}

/// Monitors whose synchronous queries feed the re-evaluation tick
///
/// The queries return each monitor's latest poll rather than running a
/// probe on the tick, so a reading is at most one poll interval old
/// (`project_poll_interval_ms`, `activity_poll_interval_ms`). Grace deadlines
/// are re-checked against those readings, never against signals the router
/// derived from earlier events.
#[derive(Clone)]
struct Monitors {
    project: Arc<dyn ProjectMonitor>,
    activity: Arc<dyn ActivityMonitor>,
}

impl Monitors {
    fn signals(&self) -> Signals {
        Signals::new(
            self.project.current_project(),
            self.project.is_focused(),
            self.activity.is_active(),
        )
    }
}

/// Routes monitor events and ticks into the session state machine
pub struct EventRouter {
    monitors: Monitors,
    config: EventRouterConfig,
    /// Present while stopped; moved into the loop task while running
    machine: Option<SessionStateMachine>,
    events: broadcast::Receiver<SessionEvent>,
    status: watch::Receiver<TrackingStatus>,
    cancellation_token: CancellationToken,
    task_handle: Option<JoinHandle<SessionStateMachine>>,
}

impl EventRouter {
    pub fn new(
        machine: SessionStateMachine,
        project_monitor: Arc<dyn ProjectMonitor>,
        activity_monitor: Arc<dyn ActivityMonitor>,
        config: EventRouterConfig,
    ) -> Self {
        let status = machine.status_receiver();
        let events = machine.subscribe();
        Self {
            monitors: Monitors { project: project_monitor, activity: activity_monitor },
            config,
            machine: Some(machine),
            events,
            status,
            cancellation_token: CancellationToken::new(),
            task_handle: None,
        }
    }

    /// Latest tracking status, updated after every routed command
    pub fn status(&self) -> watch::Receiver<TrackingStatus> {
        self.status.clone()
    }

    /// Subscribe to session lifecycle notifications
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.resubscribe()
    }

    /// Check if the routing loop is running
    pub fn is_running(&self) -> bool {
        self.task_handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Start both monitors and the routing loop.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyRunning` if the router is running, or `StartFailed` if
    /// a monitor cannot start (any monitor already started is stopped again).
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning(COMPONENT));
        }
        let Some(machine) = self.machine.take() else {
            return Err(SchedulerError::AlreadyRunning(COMPONENT));
        };

        info!("Starting event router");

        let (tx, rx) = mpsc::channel(self.config.queue_capacity);
        if let Err(e) = self.monitors.project.start(tx.clone()).await {
            self.machine = Some(machine);
            return Err(SchedulerError::StartFailed {
                component: "project monitor",
                reason: e.to_string(),
            });
        }
        if let Err(e) = self.monitors.activity.start(tx).await {
            if let Err(stop_err) = self.monitors.project.stop().await {
                warn!(error = %stop_err, "Failed to stop project monitor after start failure");
            }
            self.machine = Some(machine);
            return Err(SchedulerError::StartFailed {
                component: "activity monitor",
                reason: e.to_string(),
            });
        }

        // Create a new cancellation token (supports restart after stop)
        self.cancellation_token = CancellationToken::new();
        let cancel = self.cancellation_token.clone();
        let monitors = self.monitors.clone();
        let config = self.config.clone();

        self.task_handle = Some(tokio::spawn(async move {
            Self::route_loop(machine, rx, monitors, config, cancel).await
        }));

        info!("Event router started");
        Ok(())
    }

    /// Stop the monitors and the loop, delivering the final close and flush.
    ///
    /// Stopping a stopped router is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `Timeout` or `TaskJoinFailed` if the loop does not finish
    /// cleanly; the state machine is lost in that case.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        let Some(handle) = self.task_handle.take() else {
            debug!("Event router not running; nothing to stop");
            return Ok(());
        };

        info!("Stopping event router");

        if let Err(e) = self.monitors.project.stop().await {
            warn!(error = %e, "Failed to stop project monitor");
        }
        if let Err(e) = self.monitors.activity.stop().await {
            warn!(error = %e, "Failed to stop activity monitor");
        }

        self.cancellation_token.cancel();

        let join_timeout = self.config.join_timeout;
        let machine = tokio::time::timeout(join_timeout, handle)
            .await
            .map_err(|_| SchedulerError::Timeout { seconds: join_timeout.as_secs() })?
            .map_err(|e| SchedulerError::TaskJoinFailed(e.to_string()))?;
        self.machine = Some(machine);

        info!("Event router stopped");
        Ok(())
    }

    /// Background routing loop; returns the machine for a later restart.
    async fn route_loop(
        mut machine: SessionStateMachine,
        mut events: mpsc::Receiver<MonitorEvent>,
        monitors: Monitors,
        config: EventRouterConfig,
        cancel: CancellationToken,
    ) -> SessionStateMachine {
        let mut reevaluate = tokio::time::interval(config.reevaluate_interval);
        reevaluate.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut flush = tokio::time::interval_at(
            Instant::now() + config.flush_interval,
            config.flush_interval,
        );
        flush.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Routing loop cancelled");
                    break;
                }
                Some(event) = events.recv() => dispatch(&mut machine, event),
                _ = reevaluate.tick() => {
                    let signals = monitors.signals();
                    trace!(?signals, "Re-evaluating");
                    machine.reevaluate(signals);
                }
                _ = flush.tick() => machine.flush(),
            }
        }

        while let Ok(event) = events.try_recv() {
            dispatch(&mut machine, event);
        }

        machine.project_changed(None);
        machine.flush();
        info!(state = %machine.state(), "Routing loop finished");
        machine
    }
}

/// Translate one monitor event into exactly one state-machine command.
fn dispatch(machine: &mut SessionStateMachine, event: MonitorEvent) {
    trace!(?event, "Routing monitor event");
    match event {
        MonitorEvent::ProjectChanged(project) => machine.project_changed(project),
        MonitorEvent::FocusGained => machine.focus_gained(),
        MonitorEvent::FocusLost => machine.focus_lost(),
        MonitorEvent::UserActive => machine.user_active(),
        MonitorEvent::UserIdle => machine.user_idle(),
    }
}
