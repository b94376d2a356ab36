//! Polling project monitor
//!
//! Reads a [`ProjectProbe`] on a fixed interval, keeps the latest reading
//! for the synchronous queries and emits [`MonitorEvent`]s only when a value
//! changes. The baseline before the first poll is "no project, unfocused",
//! so the first real reading produces the edges needed to start tracking.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use reeltime_core::ProjectMonitor;
use reeltime_domain::{MonitorEvent, Result as DomainResult};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::polling::Poller;

/// One observation of the host application
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectReading {
    pub project: Option<String>,
    pub focused: bool,
}

/// Source of project readings. Failures must be reported as
/// `ProjectReading::default()`.
#[async_trait]
pub trait ProjectProbe: Send + Sync {
    async fn read(&self) -> ProjectReading;
}

/// Edge events between two readings: project first, then focus.
pub fn project_edges(previous: &ProjectReading, next: &ProjectReading) -> Vec<MonitorEvent> {
    let mut events = Vec::new();
    if previous.project != next.project {
        events.push(MonitorEvent::ProjectChanged(next.project.clone()));
    }
    match (previous.focused, next.focused) {
        (false, true) => events.push(MonitorEvent::FocusGained),
        (true, false) => events.push(MonitorEvent::FocusLost),
        _ => {}
    }
    events
}

/// `ProjectMonitor` driven by a polled probe
pub struct PollingProjectMonitor {
    probe: Arc<dyn ProjectProbe>,
    interval: Duration,
    latest: Arc<RwLock<ProjectReading>>,
    poller: Poller,
}

impl PollingProjectMonitor {
    pub fn new(probe: Arc<dyn ProjectProbe>, interval: Duration) -> Self {
        Self {
            probe,
            interval,
            latest: Arc::new(RwLock::new(ProjectReading::default())),
            poller: Poller::new("project monitor"),
        }
    }

    pub fn is_running(&self) -> bool {
        self.poller.is_running()
    }

    async fn poll_loop(
        probe: Arc<dyn ProjectProbe>,
        latest: Arc<RwLock<ProjectReading>>,
        interval: Duration,
        events: mpsc::Sender<MonitorEvent>,
        cancel: CancellationToken,
    ) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Project poll loop cancelled");
                    break;
                }
                _ = ticker.tick() => {
                    let reading = tokio::select! {
                        _ = cancel.cancelled() => break,
                        reading = probe.read() => reading,
                    };
                    let previous = std::mem::replace(&mut *latest.write(), reading.clone());
                    trace!(project = ?reading.project, focused = reading.focused, "Project polled");

                    for event in project_edges(&previous, &reading) {
                        if events.send(event).await.is_err() {
                            debug!("Event receiver dropped; stopping project poll loop");
                            return;
                        }
                    }
                }
            }
        }
    }
}

#[async_trait]
impl ProjectMonitor for PollingProjectMonitor {
    async fn start(&self, events: mpsc::Sender<MonitorEvent>) -> DomainResult<()> {
        *self.latest.write() = ProjectReading::default();
        let probe = Arc::clone(&self.probe);
        let latest = Arc::clone(&self.latest);
        let interval = self.interval;
        self.poller
            .spawn(move |cancel| Self::poll_loop(probe, latest, interval, events, cancel))
    }

    async fn stop(&self) -> DomainResult<()> {
        self.poller.stop().await
    }

    fn current_project(&self) -> Option<String> {
        self.latest.read().project.clone()
    }

    fn is_focused(&self) -> bool {
        self.latest.read().focused
    }
}
