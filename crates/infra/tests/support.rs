#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use reeltime_common::testing::TempDir;
use reeltime_core::{ActivityMonitor, Clock, ProjectMonitor};
use reeltime_domain::{MonitorEvent, ReelTimeError, Result as DomainResult, SessionEvent};
use reeltime_infra::database::DbManager;
use tokio::sync::{broadcast, mpsc};

/// Temporary database wrapper that keeps the underlying file alive for the
/// duration of a test run.
pub struct TestDatabase {
    pub manager: Arc<DbManager>,
    _temp_dir: TempDir,
}

impl TestDatabase {
    /// Create a new temporary database with the schema applied.
    pub fn new() -> Self {
        let temp_dir = TempDir::new("infra-test").expect("temp dir should be created");
        let db_path = temp_dir.path().join("reeltime.db");

        let manager = DbManager::new(&db_path, 4).expect("db manager should be created");
        manager.run_migrations().expect("schema migrations should apply");

        Self { manager: Arc::new(manager), _temp_dir: temp_dir }
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

/// Clock pinned to a settable instant
#[derive(Debug, Clone)]
pub struct FixedClock(Arc<Mutex<DateTime<Utc>>>);

impl FixedClock {
    pub fn at(secs: i64) -> Self {
        Self(Arc::new(Mutex::new(instant(secs))))
    }

    pub fn set(&self, secs: i64) {
        *self.0.lock() = instant(secs);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock()
    }
}

/// `secs` seconds after 2024-05-01 09:00 UTC
pub fn instant(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap() + chrono::Duration::seconds(secs)
}

/// Project monitor driven by the test instead of a probe.
#[derive(Default)]
pub struct ScriptedProjectMonitor {
    project: Mutex<Option<String>>,
    focused: AtomicBool,
    sender: Mutex<Option<mpsc::Sender<MonitorEvent>>>,
    pub stops: AtomicUsize,
}

impl ScriptedProjectMonitor {
    /// Open `project` with the host focused.
    pub async fn open(&self, project: &str) {
        *self.project.lock() = Some(project.to_string());
        self.focused.store(true, Ordering::SeqCst);
        self.send(MonitorEvent::ProjectChanged(Some(project.to_string()))).await;
        self.send(MonitorEvent::FocusGained).await;
    }

    pub async fn lose_focus(&self) {
        self.focused.store(false, Ordering::SeqCst);
        self.send(MonitorEvent::FocusLost).await;
    }

    pub async fn gain_focus(&self) {
        self.focused.store(true, Ordering::SeqCst);
        self.send(MonitorEvent::FocusGained).await;
    }

    /// Change the queried reading without emitting an edge event.
    pub fn set_quietly(&self, project: Option<&str>, focused: bool) {
        *self.project.lock() = project.map(str::to_owned);
        self.focused.store(focused, Ordering::SeqCst);
    }

    async fn send(&self, event: MonitorEvent) {
        let sender = self.sender.lock().clone();
        if let Some(sender) = sender {
            sender.send(event).await.expect("router should be receiving");
        }
    }
}

#[async_trait]
impl ProjectMonitor for ScriptedProjectMonitor {
    async fn start(&self, events: mpsc::Sender<MonitorEvent>) -> DomainResult<()> {
        *self.sender.lock() = Some(events);
        Ok(())
    }

    async fn stop(&self) -> DomainResult<()> {
        self.sender.lock().take();
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn current_project(&self) -> Option<String> {
        self.project.lock().clone()
    }

    fn is_focused(&self) -> bool {
        self.focused.load(Ordering::SeqCst)
    }
}

/// Activity monitor driven by the test; optionally refuses to start.
#[derive(Default)]
pub struct ScriptedActivityMonitor {
    active: AtomicBool,
    fail_start: bool,
    sender: Mutex<Option<mpsc::Sender<MonitorEvent>>>,
}

impl ScriptedActivityMonitor {
    pub fn failing() -> Self {
        Self { fail_start: true, ..Self::default() }
    }

    /// Change the queried reading without emitting an edge event.
    pub fn set_active_quietly(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }

    pub async fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
        let event = if active { MonitorEvent::UserActive } else { MonitorEvent::UserIdle };
        let sender = self.sender.lock().clone();
        if let Some(sender) = sender {
            sender.send(event).await.expect("router should be receiving");
        }
    }
}

#[async_trait]
impl ActivityMonitor for ScriptedActivityMonitor {
    async fn start(&self, events: mpsc::Sender<MonitorEvent>) -> DomainResult<()> {
        if self.fail_start {
            return Err(ReelTimeError::Platform("idle helper missing".into()));
        }
        *self.sender.lock() = Some(events);
        Ok(())
    }

    async fn stop(&self) -> DomainResult<()> {
        self.sender.lock().take();
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

/// Next Started or Ended notification, skipping checkpoints.
pub async fn next_lifecycle_event(events: &mut broadcast::Receiver<SessionEvent>) -> SessionEvent {
    loop {
        let event = tokio::time::timeout(Duration::from_secs(3), events.recv())
            .await
            .expect("lifecycle event should arrive in time")
            .expect("session event channel should be open");
        if !matches!(event, SessionEvent::Checkpointed(_)) {
            return event;
        }
    }
}
