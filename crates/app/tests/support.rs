#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use reeltime_common::testing::TempDir;
use reeltime_core::{ActivityMonitor, ProjectMonitor};
use reeltime_domain::{Config, DatabaseConfig, MonitorEvent, Result, SessionEvent, TrackingConfig};
use tokio::sync::{broadcast, mpsc};

/// Configuration pointing at a database inside `temp_dir`, with grace
/// periods short enough for real-time tests.
pub fn test_config(temp_dir: &TempDir) -> Config {
    Config {
        database: DatabaseConfig {
            path: temp_dir.path().join("reeltime.db").to_string_lossy().into_owned(),
            pool_size: 2,
        },
        tracking: TrackingConfig {
            user_id: "editor".to_string(),
            grace_start_secs: 0,
            grace_end_secs: 1,
            reevaluate_interval_ms: 20,
            flush_interval_secs: 1,
        },
        ..Config::default()
    }
}

/// Project and activity monitor in one, scripted by the test.
#[derive(Default)]
pub struct ScriptedHost {
    project: Mutex<Option<String>>,
    focused: AtomicBool,
    active: AtomicBool,
    sender: Mutex<Option<mpsc::Sender<MonitorEvent>>>,
}

impl ScriptedHost {
    /// Open `project`, focused, with an active user.
    pub async fn open(&self, project: &str) {
        *self.project.lock() = Some(project.to_string());
        self.focused.store(true, Ordering::SeqCst);
        self.active.store(true, Ordering::SeqCst);
        self.send(MonitorEvent::ProjectChanged(Some(project.to_string()))).await;
        self.send(MonitorEvent::FocusGained).await;
        self.send(MonitorEvent::UserActive).await;
    }

    /// Close the project and go idle without emitting events.
    pub fn reset(&self) {
        self.project.lock().take();
        self.focused.store(false, Ordering::SeqCst);
        self.active.store(false, Ordering::SeqCst);
    }

    async fn send(&self, event: MonitorEvent) {
        let sender = self.sender.lock().clone();
        if let Some(sender) = sender {
            sender.send(event).await.expect("router should be receiving");
        }
    }
}

/// Both monitor traits hand out the same script.
pub struct HostProject(pub std::sync::Arc<ScriptedHost>);
pub struct HostActivity(pub std::sync::Arc<ScriptedHost>);

#[async_trait]
impl ProjectMonitor for HostProject {
    async fn start(&self, events: mpsc::Sender<MonitorEvent>) -> Result<()> {
        *self.0.sender.lock() = Some(events);
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.0.sender.lock().take();
        Ok(())
    }

    fn current_project(&self) -> Option<String> {
        self.0.project.lock().clone()
    }

    fn is_focused(&self) -> bool {
        self.0.focused.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ActivityMonitor for HostActivity {
    async fn start(&self, _events: mpsc::Sender<MonitorEvent>) -> Result<()> {
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.0.active.load(Ordering::SeqCst)
    }
}

/// Next Started notification, skipping everything else.
pub async fn wait_for_start(events: &mut broadcast::Receiver<SessionEvent>) -> SessionEvent {
    loop {
        let event = tokio::time::timeout(Duration::from_secs(3), events.recv())
            .await
            .expect("session should start in time")
            .expect("session event channel should be open");
        if matches!(event, SessionEvent::Started(_)) {
            return event;
        }
    }
}
