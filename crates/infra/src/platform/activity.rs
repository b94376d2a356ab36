//! User activity detection
//!
//! An idle helper (e.g. `xprintidle`) prints the time since the last input
//! in milliseconds; the user is active while that stays under the idle
//! threshold. Unreadable output or a failed helper reads as inactive. Without
//! a helper, activity detection is off and the user always counts as active.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use reeltime_core::ActivityMonitor;
use reeltime_domain::{MonitorConfig, MonitorEvent, Result as DomainResult};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::polling::Poller;
use super::process::run_probe;

/// Source of activity readings
#[async_trait]
pub trait ActivityProbe: Send + Sync {
    /// `true` when the user is providing input; unknown is `false`
    async fn is_active(&self) -> bool;
}

/// Used when no idle helper is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysActive;

#[async_trait]
impl ActivityProbe for AlwaysActive {
    async fn is_active(&self) -> bool {
        true
    }
}

/// Runs an idle helper and compares its answer with a threshold
pub struct IdleCommandProbe {
    argv: Vec<String>,
    threshold: Duration,
    timeout: Duration,
}

impl IdleCommandProbe {
    pub fn new(argv: Vec<String>, threshold: Duration, timeout: Duration) -> Self {
        Self { argv, threshold, timeout }
    }

    async fn idle_time(&self) -> Option<Duration> {
        let output = match run_probe(self.argv.clone(), self.timeout).await {
            Ok(output) if output.success() => output,
            Ok(output) => {
                warn!(code = ?output.code, "Idle probe failed");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Idle probe did not run");
                return None;
            }
        };

        let idle = parse_idle_millis(&output.stdout);
        if idle.is_none() {
            warn!(stdout = %output.stdout, "Idle probe printed an unreadable value");
        }
        idle
    }
}

#[async_trait]
impl ActivityProbe for IdleCommandProbe {
    async fn is_active(&self) -> bool {
        self.idle_time().await.is_some_and(|idle| idle < self.threshold)
    }
}

/// Build the probe described by `config`.
pub fn activity_probe_from_config(config: &MonitorConfig) -> Arc<dyn ActivityProbe> {
    match &config.idle_command {
        Some(argv) => Arc::new(IdleCommandProbe::new(
            argv.clone(),
            config.idle_threshold(),
            config.probe_timeout(),
        )),
        None => {
            debug!("No idle command configured; activity detection disabled");
            Arc::new(AlwaysActive)
        }
    }
}

fn parse_idle_millis(stdout: &str) -> Option<Duration> {
    stdout.lines().next()?.trim().parse::<u64>().ok().map(Duration::from_millis)
}

/// `ActivityMonitor` driven by a polled probe. Baseline is inactive.
pub struct PollingActivityMonitor {
    probe: Arc<dyn ActivityProbe>,
    interval: Duration,
    active: Arc<RwLock<bool>>,
    poller: Poller,
}

impl PollingActivityMonitor {
    pub fn new(probe: Arc<dyn ActivityProbe>, interval: Duration) -> Self {
        Self {
            probe,
            interval,
            active: Arc::new(RwLock::new(false)),
            poller: Poller::new("activity monitor"),
        }
    }

    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(activity_probe_from_config(config), config.activity_poll_interval())
    }

    async fn poll_loop(
        probe: Arc<dyn ActivityProbe>,
        active: Arc<RwLock<bool>>,
        interval: Duration,
        events: mpsc::Sender<MonitorEvent>,
        cancel: CancellationToken,
    ) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Activity poll loop cancelled");
                    break;
                }
                _ = ticker.tick() => {
                    let now_active = tokio::select! {
                        _ = cancel.cancelled() => break,
                        value = probe.is_active() => value,
                    };
                    let was_active = std::mem::replace(&mut *active.write(), now_active);
                    trace!(active = now_active, "Activity polled");

                    if was_active == now_active {
                        continue;
                    }
                    let event =
                        if now_active { MonitorEvent::UserActive } else { MonitorEvent::UserIdle };
                    if events.send(event).await.is_err() {
                        debug!("Event receiver dropped; stopping activity poll loop");
                        return;
                    }
                }
            }
        }
    }
}

#[async_trait]
impl ActivityMonitor for PollingActivityMonitor {
    async fn start(&self, events: mpsc::Sender<MonitorEvent>) -> DomainResult<()> {
        *self.active.write() = false;
        let probe = Arc::clone(&self.probe);
        let active = Arc::clone(&self.active);
        let interval = self.interval;
        self.poller.spawn(move |cancel| Self::poll_loop(probe, active, interval, events, cancel))
    }

    async fn stop(&self) -> DomainResult<()> {
        self.poller.stop().await
    }

    fn is_active(&self) -> bool {
        *self.active.read()
    }
}
