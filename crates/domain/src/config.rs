//! Configuration management

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEBUG_GRACE_END_SECS, DEBUG_GRACE_START_SECS, DEFAULT_ACTIVITY_POLL_INTERVAL_MS,
    DEFAULT_DB_PATH, DEFAULT_DB_POOL_SIZE, DEFAULT_FLUSH_INTERVAL_SECS, DEFAULT_GRACE_END_SECS,
    DEFAULT_GRACE_START_SECS, DEFAULT_IDLE_THRESHOLD_SECS, DEFAULT_PROBE_TIMEOUT_MS,
    DEFAULT_PROJECT_POLL_INTERVAL_MS, DEFAULT_REEVALUATE_INTERVAL_MS, DEFAULT_USER_ID,
};
use crate::errors::{ReelTimeError, Result};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub tracking: TrackingConfig,
    pub monitors: MonitorConfig,
    pub logging: LoggingConfig,
}

/// Database configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub pool_size: u32,
}

/// Session tracking configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Owner of every session recorded by this process
    pub user_id: String,
    pub grace_start_secs: u64,
    pub grace_end_secs: u64,
    pub reevaluate_interval_ms: u64,
    pub flush_interval_secs: u64,
}

/// Project and activity monitor configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub project_poll_interval_ms: u64,
    pub activity_poll_interval_ms: u64,
    pub idle_threshold_secs: u64,
    pub probe_timeout_ms: u64,
    /// Interpreter used to run the Resolve bridge script
    pub python: String,
    /// Bridge script printing the current project name
    pub resolve_script: Option<PathBuf>,
    /// Command whose exit status reports host focus (0 = focused)
    pub focus_command: Option<Vec<String>>,
    /// Command printing the user's idle time in milliseconds
    pub idle_command: Option<Vec<String>>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: DEFAULT_DB_PATH.to_string(), pool_size: DEFAULT_DB_POOL_SIZE }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            user_id: DEFAULT_USER_ID.to_string(),
            grace_start_secs: DEFAULT_GRACE_START_SECS,
            grace_end_secs: DEFAULT_GRACE_END_SECS,
            reevaluate_interval_ms: DEFAULT_REEVALUATE_INTERVAL_MS,
            flush_interval_secs: DEFAULT_FLUSH_INTERVAL_SECS,
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            project_poll_interval_ms: DEFAULT_PROJECT_POLL_INTERVAL_MS,
            activity_poll_interval_ms: DEFAULT_ACTIVITY_POLL_INTERVAL_MS,
            idle_threshold_secs: DEFAULT_IDLE_THRESHOLD_SECS,
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            python: default_python().to_string(),
            resolve_script: None,
            focus_command: None,
            idle_command: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}

fn default_python() -> &'static str {
    if cfg!(windows) {
        "python"
    } else {
        "python3"
    }
}

impl Config {
    /// Configuration with short grace periods for manual testing.
    pub fn debug() -> Self {
        Self {
            tracking: TrackingConfig {
                grace_start_secs: DEBUG_GRACE_START_SECS,
                grace_end_secs: DEBUG_GRACE_END_SECS,
                ..TrackingConfig::default()
            },
            logging: LoggingConfig { level: "debug".to_string(), json: false },
            ..Self::default()
        }
    }

    /// Reject values the runtime cannot operate with.
    ///
    /// # Errors
    /// Returns `ReelTimeError::Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.database.path.trim().is_empty() {
            return Err(ReelTimeError::Config("database.path must not be empty".into()));
        }
        if self.database.pool_size == 0 {
            return Err(ReelTimeError::Config("database.pool_size must be > 0".into()));
        }
        if self.tracking.user_id.trim().is_empty() {
            return Err(ReelTimeError::Config("tracking.user_id must not be empty".into()));
        }

        let intervals = [
            ("tracking.reevaluate_interval_ms", self.tracking.reevaluate_interval_ms),
            ("tracking.flush_interval_secs", self.tracking.flush_interval_secs),
            ("monitors.project_poll_interval_ms", self.monitors.project_poll_interval_ms),
            ("monitors.activity_poll_interval_ms", self.monitors.activity_poll_interval_ms),
            ("monitors.probe_timeout_ms", self.monitors.probe_timeout_ms),
        ];
        if let Some((name, _)) = intervals.iter().find(|(_, value)| *value == 0) {
            return Err(ReelTimeError::Config(format!("{name} must be > 0")));
        }

        for (name, command) in [
            ("monitors.focus_command", &self.monitors.focus_command),
            ("monitors.idle_command", &self.monitors.idle_command),
        ] {
            if command.as_ref().is_some_and(|argv| argv.is_empty()) {
                return Err(ReelTimeError::Config(format!("{name} must name a program")));
            }
        }

        Ok(())
    }
}

impl TrackingConfig {
    pub fn grace_start(&self) -> Duration {
        Duration::from_secs(self.grace_start_secs)
    }

    pub fn grace_end(&self) -> Duration {
        Duration::from_secs(self.grace_end_secs)
    }

    pub fn reevaluate_interval(&self) -> Duration {
        Duration::from_millis(self.reevaluate_interval_ms)
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs)
    }
}

impl MonitorConfig {
    pub fn project_poll_interval(&self) -> Duration {
        Duration::from_millis(self.project_poll_interval_ms)
    }

    pub fn activity_poll_interval(&self) -> Duration {
        Duration::from_millis(self.activity_poll_interval_ms)
    }

    pub fn idle_threshold(&self) -> Duration {
        Duration::from_secs(self.idle_threshold_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}
