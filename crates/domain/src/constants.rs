//! Application constants
//!
//! Centralized location for domain-level constants used throughout the
//! application.

// Grace periods (production)
pub const DEFAULT_GRACE_START_SECS: u64 = 60;
pub const DEFAULT_GRACE_END_SECS: u64 = 300;

// Grace periods (debug builds / manual testing)
pub const DEBUG_GRACE_START_SECS: u64 = 5;
pub const DEBUG_GRACE_END_SECS: u64 = 10;

// Scheduling
pub const DEFAULT_REEVALUATE_INTERVAL_MS: u64 = 1_000;
pub const DEFAULT_FLUSH_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_PROJECT_POLL_INTERVAL_MS: u64 = 1_500;
pub const DEFAULT_ACTIVITY_POLL_INTERVAL_MS: u64 = 2_000;
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_IDLE_THRESHOLD_SECS: u64 = 120;

// Storage
pub const DEFAULT_DB_PATH: &str = "reeltime.db";
pub const DEFAULT_DB_POOL_SIZE: u32 = 4;

// Identity
pub const DEFAULT_USER_ID: &str = "local";

// Resolve bridge script output markers
pub const RESOLVE_NO_PROJECT_MARKER: &str = "NO_PROJECT";
pub const RESOLVE_ERROR_PREFIX: &str = "ERROR:";

// Notification fan-out
pub const SESSION_EVENT_CAPACITY: usize = 64;
pub const MONITOR_EVENT_CAPACITY: usize = 64;
