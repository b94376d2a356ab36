//! # ReelTime Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The session state machine and its grace-period rules
//! - Port/adapter interfaces (traits) for monitors, storage and time
//! - Crash recovery and statistics services
//!
//! ## Architecture Principles
//! - Only depends on `reeltime-domain`
//! - No database, process or platform code
//! - All external dependencies via traits

pub mod stats;
pub mod tracking;

pub use stats::StatisticsService;
pub use tracking::ports::{
    ActivityMonitor, Clock, ProjectMonitor, SessionRepository, SystemClock,
};
pub use tracking::{CrashRecoveryService, GracePeriods, RecoveryReport, SessionStateMachine};
