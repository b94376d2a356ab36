//! # ReelTime Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - Database implementations (SQLite via r2d2)
//! - Configuration loading (environment and config files)
//! - Platform probes (DaVinci Resolve bridge, idle helper)
//! - Background tasks (event router, session persister)
//! - Single-tracker lock file
//!
//! ## Architecture
//! - Implements traits defined in `reeltime-core`
//! - Depends on `reeltime-common` and `reeltime-core`
//! - Contains all "impure" code (I/O, child processes, timers)

pub mod config;
pub mod database;
pub mod errors;
pub mod instance_lock;
pub mod platform;
pub mod scheduling;

// Re-export commonly used items
pub use database::{DbManager, SqliteSessionRepository};
pub use errors::InfraError;
pub use instance_lock::InstanceLock;
pub use platform::*;
pub use scheduling::{EventRouter, EventRouterConfig, SessionPersister};
