//! Modular common utilities shared across ReelTime crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: error types
//! - `platform`: SQLite storage (r2d2 pool, connection wrappers, pragmas)
//! - `test-utils`: temporary directories for tests

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Platform tier
// -------------------------------------------------------------------
#[cfg(feature = "platform")]
pub mod storage;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "test-utils", test))]
pub mod testing;

#[cfg(feature = "platform")]
pub use storage::{SqliteConnection, SqlitePool, SqlitePoolConfig, StorageError, StorageResult};
