//! # ReelTime App
//!
//! Application layer: wiring and the command-line entry point.
//!
//! This crate contains:
//! - Application context (dependency injection)
//! - Command-line interface definition
//! - Logging setup
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture
//! - Owns the order of startup (recovery before tracking) and shutdown

pub mod cli;
pub mod context;
pub mod utils;

// Re-export for convenience
pub use context::*;
