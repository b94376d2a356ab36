//! Shared test helpers for `reeltime-core` integration tests.
//!
//! In-memory implementations of the core ports so tests can drive the state
//! machine and services without a database or real time.

#![allow(dead_code)]

pub mod clock;
pub mod repositories;

pub use clock::ManualClock;
pub use repositories::InMemorySessionRepository;
