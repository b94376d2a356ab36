//! Testing helpers shared by integration tests across crates.

pub mod temp;

pub use temp::TempDir;
