//! Storage primitives for local SQLite databases
//!
//! This module provides the r2d2-backed connection pool, connection
//! wrappers and the storage error type shared by repository
//! implementations.

pub mod error;
pub mod sqlite;

// Re-export commonly used types
pub use error::{StorageError, StorageResult};
pub use sqlite::{apply_connection_pragmas, SqliteConnection, SqlitePool, SqlitePoolConfig};
