//! Database implementations

pub mod manager;
pub mod session_repository;

pub use manager::DbManager;
pub use session_repository::SqliteSessionRepository;
