//! SQLite connection pool
//!
//! Provides r2d2-based connection pooling for local SQLite databases.

use std::path::Path;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use tracing::{debug, info, instrument, warn};

use super::config::SqlitePoolConfig;
use super::connection::SqliteConnection;
use super::pragmas::apply_connection_pragmas;
use crate::storage::error::{StorageError, StorageResult};

/// SQLite connection pool
///
/// Every pooled connection gets the configured pragmas applied on open.
#[derive(Debug)]
pub struct SqlitePool {
    pool: Pool<SqliteConnectionManager>,
    config: SqlitePoolConfig,
}

impl SqlitePool {
    /// Create a new connection pool for the database file at `path`.
    ///
    /// The parent directory is created when missing. A test connection is
    /// acquired before returning so an unreadable database fails here and
    /// not on first use.
    #[instrument(skip(config), fields(db_path = ?path, pool_size = config.max_size))]
    pub fn new(path: &Path, config: SqlitePoolConfig) -> StorageResult<Self> {
        if config.max_size == 0 {
            return Err(StorageError::InvalidConfig("pool max_size must be > 0".into()));
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let pool_config = config.clone();
        let manager = SqliteConnectionManager::file(path).with_init(move |conn| {
            apply_connection_pragmas(conn, &pool_config)
                .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
        });

        let pool = Pool::builder()
            .max_size(config.max_size)
            .connection_timeout(config.connection_timeout)
            .build(manager)
            .map_err(|e| {
                warn!(error = %e, "Failed to create connection pool");
                StorageError::Connection(format!("Failed to create pool: {e}"))
            })?;

        {
            let conn = pool.get()?;
            conn.query_row("SELECT 1", [], |row| row.get::<_, i32>(0))?;
            debug!("Test connection verified");
        }

        info!(max_connections = config.max_size, "SQLite pool created");

        Ok(Self { pool, config })
    }

    /// Get a connection from the pool
    #[instrument(skip(self), fields(pool_size = self.config.max_size))]
    pub fn get_connection(&self) -> StorageResult<SqliteConnection> {
        let start = std::time::Instant::now();

        match self.pool.get() {
            Ok(conn) => {
                debug!(elapsed_ms = start.elapsed().as_millis() as u64, "Connection acquired");
                Ok(SqliteConnection::new(conn))
            }
            Err(e) => {
                let err_str = e.to_string().to_lowercase();
                if err_str.contains("timed out") || err_str.contains("timeout") {
                    warn!(timeout = ?self.config.connection_timeout, "Connection timeout");
                    Err(StorageError::Timeout(self.config.connection_timeout.as_secs()))
                } else {
                    warn!(error = %e, "Connection error");
                    Err(StorageError::Connection(format!("Failed to get connection: {e}")))
                }
            }
        }
    }

    /// Maximum number of pooled connections
    pub fn max_size(&self) -> u32 {
        self.pool.max_size()
    }

    /// Connections currently idle in the pool
    pub fn idle_connections(&self) -> u32 {
        self.pool.state().idle_connections
    }
}
