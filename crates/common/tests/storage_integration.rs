//! Integration tests for the storage module
//!
//! These tests verify end-to-end storage workflows:
//! - Connection pooling against a file database
//! - Data persisted through one connection is visible through another
//! - Concurrent access from multiple threads

#![cfg(feature = "platform")]

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use reeltime_common::storage::{SqlitePool, SqlitePoolConfig, StorageResult};
use reeltime_common::testing::TempDir;

fn temp_db_path() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new("storage-test").unwrap();
    let db_path = temp_dir.path().join("test.db");
    (temp_dir, db_path)
}

fn test_pool(db_path: &std::path::Path) -> StorageResult<SqlitePool> {
    SqlitePool::new(db_path, SqlitePoolConfig::default())
}

#[test]
fn data_survives_pool_reopen() {
    let (_temp_dir, db_path) = temp_db_path();

    {
        let pool = test_pool(&db_path).unwrap();
        let conn = pool.get_connection().unwrap();
        conn.execute("CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT NOT NULL)", &[])
            .unwrap();
        conn.execute("INSERT INTO notes (body) VALUES (?1)", &[&"persisted"]).unwrap();
    }

    let pool = test_pool(&db_path).unwrap();
    let conn = pool.get_connection().unwrap();
    let body: String =
        conn.query_row("SELECT body FROM notes WHERE id = 1", &[], |row| row.get(0)).unwrap();
    assert_eq!(body, "persisted");
}

#[test]
fn writes_are_visible_across_connections() {
    let (_temp_dir, db_path) = temp_db_path();
    let pool = test_pool(&db_path).unwrap();

    let writer = pool.get_connection().unwrap();
    writer.execute("CREATE TABLE counters (name TEXT PRIMARY KEY, value INTEGER)", &[]).unwrap();
    writer.execute("INSERT INTO counters (name, value) VALUES ('ticks', 3)", &[]).unwrap();

    let reader = pool.get_connection().unwrap();
    let value: i64 = reader
        .query_row("SELECT value FROM counters WHERE name = 'ticks'", &[], |row| row.get(0))
        .unwrap();
    assert_eq!(value, 3);
}

#[test]
fn concurrent_inserts_from_threads() {
    let (_temp_dir, db_path) = temp_db_path();
    let pool = Arc::new(test_pool(&db_path).unwrap());

    pool.get_connection()
        .unwrap()
        .execute("CREATE TABLE events (id INTEGER PRIMARY KEY, worker INTEGER)", &[])
        .unwrap();

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                for _ in 0..10 {
                    let conn = pool.get_connection().unwrap();
                    conn.execute("INSERT INTO events (worker) VALUES (?1)", &[&worker]).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let count: i64 = pool
        .get_connection()
        .unwrap()
        .query_row("SELECT COUNT(*) FROM events", &[], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 40);
}
