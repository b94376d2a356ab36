//! Single-tracker lock using PID files
//!
//! Two trackers writing to one database would each open their own session
//! for the same user. The lock file sits next to the database and holds the
//! owner's PID; a file left behind by a dead process is taken over.

use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use reeltime_domain::{ReelTimeError, Result};
use tracing::{info, warn};

/// Held for as long as this process is the database's tracker
#[derive(Debug)]
pub struct InstanceLock {
    path: PathBuf,
}

impl InstanceLock {
    /// Lock the database at `db_path` (`<db>.lock` beside it).
    ///
    /// # Errors
    /// Returns `ReelTimeError::Platform` if a live process holds the lock or
    /// the lock file cannot be written.
    pub fn acquire_for_database(db_path: &Path) -> Result<Self> {
        let mut name = db_path.file_name().map_or_else(|| OsString::from("reeltime"), Into::into);
        name.push(".lock");
        Self::acquire(db_path.with_file_name(name))
    }

    /// Lock `path`, replacing it when its owner is no longer running.
    ///
    /// # Errors
    /// See [`InstanceLock::acquire_for_database`].
    pub fn acquire(path: PathBuf) -> Result<Self> {
        if path.exists() {
            match read_pid(&path) {
                Some(pid) if pid != std::process::id() && is_process_running(pid) => {
                    warn!(existing_pid = pid, path = %path.display(), "Tracker already running");
                    return Err(ReelTimeError::Platform(format!(
                        "another tracker (PID {pid}) is using this database; stop it first"
                    )));
                }
                Some(pid) => warn!(stale_pid = pid, path = %path.display(), "Replacing stale lock"),
                None => warn!(path = %path.display(), "Replacing unreadable lock file"),
            }
            remove(&path);
        }

        let pid = std::process::id();
        let mut file = OpenOptions::new().write(true).create_new(true).open(&path).map_err(
            |e| match e.kind() {
                ErrorKind::AlreadyExists => ReelTimeError::Platform(format!(
                    "lock file {} was created concurrently",
                    path.display()
                )),
                _ => ReelTimeError::Platform(format!(
                    "failed to create lock file {}: {e}",
                    path.display()
                )),
            },
        )?;
        file.write_all(pid.to_string().as_bytes()).map_err(|e| {
            ReelTimeError::Platform(format!("failed to write lock file {}: {e}", path.display()))
        })?;

        info!(pid, path = %path.display(), "Instance lock acquired");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        remove(&self.path);
        info!(path = %self.path.display(), "Instance lock released");
    }
}

fn read_pid(path: &Path) -> Option<u32> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

fn remove(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != ErrorKind::NotFound {
            warn!(error = %e, path = %path.display(), "Failed to remove lock file");
        }
    }
}

#[cfg(target_os = "linux")]
fn is_process_running(pid: u32) -> bool {
    Path::new("/proc").join(pid.to_string()).exists()
}

#[cfg(all(unix, not(target_os = "linux")))]
fn is_process_running(pid: u32) -> bool {
    // `kill -0` probes for the process without signalling it.
    std::process::Command::new("kill")
        .arg("-0")
        .arg(pid.to_string())
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_process_running(pid: u32) -> bool {
    warn!(pid, "Cannot check process liveness on this platform; assuming stale");
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_lock_on_same_database_fails_until_released() {
        let dir = tempfile::TempDir::new().unwrap();
        let db = dir.path().join("reeltime.db");

        let first = InstanceLock::acquire_for_database(&db).unwrap();
        assert_eq!(first.path(), dir.path().join("reeltime.db.lock"));

        // PID 1 is always alive.
        #[cfg(target_os = "linux")]
        {
            fs::write(first.path(), "1").unwrap();
            assert!(InstanceLock::acquire_for_database(&db).is_err());
            fs::write(first.path(), std::process::id().to_string()).unwrap();
        }

        drop(first);
        assert!(!dir.path().join("reeltime.db.lock").exists());

        let again = InstanceLock::acquire_for_database(&db).unwrap();
        drop(again);
    }

    #[test]
    fn stale_lock_is_taken_over() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("stale.lock");
        // PIDs are bounded well below this on every supported platform.
        fs::write(&path, "4294967294").unwrap();

        let lock = InstanceLock::acquire(path.clone()).unwrap();
        assert_eq!(read_pid(&path), Some(std::process::id()));
        drop(lock);
    }

    #[test]
    fn garbage_lock_file_is_replaced() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("garbage.lock");
        fs::write(&path, "not a pid").unwrap();

        let _lock = InstanceLock::acquire(path.clone()).unwrap();
        assert_eq!(read_pid(&path), Some(std::process::id()));
    }
}
