//! Temporary directory helper
//!
//! RAII wrapper for a uniquely named directory under the system temp dir.

#![allow(clippy::missing_errors_doc)]

use std::path::{Path, PathBuf};
use std::{fs, io};

/// Temporary directory that is deleted when dropped
///
/// # Examples
///
/// ```
/// use reeltime_common::testing::TempDir;
///
/// let temp_dir = TempDir::new("sessions").unwrap();
/// let db_path = temp_dir.path().join("reeltime.db");
/// assert!(db_path.starts_with(temp_dir.path()));
/// ```
#[derive(Debug)]
pub struct TempDir {
    path: PathBuf,
}

impl TempDir {
    /// Create a new temporary directory with a prefix
    pub fn new(prefix: &str) -> io::Result<Self> {
        let dir_name = format!("{}-{}", prefix, uuid::Uuid::new_v4());
        let path = std::env::temp_dir().join(dir_name);

        fs::create_dir_all(&path)?;

        Ok(Self { path })
    }

    /// Get the path to the temporary directory
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create a file in the temporary directory
    pub fn create_file(&self, name: &str, contents: &str) -> io::Result<PathBuf> {
        let file_path = self.path.join(name);
        fs::write(&file_path, contents)?;
        Ok(file_path)
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        if self.path.exists() {
            let _ = fs::remove_dir_all(&self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_is_removed_on_drop() {
        let temp_dir = TempDir::new("drop-check").unwrap();
        let path = temp_dir.path().to_path_buf();
        temp_dir.create_file("probe.txt", "x").unwrap();
        assert!(path.join("probe.txt").exists());

        drop(temp_dir);

        assert!(!path.exists());
    }
}
