//! Statistics types

use serde::{Deserialize, Serialize};

/// Time attributed to one project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectTotal {
    pub project_name: String,
    pub session_count: u32,
    pub total_seconds: i64,
}

impl ProjectTotal {
    /// Total formatted as `HH:MM:SS`.
    pub fn formatted_total(&self) -> String {
        let secs = self.total_seconds.max(0);
        format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
