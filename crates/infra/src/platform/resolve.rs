//! DaVinci Resolve project probe
//!
//! Resolve only exposes its scripting API to an external interpreter, so the
//! probe runs a small bridge script and reads its answer:
//!
//! | stdout            | exit | meaning            |
//! |-------------------|------|--------------------|
//! | `<project name>`  | 0    | project open       |
//! | `NO_PROJECT`      | 1    | no project         |
//! | `ERROR:<message>` | 2    | API unavailable    |
//!
//! Failures of any kind read as "no signal": no project and not focused.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reeltime_domain::constants::{RESOLVE_ERROR_PREFIX, RESOLVE_NO_PROJECT_MARKER};
use reeltime_domain::{MonitorConfig, ReelTimeError, Result as DomainResult};
use tracing::{debug, warn};

use super::process::{run_probe, ProbeOutput};
use super::project_monitor::{ProjectProbe, ProjectReading};

/// Bridge script shipped with the binary
pub const BRIDGE_SCRIPT: &str = include_str!("resolve_bridge.py");
const BRIDGE_SCRIPT_NAME: &str = "resolve_bridge.py";

/// Interpretation of one bridge-script run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeAnswer {
    Project(String),
    NoProject,
    Failed(String),
}

impl BridgeAnswer {
    pub fn project(self) -> Option<String> {
        match self {
            Self::Project(name) => Some(name),
            Self::NoProject | Self::Failed(_) => None,
        }
    }
}

/// Decode the bridge protocol.
pub fn parse_bridge_output(output: &ProbeOutput) -> BridgeAnswer {
    let stdout = output.stdout.trim();
    if let Some(message) = stdout.strip_prefix(RESOLVE_ERROR_PREFIX) {
        return BridgeAnswer::Failed(message.trim().to_string());
    }

    match output.code {
        Some(0) if !stdout.is_empty() && stdout != RESOLVE_NO_PROJECT_MARKER => {
            // Only the first line names the project; anything after is noise
            // from the scripting module.
            let name = stdout.lines().next().unwrap_or_default().trim();
            BridgeAnswer::Project(name.to_string())
        }
        Some(0 | 1) => BridgeAnswer::NoProject,
        Some(code) => BridgeAnswer::Failed(format!("bridge exited with {code}: {stdout}")),
        None => BridgeAnswer::Failed("bridge terminated by signal".into()),
    }
}

/// Write the bundled bridge script into `dir`, refreshing stale copies.
///
/// # Errors
/// Returns `ReelTimeError::Platform` when the directory or file cannot be
/// written.
pub fn install_bridge_script(dir: &Path) -> DomainResult<PathBuf> {
    let path = dir.join(BRIDGE_SCRIPT_NAME);
    let current = std::fs::read_to_string(&path).ok();
    if current.as_deref() != Some(BRIDGE_SCRIPT) {
        std::fs::create_dir_all(dir)
            .and_then(|()| std::fs::write(&path, BRIDGE_SCRIPT))
            .map_err(|e| {
                ReelTimeError::Platform(format!(
                    "failed to install bridge script at {}: {e}",
                    path.display()
                ))
            })?;
        debug!(path = %path.display(), "Installed Resolve bridge script");
    }
    Ok(path)
}

/// Reads the open project through the bridge script and focus through an
/// optional focus command.
pub struct ResolveScriptProbe {
    python: String,
    script: PathBuf,
    focus_command: Option<Vec<String>>,
    timeout: Duration,
}

impl ResolveScriptProbe {
    pub fn new(python: impl Into<String>, script: PathBuf, timeout: Duration) -> Self {
        Self { python: python.into(), script, focus_command: None, timeout }
    }

    pub fn from_config(config: &MonitorConfig, script: PathBuf) -> Self {
        Self {
            python: config.python.clone(),
            script,
            focus_command: config.focus_command.clone(),
            timeout: config.probe_timeout(),
        }
    }

    /// Report focus from `argv`'s exit status instead of project presence.
    pub fn with_focus_command(mut self, argv: Vec<String>) -> Self {
        self.focus_command = Some(argv);
        self
    }

    async fn read_project(&self) -> Option<String> {
        let argv = vec![self.python.clone(), self.script.to_string_lossy().into_owned()];
        match run_probe(argv, self.timeout).await {
            Ok(output) => match parse_bridge_output(&output) {
                BridgeAnswer::Failed(reason) => {
                    warn!(reason = %reason, "Resolve bridge reported an error");
                    None
                }
                answer => answer.project(),
            },
            Err(e) => {
                warn!(error = %e, "Resolve bridge did not run");
                None
            }
        }
    }

    async fn read_focus(&self, project_open: bool) -> bool {
        let Some(argv) = self.focus_command.clone() else {
            return project_open;
        };
        if !project_open {
            return false;
        }

        match run_probe(argv, self.timeout).await {
            Ok(output) => output.success(),
            Err(e) => {
                debug!(error = %e, "Focus probe failed; treating as unfocused");
                false
            }
        }
    }
}

#[async_trait]
impl ProjectProbe for ResolveScriptProbe {
    async fn read(&self) -> ProjectReading {
        let project = self.read_project().await;
        let focused = self.read_focus(project.is_some()).await;
        ProjectReading { project, focused }
    }
}
