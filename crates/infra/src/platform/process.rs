//! External probe execution with timeout handling.
//!
//! Probes are short-lived helper programs (the Resolve bridge script, focus
//! and idle helpers). The exit status is part of their protocol, so a
//! non-zero exit is returned to the caller rather than treated as an error.

use std::io::Read;
use std::process::{ChildStdout, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use reeltime_domain::{ReelTimeError, Result as DomainResult};
use tokio::task;
use wait_timeout::ChildExt;

/// Captured result of a finished probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutput {
    /// `None` when the process was terminated by a signal
    pub code: Option<i32>,
    /// Trimmed standard output
    pub stdout: String,
}

impl ProbeOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Run `argv` on the blocking pool, killing it after `timeout`.
///
/// # Errors
/// Returns `ReelTimeError::Platform` if `argv` is empty, the program cannot
/// be spawned, or it does not finish in time.
pub async fn run_probe(argv: Vec<String>, timeout: Duration) -> DomainResult<ProbeOutput> {
    task::spawn_blocking(move || run_probe_blocking(&argv, timeout))
        .await
        .map_err(|e| ReelTimeError::Internal(format!("probe task failed: {e}")))?
}

fn run_probe_blocking(argv: &[String], timeout: Duration) -> DomainResult<ProbeOutput> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| ReelTimeError::Platform("probe command is empty".into()))?;

    tracing::trace!(program = %program, timeout_ms = timeout.as_millis() as u64, "Running probe");

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| map_platform_io_error(program, "spawn", e))?;

    // Drained concurrently so a chatty probe never blocks on a full pipe.
    let reader = child.stdout.take().map(spawn_reader);

    let status = match child.wait_timeout(timeout) {
        Ok(Some(status)) => status,
        Ok(None) => {
            tracing::warn!(
                program = %program,
                timeout_ms = timeout.as_millis() as u64,
                "Probe timed out, killing process"
            );
            let _ = child.kill();
            let _ = child.wait();
            return Err(ReelTimeError::Platform(format!(
                "{program} timed out after {}ms",
                timeout.as_millis()
            )));
        }
        Err(e) => return Err(map_platform_io_error(program, "wait", e)),
    };

    let raw = match reader {
        Some(handle) => handle
            .join()
            .map_err(|_| ReelTimeError::Internal(format!("{program} stdout reader panicked")))?
            .map_err(|e| map_platform_io_error(program, "read", e))?,
        None => Vec::new(),
    };

    let stdout = String::from_utf8_lossy(&raw).trim().to_string();
    Ok(ProbeOutput { code: status.code(), stdout })
}

fn spawn_reader(mut stdout: ChildStdout) -> JoinHandle<std::io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut raw = Vec::new();
        stdout.read_to_end(&mut raw)?;
        Ok(raw)
    })
}

fn map_platform_io_error(program: &str, operation: &str, err: std::io::Error) -> ReelTimeError {
    ReelTimeError::Platform(format!("{program} {operation} failed: {err}"))
}
