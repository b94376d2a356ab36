//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. If `REELTIME_DB_PATH` is set, configuration comes from the environment
//! 2. Otherwise probes multiple paths for a config file
//! 3. Without a config file the production defaults are used
//!
//! Files may be JSON or TOML (detected by extension); missing fields keep
//! their defaults. The result is validated before it is returned.
//!
//! ## Environment Variables
//! - `REELTIME_DB_PATH`: Database file path (selects environment loading)
//! - `REELTIME_DB_POOL_SIZE`: Connection pool size
//! - `REELTIME_DEBUG`: Start from the short debug grace periods (true/false)
//! - `REELTIME_USER_ID`: Owner of recorded sessions
//! - `REELTIME_GRACE_START_SECS` / `REELTIME_GRACE_END_SECS`
//! - `REELTIME_REEVALUATE_INTERVAL_MS` / `REELTIME_FLUSH_INTERVAL_SECS`
//! - `REELTIME_PROJECT_POLL_INTERVAL_MS` / `REELTIME_ACTIVITY_POLL_INTERVAL_MS`
//! - `REELTIME_IDLE_THRESHOLD_SECS` / `REELTIME_PROBE_TIMEOUT_MS`
//! - `REELTIME_PYTHON`: Interpreter for the Resolve bridge script
//! - `REELTIME_RESOLVE_SCRIPT`: Path to the Resolve bridge script
//! - `REELTIME_FOCUS_COMMAND` / `REELTIME_IDLE_COMMAND`: Whitespace-separated
//!   probe commands
//! - `REELTIME_LOG_LEVEL` / `REELTIME_LOG_JSON`
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.{json,toml}` and `./reeltime.{json,toml}` (current directory)
//! 2. The same names in the parent and grandparent directories
//! 3. The same names relative to the executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use reeltime_domain::{Config, ReelTimeError, Result};

const CONFIG_FILE_NAMES: [&str; 4] =
    ["config.json", "config.toml", "reeltime.json", "reeltime.toml"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `ReelTimeError::Config` if a source is present but invalid, or
/// the resulting configuration fails validation.
pub fn load() -> Result<Config> {
    let config = if std::env::var_os("REELTIME_DB_PATH").is_some() {
        let config = load_from_env()?;
        tracing::info!("Configuration loaded from environment variables");
        config
    } else {
        match probe_config_paths() {
            Some(path) => load_from_file(Some(path))?,
            None => {
                tracing::info!("No config file found; using defaults");
                Config::default()
            }
        }
    };

    config.validate()?;
    Ok(config)
}

/// Load configuration from environment variables
///
/// `REELTIME_DB_PATH` is required; every other variable overrides the
/// corresponding default when set.
///
/// # Errors
/// Returns `ReelTimeError::Config` if the database path is missing or a
/// variable has an invalid value.
pub fn load_from_env() -> Result<Config> {
    let mut config =
        if env_bool("REELTIME_DEBUG", false) { Config::debug() } else { Config::default() };

    config.database.path = env_var("REELTIME_DB_PATH")?;
    override_parsed("REELTIME_DB_POOL_SIZE", &mut config.database.pool_size)?;

    let tracking = &mut config.tracking;
    if let Ok(user_id) = std::env::var("REELTIME_USER_ID") {
        tracking.user_id = user_id;
    }
    override_parsed("REELTIME_GRACE_START_SECS", &mut tracking.grace_start_secs)?;
    override_parsed("REELTIME_GRACE_END_SECS", &mut tracking.grace_end_secs)?;
    override_parsed("REELTIME_REEVALUATE_INTERVAL_MS", &mut tracking.reevaluate_interval_ms)?;
    override_parsed("REELTIME_FLUSH_INTERVAL_SECS", &mut tracking.flush_interval_secs)?;

    let monitors = &mut config.monitors;
    override_parsed("REELTIME_PROJECT_POLL_INTERVAL_MS", &mut monitors.project_poll_interval_ms)?;
    override_parsed(
        "REELTIME_ACTIVITY_POLL_INTERVAL_MS",
        &mut monitors.activity_poll_interval_ms,
    )?;
    override_parsed("REELTIME_IDLE_THRESHOLD_SECS", &mut monitors.idle_threshold_secs)?;
    override_parsed("REELTIME_PROBE_TIMEOUT_MS", &mut monitors.probe_timeout_ms)?;
    if let Ok(python) = std::env::var("REELTIME_PYTHON") {
        monitors.python = python;
    }
    if let Some(script) = std::env::var_os("REELTIME_RESOLVE_SCRIPT") {
        monitors.resolve_script = Some(PathBuf::from(script));
    }
    if let Some(command) = env_command("REELTIME_FOCUS_COMMAND") {
        monitors.focus_command = Some(command);
    }
    if let Some(command) = env_command("REELTIME_IDLE_COMMAND") {
        monitors.idle_command = Some(command);
    }

    if let Ok(level) = std::env::var("REELTIME_LOG_LEVEL") {
        config.logging.level = level;
    }
    config.logging.json = env_bool("REELTIME_LOG_JSON", config.logging.json);

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `ReelTimeError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ReelTimeError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            ReelTimeError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| ReelTimeError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `ReelTimeError::Config` if format is invalid or parsing fails.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| ReelTimeError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| ReelTimeError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(ReelTimeError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut bases = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        bases.extend([cwd.clone(), cwd.join(".."), cwd.join("../..")]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            bases.extend([exe_dir.to_path_buf(), exe_dir.join(".."), exe_dir.join("../..")]);
        }
    }

    bases
        .iter()
        .flat_map(|base| CONFIG_FILE_NAMES.iter().map(move |name| base.join(name)))
        .find(|path| path.exists())
}

/// Get required environment variable
///
/// # Errors
/// Returns `ReelTimeError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        ReelTimeError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Replace `target` with the parsed value of `key` when it is set.
fn override_parsed<T>(key: &str, target: &mut T) -> Result<()>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if let Ok(raw) = std::env::var(key) {
        *target = raw
            .trim()
            .parse()
            .map_err(|e| ReelTimeError::Config(format!("Invalid value for {key}: {e}")))?;
    }
    Ok(())
}

/// Split a command line on whitespace; empty values count as unset.
fn env_command(key: &str) -> Option<Vec<String>> {
    let raw = std::env::var(key).ok()?;
    let argv: Vec<String> = raw.split_whitespace().map(str::to_owned).collect();
    (!argv.is_empty()).then_some(argv)
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
