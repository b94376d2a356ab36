use reeltime_domain::{LoggingConfig, ReelTimeError};
use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins over `config.level`; `config.json` switches to one JSON
/// object per line.
///
/// # Errors
/// Returns `ReelTimeError::Internal` if a subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), ReelTimeError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    let result = if config.json { builder.json().try_init() } else { builder.try_init() };

    result.map_err(|e| {
        ReelTimeError::Internal(format!("failed to initialize tracing subscriber: {e}"))
    })
}

/// Convert a `ReelTimeError` into a stable label suitable for logging.
#[inline]
pub fn error_label(error: &ReelTimeError) -> &'static str {
    match error {
        ReelTimeError::Database(_) => "database",
        ReelTimeError::Config(_) => "config",
        ReelTimeError::Platform(_) => "platform",
        ReelTimeError::NotFound(_) => "not_found",
        ReelTimeError::InvalidInput(_) => "invalid_input",
        ReelTimeError::Internal(_) => "internal",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_stable() {
        assert_eq!(error_label(&ReelTimeError::Database("locked".into())), "database");
        assert_eq!(error_label(&ReelTimeError::Platform("no python".into())), "platform");
    }

    #[test]
    fn second_install_is_reported() {
        let config = LoggingConfig::default();
        let _ = init_tracing(&config);
        assert!(matches!(init_tracing(&config), Err(ReelTimeError::Internal(_))));
    }
}
