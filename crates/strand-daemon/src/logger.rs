//! Logging initialisation via tracing-subscriber.
//!
//! `RUST_LOG` wins over the configured level when it is set and valid.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    #[error("invalid log level '{0}'")]
    InvalidLevel(String),

    #[error("cannot open log file: {0}")]
    File(#[from] std::io::Error),

    #[error("failed to set subscriber: {0}")]
    Init(String),
}

/// Install the global subscriber, writing to `log_file` or stderr.
pub fn init(level: &str, log_file: Option<&Path>) -> Result<(), LoggerError> {
    let filter = build_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref(), level)?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    }
    .map_err(|e| LoggerError::Init(e.to_string()))
}

/// `rust_log` when present and valid, else the configured `level`.
fn build_filter(rust_log: Option<&str>, level: &str) -> Result<EnvFilter, LoggerError> {
    if let Some(filter) = rust_log.and_then(|directives| EnvFilter::try_new(directives).ok()) {
        return Ok(filter);
    }
    let parsed = parse_level(level)?;
    Ok(EnvFilter::default().add_directive(parsed.into()))
}

/// Parse a level name; rejects empty and unknown values.
pub fn parse_level(level: &str) -> Result<LevelFilter, LoggerError> {
    if level.is_empty() {
        return Err(LoggerError::InvalidLevel(String::new()));
    }
    level
        .parse::<LevelFilter>()
        .map_err(|_| LoggerError::InvalidLevel(level.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_levels_parse() {
        for l in ["error", "warn", "info", "debug", "trace"] {
            assert!(parse_level(l).is_ok(), "expected '{l}' to be valid");
        }
        assert_eq!(parse_level("debug").expect("debug"), LevelFilter::DEBUG);
    }

    #[test]
    fn test_invalid_levels_rejected() {
        assert!(parse_level("verbose").is_err());
        assert!(parse_level("").is_err());
        assert!(matches!(
            build_filter(None, "loud"),
            Err(LoggerError::InvalidLevel(_))
        ));
    }

    #[test]
    fn test_rust_log_overrides_invalid_level() {
        let filter = build_filter(Some("strand_bootstrap=debug"), "loud").expect("filter");
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn test_invalid_rust_log_falls_back_to_level() {
        let filter = build_filter(Some("strand=loudest"), "warn").expect("filter");
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));
        assert!(matches!(
            build_filter(Some("strand=loudest"), "loud"),
            Err(LoggerError::InvalidLevel(_))
        ));
    }

    #[test]
    fn test_unwritable_log_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing").join("strand.log");
        assert!(matches!(
            init("info", Some(&path)),
            Err(LoggerError::File(_))
        ));
    }
}
