//! # Telemetry
//!
//! Installs the process-wide `tracing` subscriber. The library itself only
//! emits events; binaries call [`init_tracing`] once at startup.

use crate::config::{LogConfig, LogFormat};
use thiserror::Error;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Error installing the subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The configured level is not a valid filter directive.
    #[error("invalid log filter: {0}")]
    Filter(#[from] ParseError),

    /// A global subscriber is already installed.
    #[error("failed to install subscriber: {0}")]
    Init(#[from] TryInitError),
}

/// Builds the event filter: `RUST_LOG` when set, otherwise the configured level.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] if the configured level does not parse.
pub fn env_filter(config: &LogConfig) -> Result<EnvFilter, TelemetryError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::try_new(&config.level)?),
    }
}

/// Installs a registry with an [`EnvFilter`] and a text or JSON `fmt` layer.
///
/// # Errors
///
/// Returns [`TelemetryError`] if the filter is invalid or a subscriber is
/// already installed.
pub fn init_tracing(config: &LogConfig) -> Result<(), TelemetryError> {
    let registry = tracing_subscriber::registry().with(env_filter(config)?);

    match config.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(false))
            .try_init()?,
        LogFormat::Text => registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .try_init()?,
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn configured_level_builds_filter() {
        let config = LogConfig {
            level: "provider_directory=debug,sqlx=warn".to_string(),
            ..LogConfig::default()
        };
        assert!(env_filter(&config).is_ok());
    }

    #[test]
    fn second_init_fails() {
        let config = LogConfig::default();
        let _ = init_tracing(&config);
        assert!(matches!(init_tracing(&config), Err(TelemetryError::Init(_))));
    }
}
