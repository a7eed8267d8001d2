//! # Telemetry and Observability
//!
//! Structured logging for reactd via `tracing`. Streams log per-I/O detail at
//! `trace`, state changes at `debug` and hard I/O failures at `warn`; workers
//! log their lifecycle at `info`.
//!
//! ## Usage
//!
//! ```ignore
//! use reactd::telemetry::init_logging;
//!
//! init_logging(&config.global.logging, &config.global.telemetry)?;
//! ```

pub mod config;

pub use config::TelemetryConfig;

use crate::config::LoggingConfig;
use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize structured logging.
///
/// `RUST_LOG` takes precedence over the configured level when it is set.
/// Fails if a global subscriber is already installed.
pub fn init_logging(logging: &LoggingConfig, telemetry: &TelemetryConfig) -> Result<()> {
    let filter = build_filter(logging)?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_ansi(logging.enable_colors)
        .with_line_number(logging.include_file_line)
        .with_file(logging.include_file_line);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;

    tracing::info!(service = %telemetry.service_name, level = %logging.level, "Logging initialized");
    Ok(())
}

fn build_filter(logging: &LoggingConfig) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(logging.level.to_string())
            .with_context(|| format!("invalid log level: {}", logging.level)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn test_filter_from_configured_level() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let logging = LoggingConfig {
            level: LogLevel::Debug,
            ..LoggingConfig::default()
        };
        let filter = build_filter(&logging).unwrap();
        assert_eq!(filter.to_string(), "debug");
    }

    #[test]
    fn test_telemetry_config_validation() {
        assert!(TelemetryConfig::default().validate().is_ok());

        let config = TelemetryConfig {
            service_name: "  ".to_string(),
            ..TelemetryConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
