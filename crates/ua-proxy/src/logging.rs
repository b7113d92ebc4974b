// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Logging and tracing initialization.
//!
//! The library itself only emits `tracing` events. Applications embedding
//! the proxy layer may call [`init_logging`] once to install a subscriber.

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};
use crate::error::{ConfigurationError, ProxyError, ProxyResult};

// =============================================================================
// Logging Initialization
// =============================================================================

/// Installs a global subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Returns `Ok(false)`
/// if a subscriber was already installed.
///
/// # Example
///
/// ```ignore
/// use ua_proxy::config::LoggingConfig;
/// use ua_proxy::logging::init_logging;
///
/// init_logging(&LoggingConfig::default())?;
/// ```
pub fn init_logging(config: &LoggingConfig) -> ProxyResult<bool> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| {
            ProxyError::configuration(ConfigurationError::invalid_value(
                "log.level",
                e.to_string(),
            ))
        })?,
    };

    let installed = match config.format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .try_init()
            .is_ok(),
        LogFormat::Compact => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact().with_target(false))
            .try_init()
            .is_ok(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .try_init()
            .is_ok(),
    };

    Ok(installed)
}

/// Parses a log level string into a `Level`, defaulting to INFO.
pub fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("trace"), Level::TRACE);
        assert_eq!(parse_level("DEBUG"), Level::DEBUG);
        assert_eq!(parse_level("warning"), Level::WARN);
        assert_eq!(parse_level("bogus"), Level::INFO);
    }

    #[test]
    fn test_init_twice_is_harmless() {
        let config = LoggingConfig {
            level: "ua_proxy=debug".into(),
            format: LogFormat::Compact,
        };
        assert!(init_logging(&config).is_ok());
        assert_eq!(init_logging(&config).unwrap(), false);
    }
}
