//! Tracing subscriber setup with format selection.

use anyhow::{Context, Result};
use std::env;
use std::io::IsTerminal;
use std::str::FromStr;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// JSON format for structured logging.
    Json,
    /// Human-readable pretty format.
    Pretty,
    /// Compact single-line format.
    #[default]
    Compact,
}

impl FromStr for LogFormat {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "json" => Self::Json,
            "pretty" => Self::Pretty,
            _ => Self::Compact,
        })
    }
}

/// Configuration for logging.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Log output format.
    pub log_format: LogFormat,
    /// Log level filter (e.g. "info", "debug,callmesh=trace").
    pub log_filter: String,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::default(),
            log_filter: "info".to_string(),
        }
    }
}

impl TracingConfig {
    /// Create configuration from environment variables.
    ///
    /// - `CALLMESH_LOG_FORMAT`: "json", "pretty", or "compact"
    /// - `CALLMESH_LOG_LEVEL` or `RUST_LOG`: log filter string
    pub fn from_env() -> Self {
        let log_format = env::var("CALLMESH_LOG_FORMAT")
            .ok()
            .and_then(|s| s.parse::<LogFormat>().ok())
            .unwrap_or_else(|| {
                // JSON for non-TTY, compact for a terminal.
                if std::io::stdout().is_terminal() {
                    LogFormat::Compact
                } else {
                    LogFormat::Json
                }
            });

        let log_filter = env::var("CALLMESH_LOG_LEVEL")
            .or_else(|_| env::var("RUST_LOG"))
            .unwrap_or_else(|_| "info".to_string());

        Self {
            log_format,
            log_filter,
        }
    }
}

/// Initialize the global tracing subscriber.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(config: &TracingConfig) -> Result<()> {
    let filter =
        EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));

    match config.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty())
            .try_init(),
        LogFormat::Compact => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init(),
    }
    .context("failed to install tracing subscriber")
}
