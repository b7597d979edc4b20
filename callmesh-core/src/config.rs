//! Environment-variable configuration for the server shell.
//!
//! The original service loaded its settings by reflecting over a struct; here
//! each field is read explicitly, which keeps failures attributable to a
//! concrete variable.

use crate::error::ConfigError;
use std::env;

/// Server configuration, loaded once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Address to bind the listener to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Base URL recursive child calls are sent to.
    pub target_url: String,
    /// Timeout for outbound child calls in milliseconds; 0 disables.
    ///
    /// Deliberately generous by default: a chain of 1000 nodes at 50 ms per
    /// tasklet legitimately holds the root connection for ~50 s.
    pub upstream_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            target_url: "http://localhost:8080".to_string(),
            upstream_timeout_ms: 120_000,
        }
    }
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// Variables: `CALLMESH_HOST`, `CALLMESH_PORT`, `CALLMESH_TARGET_URL`,
    /// `CALLMESH_UPSTREAM_TIMEOUT_MS`. Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the variable that failed to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(host) = env::var("CALLMESH_HOST") {
            config.host = host;
        }
        if let Ok(port) = env::var("CALLMESH_PORT") {
            config.port = port.parse().map_err(|e| ConfigError::InvalidValue {
                name: "CALLMESH_PORT",
                value: port.clone(),
                cause: format!("{e}"),
            })?;
        }
        if let Ok(url) = env::var("CALLMESH_TARGET_URL") {
            config.target_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(timeout) = env::var("CALLMESH_UPSTREAM_TIMEOUT_MS") {
            config.upstream_timeout_ms =
                timeout.parse().map_err(|e| ConfigError::InvalidValue {
                    name: "CALLMESH_UPSTREAM_TIMEOUT_MS",
                    value: timeout.clone(),
                    cause: format!("{e}"),
                })?;
        }

        Ok(config)
    }

    /// The socket address string to bind to.
    #[must_use]
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_self() {
        let config = Config::default();
        assert_eq!(config.listen_addr(), "0.0.0.0:8080");
        assert_eq!(config.target_url, "http://localhost:8080");
        assert_eq!(config.upstream_timeout_ms, 120_000);
    }
}
