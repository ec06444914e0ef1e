//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::service::{ServiceOptions, SERVER_MAX_CONNECTIONS, SERVER_READ_HEADER_TIMEOUT};

/// Root configuration for a service process.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address, admission control).
    pub listener: ListenerConfig,

    /// Graceful shutdown settings.
    pub shutdown: ShutdownConfig,

    /// Logging settings.
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    /// Transport options for [`Service::with_options`](crate::Service::with_options).
    pub fn options(&self) -> ServiceOptions {
        ServiceOptions {
            read_header_timeout: Duration::from_secs(self.listener.read_header_timeout_secs),
            max_connections: self.listener.max_connections,
        }
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown.timeout_secs)
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,

    /// Seconds a client has to send its request headers.
    pub read_header_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            max_connections: SERVER_MAX_CONNECTIONS,
            read_header_timeout_secs: SERVER_READ_HEADER_TIMEOUT.as_secs(),
        }
    }
}

/// Graceful shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Seconds to wait for in-flight requests before giving up.
    pub timeout_secs: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self { timeout_secs: 5 }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, overridden by `RUST_LOG` when set.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "vex=info,tower_http=info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: ServiceConfig = toml::from_str(
            r#"
            [listener]
            bind_address = "0.0.0.0:9000"
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "0.0.0.0:9000");
        assert_eq!(config.listener.max_connections, 50);
        assert_eq!(config.options(), ServiceOptions::default());
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(5));
    }
}
