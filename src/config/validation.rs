//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, connection cap > 0)
//! - Check the bind address and log filter parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Pure function: &ServiceConfig → Result<(), Vec<ValidationError>>

use std::net::ToSocketAddrs;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::schema::ServiceConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address is empty")]
    EmptyBindAddress,
    #[error("listener.bind_address {0:?} is not a valid host:port")]
    InvalidBindAddress(String),
    #[error("listener.max_connections must be at least 1")]
    ZeroMaxConnections,
    #[error("listener.read_header_timeout_secs must be at least 1")]
    ZeroReadHeaderTimeout,
    #[error("shutdown.timeout_secs must be at least 1")]
    ZeroShutdownTimeout,
    #[error("logging.filter {0:?} is invalid")]
    InvalidLogFilter(String),
}

/// Validate `config`, collecting every problem.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let addr = config.listener.bind_address.trim();
    if addr.is_empty() {
        errors.push(ValidationError::EmptyBindAddress);
    } else if addr.to_socket_addrs().is_err() {
        errors.push(ValidationError::InvalidBindAddress(addr.to_string()));
    }

    if config.listener.max_connections == 0 {
        errors.push(ValidationError::ZeroMaxConnections);
    }
    if config.listener.read_header_timeout_secs == 0 {
        errors.push(ValidationError::ZeroReadHeaderTimeout);
    }
    if config.shutdown.timeout_secs == 0 {
        errors.push(ValidationError::ZeroShutdownTimeout);
    }
    if EnvFilter::try_new(&config.logging.filter).is_err() {
        errors.push(ValidationError::InvalidLogFilter(config.logging.filter.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
