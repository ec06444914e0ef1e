//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the process-wide tracing subscriber (binary only)
//! - Build the span a service logs under
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - `RUST_LOG` wins over the configured filter

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Install the global subscriber. Call once, from `main`.
pub fn init(config: &LoggingConfig) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
}

/// Span that a service's lifecycle and request events are recorded under.
pub fn service_span(addr: &str) -> tracing::Span {
    tracing::info_span!("service", addr = %addr)
}
