//! Vex service shell library
//!
//! Lifecycle and connection-admission layer for an HTTP service: bounded
//! listening, endpoint registration with panic containment, and graceful
//! shutdown.

pub mod config;
pub mod error;
pub mod handlers;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod resilience;
pub mod routing;
pub mod service;

pub use config::ServiceConfig;
pub use error::ServiceError;
pub use lifecycle::ServiceState;
pub use routing::{
    Endpoint, ServiceMux, GET_QUEUE_ENDPOINT, HEALTH_ENDPOINT, POST_QUEUE_ENDPOINT,
    READY_ENDPOINT,
};
pub use service::{
    version, Service, ServiceOptions, SERVER_MAX_CONNECTIONS, SERVER_READ_HEADER_TIMEOUT,
    VERSION_MAJOR, VERSION_MINOR, VERSION_PATCH,
};
