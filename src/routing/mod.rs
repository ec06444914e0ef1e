//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (before or after start):
//!     Endpoint (method, path) + handler
//!     → router.rs (ServiceMux, atomic table swap)
//!
//! Dispatch (per request):
//!     Request → ServiceMux snapshot → axum Router → handler
//! ```
//!
//! # Design Decisions
//! - Endpoint paths are fixed constants (endpoint.rs)
//! - Duplicate (method, path) pairs are an error, never silently replaced

pub mod endpoint;
pub mod router;

pub use endpoint::{
    Endpoint, GET_QUEUE_ENDPOINT, HEALTH_ENDPOINT, POST_QUEUE_ENDPOINT,
    READY_ENDPOINT,
};
pub use router::ServiceMux;
