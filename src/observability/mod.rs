//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Service span (logging.rs)
//!     → lifecycle events (listening, draining, stopped)
//!     → connection spans (id, peer)
//!     → request spans (tower-http TraceLayer, x-request-id)
//! ```
//!
//! # Design Decisions
//! - The library never installs a subscriber; the binary does
//! - Errors are returned to callers, not logged by the library

pub mod logging;
