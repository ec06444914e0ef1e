//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Bounded TCP connection
//!     → server.rs (first byte / header deadline, HTTP/1.1 via hyper)
//!     → request ID + trace span (tower-http)
//!     → ServiceMux (routing) → handler
//!     → response, connection closed
//! ```

pub mod server;

pub use server::HttpServer;
