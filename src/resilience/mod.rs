//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Accept error:
//!     → retries.rs (transient or fatal?)
//!     → transient: backoff.rs (sleep, then accept again)
//!     → fatal: accept loop returns the error
//! ```

pub mod backoff;
pub mod retries;
