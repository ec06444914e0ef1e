//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     start() → Starting → bind listener → Serving → accept loop
//!
//! Shutdown (shutdown.rs):
//!     stop() → trigger → accept loop exits
//!            → connections finish current request and close
//!            → wait for drain (bounded by caller deadline) → Stopped
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → stop()
//! ```
//!
//! # Design Decisions
//! - Ordered shutdown: stop accept, drain, close
//! - The drain wait is bounded; overrunning it is reported, not forced

pub mod shutdown;
pub mod signals;
pub mod state;

pub use shutdown::{Shutdown, ShutdownSignal};
pub use signals::shutdown_signal;
pub use state::{ServiceState, StateCell};
