//! Service lifecycle errors.
//!
//! Every failure of the lifecycle layer is returned to the direct caller as a
//! [`ServiceError`]. Nothing here logs or exits the process.

use thiserror::Error;

/// Errors returned by [`Service`](crate::Service) construction and lifecycle
/// operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The service has no transport (e.g. built with `Service::default()`).
    #[error("service's server must not be nil")]
    NilServer,

    /// Binding the listener failed.
    #[error("failed to start service: {0}")]
    Start(#[source] std::io::Error),

    /// The accept loop hit a non-recoverable error.
    #[error("failed to serve service: {0}")]
    Serve(#[source] std::io::Error),

    /// The shutdown deadline elapsed before in-flight connections drained.
    #[error("failed to stop service: deadline elapsed with {in_flight} connection(s) in flight")]
    Stop { in_flight: usize },

    /// Registering an endpoint on the router failed.
    #[error("failed to register handlers: {0}")]
    Registration(String),
}

impl ServiceError {
    /// Returns true for the nil-transport condition.
    pub fn is_nil_server(&self) -> bool {
        matches!(self, ServiceError::NilServer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_context() {
        let err = ServiceError::Start(std::io::Error::new(
            std::io::ErrorKind::AddrInUse,
            "address in use",
        ));
        assert_eq!(err.to_string(), "failed to start service: address in use");

        let err = ServiceError::Stop { in_flight: 3 };
        assert!(err.to_string().starts_with("failed to stop service"));
        assert!(!err.is_nil_server());
        assert!(ServiceError::NilServer.is_nil_server());
    }
}
