//! Fixed endpoint contract.
//!
//! Probes and clients rely on these exact method/path pairs, so they are
//! crate constants rather than per-instance configuration.

use axum::http::Method;

/// A method and path pattern pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub method: Method,
    pub path: &'static str,
}

impl Endpoint {
    pub const fn new(method: Method, path: &'static str) -> Self {
        Self { method, path }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Liveness probe.
pub const HEALTH_ENDPOINT: Endpoint = Endpoint::new(Method::GET, "/health");

// Everything below is versioned under "/v1/".

/// Readiness probe.
pub const READY_ENDPOINT: Endpoint = Endpoint::new(Method::GET, "/v1/ready");

/// Submission queue write.
pub const POST_QUEUE_ENDPOINT: Endpoint = Endpoint::new(Method::POST, "/v1/queue");

/// Submission queue read.
pub const GET_QUEUE_ENDPOINT: Endpoint = Endpoint::new(Method::GET, "/v1/queue");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_endpoints_are_unique() {
        let defaults = [
            HEALTH_ENDPOINT,
            READY_ENDPOINT,
            POST_QUEUE_ENDPOINT,
            GET_QUEUE_ENDPOINT,
        ];
        for (i, a) in defaults.iter().enumerate() {
            for b in defaults.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn display_shows_method_and_path() {
        assert_eq!(POST_QUEUE_ENDPOINT.to_string(), "POST /v1/queue");
    }
}
