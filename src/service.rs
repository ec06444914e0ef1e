//! Vex service.
//!
//! A [`Service`] composes a network address, a bounded listener, a request
//! router and a logging span into a unit with `start`/`stop` lifecycle
//! operations. Use [`Service::new`] for the default endpoints or
//! [`Service::with_router`] to supply your own router.

use std::net::SocketAddr;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use crate::error::ServiceError;
use crate::handlers::{DefaultHandlers, SubmissionQueue};
use crate::http::HttpServer;
use crate::lifecycle::ServiceState;
use crate::routing::ServiceMux;

/// Vex major version number.
pub const VERSION_MAJOR: u32 = 0;
/// Vex minor version number.
pub const VERSION_MINOR: u32 = 0;
/// Vex patch version number.
pub const VERSION_PATCH: u32 = 1;

/// Deadline for a client to deliver a complete request header block.
/// Keeps clients that never send anything from holding a connection slot.
pub const SERVER_READ_HEADER_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum concurrent TCP connections a service accepts.
///
/// Sized as anticipated request rate × average request duration. Works
/// together with [`SERVER_READ_HEADER_TIMEOUT`] so a slot is never held
/// indefinitely by a client that never finishes its request.
pub const SERVER_MAX_CONNECTIONS: usize = 50;

/// Tunables for a service's transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceOptions {
    pub read_header_timeout: Duration,
    pub max_connections: usize,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            read_header_timeout: SERVER_READ_HEADER_TIMEOUT,
            max_connections: SERVER_MAX_CONNECTIONS,
        }
    }
}

/// A controllable HTTP service.
///
/// `Service::default()` has no transport; its `start` and `stop` return
/// [`ServiceError::NilServer`].
#[derive(Debug)]
pub struct Service {
    server: Option<HttpServer>,
    queue: Arc<SubmissionQueue>,
    logger: tracing::Span,
}

impl Service {
    /// Create a service listening on `addr` with its own router and the
    /// default endpoints registered.
    ///
    /// Fails if registration fails; no usable service is returned then.
    pub fn new(addr: impl Into<String>, logger: tracing::Span) -> Result<Self, ServiceError> {
        let mux = ServiceMux::new();
        let svc = Self::with_router(addr, Some(mux.clone()), logger);
        svc.register_default_handlers(&mux)?;
        Ok(svc)
    }

    /// Create a service that dispatches to `router` without registering
    /// anything on it. `None` gives the service an empty router of its own.
    ///
    /// Give each service its own router when running several in one
    /// process; sharing one invites duplicate-route registration failures.
    pub fn with_router(
        addr: impl Into<String>,
        router: Option<ServiceMux>,
        logger: tracing::Span,
    ) -> Self {
        Self::with_options(addr, router, logger, ServiceOptions::default())
    }

    /// Like [`Service::with_router`] with explicit transport options.
    pub fn with_options(
        addr: impl Into<String>,
        router: Option<ServiceMux>,
        logger: tracing::Span,
        options: ServiceOptions,
    ) -> Self {
        let mux = router.unwrap_or_default();
        Self {
            server: Some(HttpServer::new(addr.into(), mux, options, logger.clone())),
            queue: Arc::new(SubmissionQueue::default()),
            logger,
        }
    }

    /// Register the default endpoints (health, ready, queue write, queue
    /// read) on `mux`.
    ///
    /// A router panic (duplicate or malformed route) is captured and
    /// returned as [`ServiceError::Registration`]. Endpoints registered
    /// before the failure stay registered.
    pub fn register_default_handlers(&self, mux: &ServiceMux) -> Result<(), ServiceError> {
        let handlers = Arc::new(DefaultHandlers::new(
            Arc::clone(&self.queue),
            self.server.as_ref().map(|server| server.state().subscribe()),
            self.logger.clone(),
        ));

        catch_unwind(AssertUnwindSafe(|| handlers.register(mux)))
            .map_err(|panic| ServiceError::Registration(panic_message(panic.as_ref())))
    }

    /// Listen on the configured address and serve until [`Service::stop`]
    /// is called or a fatal network error occurs.
    ///
    /// Returns `Ok(())` after a requested stop. Calling it again after a stop
    /// does not serve again; calling it while already serving fails with
    /// [`ServiceError::Start`].
    pub async fn start(&self) -> Result<(), ServiceError> {
        let server = self.server.as_ref().ok_or(ServiceError::NilServer)?;
        server.serve().await
    }

    /// Gracefully stop the service: refuse new connections and wait up to
    /// `deadline` for in-flight requests to finish.
    ///
    /// On success the listening socket is closed. Stopping a service that
    /// never started, or already stopped, succeeds.
    pub async fn stop(&self, deadline: Duration) -> Result<(), ServiceError> {
        let server = self.server.as_ref().ok_or(ServiceError::NilServer)?;
        server.shutdown(deadline).await
    }

    /// Wait until the listener is bound. Returns its address, or `None` if
    /// the service stopped (or failed) before serving.
    pub async fn wait_serving(&self) -> Option<SocketAddr> {
        let server = self.server.as_ref()?;
        match server.state().reached(ServiceState::Serving).await {
            ServiceState::Serving => server.local_addr(),
            _ => None,
        }
    }

    /// Current lifecycle state, if the service has a transport.
    pub fn state(&self) -> Option<ServiceState> {
        self.server.as_ref().map(|server| server.state().get())
    }

    /// Configured address.
    pub fn addr(&self) -> Option<&str> {
        self.server.as_ref().map(HttpServer::addr)
    }

    /// Bound address, once serving.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.as_ref().and_then(HttpServer::local_addr)
    }

    /// The router requests are dispatched to.
    pub fn router(&self) -> Option<&ServiceMux> {
        self.server.as_ref().map(HttpServer::mux)
    }

    pub fn options(&self) -> Option<ServiceOptions> {
        self.server.as_ref().map(HttpServer::options)
    }

    /// Connections accepted and not yet closed.
    pub fn in_flight(&self) -> usize {
        self.server.as_ref().map_or(0, HttpServer::in_flight)
    }

    /// Logging span shared with the caller.
    pub fn logger(&self) -> &tracing::Span {
        &self.logger
    }
}

impl Default for Service {
    fn default() -> Self {
        Self {
            server: None,
            queue: Arc::new(SubmissionQueue::default()),
            logger: tracing::Span::none(),
        }
    }
}

/// `major.minor.patch` of this build.
pub fn version() -> String {
    format!("{}.{}.{}", VERSION_MAJOR, VERSION_MINOR, VERSION_PATCH)
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "router panicked during registration".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{Endpoint, GET_QUEUE_ENDPOINT, HEALTH_ENDPOINT, READY_ENDPOINT};
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use tower::ServiceExt;

    async fn status_of(mux: &ServiceMux, method: Method, path: &str) -> StatusCode {
        let req = Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .unwrap();
        mux.clone().oneshot(req).await.unwrap().status()
    }

    #[test]
    fn version_matches_package() {
        assert_eq!(version(), env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn defaults_match_constants() {
        let options = ServiceOptions::default();
        assert_eq!(options.read_header_timeout, Duration::from_secs(10));
        assert_eq!(options.max_connections, 50);
    }

    #[tokio::test]
    async fn new_registers_default_endpoints() {
        let svc = Service::new("127.0.0.1:0", tracing::Span::none()).unwrap();
        let mux = svc.router().unwrap();

        assert_eq!(status_of(mux, Method::GET, HEALTH_ENDPOINT.path).await, StatusCode::OK);
        assert_eq!(status_of(mux, Method::GET, GET_QUEUE_ENDPOINT.path).await, StatusCode::OK);
        // Not serving yet.
        assert_eq!(
            status_of(mux, Method::GET, READY_ENDPOINT.path).await,
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(svc.state(), Some(ServiceState::Constructed));
        assert!(svc.local_addr().is_none());
    }

    #[test]
    fn duplicate_registration_is_an_error() {
        let mux = ServiceMux::new();
        let svc = Service::with_router("127.0.0.1:0", Some(mux.clone()), tracing::Span::none());

        svc.register_default_handlers(&mux).unwrap();
        let err = svc.register_default_handlers(&mux).unwrap_err();
        assert!(matches!(err, ServiceError::Registration(_)));
        assert!(err.to_string().contains("/health"));
    }

    #[tokio::test]
    async fn failed_registration_keeps_earlier_endpoints() {
        let mux = ServiceMux::new();
        mux.handle(&GET_QUEUE_ENDPOINT, || async { "taken" });

        let svc = Service::with_router("127.0.0.1:0", Some(mux.clone()), tracing::Span::none());
        let err = svc.register_default_handlers(&mux).unwrap_err();
        assert!(matches!(err, ServiceError::Registration(_)));

        assert_eq!(status_of(&mux, Method::GET, "/health").await, StatusCode::OK);
        assert_ne!(status_of(&mux, Method::POST, "/v1/queue").await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn separate_routers_do_not_conflict() {
        let a = Service::new("127.0.0.1:0", tracing::Span::none());
        let b = Service::new("127.0.0.1:0", tracing::Span::none());
        assert!(a.is_ok());
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn with_router_none_starts_empty() {
        let svc = Service::with_router("127.0.0.1:0", None, tracing::Span::none());
        let mux = svc.router().unwrap();
        assert_eq!(status_of(mux, Method::GET, "/health").await, StatusCode::NOT_FOUND);

        mux.handle(&Endpoint::new(Method::GET, "/custom"), || async { "ok" });
        assert_eq!(status_of(mux, Method::GET, "/custom").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn nil_server_is_rejected() {
        let svc = Service::default();
        assert!(matches!(svc.start().await, Err(ServiceError::NilServer)));
        assert!(matches!(
            svc.stop(Duration::from_secs(1)).await,
            Err(ServiceError::NilServer)
        ));
        assert!(svc.state().is_none());
        assert!(svc.wait_serving().await.is_none());
        assert_eq!(svc.in_flight(), 0);
    }

    #[tokio::test]
    async fn stop_before_start_succeeds_and_start_is_a_no_op() {
        let svc = Service::new("127.0.0.1:0", tracing::Span::none()).unwrap();
        svc.stop(Duration::from_secs(1)).await.unwrap();
        assert_eq!(svc.state(), Some(ServiceState::Stopped));

        svc.start().await.unwrap();
        assert!(svc.local_addr().is_none());
        svc.stop(Duration::from_secs(1)).await.unwrap();
    }

    #[tokio::test]
    async fn bind_failure_is_wrapped() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = taken.local_addr().unwrap().to_string();

        let svc = Service::new(addr, tracing::Span::none()).unwrap();
        let err = svc.start().await.unwrap_err();
        assert!(matches!(err, ServiceError::Start(_)));
        assert!(err.to_string().starts_with("failed to start service"));
        assert_eq!(svc.state(), Some(ServiceState::Stopped));
    }

    #[tokio::test]
    async fn invalid_address_is_a_start_error() {
        let svc = Service::new("not an address", tracing::Span::none()).unwrap();
        assert!(matches!(svc.start().await, Err(ServiceError::Start(_))));
    }
}
