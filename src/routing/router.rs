//! Endpoint registry.
//!
//! # Responsibilities
//! - Store the (method, path) → handler table for one service
//! - Dispatch each request against the current table
//!
//! # Design Decisions
//! - One registry per service; there is no process-wide default
//! - Registration goes through axum, which panics on overlapping or
//!   malformed routes. Callers that must not crash contain the panic at
//!   their own boundary (see `Service::register_default_handlers`).
//! - The table is swapped atomically, so a panic mid-registration leaves
//!   every earlier registration intact and registrations after `start` are
//!   picked up by the next request.

use std::convert::Infallible;
use std::sync::Arc;
use std::task::{Context, Poll};

use arc_swap::ArcSwap;
use axum::{
    body::{Bytes, HttpBody},
    handler::Handler,
    http::Request,
    response::Response,
    routing::{on, MethodFilter, MethodRouter},
    BoxError, Router,
};
use tower::util::Oneshot;
use tower::{Service, ServiceExt};

use crate::routing::endpoint::Endpoint;

/// Request multiplexer owned by a service.
///
/// Cloning yields another handle to the same table.
#[derive(Debug, Clone)]
pub struct ServiceMux {
    router: Arc<ArcSwap<Router>>,
}

impl ServiceMux {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::from_router(Router::new())
    }

    fn from_router(router: Router) -> Self {
        Self {
            router: Arc::new(ArcSwap::from_pointee(router)),
        }
    }

    /// Register `handler` for `endpoint`.
    ///
    /// # Panics
    ///
    /// Panics if the path is malformed, the method cannot be routed, or a
    /// handler is already registered for the same method and path.
    pub fn handle<H, T>(&self, endpoint: &Endpoint, handler: H)
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        let filter = match MethodFilter::try_from(endpoint.method.clone()) {
            Ok(filter) => filter,
            Err(err) => panic!("cannot register {endpoint}: {err}"),
        };
        self.route(endpoint.path, on(filter, handler));
    }

    /// Register a full method router on `path`.
    ///
    /// # Panics
    ///
    /// Same conditions as [`ServiceMux::handle`].
    pub fn route(&self, path: &str, method_router: MethodRouter) {
        self.router
            .rcu(|current| Router::clone(current).route(path, method_router.clone()));
        tracing::debug!(path, "Route registered");
    }

    /// Snapshot of the current routing table.
    pub fn router(&self) -> Router {
        Router::clone(&self.router.load())
    }
}

impl Default for ServiceMux {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> Service<Request<B>> for ServiceMux
where
    B: HttpBody<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Oneshot<Router, Request<B>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        self.router().oneshot(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, StatusCode};
    use std::panic::{catch_unwind, AssertUnwindSafe};

    const PING: Endpoint = Endpoint::new(Method::GET, "/ping");

    async fn status_of(mux: &ServiceMux, method: Method, path: &str) -> StatusCode {
        let req = Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .unwrap();
        mux.clone().oneshot(req).await.unwrap().status()
    }

    #[tokio::test]
    async fn routes_registered_handler() {
        let mux = ServiceMux::new();
        mux.handle(&PING, || async { "pong" });

        assert_eq!(status_of(&mux, Method::GET, "/ping").await, StatusCode::OK);
        assert_eq!(status_of(&mux, Method::GET, "/missing").await, StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(&mux, Method::POST, "/ping").await,
            StatusCode::METHOD_NOT_ALLOWED
        );
    }

    #[tokio::test]
    async fn same_path_different_methods_coexist() {
        let mux = ServiceMux::new();
        mux.handle(&Endpoint::new(Method::POST, "/items"), || async { "created" });
        mux.handle(&Endpoint::new(Method::GET, "/items"), || async { "listed" });

        assert_eq!(status_of(&mux, Method::POST, "/items").await, StatusCode::OK);
        assert_eq!(status_of(&mux, Method::GET, "/items").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn duplicate_registration_panics_and_keeps_table() {
        let mux = ServiceMux::new();
        mux.handle(&PING, || async { "pong" });

        let result = catch_unwind(AssertUnwindSafe(|| mux.handle(&PING, || async { "again" })));
        assert!(result.is_err());

        assert_eq!(status_of(&mux, Method::GET, "/ping").await, StatusCode::OK);
    }

    #[test]
    fn malformed_path_panics() {
        let mux = ServiceMux::new();
        let result = catch_unwind(AssertUnwindSafe(|| {
            mux.handle(&Endpoint::new(Method::GET, "no-slash"), || async { "" })
        }));
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn clones_share_the_table() {
        let mux = ServiceMux::new();
        let other = mux.clone();
        other.handle(&PING, || async { "pong" });

        assert_eq!(status_of(&mux, Method::GET, "/ping").await, StatusCode::OK);
    }
}
