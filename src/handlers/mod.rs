//! Default endpoint handlers.
//!
//! # Endpoints
//! - `GET /health`: liveness (probes.rs)
//! - `GET /v1/ready`: readiness, tied to the service lifecycle (probes.rs)
//! - `POST /v1/queue`, `GET /v1/queue`: submission queue (queue.rs)

pub mod probes;
pub mod queue;

use std::sync::Arc;

use axum::body::Bytes;
use tokio::sync::watch;

use crate::lifecycle::ServiceState;
use crate::routing::{
    ServiceMux, GET_QUEUE_ENDPOINT, HEALTH_ENDPOINT, POST_QUEUE_ENDPOINT, READY_ENDPOINT,
};

pub use queue::{Submission, SubmissionQueue};

/// State shared by the default handlers of one service.
#[derive(Debug)]
pub struct DefaultHandlers {
    queue: Arc<SubmissionQueue>,
    state: Option<watch::Receiver<ServiceState>>,
    logger: tracing::Span,
}

impl DefaultHandlers {
    pub fn new(
        queue: Arc<SubmissionQueue>,
        state: Option<watch::Receiver<ServiceState>>,
        logger: tracing::Span,
    ) -> Self {
        Self {
            queue,
            state,
            logger,
        }
    }

    /// Register all four endpoints on `mux`, in order.
    ///
    /// # Panics
    ///
    /// Panics when `mux` already routes one of the endpoints. Endpoints
    /// registered before the panic remain.
    pub fn register(self: &Arc<Self>, mux: &ServiceMux) {
        mux.handle(&HEALTH_ENDPOINT, || async { probes::health() });

        let h = Arc::clone(self);
        mux.handle(&READY_ENDPOINT, move || {
            let h = Arc::clone(&h);
            async move { probes::ready(h.state.as_ref()) }
        });

        let h = Arc::clone(self);
        mux.handle(&POST_QUEUE_ENDPOINT, move |body: Bytes| {
            let h = Arc::clone(&h);
            async move { queue::enqueue(&h.queue, body, &h.logger) }
        });

        let h = Arc::clone(self);
        mux.handle(&GET_QUEUE_ENDPOINT, move || {
            let h = Arc::clone(&h);
            async move { queue::list(&h.queue) }
        });
    }
}
