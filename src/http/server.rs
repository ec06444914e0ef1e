//! HTTP transport for a service.
//!
//! # Responsibilities
//! - Bind the bounded listener and run the accept loop
//! - Serve each connection with HTTP/1.1 under a header-read deadline
//! - Wire up per-request middleware (request ID, tracing)
//! - Stop accepting on shutdown and let live connections drain
//!
//! # Design Decisions
//! - One task per accepted connection; the connection slot is released
//!   when the task ends, whatever the reason
//! - The header-read deadline is fixed when the connection is accepted. A
//!   connection must send its complete header block before it, whether it
//!   stays silent or trickles bytes. Silent connections are dropped without
//!   involving hyper.
//! - `shutdown` reports success only once the listening socket is closed
//!   and every connection has drained
//! - Keep-alive is off: every accepted connection carries one request, so
//!   an idle client can never pin a slot between requests

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;
use std::time::Duration;

use hyper::server::conn::http1;
use hyper_util::rt::{TokioIo, TokioTimer};
use hyper_util::service::TowerToHyperService;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::time::Instant;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::Instrument;

use crate::error::ServiceError;
use crate::lifecycle::{ServiceState, Shutdown, ShutdownSignal, StateCell};
use crate::net::{ConnectionPermit, ConnectionTracker, Listener};
use crate::resilience::backoff::accept_backoff;
use crate::resilience::retries::is_transient_accept_error;
use crate::routing::ServiceMux;
use crate::service::ServiceOptions;

/// Transport owned by a [`Service`](crate::Service).
#[derive(Debug)]
pub struct HttpServer {
    addr: String,
    mux: ServiceMux,
    options: ServiceOptions,
    shutdown: Shutdown,
    tracker: ConnectionTracker,
    state: StateCell,
    started: AtomicBool,
    /// True while a listening socket is open.
    listening: watch::Sender<bool>,
    local_addr: OnceLock<SocketAddr>,
    span: tracing::Span,
}

/// Marks the listener closed when dropped. Declared before the listener so
/// it drops after it.
struct ListeningGuard<'a>(&'a watch::Sender<bool>);

impl Drop for ListeningGuard<'_> {
    fn drop(&mut self) {
        self.0.send_replace(false);
    }
}

impl HttpServer {
    /// Create a server for `addr`. No socket is opened until [`HttpServer::serve`].
    pub fn new(addr: String, mux: ServiceMux, options: ServiceOptions, span: tracing::Span) -> Self {
        Self {
            addr,
            mux,
            options,
            shutdown: Shutdown::new(),
            tracker: ConnectionTracker::new(),
            state: StateCell::new(),
            started: AtomicBool::new(false),
            listening: watch::channel(false).0,
            local_addr: OnceLock::new(),
            span,
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn mux(&self) -> &ServiceMux {
        &self.mux
    }

    pub fn options(&self) -> ServiceOptions {
        self.options
    }

    pub fn state(&self) -> &StateCell {
        &self.state
    }

    /// Address the listener is bound to, once serving.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr.get().copied()
    }

    /// Connections accepted and not yet closed.
    pub fn in_flight(&self) -> usize {
        self.tracker.active_count()
    }

    /// Bind and run the accept loop until shutdown or a fatal accept error.
    ///
    /// Serves at most once: after shutdown it returns `Ok(())` without
    /// binding, and while another call is running it fails with `AddrInUse`.
    pub async fn serve(&self) -> Result<(), ServiceError> {
        if self.started.swap(true, Ordering::SeqCst) {
            if self.shutdown.is_triggered() {
                return Ok(());
            }
            return Err(ServiceError::Start(std::io::Error::new(
                std::io::ErrorKind::AddrInUse,
                "service is already started",
            )));
        }

        // Publish before checking the trigger so a concurrent shutdown either
        // stops us here or waits for the listener to close.
        self.listening.send_replace(true);
        let _listening = ListeningGuard(&self.listening);
        if self.shutdown.is_triggered() {
            return Ok(());
        }
        self.state.advance(ServiceState::Starting);

        let listener = match Listener::bind(&self.addr, self.options.max_connections).await {
            Ok(listener) => listener,
            Err(err) => {
                self.state.advance(ServiceState::Stopped);
                return Err(ServiceError::Start(err.into_io()));
            }
        };
        let local_addr = match listener.local_addr() {
            Ok(addr) => addr,
            Err(err) => {
                self.state.advance(ServiceState::Stopped);
                return Err(ServiceError::Start(err));
            }
        };
        if self.local_addr.set(local_addr).is_err() {
            tracing::warn!(
                parent: &self.span,
                address = %local_addr,
                "Bound address already recorded"
            );
        }
        self.state.advance(ServiceState::Serving);

        tracing::info!(
            parent: &self.span,
            address = %local_addr,
            max_connections = listener.max_connections(),
            read_header_timeout = ?self.options.read_header_timeout,
            "Service listening"
        );

        let mut shutdown = self.shutdown.subscribe();
        let mut failures: u32 = 0;

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer_addr, permit)) => {
                        failures = 0;
                        self.spawn_connection(stream, peer_addr, permit);
                    }
                    Err(err) => {
                        let err = err.into_io();
                        if !is_transient_accept_error(&err) {
                            self.state.advance(ServiceState::Stopped);
                            return Err(ServiceError::Serve(err));
                        }

                        failures = failures.saturating_add(1);
                        let delay = accept_backoff(failures);
                        tracing::debug!(
                            parent: &self.span,
                            error = %err,
                            retry_in = ?delay,
                            "Accept failed, retrying"
                        );
                        tokio::select! {
                            biased;
                            _ = shutdown.recv() => break,
                            _ = tokio::time::sleep(delay) => {}
                        }
                    }
                },
            }
        }

        tracing::info!(
            parent: &self.span,
            in_flight = self.tracker.active_count(),
            "Service stopped accepting"
        );
        Ok(())
    }

    /// Stop accepting and wait up to `deadline` for the listener to close and
    /// live connections to finish.
    pub async fn shutdown(&self, deadline: Duration) -> Result<(), ServiceError> {
        if self.shutdown.trigger() {
            tracing::info!(
                parent: &self.span,
                in_flight = self.tracker.active_count(),
                "Service draining"
            );
        }
        self.state.advance(ServiceState::Stopping);

        let mut listening = self.listening.subscribe();
        let drained = async {
            // The sender lives in `self`, so this only ends on `false`.
            let _ = listening.wait_for(|open| !*open).await;
            self.tracker.wait_idle().await;
        };

        match tokio::time::timeout(deadline, drained).await {
            Ok(()) => {
                if self.state.advance(ServiceState::Stopped) {
                    tracing::info!(parent: &self.span, "Service stopped");
                }
                Ok(())
            }
            Err(_) => Err(ServiceError::Stop {
                in_flight: self.tracker.active_count(),
            }),
        }
    }

    fn spawn_connection(&self, stream: TcpStream, peer_addr: SocketAddr, permit: ConnectionPermit) {
        let guard = self.tracker.track();
        let span = tracing::debug_span!(
            parent: &self.span,
            "connection",
            id = %guard.id(),
            peer = %peer_addr
        );
        let mux = self.mux.clone();
        let shutdown = self.shutdown.subscribe();
        let header_deadline = Instant::now() + self.options.read_header_timeout;

        tokio::spawn(
            async move {
                // Both are released when the connection ends, even on panic.
                let _permit = permit;
                let _guard = guard;
                serve_connection(stream, mux, header_deadline, shutdown).await;
            }
            .instrument(span),
        );
    }
}

async fn serve_connection(
    stream: TcpStream,
    mux: ServiceMux,
    header_deadline: Instant,
    mut shutdown: ShutdownSignal,
) {
    tokio::select! {
        biased;
        _ = shutdown.recv() => return,
        ready = tokio::time::timeout_at(header_deadline, stream.readable()) => match ready {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                tracing::debug!(error = %err, "Connection failed before request");
                return;
            }
            Err(_) => {
                tracing::debug!("No request within header read timeout, closing");
                return;
            }
        },
    }

    // hyper times the header read from its first poll, so it only gets what
    // is left of the deadline.
    let remaining = header_deadline.saturating_duration_since(Instant::now());
    if remaining.is_zero() {
        tracing::debug!("No request within header read timeout, closing");
        return;
    }

    let service = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .service(mux);

    let conn = http1::Builder::new()
        .timer(TokioTimer::new())
        .header_read_timeout(remaining)
        .keep_alive(false)
        .serve_connection(TokioIo::new(stream), TowerToHyperService::new(service));
    let mut conn = std::pin::pin!(conn);
    let mut draining = false;

    loop {
        tokio::select! {
            res = conn.as_mut() => {
                if let Err(err) = res {
                    tracing::debug!(error = %err, "Connection closed with error");
                }
                break;
            }
            _ = shutdown.recv(), if !draining => {
                draining = true;
                conn.as_mut().graceful_shutdown();
            }
        }
    }
}
