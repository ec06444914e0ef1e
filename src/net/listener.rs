//! TCP listener with blocking admission control.
//!
//! # Responsibilities
//! - Bind to the service address
//! - Accept incoming TCP connections
//! - Cap in-flight connections via semaphore
//!
//! # Design Decisions
//! - A permit is acquired *before* accepting, so the (N+1)th connection stays
//!   in the kernel backlog until a slot frees. Connections are never refused.
//! - The permit travels with the connection and is released on drop, even if
//!   the connection task panics.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Error type for listener operations.
#[derive(Debug)]
pub enum ListenerError {
    /// Failed to bind to address.
    Bind(std::io::Error),
    /// Failed to accept connection.
    Accept(std::io::Error),
}

impl ListenerError {
    /// Unwrap the underlying I/O error.
    pub fn into_io(self) -> std::io::Error {
        match self {
            ListenerError::Bind(e) | ListenerError::Accept(e) => e,
        }
    }
}

impl std::fmt::Display for ListenerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerError::Bind(e) => write!(f, "failed to bind: {}", e),
            ListenerError::Accept(e) => write!(f, "failed to accept: {}", e),
        }
    }
}

impl std::error::Error for ListenerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ListenerError::Bind(e) | ListenerError::Accept(e) => Some(e),
        }
    }
}

/// A bounded TCP listener that limits concurrent connections.
///
/// Uses a semaphore to enforce `max_connections`. When the limit is reached,
/// [`Listener::accept`] waits until a slot becomes available.
#[derive(Debug)]
pub struct Listener {
    /// The underlying TCP listener.
    inner: TcpListener,
    /// Semaphore to limit concurrent connections.
    connection_limit: Arc<Semaphore>,
    /// Configured maximum connections.
    max_connections: usize,
}

impl Listener {
    /// Bind to `addr` (`host:port`, resolved if needed) with a cap of
    /// `max_connections` concurrently accepted connections.
    pub async fn bind(addr: &str, max_connections: usize) -> Result<Self, ListenerError> {
        if max_connections == 0 {
            return Err(ListenerError::Bind(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "max_connections must be at least 1",
            )));
        }

        let listener = TcpListener::bind(addr).await.map_err(ListenerError::Bind)?;
        Ok(Self::from_tcp(listener, max_connections))
    }

    fn from_tcp(listener: TcpListener, max_connections: usize) -> Self {
        Self {
            inner: listener,
            connection_limit: Arc::new(Semaphore::new(max_connections)),
            max_connections,
        }
    }

    /// Accept a new connection, respecting the connection limit.
    ///
    /// This will wait if the connection limit has been reached.
    /// Returns the stream and a permit that must be held for the connection's lifetime.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr, ConnectionPermit), ListenerError> {
        // Acquire permit first (backpressure)
        let permit = Arc::clone(&self.connection_limit)
            .acquire_owned()
            .await
            .map_err(|_| ListenerError::Accept(std::io::Error::other("connection limiter closed")))?;

        let (stream, addr) = self.inner.accept().await.map_err(ListenerError::Accept)?;

        tracing::debug!(
            peer_addr = %addr,
            available_permits = self.connection_limit.available_permits(),
            "Connection accepted"
        );

        Ok((stream, addr, ConnectionPermit { _permit: permit }))
    }

    /// Get the local address this listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.inner.local_addr()
    }

    /// Get configured maximum connections.
    pub fn max_connections(&self) -> usize {
        self.max_connections
    }
}

/// A permit representing a connection slot.
///
/// When dropped, the connection slot is released back to the pool.
#[derive(Debug)]
pub struct ConnectionPermit {
    _permit: OwnedSemaphorePermit,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn rejects_zero_capacity() {
        let err = Listener::bind("127.0.0.1:0", 0).await.unwrap_err();
        assert!(matches!(err, ListenerError::Bind(_)));
    }

    #[tokio::test]
    async fn bind_failure_is_reported() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap().to_string();

        let err = Listener::bind(&addr, 4).await.unwrap_err();
        assert!(matches!(err, ListenerError::Bind(_)));
    }

    #[tokio::test]
    async fn accept_waits_for_a_free_slot() {
        let listener = Listener::bind("127.0.0.1:0", 1).await.unwrap();
        let addr = listener.local_addr().unwrap();

        let _c1 = TcpStream::connect(addr).await.unwrap();
        let _c2 = TcpStream::connect(addr).await.unwrap();

        let (_s1, _, permit) = listener.accept().await.unwrap();

        // Second connection is in the backlog but no slot is free.
        let blocked = tokio::time::timeout(Duration::from_millis(200), listener.accept()).await;
        assert!(blocked.is_err());

        drop(permit);
        let accepted = tokio::time::timeout(Duration::from_secs(2), listener.accept()).await;
        assert!(accepted.is_ok());
        assert_eq!(listener.max_connections(), 1);
    }
}
