//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

use vex::{Service, ServiceError};

/// Spawn `service.start()` and wait for the listener to be bound.
pub async fn spawn_service(
    service: Arc<Service>,
) -> (SocketAddr, JoinHandle<Result<(), ServiceError>>) {
    let handle = {
        let service = Arc::clone(&service);
        tokio::spawn(async move { service.start().await })
    };

    let addr = tokio::time::timeout(Duration::from_secs(5), service.wait_serving())
        .await
        .expect("service did not start in time")
        .expect("service stopped before serving");

    (addr, handle)
}

/// HTTP client that never reuses connections or goes through a proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Poll `f` until it returns true or `within` elapses.
pub async fn eventually<F>(within: Duration, mut f: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + within;
    while tokio::time::Instant::now() < deadline {
        if f() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    f()
}

/// Raw HTTP/1.1 GET request bytes.
pub fn get_request(path: &str) -> String {
    format!(
        "GET {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        path
    )
}

/// Send a raw GET over a fresh connection and return the whole response.
pub async fn raw_get(addr: SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(get_request(path).as_bytes()).await.unwrap();

    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();
    String::from_utf8_lossy(&buf).into_owned()
}
