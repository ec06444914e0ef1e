//! Liveness and readiness probes.

use axum::{http::StatusCode, Json};
use serde::Serialize;
use tokio::sync::watch;

use crate::lifecycle::ServiceState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ReadyStatus {
    pub ready: bool,
    pub state: String,
}

/// Always healthy while the process can answer.
pub fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Ready only while the owning service is serving.
pub fn ready(state: Option<&watch::Receiver<ServiceState>>) -> (StatusCode, Json<ReadyStatus>) {
    let current = state.map(|rx| *rx.borrow());
    let ready = current == Some(ServiceState::Serving);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ReadyStatus {
            ready,
            state: current.map_or_else(|| "detached".to_string(), |s| s.to_string()),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_follows_state() {
        let (tx, rx) = watch::channel(ServiceState::Starting);
        let (status, body) = ready(Some(&rx));
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(!body.0.ready);

        tx.send_replace(ServiceState::Serving);
        let (status, body) = ready(Some(&rx));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.0.state, "serving");

        let (status, _) = ready(None);
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn health_reports_version() {
        assert_eq!(health().0.status, "ok");
        assert_eq!(health().0.version, env!("CARGO_PKG_VERSION"));
    }
}
