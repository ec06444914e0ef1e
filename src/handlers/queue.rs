//! In-memory submission queue backing the default queue endpoints.
//!
//! A process-local stand-in: bounded, not persisted, and no delivery
//! semantics beyond "what was accepted can be listed".

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use axum::{
    body::Bytes,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

/// Maximum number of stored submissions.
pub const QUEUE_CAPACITY: usize = 1024;

/// Largest accepted submission body.
pub const MAX_SUBMISSION_BYTES: usize = 64 * 1024;

/// An accepted submission.
#[derive(Debug, Clone, Serialize)]
pub struct Submission {
    pub id: Uuid,
    pub payload: serde_json::Value,
}

#[derive(Debug, thiserror::Error)]
#[error("submission queue is full ({capacity} entries)")]
pub struct QueueFull {
    pub capacity: usize,
}

#[derive(Debug)]
pub struct SubmissionQueue {
    entries: Mutex<VecDeque<Submission>>,
    capacity: usize,
}

impl SubmissionQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            capacity,
        }
    }

    /// Store `payload` and return its id.
    pub fn push(&self, payload: serde_json::Value) -> Result<Uuid, QueueFull> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.len() >= self.capacity {
            return Err(QueueFull {
                capacity: self.capacity,
            });
        }

        let id = Uuid::new_v4();
        entries.push_back(Submission { id, payload });
        Ok(id)
    }

    /// Copy of every stored submission.
    pub fn snapshot(&self) -> Vec<Submission> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SubmissionQueue {
    fn default() -> Self {
        Self::new(QUEUE_CAPACITY)
    }
}

/// `POST` queue handler body: validate, store, answer 202 with the id.
pub fn enqueue(queue: &SubmissionQueue, body: Bytes, logger: &tracing::Span) -> Response {
    if body.len() > MAX_SUBMISSION_BYTES {
        return (
            StatusCode::PAYLOAD_TOO_LARGE,
            Json(json!({ "error": format!("submission exceeds {} bytes", MAX_SUBMISSION_BYTES) })),
        )
            .into_response();
    }

    let payload: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(err) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": format!("invalid JSON: {}", err) })),
            )
                .into_response();
        }
    };

    match queue.push(payload) {
        Ok(id) => {
            tracing::debug!(parent: logger, submission_id = %id, "Submission queued");
            (StatusCode::ACCEPTED, Json(json!({ "id": id }))).into_response()
        }
        Err(err) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response(),
    }
}

/// `GET` queue handler body.
pub fn list(queue: &SubmissionQueue) -> Json<Vec<Submission>> {
    Json(queue.snapshot())
}
