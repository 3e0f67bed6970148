//! API Gateway error types.
//!
//! | Kind | Status | Body |
//! |------|--------|------|
//! | not ready | 503 | plain text |
//! | not found | 404 | plain text, lists the routes |
//! | client input | 400 | `{"error": ...}` |
//! | backing failure | 500 | `{"error": ...}` |

use crate::domain::config::ConfigError;
use crate::domain::routes::not_found_message;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use lg_01_ledger_index::IndexError;
use std::fmt;
use std::net::SocketAddr;

/// Body of every 503 from the gate and from `/readyz`.
pub const NOT_READY_MESSAGE: &str = "The node is not initialized";

/// HTTP-facing error: a status and a client-visible message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Node not ready
    pub fn not_ready() -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, NOT_READY_MESSAGE)
    }

    /// No route for this method and path
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, not_found_message())
    }

    /// Malformed or missing client input
    pub fn bad_request(details: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, details)
    }

    /// The ledger index failed. Never retried.
    pub fn backing_failure(operation: &str, error: impl fmt::Display) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("{} failed: {}", operation, error),
        )
    }

    /// Map an index error from `operation`.
    ///
    /// An envelope the index refuses is the client's fault; anything else is
    /// a backing failure.
    pub fn from_index(operation: &str, error: IndexError) -> Self {
        match error {
            IndexError::InvalidEnvelope(e) => Self::bad_request(e.to_string()),
            other => Self::backing_failure(operation, other),
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status.is_client_error()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.status.as_u16(), self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.status {
            StatusCode::SERVICE_UNAVAILABLE | StatusCode::NOT_FOUND => {
                (self.status, self.message).into_response()
            }
            status => (
                status,
                Json(serde_json::json!({ "error": self.message })),
            )
                .into_response(),
        }
    }
}

/// Result type for handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Gateway-level errors (startup and serving, not per-request)
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Server socket bind error
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// A server stopped with an I/O error
    #[error("{server} server failed: {source}")]
    Serve {
        server: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// A server task panicked or was cancelled
    #[error("{server} server task aborted: {reason}")]
    TaskAborted { server: &'static str, reason: String },
}
