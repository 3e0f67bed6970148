//! Liveness and readiness probes. Served in every node state.

use crate::domain::ApiError;
use crate::router::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

pub const OK_BODY: &str = "OK";

/// `GET /healthz`: the process is up.
pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, OK_BODY)
}

/// `GET /readyz`: 200 exactly when the node is `Ready`.
pub async fn readyz(State(state): State<AppState>) -> Response {
    if state.lifecycle.is_ready() {
        (StatusCode::OK, OK_BODY).into_response()
    } else {
        ApiError::not_ready().into_response()
    }
}
