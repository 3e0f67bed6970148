//! HTTP and admin routers.

use crate::domain::{ApiError, ConfigError, GatewayConfig, Route};
use crate::lifecycle::LifecycleController;
use crate::middleware::{
    create_cors_layer, GatewayMetrics, ReadinessGateLayer, StaticHeadersLayer, TracingLayer,
};
use crate::rest::{
    channels_by_topic, healthz, persist_transaction, readyz, transactions_by_channel,
};
use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};
use lg_01_ledger_index::LedgerIndex;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub index: Arc<dyn LedgerIndex>,
    pub lifecycle: Arc<LifecycleController>,
    pub metrics: Arc<GatewayMetrics>,
}

impl AppState {
    pub fn new(
        index: Arc<dyn LedgerIndex>,
        lifecycle: Arc<LifecycleController>,
        metrics: Arc<GatewayMetrics>,
    ) -> Self {
        Self {
            index,
            lifecycle,
            metrics,
        }
    }
}

/// Build the public router with the full middleware stack.
pub fn build_http_router(state: AppState, config: &GatewayConfig) -> Result<Router, ConfigError> {
    let headers = StaticHeadersLayer::from_config(&config.headers)?;
    let gate = ReadinessGateLayer::new(Arc::clone(&state.lifecycle), Arc::clone(&state.metrics));
    let tracing = TracingLayer::new(Arc::clone(&state.metrics));

    let router = Router::new()
        .route(Route::Healthz.path(), get(healthz))
        .route(Route::Readyz.path(), get(readyz))
        .route(Route::PersistTransaction.path(), post(persist_transaction))
        .route(Route::TransactionsByChannel.path(), get(transactions_by_channel))
        .route(Route::ChannelsByTopic.path(), get(channels_by_topic))
        .fallback(not_found)
        .layer(gate)
        .layer(DefaultBodyLimit::max(config.limits.max_request_size));

    // CORS answers preflights itself, so the static headers go outside it.
    let router = if config.cors.enabled {
        router.layer(create_cors_layer(&config.cors))
    } else {
        router
    };

    Ok(router.layer(headers).layer(tracing).with_state(state))
}

async fn not_found() -> ApiError {
    ApiError::not_found()
}

/// Build the admin router (metrics and node status).
pub fn build_admin_router(state: AppState) -> Router {
    let router = Router::new()
        .route("/metrics", get(metrics_json))
        .route("/status", get(node_status));

    #[cfg(feature = "metrics")]
    let router = router.route("/metrics/prometheus", get(metrics_prometheus));

    router.with_state(state)
}

async fn metrics_json(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(state.metrics.to_json())
}

#[cfg(feature = "metrics")]
async fn metrics_prometheus(State(state): State<AppState>) -> String {
    state.metrics.to_prometheus()
}

async fn node_status(State(state): State<AppState>) -> Json<serde_json::Value> {
    let lifecycle = &state.lifecycle;
    Json(serde_json::json!({
        "state": lifecycle.current_state(),
        "lastFailure": lifecycle.last_failure(),
        "synchronizationRunning": lifecycle.synchronization_running(),
    }))
}
