//! Cross-crate integration flows.

pub mod file_ledger;
pub mod gateway_flows;
pub mod node_flows;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use axum::Router;
use lg_01_ledger_index::{InMemoryLedger, LedgerIndex, LedgerIndexService, SyncConfig};
use lg_02_api_gateway::{
    build_http_router, AppState, GatewayConfig, GatewayMetrics, LifecycleController,
};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

/// A gateway router wired to a real ledger index, without sockets.
pub struct GatewayUnderTest<L> {
    pub service: LedgerIndexService<L>,
    pub lifecycle: Arc<LifecycleController>,
    pub metrics: Arc<GatewayMetrics>,
    pub router: Router,
}

impl GatewayUnderTest<InMemoryLedger> {
    pub fn in_memory() -> Self {
        Self::with_service(LedgerIndexService::new(
            InMemoryLedger::new(),
            fast_sync(),
        ))
    }
}

impl<L: lg_01_ledger_index::LedgerSource> GatewayUnderTest<L> {
    pub fn with_service(service: LedgerIndexService<L>) -> Self {
        Self::with_config(service, &GatewayConfig::default())
    }

    pub fn with_config(service: LedgerIndexService<L>, config: &GatewayConfig) -> Self {
        let index: Arc<dyn LedgerIndex> = Arc::new(service.clone());
        let metrics = Arc::new(GatewayMetrics::new());
        let lifecycle = Arc::new(LifecycleController::new(
            Arc::clone(&index),
            Duration::ZERO,
            Arc::clone(&metrics),
        ));
        let state = AppState::new(index, Arc::clone(&lifecycle), Arc::clone(&metrics));
        let router = match build_http_router(state, config) {
            Ok(router) => router,
            Err(e) => panic!("invalid test config: {e}"),
        };
        Self {
            service,
            lifecycle,
            metrics,
            router,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        match self.router.clone().oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        }
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.send(request("GET", uri, Body::empty())).await
    }

    pub async fn post(&self, uri: &str, body: &str) -> Response {
        self.send(request("POST", uri, Body::from(body.to_string())))
            .await
    }
}

/// Sync often enough that tests never wait long for a catch-up pass.
pub fn fast_sync() -> SyncConfig {
    SyncConfig {
        interval: Duration::from_millis(10),
        batch_size: 4,
    }
}

fn request(method: &str, uri: &str, body: Body) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    match builder.body(body) {
        Ok(request) => request,
        Err(e) => panic!("bad test request {method} {uri}: {e}"),
    }
}

pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap_or_default();
    String::from_utf8_lossy(&bytes).into_owned()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_str(&body_text(response).await).unwrap_or(serde_json::Value::Null)
}
