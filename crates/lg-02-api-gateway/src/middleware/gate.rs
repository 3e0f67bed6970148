//! Readiness gate.
//!
//! Resolves every request against the [`Route`] table before any handler runs:
//!
//! - no matching route: 404 with the route list, in every node state
//! - application route while the node is not `Ready`: 503, the handler and
//!   the ledger index are never reached
//! - otherwise: passed through
//!
//! The state check is a single `watch` borrow on the calling task.

use crate::domain::{ApiError, Route};
use crate::lifecycle::LifecycleController;
use crate::middleware::GatewayMetrics;
use axum::{body::Body, http::Request, response::IntoResponse, response::Response};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::debug;

/// Layer that refuses requests the node cannot serve yet.
#[derive(Clone)]
pub struct ReadinessGateLayer {
    lifecycle: Arc<LifecycleController>,
    metrics: Arc<GatewayMetrics>,
}

impl ReadinessGateLayer {
    pub fn new(lifecycle: Arc<LifecycleController>, metrics: Arc<GatewayMetrics>) -> Self {
        Self { lifecycle, metrics }
    }
}

impl<S> Layer<S> for ReadinessGateLayer {
    type Service = ReadinessGateService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ReadinessGateService {
            inner,
            lifecycle: Arc::clone(&self.lifecycle),
            metrics: Arc::clone(&self.metrics),
        }
    }
}

/// Readiness gate service
#[derive(Clone)]
pub struct ReadinessGateService<S> {
    inner: S,
    lifecycle: Arc<LifecycleController>,
    metrics: Arc<GatewayMetrics>,
}

impl<S> ReadinessGateService<S> {
    fn reject(&self, req: &Request<Body>) -> Option<ApiError> {
        match Route::resolve(req.method(), req.uri().path()) {
            None => {
                self.metrics.record_not_found();
                debug!(method = %req.method(), path = %req.uri().path(), "No route");
                Some(ApiError::not_found())
            }
            Some(route) if route.requires_ready() && !self.lifecycle.is_ready() => {
                self.metrics.record_not_ready();
                debug!(
                    route = route.name(),
                    state = %self.lifecycle.current_state(),
                    "Refusing request before node is ready"
                );
                Some(ApiError::not_ready())
            }
            Some(_) => None,
        }
    }
}

impl<S> Service<Request<Body>> for ReadinessGateService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        if let Some(rejection) = self.reject(&req) {
            let response = rejection.into_response();
            return Box::pin(async move { Ok(response) });
        }

        // The clone left behind is the one that gets poll_ready'd next.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        Box::pin(async move { inner.call(req).await })
    }
}
