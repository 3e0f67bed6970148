//! Gateway metrics.
//!
//! Served by the admin server as JSON, and as Prometheus text with the
//! `metrics` feature.

use axum::http::StatusCode;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const INIT_PENDING: u8 = 0;
const INIT_SUCCEEDED: u8 = 1;
const INIT_FAILED: u8 = 2;

/// API Gateway metrics
#[derive(Default)]
pub struct GatewayMetrics {
    // Request counters, by response class
    pub requests_total: AtomicU64,
    pub requests_success: AtomicU64,
    pub requests_client_error: AtomicU64,
    pub requests_server_error: AtomicU64,

    // Gate outcomes
    pub not_ready_rejections: AtomicU64,
    pub not_found: AtomicU64,

    // Handler outcomes
    pub transactions_persisted: AtomicU64,
    pub backing_failures: AtomicU64,

    // Latency tracking
    pub total_latency_ms: AtomicU64,
    pub request_count_for_latency: AtomicU64,

    // Lifecycle
    pub initialize_duration_ms: AtomicU64,
    initialize_outcome: AtomicU8,
}

impl GatewayMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed request
    pub fn record_request(&self, status: StatusCode, latency_ms: u64) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);

        if status.is_server_error() {
            self.requests_server_error.fetch_add(1, Ordering::Relaxed);
        } else if status.is_client_error() {
            self.requests_client_error.fetch_add(1, Ordering::Relaxed);
        } else {
            self.requests_success.fetch_add(1, Ordering::Relaxed);
        }

        self.total_latency_ms.fetch_add(latency_ms, Ordering::Relaxed);
        self.request_count_for_latency.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a request refused because the node is not ready
    pub fn record_not_ready(&self) {
        self.not_ready_rejections.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a request that matched no route
    pub fn record_not_found(&self) {
        self.not_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_persisted(&self) {
        self.transactions_persisted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_backing_failure(&self) {
        self.backing_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the wall-clock duration of node initialization
    pub fn record_initialize(&self, duration: Duration, success: bool) {
        self.initialize_duration_ms
            .store(duration.as_millis() as u64, Ordering::Relaxed);
        let outcome = if success { INIT_SUCCEEDED } else { INIT_FAILED };
        self.initialize_outcome.store(outcome, Ordering::Relaxed);
    }

    /// `None` until initialization has finished.
    pub fn initialize_succeeded(&self) -> Option<bool> {
        match self.initialize_outcome.load(Ordering::Relaxed) {
            INIT_PENDING => None,
            outcome => Some(outcome == INIT_SUCCEEDED),
        }
    }

    /// Get average latency in ms
    pub fn average_latency_ms(&self) -> f64 {
        let total = self.total_latency_ms.load(Ordering::Relaxed);
        let count = self.request_count_for_latency.load(Ordering::Relaxed);
        if count == 0 {
            0.0
        } else {
            total as f64 / count as f64
        }
    }

    /// Export metrics in Prometheus format
    #[cfg(feature = "metrics")]
    pub fn to_prometheus(&self) -> String {
        let counters = [
            (
                "ledger_gateway_requests_total",
                "Total number of HTTP requests",
                &self.requests_total,
            ),
            (
                "ledger_gateway_requests_success_total",
                "Requests answered with 1xx-3xx",
                &self.requests_success,
            ),
            (
                "ledger_gateway_requests_client_error_total",
                "Requests answered with 4xx",
                &self.requests_client_error,
            ),
            (
                "ledger_gateway_requests_server_error_total",
                "Requests answered with 5xx",
                &self.requests_server_error,
            ),
            (
                "ledger_gateway_not_ready_rejections_total",
                "Application requests refused before the node was ready",
                &self.not_ready_rejections,
            ),
            (
                "ledger_gateway_not_found_total",
                "Requests matching no route",
                &self.not_found,
            ),
            (
                "ledger_gateway_transactions_persisted_total",
                "Transactions appended to the ledger",
                &self.transactions_persisted,
            ),
            (
                "ledger_gateway_backing_failures_total",
                "Ledger index calls that failed",
                &self.backing_failures,
            ),
        ];

        let mut output = String::new();
        for (name, help, counter) in counters {
            output.push_str(&format!(
                "# HELP {name} {help}\n# TYPE {name} counter\n{name} {}\n",
                counter.load(Ordering::Relaxed)
            ));
        }

        output.push_str(&format!(
            "# HELP ledger_gateway_average_latency_ms Average request latency\n\
             # TYPE ledger_gateway_average_latency_ms gauge\n\
             ledger_gateway_average_latency_ms {:.2}\n",
            self.average_latency_ms()
        ));

        output.push_str(&format!(
            "# HELP ledger_gateway_initialize_duration_ms Duration of node initialization\n\
             # TYPE ledger_gateway_initialize_duration_ms gauge\n\
             ledger_gateway_initialize_duration_ms {}\n",
            self.initialize_duration_ms.load(Ordering::Relaxed)
        ));

        output
    }

    /// Export metrics as JSON
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "requests": {
                "total": self.requests_total.load(Ordering::Relaxed),
                "success": self.requests_success.load(Ordering::Relaxed),
                "client_error": self.requests_client_error.load(Ordering::Relaxed),
                "server_error": self.requests_server_error.load(Ordering::Relaxed),
            },
            "gate": {
                "not_ready": self.not_ready_rejections.load(Ordering::Relaxed),
                "not_found": self.not_found.load(Ordering::Relaxed),
            },
            "transactions": {
                "persisted": self.transactions_persisted.load(Ordering::Relaxed),
                "backing_failures": self.backing_failures.load(Ordering::Relaxed),
            },
            "latency": {
                "average_ms": self.average_latency_ms(),
            },
            "initialize": {
                "duration_ms": self.initialize_duration_ms.load(Ordering::Relaxed),
                "succeeded": self.initialize_succeeded(),
            }
        })
    }
}

/// Request timing helper
pub struct RequestTimer {
    start: Instant,
    metrics: Arc<GatewayMetrics>,
}

impl RequestTimer {
    pub fn new(metrics: Arc<GatewayMetrics>) -> Self {
        Self {
            start: Instant::now(),
            metrics,
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    /// Record the request and return its latency in ms.
    pub fn finish(self, status: StatusCode) -> u64 {
        let latency_ms = self.elapsed_ms();
        self.metrics.record_request(status, latency_ms);
        latency_ms
    }
}
