//! LG-02 API Gateway - readiness-gated REST interface to the ledger index.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         API GATEWAY (lg-02)                          │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐                              ┌─────────────┐       │
//! │  │    HTTP     │                              │    Admin    │       │
//! │  │  Port 8080  │                              │  Port 9090  │       │
//! │  └──────┬──────┘                              └──────┬──────┘       │
//! │         │                                            │              │
//! │  ┌──────┴──────────────────────────────┐      /metrics, /status     │
//! │  │           Middleware Stack           │                           │
//! │  │ Tracing → CORS → Headers → BodyLimit │                           │
//! │  └──────┬──────────────────────────────┘                            │
//! │         │                                                           │
//! │  ┌──────┴──────────────┐   reads    ┌──────────────────────┐        │
//! │  │   Readiness Gate    │──────────▶│ LifecycleController  │        │
//! │  │  (route table)      │  NodeState │  (watch channel)     │        │
//! │  └──────┬──────────────┘            └──────────┬───────────┘        │
//! │         │ Ready only                           │ initialize()       │
//! │  ┌──────┴──────────────┐                       │ start_sync()       │
//! │  │   REST Handlers     │                       │                    │
//! │  └──────┬──────────────┘                       │                    │
//! └─────────┼──────────────────────────────────────┼────────────────────┘
//!           │                                      │
//!           └──────────────▶ LedgerIndex ◀─────────┘
//!                            (lg-01)
//! ```
//!
//! # Routes
//!
//! | Method | Path | Before ready | Ready |
//! |--------|------|--------------|-------|
//! | GET | `/healthz` | 200 | 200 |
//! | GET | `/readyz` | 503 | 200 |
//! | POST | `/persistTransaction` | 503 | 201 `{"locationId"}` |
//! | GET | `/getTransactionsByChannelId?channelId=` | 503 | 200 list |
//! | GET | `/getChannelsByTopic?topic=` | 503 | 200 list |
//! | any | anything else | 404 | 404 |
//!
//! # Usage
//!
//! ```ignore
//! use lg_02_api_gateway::{ApiGatewayService, GatewayConfig, GatewayMetrics, LifecycleController};
//!
//! let metrics = Arc::new(GatewayMetrics::new());
//! let lifecycle = Arc::new(LifecycleController::new(index.clone(), config.lifecycle.warmup_delay, metrics.clone()));
//! let gateway = ApiGatewayService::new(config, index, lifecycle.clone(), metrics)?;
//! let running = gateway.start().await?;
//! lifecycle.initialize().await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod domain;
pub mod lifecycle;
pub mod middleware;
pub mod rest;
pub mod router;
pub mod service;

#[cfg(test)]
pub(crate) mod test_support;

// Re-exports for public API
pub use domain::config::{GatewayConfig, HeaderEntry};
pub use domain::error::{ApiError, ApiResult, GatewayError, NOT_READY_MESSAGE};
pub use domain::routes::Route;
pub use lifecycle::{LifecycleController, LifecycleError};
pub use middleware::GatewayMetrics;
pub use router::{build_admin_router, build_http_router, AppState};
pub use service::{ApiGatewayService, RunningGateway};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
