//! # Gateway Telemetry
//!
//! Structured logging for the Ledger Gateway.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gateway_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_telemetry(&TelemetryConfig::from_env())?;
//!     // Logs are now being collected
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `LG_SERVICE_NAME` | `ledger-gateway` | Service name in logs |
//! | `LG_LOG_LEVEL` | `info` | Log filter (falls back to `RUST_LOG`) |
//! | `LG_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `LG_JSON_LOGS` | `false` (`true` in containers) | JSON log lines |

mod config;
mod logging;

pub use config::{parse_flag, TelemetryConfig};
pub use logging::{build_filter, init_logging};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("invalid log filter: {0}")]
    Filter(String),

    #[error("failed to install log subscriber: {0}")]
    Init(String),
}

/// Initialize process telemetry. Call once, before anything logs.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    init_logging(config)
}
