//! # Ledger Gateway Node
//!
//! Process entry point.
//!
//! ## Exit Status
//!
//! - `0`: clean shutdown after Ctrl-C
//! - non-zero: invalid configuration, listener bind failure, unopenable
//!   ledger, or failed node initialization
//!
//! See `node_runtime` for the startup sequence and `container::config` for
//! the `LG_*` environment variables.

use anyhow::{Context, Result};
use gateway_telemetry::{init_telemetry, TelemetryConfig};
use node_runtime::{NodeConfig, NodeRuntime};
use tracing::{error, info};

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        // Without a signal handler the node can only stop on a listener failure.
        error!(error = %e, "Failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_telemetry(&TelemetryConfig::from_env()).context("Failed to initialize logging")?;

    let config = NodeConfig::load().context("Failed to load configuration")?;

    let runtime = NodeRuntime::new(config);
    info!("Node is starting. Press Ctrl+C to stop.");
    runtime
        .run_until(shutdown_signal())
        .await
        .context("Node stopped with an error")?;

    Ok(())
}
