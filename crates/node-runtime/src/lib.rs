//! # Node Runtime Library
//!
//! Wires the ledger index, the lifecycle controller and the API gateway
//! into one process. The `main.rs` binary is a thin shell over [`NodeRuntime`].
//!
//! ## Startup Sequence
//!
//! 1. Validate configuration
//! 2. Open the configured ledger and build the index (not yet initialized)
//! 3. Bind the HTTP and admin listeners; `/healthz` and `/readyz` answer
//!    from here on
//! 4. `LifecycleController::initialize()`: warm-up delay, index
//!    initialization, synchronization start
//! 5. Serve until Ctrl-C or a listener failure, then drain
//!
//! A failure in step 4 is fatal: the servers are stopped and the error is
//! returned to `main`, which exits non-zero.

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod container;

pub use container::{ConfigError, LedgerBackend, LedgerConfig, NodeConfig};

use lg_01_ledger_index::SourceError;
use lg_02_api_gateway::{
    ApiGatewayService, GatewayError, GatewayMetrics, LifecycleController, LifecycleError,
    RunningGateway,
};
use shared_types::NodeState;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

/// Fatal runtime errors.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to open ledger: {0}")]
    Ledger(#[from] SourceError),

    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("node initialization failed: {0}")]
    Lifecycle(#[from] LifecycleError),
}

/// The node runtime.
pub struct NodeRuntime {
    config: NodeConfig,
}

impl NodeRuntime {
    pub fn new(config: NodeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Steps 1-3: build everything and bind the listeners.
    ///
    /// The node is still `Uninitialized` when this returns.
    pub async fn start(&self) -> Result<RunningNode, RuntimeError> {
        info!("===========================================");
        info!("  Ledger Gateway v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        self.config.validate()?;

        let index = container::build_ledger_index(&self.config.ledger).await?;
        let metrics = Arc::new(GatewayMetrics::new());
        let lifecycle = Arc::new(LifecycleController::new(
            Arc::clone(&index),
            self.config.gateway.lifecycle.warmup_delay,
            Arc::clone(&metrics),
        ));

        let gateway = ApiGatewayService::new(
            self.config.gateway.clone(),
            index,
            Arc::clone(&lifecycle),
            metrics,
        )?;
        let gateway = gateway.start().await?;

        info!(
            http = %gateway.http_addr(),
            admin = ?gateway.admin_addr(),
            backend = ?self.config.ledger.backend,
            "Listeners bound"
        );

        Ok(RunningNode { gateway, lifecycle })
    }

    /// Run the whole sequence until `shutdown` resolves.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), RuntimeError>
    where
        F: Future<Output = ()>,
    {
        let node = self.start().await?.initialize_or_stop().await?;
        node.serve_until(shutdown).await
    }
}

/// A node whose listeners are bound.
pub struct RunningNode {
    gateway: RunningGateway,
    lifecycle: Arc<LifecycleController>,
}

impl RunningNode {
    pub fn http_addr(&self) -> SocketAddr {
        self.gateway.http_addr()
    }

    pub fn admin_addr(&self) -> Option<SocketAddr> {
        self.gateway.admin_addr()
    }

    pub fn lifecycle(&self) -> Arc<LifecycleController> {
        Arc::clone(&self.lifecycle)
    }

    pub fn state(&self) -> NodeState {
        self.lifecycle.current_state()
    }

    /// Step 4. Listeners keep serving if this fails; see `initialize_or_stop`.
    pub async fn initialize(&self) -> Result<(), RuntimeError> {
        match self.lifecycle.initialize().await {
            Ok(()) => {
                info!("Node is ready");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Node initialization failed");
                Err(e.into())
            }
        }
    }

    /// Initialize, shutting the listeners down if it fails.
    pub async fn initialize_or_stop(self) -> Result<Self, RuntimeError> {
        if let Err(e) = self.initialize().await {
            if let Err(stop) = self.gateway.shutdown().await {
                warn!(error = %stop, "Listeners did not stop cleanly");
            }
            return Err(e);
        }
        Ok(self)
    }

    /// Step 5. Serve until `shutdown` resolves or a listener fails.
    pub async fn serve_until<F>(mut self, shutdown: F) -> Result<(), RuntimeError>
    where
        F: Future<Output = ()>,
    {
        let failure = tokio::select! {
            _ = shutdown => {
                info!("Shutdown signal received");
                None
            }
            result = self.gateway.wait() => result.err(),
        };

        if let Some(e) = failure {
            error!(error = %e, "Listener stopped unexpectedly");
            if let Err(stop) = self.gateway.shutdown().await {
                warn!(error = %stop, "Listeners did not stop cleanly");
            }
            return Err(e.into());
        }

        self.shutdown().await
    }

    /// Stop the listeners and wait for in-flight requests.
    pub async fn shutdown(self) -> Result<(), RuntimeError> {
        info!("Initiating graceful shutdown...");
        self.gateway.shutdown().await?;
        info!("Shutdown complete");
        Ok(())
    }
}
