//! API Gateway service.
//!
//! Binds the public HTTP server and the admin server and serves them until
//! shutdown. Binding does not wait for the node to be ready: `/healthz` and
//! `/readyz` answer while the lifecycle controller is still initializing.

use crate::domain::config::GatewayConfig;
use crate::domain::error::GatewayError;
use crate::lifecycle::LifecycleController;
use crate::middleware::GatewayMetrics;
use crate::router::{build_admin_router, build_http_router, AppState};
use axum::Router;
use futures::future::select_all;
use lg_01_ledger_index::LedgerIndex;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// API Gateway service state
pub struct ApiGatewayService {
    config: GatewayConfig,
    state: AppState,
}

impl ApiGatewayService {
    /// Create a new API Gateway service
    pub fn new(
        config: GatewayConfig,
        index: Arc<dyn LedgerIndex>,
        lifecycle: Arc<LifecycleController>,
        metrics: Arc<GatewayMetrics>,
    ) -> Result<Self, GatewayError> {
        config.validate()?;
        Ok(Self {
            config,
            state: AppState::new(index, lifecycle, metrics),
        })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn metrics(&self) -> Arc<GatewayMetrics> {
        Arc::clone(&self.state.metrics)
    }

    /// Public router with the full middleware stack.
    pub fn http_router(&self) -> Result<Router, GatewayError> {
        Ok(build_http_router(self.state.clone(), &self.config)?)
    }

    pub fn admin_router(&self) -> Router {
        build_admin_router(self.state.clone())
    }

    /// Bind the listeners and start serving in background tasks.
    pub async fn start(&self) -> Result<RunningGateway, GatewayError> {
        info!("Starting API Gateway...");
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut servers = Vec::new();

        let http_listener = bind(self.config.http_addr()).await?;
        let http_addr = local_addr(&http_listener, self.config.http_addr())?;
        info!(addr = %http_addr, "HTTP server listening");
        servers.push(spawn_server(
            "http",
            http_listener,
            self.http_router()?,
            shutdown_rx.clone(),
        ));

        let admin_addr = if self.config.admin.enabled {
            let listener = bind(self.config.admin_addr()).await?;
            let addr = local_addr(&listener, self.config.admin_addr())?;
            info!(addr = %addr, "Admin server listening");
            servers.push(spawn_server(
                "admin",
                listener,
                self.admin_router(),
                shutdown_rx.clone(),
            ));
            Some(addr)
        } else {
            None
        };

        info!("API Gateway started successfully");
        Ok(RunningGateway {
            http_addr,
            admin_addr,
            shutdown_tx,
            servers,
        })
    }
}

async fn bind(addr: SocketAddr) -> Result<TcpListener, GatewayError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| GatewayError::Bind { addr, source })
}

fn local_addr(listener: &TcpListener, addr: SocketAddr) -> Result<SocketAddr, GatewayError> {
    listener
        .local_addr()
        .map_err(|source| GatewayError::Bind { addr, source })
}

struct ServerTask {
    name: &'static str,
    handle: JoinHandle<std::io::Result<()>>,
}

fn spawn_server(
    name: &'static str,
    listener: TcpListener,
    router: Router,
    mut shutdown: watch::Receiver<bool>,
) -> ServerTask {
    let handle = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                // A dropped sender also means shut down.
                let _ = shutdown.wait_for(|stop| *stop).await;
            })
            .await
    });
    ServerTask { name, handle }
}

/// Handle to the running servers.
pub struct RunningGateway {
    http_addr: SocketAddr,
    admin_addr: Option<SocketAddr>,
    shutdown_tx: watch::Sender<bool>,
    servers: Vec<ServerTask>,
}

impl RunningGateway {
    /// Address the HTTP server is bound to.
    pub fn http_addr(&self) -> SocketAddr {
        self.http_addr
    }

    /// Address the admin server is bound to, when enabled.
    pub fn admin_addr(&self) -> Option<SocketAddr> {
        self.admin_addr
    }

    /// Wait until any server stops. Servers only stop on their own when they
    /// fail, so this normally returns an error.
    pub async fn wait(&mut self) -> Result<(), GatewayError> {
        if self.servers.is_empty() {
            return Ok(());
        }

        let handles = self.servers.iter_mut().map(|s| &mut s.handle);
        let (result, index, _) = select_all(handles).await;
        let server = self.servers.remove(index);
        server_result(server.name, result)
    }

    /// Signal graceful shutdown and wait for the servers to drain.
    pub async fn shutdown(self) -> Result<(), GatewayError> {
        info!("Shutting down API Gateway");
        let _ = self.shutdown_tx.send(true);

        let mut first_error = None;
        for server in self.servers {
            if let Err(e) = server_result(server.name, server.handle.await) {
                error!(error = %e, "Server did not stop cleanly");
                first_error.get_or_insert(e);
            }
        }

        info!("API Gateway stopped");
        first_error.map_or(Ok(()), Err)
    }
}

fn server_result(
    server: &'static str,
    result: Result<std::io::Result<()>, tokio::task::JoinError>,
) -> Result<(), GatewayError> {
    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(source)) => Err(GatewayError::Serve { server, source }),
        Err(e) => Err(GatewayError::TaskAborted {
            server,
            reason: e.to_string(),
        }),
    }
}
