//! Relay server listener
//!
//! Binds the TCP listener and serves the HTTP router on it.

use std::future::Future;
use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;

use crate::error::Result;
use crate::server::config::RelayConfig;
use crate::server::routes::build_router;
use crate::server::state::AppState;

/// Broadcast relay server
pub struct RelayServer {
    config: RelayConfig,
    state: AppState,
}

impl RelayServer {
    /// Create a new server with the given configuration
    pub fn new(config: RelayConfig) -> Self {
        let state = AppState::new(config.clone());
        Self { config, state }
    }

    /// Shared state, including the per-protocol registries
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Router serving every relay route
    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Get the configured bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    /// Run the server
    ///
    /// This method blocks until the server fails.
    pub async fn run(&self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener
    ///
    /// Useful when binding to port 0 and reading the chosen address back.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(addr = %addr, "Relay server listening");

        axum::serve(
            listener,
            self.router()
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            shutdown.await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

        let stats = self.state.stats();
        tracing::info!(
            events_published = stats.events_published,
            deliveries = stats.deliveries,
            dropped_deliveries = stats.dropped_deliveries,
            "Relay server stopped"
        );

        Ok(())
    }
}
