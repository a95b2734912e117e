//! Listener lifecycle
//!
//! Two axum listeners share one [`AppState`]: the increment API and the
//! scrape/ops endpoints.

use anyhow::{Context, Result};
use std::future::IntoFuture;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

use crate::api::{build_increment_router, build_ops_router};
use crate::app_state::AppState;
use crate::config::Config;
use crate::metrics::{spawn_synthetic, Telemetry};

/// Probe server
pub struct Server {
    /// Server configuration
    config: Arc<Config>,
    /// Push/pull sinks
    telemetry: Telemetry,
    /// Handler state
    state: AppState,
    /// Shutdown signal
    shutdown_tx: watch::Sender<bool>,
}

impl Server {
    /// Create a new server instance
    ///
    /// Must run inside the tokio runtime: the OTLP exporter binds its channel
    /// to it.
    pub async fn new(config: Arc<Config>) -> Result<Self> {
        let telemetry = Telemetry::init(&config);
        let state = AppState::new(&telemetry);
        let (shutdown_tx, _) = watch::channel(false);

        Ok(Self {
            config,
            telemetry,
            state,
            shutdown_tx,
        })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Serve both listeners until [`Server::shutdown`] is called
    pub async fn run(&self) -> Result<()> {
        let api_addr = self.config.server.bind_addr;
        let ops_addr = self.config.metrics.bind_addr;

        let api_listener = TcpListener::bind(api_addr)
            .await
            .with_context(|| format!("Failed to bind increment API on {api_addr}"))?;
        let ops_listener = TcpListener::bind(ops_addr)
            .await
            .with_context(|| format!("Failed to bind metrics endpoint on {ops_addr}"))?;

        spawn_synthetic(
            &self.config.synthetic,
            self.telemetry.pull(),
            self.telemetry.push(),
        );

        info!(bind_addr = %api_addr, "Increment API listening");
        info!(bind_addr = %ops_addr, "Metrics available at http://{ops_addr}/metrics");

        let api = axum::serve(api_listener, build_increment_router(self.state.clone()))
            .with_graceful_shutdown(wait_for_shutdown(self.shutdown_tx.subscribe()));
        let ops = axum::serve(ops_listener, build_ops_router(self.state.clone()))
            .with_graceful_shutdown(wait_for_shutdown(self.shutdown_tx.subscribe()));

        tokio::try_join!(api.into_future(), ops.into_future()).context("HTTP server error")?;
        Ok(())
    }

    /// Stop accepting requests and flush the push exporter
    ///
    /// Periodic workers are not drained; they end with the process.
    pub async fn shutdown(&self) {
        info!(active_workers = self.state.registry().len(), "Shutting down");
        let _ = self.shutdown_tx.send(true);
        self.telemetry.shutdown();
    }
}

async fn wait_for_shutdown(mut rx: watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}
