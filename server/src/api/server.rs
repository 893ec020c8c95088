//! Streamable HTTP transport

use std::future::IntoFuture;
use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use super::mcp;
use super::routes::health;
use crate::core::CoreApp;
use crate::core::constants::MCP_HTTP_PATH;
use crate::core::shutdown::ShutdownService;

pub struct ApiServer {
    app: CoreApp,
}

impl ApiServer {
    pub fn new(app: CoreApp) -> Self {
        Self { app }
    }

    /// Router with the MCP endpoint and a health probe
    pub fn router(app: &CoreApp) -> Router {
        let mcp_routes = mcp::routes(
            app.client.clone(),
            app.config.metrics.timezone,
            app.shutdown.token(),
        );

        Router::new()
            .route("/health", get(health::health))
            .merge(mcp_routes)
            .layer(TraceLayer::new_for_http())
    }

    /// Serve until shutdown is triggered, then drain in-flight requests
    pub async fn start(self) -> Result<()> {
        let app = self.app;
        let shutdown = app.shutdown.clone();

        let host = app.config.server.host.clone();
        let port = app.config.server.port;
        let addr = SocketAddr::new(
            host.parse()
                .with_context(|| format!("Invalid bind address: {}", host))?,
            port,
        );

        let router = Self::router(&app);
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        tracing::info!(
            "MCP endpoint listening on http://{}{}",
            listener.local_addr().unwrap_or(addr),
            MCP_HTTP_PATH
        );

        let mut server = tokio::spawn(
            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown.wait())
                .into_future(),
        );

        tokio::select! {
            joined = &mut server => {
                joined.context("HTTP server task failed")??;
                return Ok(());
            }
            _ = shutdown.wait() => {}
        }

        match tokio::time::timeout(ShutdownService::drain_timeout(), server).await {
            Ok(joined) => joined.context("HTTP server task failed")??,
            Err(_) => tracing::warn!("Timed out draining HTTP sessions"),
        }
        Ok(())
    }
}
