use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use chrono_tz::Tz;
use rmcp::ServiceExt;
use rmcp::transport::stdio;
use rmcp::transport::streamable_http_server::{
    StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
};
use tokio_util::sync::CancellationToken;

use crate::core::constants::MCP_HTTP_PATH;
use crate::data::ControlPlaneClient;

mod tools;
pub mod types;

pub use self::tools::McpServer;

/// Streamable HTTP endpoint mounted at `/mcp`. Sessions share one
/// `LocalSessionManager`; every session gets its own `McpServer` over the
/// same control-plane client.
pub fn routes(client: ControlPlaneClient, tz: Tz, ct: CancellationToken) -> Router<()> {
    let service = StreamableHttpService::new(
        move || Ok(McpServer::new(client.clone(), tz)),
        Arc::new(LocalSessionManager::default()),
        StreamableHttpServerConfig {
            cancellation_token: ct,
            ..Default::default()
        },
    );
    Router::new().nest_service(MCP_HTTP_PATH, service)
}

/// Serve a single MCP session over stdin/stdout until the client disconnects
pub async fn serve_stdio(client: ControlPlaneClient, tz: Tz, ct: CancellationToken) -> Result<()> {
    let service = McpServer::new(client, tz)
        .serve_with_ct(stdio(), ct)
        .await?;
    tracing::info!("MCP stdio session started");
    let reason = service.waiting().await?;
    tracing::info!(reason = ?reason, "MCP stdio session ended");
    Ok(())
}
