//! Liveness probe of the streamable HTTP transport

use axum::Json;
use serde::Serialize;

use crate::core::constants::{APP_NAME_LOWER, MCP_HTTP_PATH};

/// Reported by `GET /health`; never contacts the control plane
#[derive(Debug, Serialize)]
pub struct TransportStatus {
    pub status: &'static str,
    pub server: &'static str,
    pub version: &'static str,
    pub mcp_endpoint: &'static str,
}

pub async fn health() -> Json<TransportStatus> {
    Json(TransportStatus {
        status: "ok",
        server: APP_NAME_LOWER,
        version: env!("CARGO_PKG_VERSION"),
        mcp_endpoint: MCP_HTTP_PATH,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_points_at_mcp_endpoint() {
        let Json(status) = health().await;
        assert_eq!(status.status, "ok");
        assert_eq!(status.server, "api7-mcp");
        assert_eq!(status.mcp_endpoint, "/mcp");
    }
}
