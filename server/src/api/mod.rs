//! MCP transports

pub mod mcp;
pub mod routes;
mod server;

pub use server::ApiServer;
