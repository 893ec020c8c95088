//! Data access layer
//!
//! - `control_plane` - HTTP client for the gateway control plane REST API
//! - `prometheus` - Wire types of the Prometheus HTTP API proxied by the control plane

pub mod control_plane;
pub mod prometheus;

pub use control_plane::{ApiRequest, ControlPlaneClient, ControlPlaneError, Presented, Shape};
