//! Domain logic for the gateway tools
//!
//! - `metrics` - Prometheus metrics pipeline
//! - `resources` - Resource kinds readable through `get_resource`
//! - `risk` - Resource overview and risk assessment prompt

pub mod metrics;
pub mod resources;
pub mod risk;

pub use metrics::{MetricsReport, MetricsRequest, MetricsService};
