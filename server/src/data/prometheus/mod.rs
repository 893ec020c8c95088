//! Prometheus HTTP API wire types

mod types;

pub use types::{PrometheusError, PrometheusResponse, PrometheusSeries, QueryData, Sample};
