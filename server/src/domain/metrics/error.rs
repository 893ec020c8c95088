use thiserror::Error;

use crate::data::control_plane::ControlPlaneError;
use crate::data::prometheus::PrometheusError;

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Invalid duration '{0}': expected <number><m|h|d>, e.g. 15m, 6h, 7d")]
    InvalidDuration(String),

    #[error("Invalid timestamp '{0}': expected ISO 8601, e.g. 2025-04-10T02:34:00.878Z")]
    InvalidTimestamp(String),

    #[error("Invalid time window: start {start} is not before end {end}")]
    InvalidWindow { start: String, end: String },

    #[error("Invalid {field}: must match ^[a-zA-Z0-9-_.]+$ and be at most 256 characters")]
    InvalidId { field: &'static str },

    #[error("Unknown metric type: {0}")]
    UnknownMetricType(String),

    #[error("At least one metric type is required")]
    NoMetricTypes,

    #[error("Invalid sample timestamp: {0}")]
    InvalidSample(f64),

    #[error(transparent)]
    Query(#[from] ControlPlaneError),

    #[error(transparent)]
    Prometheus(#[from] PrometheusError),
}

impl MetricsError {
    /// Errors caused by the caller's arguments rather than the upstream
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidDuration(_)
                | Self::InvalidTimestamp(_)
                | Self::InvalidWindow { .. }
                | Self::InvalidId { .. }
                | Self::UnknownMetricType(_)
                | Self::NoMetricTypes
        )
    }
}
