use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::error::MetricsError;

/// Prometheus endpoint a metric is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// `/api/v1/query`
    Instant,
    /// `/api/v1/query_range`
    Range,
}

/// Gateway telemetry category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum MetricType {
    /// Status code distribution
    #[serde(rename = "api-status-dist")]
    StatusDist,
    /// Failed (4xx/5xx) requests
    #[serde(rename = "api-failure-requests")]
    FailureRequests,
    /// Total requests
    #[serde(rename = "api-requests")]
    Requests,
    /// Ingress/egress bandwidth
    #[serde(rename = "api-bandwidth")]
    Bandwidth,
    /// Request latency
    #[serde(rename = "api-latency")]
    Latency,
    /// Nginx connections by state
    #[serde(rename = "api-connections")]
    Connections,
    /// Queries per second by status code
    #[serde(rename = "api-qps")]
    Qps,
}

impl MetricType {
    pub const ALL: [MetricType; 7] = [
        MetricType::StatusDist,
        MetricType::FailureRequests,
        MetricType::Requests,
        MetricType::Bandwidth,
        MetricType::Latency,
        MetricType::Connections,
        MetricType::Qps,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::StatusDist => "api-status-dist",
            MetricType::FailureRequests => "api-failure-requests",
            MetricType::Requests => "api-requests",
            MetricType::Bandwidth => "api-bandwidth",
            MetricType::Latency => "api-latency",
            MetricType::Connections => "api-connections",
            MetricType::Qps => "api-qps",
        }
    }

    pub fn query_kind(&self) -> QueryKind {
        match self {
            MetricType::StatusDist | MetricType::FailureRequests | MetricType::Requests => {
                QueryKind::Instant
            }
            MetricType::Bandwidth
            | MetricType::Latency
            | MetricType::Connections
            | MetricType::Qps => QueryKind::Range,
        }
    }

    pub fn no_data_message(&self) -> &'static str {
        match self {
            MetricType::StatusDist => "No request data in this period",
            MetricType::FailureRequests => "No failed requests in this period",
            MetricType::Requests => "No requests in this period",
            MetricType::Bandwidth => "No bandwidth usage in this period",
            MetricType::Latency => "No latency data in this period",
            MetricType::Connections => "No connection data in this period",
            MetricType::Qps => "No QPS data in this period",
        }
    }

    /// Label that splits a group into sub-series, with the prefix of the sub-key
    pub fn sub_label(&self) -> Option<(&'static str, &'static str)> {
        match self {
            MetricType::StatusDist => Some(("code", "")),
            MetricType::Bandwidth => Some(("type", "")),
            MetricType::Connections => Some(("state", "")),
            MetricType::Qps => Some(("code", "code_")),
            MetricType::FailureRequests | MetricType::Requests | MetricType::Latency => None,
        }
    }

    /// Counts are whole requests; everything else keeps two decimals
    pub fn is_count(&self) -> bool {
        matches!(self, MetricType::StatusDist | MetricType::FailureRequests)
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricType {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| MetricsError::UnknownMetricType(s.to_string()))
    }
}

/// Label dimension used for grouping and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum GroupDimension {
    ServiceId,
    RouteId,
    GatewayGroupId,
    InstanceId,
}

impl GroupDimension {
    /// Order in which dimensions appear in a group key
    pub const KEY_ORDER: [GroupDimension; 4] = [
        GroupDimension::ServiceId,
        GroupDimension::RouteId,
        GroupDimension::InstanceId,
        GroupDimension::GatewayGroupId,
    ];

    /// Prometheus label name
    pub fn label(&self) -> &'static str {
        match self {
            GroupDimension::ServiceId => "service_id",
            GroupDimension::RouteId => "route_id",
            GroupDimension::GatewayGroupId => "gateway_group_id",
            GroupDimension::InstanceId => "instance_id",
        }
    }

    /// Prefix used in group keys, e.g. `service:<id>`
    pub fn key_prefix(&self) -> &'static str {
        match self {
            GroupDimension::ServiceId => "service",
            GroupDimension::RouteId => "route",
            GroupDimension::GatewayGroupId => "gateway_group",
            GroupDimension::InstanceId => "instance",
        }
    }

    /// Labels carried by the connection gauge
    pub fn on_connections(&self) -> bool {
        matches!(
            self,
            GroupDimension::InstanceId | GroupDimension::GatewayGroupId
        )
    }
}
