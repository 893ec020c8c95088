//! PromQL construction for each metric type

use crate::core::constants::{
    PROMETHEUS_PROXY_PATH, PROMETHEUS_QUERY_PATH, PROMETHEUS_QUERY_RANGE_PATH,
};
use crate::data::control_plane::ApiRequest;
use crate::utils::string::is_valid_id;

use super::error::MetricsError;
use super::metric_type::{GroupDimension, MetricType, QueryKind};

/// Optional label filters applied to every query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricFilters {
    pub service_id: Option<String>,
    pub route_id: Option<String>,
    pub instance_id: Option<String>,
    pub gateway_group_id: Option<String>,
}

impl MetricFilters {
    fn entries(&self) -> [(GroupDimension, Option<&str>); 4] {
        [
            (GroupDimension::ServiceId, self.service_id.as_deref()),
            (GroupDimension::RouteId, self.route_id.as_deref()),
            (GroupDimension::InstanceId, self.instance_id.as_deref()),
            (GroupDimension::GatewayGroupId, self.gateway_group_id.as_deref()),
        ]
    }

    /// Reject ids that are not plain identifiers
    pub fn validate(&self) -> Result<(), MetricsError> {
        for (dim, value) in self.entries() {
            if let Some(v) = value
                && !v.is_empty()
                && !is_valid_id(v)
            {
                return Err(MetricsError::InvalidId { field: dim.label() });
            }
        }
        Ok(())
    }

    /// `k="v"` matchers for the non-empty filters
    fn matchers(&self, keep: impl Fn(GroupDimension) -> bool) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|(dim, _)| keep(*dim))
            .filter_map(|(dim, value)| {
                value
                    .filter(|v| !v.is_empty())
                    .map(|v| format!("{}=\"{}\"", dim.label(), escape_label_value(v)))
            })
            .collect()
    }
}

fn escape_label_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// `{a,b}` with the given leading matchers prepended
fn selector(leading: &[&str], matchers: &[String]) -> String {
    let parts: Vec<&str> = leading
        .iter()
        .copied()
        .chain(matchers.iter().map(String::as_str))
        .collect();
    format!("{{{}}}", parts.join(","))
}

/// `by (a,b)` with the given leading labels, or nothing when empty
fn by_clause(leading: &[&str], group_by: &[GroupDimension]) -> String {
    let labels: Vec<&str> = leading
        .iter()
        .copied()
        .chain(group_by.iter().map(|d| d.label()))
        .collect();
    if labels.is_empty() {
        String::new()
    } else {
        format!(" by ({})", labels.join(","))
    }
}

/// PromQL expression for one metric type
pub fn build_expr(
    metric: MetricType,
    filters: &MetricFilters,
    group_by: &[GroupDimension],
    raw_time: &str,
) -> String {
    let c = filters.matchers(|_| true);

    match metric {
        MetricType::StatusDist => format!(
            "sum(increase(apisix_http_status{}[{}])){} != 0",
            selector(&[], &c),
            raw_time,
            by_clause(&["code"], group_by)
        ),
        MetricType::FailureRequests => format!(
            "sum(increase(apisix_http_status{}[{}])){}",
            selector(&[r#"code=~"^[4-5]\\d\\d""#], &c),
            raw_time,
            by_clause(&[], group_by)
        ),
        MetricType::Requests => format!(
            "sum(increase(apisix_http_status{}[{}])){}",
            selector(&[], &c),
            raw_time,
            by_clause(&[], group_by)
        ),
        MetricType::Bandwidth => format!(
            "sum{} (rate(apisix_bandwidth{}[1m]))",
            by_clause(&["type"], group_by),
            selector(&[], &c)
        ),
        MetricType::Latency => {
            let sel = selector(&[r#"type="request""#], &c);
            format!(
                "sum(rate(apisix_http_latency_sum{sel}[1m]) / (1 + rate(apisix_http_latency_count{sel}[1m]))){}",
                by_clause(&[], group_by)
            )
        }
        MetricType::Connections => {
            let conn_filters = filters.matchers(|d| d.on_connections());
            let conn_group: Vec<GroupDimension> = group_by
                .iter()
                .copied()
                .filter(|d| d.on_connections())
                .collect();
            format!(
                "sum(apisix_nginx_http_current_connections{}){}",
                selector(&[], &conn_filters),
                by_clause(&["state"], &conn_group)
            )
        }
        MetricType::Qps => format!(
            "sum{} (rate(apisix_http_status{}[1m])) != 0",
            by_clause(&["code"], group_by),
            selector(&[], &c)
        ),
    }
}

/// `start`/`end`/`step` of a ranged query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeParams {
    pub start: String,
    pub end: String,
    pub step: String,
}

/// One Prometheus request for one metric type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricQuery {
    pub metric: MetricType,
    pub expr: String,
    /// Evaluation time of an instant query; Prometheus uses "now" when absent
    pub time: Option<String>,
    pub range: Option<RangeParams>,
}

impl MetricQuery {
    pub fn kind(&self) -> QueryKind {
        if self.range.is_some() {
            QueryKind::Range
        } else {
            QueryKind::Instant
        }
    }

    /// Request against the control plane's Prometheus proxy
    pub fn to_request(&self) -> ApiRequest {
        let endpoint = match self.kind() {
            QueryKind::Instant => PROMETHEUS_QUERY_PATH,
            QueryKind::Range => PROMETHEUS_QUERY_RANGE_PATH,
        };
        let req = ApiRequest::get(format!("{}{}", PROMETHEUS_PROXY_PATH, endpoint))
            .query("query", &self.expr)
            .query_opt("time", self.time.as_deref());

        match &self.range {
            Some(range) => req
                .query("start", &range.start)
                .query("end", &range.end)
                .query("step", &range.step),
            None => req,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gw() -> Vec<GroupDimension> {
        vec![GroupDimension::GatewayGroupId]
    }

    #[test]
    fn test_status_dist_expr() {
        let filters = MetricFilters {
            service_id: Some("svc1".to_string()),
            route_id: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(
            build_expr(MetricType::StatusDist, &filters, &gw(), "15m"),
            r#"sum(increase(apisix_http_status{service_id="svc1"}[15m])) by (code,gateway_group_id) != 0"#
        );
    }

    #[test]
    fn test_failure_expr_without_grouping() {
        let filters = MetricFilters {
            gateway_group_id: Some("default".to_string()),
            ..Default::default()
        };
        assert_eq!(
            build_expr(MetricType::FailureRequests, &filters, &[], "1h"),
            r#"sum(increase(apisix_http_status{code=~"^[4-5]\\d\\d",gateway_group_id="default"}[1h]))"#
        );
    }

    #[test]
    fn test_requests_expr_filter_order() {
        let filters = MetricFilters {
            service_id: Some("s".to_string()),
            route_id: Some("r".to_string()),
            instance_id: Some("i".to_string()),
            gateway_group_id: Some("g".to_string()),
        };
        assert_eq!(
            build_expr(MetricType::Requests, &filters, &gw(), "5m"),
            r#"sum(increase(apisix_http_status{service_id="s",route_id="r",instance_id="i",gateway_group_id="g"}[5m])) by (gateway_group_id)"#
        );
    }

    #[test]
    fn test_range_exprs() {
        let filters = MetricFilters::default();
        assert_eq!(
            build_expr(MetricType::Bandwidth, &filters, &gw(), "15m"),
            "sum by (type,gateway_group_id) (rate(apisix_bandwidth{}[1m]))"
        );
        assert_eq!(
            build_expr(MetricType::Latency, &filters, &[], "15m"),
            r#"sum(rate(apisix_http_latency_sum{type="request"}[1m]) / (1 + rate(apisix_http_latency_count{type="request"}[1m])))"#
        );
        assert_eq!(
            build_expr(MetricType::Qps, &filters, &[], "15m"),
            "sum by (code) (rate(apisix_http_status{}[1m])) != 0"
        );
    }

    #[test]
    fn test_connections_only_use_instance_and_group() {
        let filters = MetricFilters {
            service_id: Some("s".to_string()),
            instance_id: Some("i".to_string()),
            ..Default::default()
        };
        let group_by = vec![GroupDimension::RouteId, GroupDimension::GatewayGroupId];
        assert_eq!(
            build_expr(MetricType::Connections, &filters, &group_by, "15m"),
            r#"sum(apisix_nginx_http_current_connections{instance_id="i"}) by (state,gateway_group_id)"#
        );
    }

    #[test]
    fn test_label_values_are_escaped() {
        let filters = MetricFilters {
            route_id: Some(r#"a"b\c"#.to_string()),
            ..Default::default()
        };
        let expr = build_expr(MetricType::Requests, &filters, &[], "5m");
        assert!(expr.contains(r#"route_id="a\"b\\c""#));
    }

    #[test]
    fn test_validate_rejects_bad_ids() {
        let filters = MetricFilters {
            route_id: Some(r#"x"} or vector(1) #"#.to_string()),
            ..Default::default()
        };
        let err = filters.validate().unwrap_err();
        assert!(matches!(err, MetricsError::InvalidId { field: "route_id" }));
        assert!(MetricFilters::default().validate().is_ok());
    }

    #[test]
    fn test_to_request_instant_and_range() {
        let instant = MetricQuery {
            metric: MetricType::Requests,
            expr: "sum(x)".to_string(),
            time: None,
            range: None,
        };
        let req = instant.to_request();
        assert_eq!(req.path(), "/api/control_plane/prometheus/api/v1/query");
        assert_eq!(
            req.query_pairs(),
            &[("query".to_string(), "sum(x)".to_string())]
        );

        let ranged = MetricQuery {
            metric: MetricType::Qps,
            expr: "sum(y)".to_string(),
            time: None,
            range: Some(RangeParams {
                start: "s".to_string(),
                end: "e".to_string(),
                step: "15s".to_string(),
            }),
        };
        let req = ranged.to_request();
        assert_eq!(req.path(), "/api/control_plane/prometheus/api/v1/query_range");
        let keys: Vec<&str> = req.query_pairs().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["query", "start", "end", "step"]);
    }
}
