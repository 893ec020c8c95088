//! Metric query planning and concurrent dispatch

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use futures::future::join_all;

use crate::core::constants::DEFAULT_RAW_TIME;
use crate::data::control_plane::ControlPlaneClient;
use crate::data::prometheus::{PrometheusResponse, PrometheusSeries};
use crate::utils::time::parse_iso_timestamp;

use super::error::MetricsError;
use super::format::MetricsReport;
use super::metric_type::{GroupDimension, MetricType, QueryKind};
use super::process::{self, error_entry};
use super::query::{MetricFilters, MetricQuery, RangeParams, build_expr};
use super::time_range::{TimeWindow, calculate_time_range, resolve_step};

/// Arguments of one metrics request
#[derive(Debug, Clone)]
pub struct MetricsRequest {
    pub types: Vec<MetricType>,
    pub raw_time: String,
    pub step: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub filters: MetricFilters,
    pub group_by: Vec<GroupDimension>,
}

impl Default for MetricsRequest {
    fn default() -> Self {
        Self {
            types: Vec::new(),
            raw_time: DEFAULT_RAW_TIME.to_string(),
            step: None,
            start: None,
            end: None,
            filters: MetricFilters::default(),
            group_by: vec![GroupDimension::GatewayGroupId],
        }
    }
}

#[derive(Clone)]
pub struct MetricsService {
    client: ControlPlaneClient,
    tz: Tz,
}

impl MetricsService {
    pub fn new(client: ControlPlaneClient, tz: Tz) -> Self {
        Self { client, tz }
    }

    /// Validate the request and build one query per distinct metric type
    pub fn plan(
        &self,
        req: &MetricsRequest,
        now: DateTime<Utc>,
    ) -> Result<Vec<MetricQuery>, MetricsError> {
        let mut types: Vec<MetricType> = Vec::with_capacity(req.types.len());
        for t in &req.types {
            if !types.contains(t) {
                types.push(*t);
            }
        }
        if types.is_empty() {
            return Err(MetricsError::NoMetricTypes);
        }

        req.filters.validate()?;

        // raw_time is embedded in range selectors, so it must be well-formed
        // even when start/end are given explicitly
        let relative = calculate_time_range(&req.raw_time, now)
            .ok_or_else(|| MetricsError::InvalidDuration(req.raw_time.clone()))?;

        let start = parse_override(req.start.as_deref())?;
        let end = parse_override(req.end.as_deref())?;
        let window = TimeWindow {
            start: start.unwrap_or(relative.start),
            end: end.unwrap_or(relative.end),
        };
        if window.start >= window.end {
            return Err(MetricsError::InvalidWindow {
                start: window.start_iso(),
                end: window.end_iso(),
            });
        }

        let mut group_by: Vec<GroupDimension> = Vec::with_capacity(req.group_by.len());
        for d in &req.group_by {
            if !group_by.contains(d) {
                group_by.push(*d);
            }
        }

        let step = resolve_step(&req.raw_time, &window, req.step.as_deref());
        let time = end.map(|_| window.end_iso());

        Ok(types
            .into_iter()
            .map(|metric| {
                let expr = build_expr(metric, &req.filters, &group_by, &req.raw_time);
                match metric.query_kind() {
                    QueryKind::Instant => MetricQuery {
                        metric,
                        expr,
                        time: time.clone(),
                        range: None,
                    },
                    QueryKind::Range => MetricQuery {
                        metric,
                        expr,
                        time: None,
                        range: Some(RangeParams {
                            start: window.start_iso(),
                            end: window.end_iso(),
                            step: step.clone(),
                        }),
                    },
                }
            })
            .collect())
    }

    /// Run every query concurrently and assemble results in request order
    ///
    /// A failed fetch becomes an error entry for its type; siblings still complete.
    pub async fn collect(
        &self,
        req: &MetricsRequest,
        now: DateTime<Utc>,
    ) -> Result<MetricsReport, MetricsError> {
        let queries = self.plan(req, now)?;
        tracing::debug!(
            types = ?queries.iter().map(|q| q.metric.as_str()).collect::<Vec<_>>(),
            raw_time = %req.raw_time,
            "Dispatching metric queries"
        );

        let results = join_all(queries.iter().map(|q| self.run_query(q))).await;

        let mut report = MetricsReport::new(req.types.len() > 1);
        for (query, result) in queries.iter().zip(results) {
            match result {
                Ok(series) => {
                    let (value, ok) = process::shape(query.metric, &series, &self.tz);
                    if ok {
                        report.push(query.metric, value);
                    } else {
                        report.push_failed(query.metric, value);
                    }
                }
                Err(e) => {
                    tracing::error!(metric = %query.metric, error = %e, "Error fetching metric");
                    report.push_failed(query.metric, error_entry("Error fetching metric", query.metric, &e));
                }
            }
        }
        Ok(report)
    }

    async fn run_query(&self, query: &MetricQuery) -> Result<Vec<PrometheusSeries>, MetricsError> {
        let response: PrometheusResponse = self.client.fetch(&query.to_request()).await?;
        let series = response.into_series()?;
        tracing::debug!(metric = %query.metric, series = series.len(), "Metric query completed");
        Ok(series)
    }
}

fn parse_override(value: Option<&str>) -> Result<Option<DateTime<Utc>>, MetricsError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => parse_iso_timestamp(v)
            .map(Some)
            .ok_or_else(|| MetricsError::InvalidTimestamp(v.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use chrono::TimeZone;
    use httpmock::prelude::*;
    use serde_json::json;

    use crate::core::config::ControlPlaneConfig;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 10, 3, 4, 0).unwrap()
    }

    fn service(address: String) -> MetricsService {
        let client = ControlPlaneClient::new(&ControlPlaneConfig {
            address: address.clone(),
            token: Some("t".to_string()),
            dashboard_url: address,
            timeout: Duration::from_secs(5),
            accept_invalid_certs: false,
        })
        .unwrap();
        MetricsService::new(client, Tz::UTC)
    }

    fn request(types: Vec<MetricType>) -> MetricsRequest {
        MetricsRequest {
            types,
            ..Default::default()
        }
    }

    #[test]
    fn test_plan_dedupes_and_keeps_order() {
        let svc = service("http://localhost:1".to_string());
        let queries = svc
            .plan(
                &request(vec![MetricType::Qps, MetricType::Requests, MetricType::Qps]),
                now(),
            )
            .unwrap();
        let metrics: Vec<MetricType> = queries.iter().map(|q| q.metric).collect();
        assert_eq!(metrics, vec![MetricType::Qps, MetricType::Requests]);
    }

    #[test]
    fn test_plan_range_params() {
        let svc = service("http://localhost:1".to_string());
        let req = MetricsRequest {
            raw_time: "6h".to_string(),
            ..request(vec![MetricType::Bandwidth, MetricType::Requests])
        };
        let queries = svc.plan(&req, now()).unwrap();

        let range = queries[0].range.as_ref().unwrap();
        assert_eq!(range.start, "2025-04-09T21:04:00.000Z");
        assert_eq!(range.end, "2025-04-10T03:04:00.000Z");
        assert_eq!(range.step, "84s");
        assert!(queries[1].range.is_none());
        assert!(queries[1].time.is_none());
        assert!(queries[1].expr.contains("[6h]"));
    }

    #[test]
    fn test_plan_explicit_window() {
        let svc = service("http://localhost:1".to_string());
        let req = MetricsRequest {
            start: Some("2025-04-10T02:34:00.878Z".to_string()),
            end: Some("2025-04-10T03:04:00.878Z".to_string()),
            ..request(vec![MetricType::Latency, MetricType::Requests])
        };
        let queries = svc.plan(&req, now()).unwrap();
        let range = queries[0].range.as_ref().unwrap();
        assert_eq!(range.start, "2025-04-10T02:34:00.878Z");
        assert_eq!(range.end, "2025-04-10T03:04:00.878Z");
        assert_eq!(queries[1].time.as_deref(), Some("2025-04-10T03:04:00.878Z"));
    }

    #[test]
    fn test_plan_rejects_bad_input() {
        let svc = service("http://localhost:1".to_string());

        let req = MetricsRequest {
            raw_time: "15 minutes".to_string(),
            ..request(vec![MetricType::Requests])
        };
        assert!(matches!(
            svc.plan(&req, now()),
            Err(MetricsError::InvalidDuration(_))
        ));

        let req = MetricsRequest {
            start: Some("last tuesday".to_string()),
            ..request(vec![MetricType::Requests])
        };
        assert!(matches!(
            svc.plan(&req, now()),
            Err(MetricsError::InvalidTimestamp(_))
        ));

        let req = MetricsRequest {
            start: Some("2025-04-11T00:00:00Z".to_string()),
            ..request(vec![MetricType::Qps])
        };
        assert!(matches!(
            svc.plan(&req, now()),
            Err(MetricsError::InvalidWindow { .. })
        ));

        assert!(matches!(
            svc.plan(&request(vec![]), now()),
            Err(MetricsError::NoMetricTypes)
        ));
    }

    #[tokio::test]
    async fn test_collect_partial_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/control_plane/prometheus/api/v1/query");
                then.status(200).json_body(json!({
                    "status": "success",
                    "data": {
                        "resultType": "vector",
                        "result": [
                            {"metric": {"gateway_group_id": "default"}, "value": [1744254240, "42"]}
                        ]
                    }
                }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/control_plane/prometheus/api/v1/query_range");
                then.status(502).body("bad gateway");
            })
            .await;

        let svc = service(server.base_url());
        let report = svc
            .collect(&request(vec![MetricType::Requests, MetricType::Qps]), now())
            .await
            .unwrap();
        assert!(!report.all_failed());

        let value = report.into_value();
        assert_eq!(
            value["api-requests"],
            json!({"gateway_group:default": {"2025-04-10 03:04:00": 42}})
        );
        assert_eq!(value["api-qps"]["error"], "Error fetching metric api-qps");
        assert!(value["api-qps"]["message"].as_str().unwrap().contains("502"));
    }

    #[tokio::test]
    async fn test_collect_duplicate_types_stay_keyed() {
        let server = MockServer::start_async().await;
        let m = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/control_plane/prometheus/api/v1/query");
                then.status(200).json_body(json!({
                    "status": "success",
                    "data": {
                        "resultType": "vector",
                        "result": [{"metric": {}, "value": [1744254240, "42"]}]
                    }
                }));
            })
            .await;

        let svc = service(server.base_url());
        let report = svc
            .collect(
                &request(vec![MetricType::Requests, MetricType::Requests]),
                now(),
            )
            .await
            .unwrap();

        m.assert_hits_async(1).await;
        assert_eq!(
            report.into_value(),
            json!({"api-requests": {"all-resources": {"2025-04-10 03:04:00": 42}}})
        );
    }

    #[tokio::test]
    async fn test_collect_prometheus_error_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/control_plane/prometheus/api/v1/query");
                then.status(200).json_body(json!({
                    "status": "error",
                    "errorType": "bad_data",
                    "error": "parse error"
                }));
            })
            .await;

        let svc = service(server.base_url());
        let report = svc
            .collect(&request(vec![MetricType::StatusDist]), now())
            .await
            .unwrap();
        assert!(report.all_failed());
        let value = report.into_value();
        assert_eq!(value["error"], "Error fetching metric api-status-dist");
    }
}
