use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrometheusError {
    #[error("Prometheus query failed ({error_type}): {error}")]
    QueryFailed { error_type: String, error: String },

    #[error("Unexpected result type: expected {expected}, got {actual}")]
    UnexpectedResult {
        expected: &'static str,
        actual: String,
    },

    #[error("Malformed result: {0}")]
    Malformed(String),
}

/// Envelope of `/api/v1/query` and `/api/v1/query_range`
#[derive(Debug, Clone, Deserialize)]
pub struct PrometheusResponse {
    pub status: String,
    #[serde(default)]
    pub data: Option<QueryData>,
    #[serde(default, rename = "errorType")]
    pub error_type: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryData {
    #[serde(rename = "resultType")]
    pub result_type: String,
    #[serde(default)]
    pub result: Value,
}

/// One `[timestamp, "value"]` pair
#[derive(Debug, Clone, Deserialize)]
pub struct Sample(pub Value, pub Value);

impl Sample {
    /// Epoch seconds; Prometheus sends a float, some proxies a string
    pub fn timestamp(&self) -> Option<f64> {
        as_f64(&self.0)
    }

    /// Sample value, `None` when it is not numeric
    pub fn value(&self) -> Option<f64> {
        as_f64(&self.1)
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

/// A vector (`value`) or matrix (`values`) series
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PrometheusSeries {
    #[serde(default)]
    pub metric: HashMap<String, String>,
    #[serde(default)]
    pub value: Option<Sample>,
    #[serde(default)]
    pub values: Option<Vec<Sample>>,
}

impl PrometheusSeries {
    /// All samples of the series, regardless of query kind
    pub fn samples(&self) -> impl Iterator<Item = &Sample> {
        self.value.iter().chain(self.values.iter().flatten())
    }

    pub fn label(&self, name: &str) -> Option<&str> {
        self.metric.get(name).map(String::as_str)
    }
}

impl PrometheusResponse {
    /// Series of a successful `vector` or `matrix` result
    pub fn into_series(self) -> Result<Vec<PrometheusSeries>, PrometheusError> {
        if self.status != "success" {
            return Err(PrometheusError::QueryFailed {
                error_type: self.error_type.unwrap_or_else(|| self.status.clone()),
                error: self.error.unwrap_or_default(),
            });
        }

        let Some(data) = self.data else {
            return Ok(Vec::new());
        };

        match data.result_type.as_str() {
            "vector" | "matrix" => {
                if data.result.is_null() {
                    return Ok(Vec::new());
                }
                serde_json::from_value(data.result)
                    .map_err(|e| PrometheusError::Malformed(e.to_string()))
            }
            other => Err(PrometheusError::UnexpectedResult {
                expected: "vector or matrix",
                actual: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(body: Value) -> PrometheusResponse {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_vector_result() {
        let resp = parse(json!({
            "status": "success",
            "data": {
                "resultType": "vector",
                "result": [
                    {"metric": {"code": "200"}, "value": [1704067200.5, "12"]}
                ]
            }
        }));
        let series = resp.into_series().unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].label("code"), Some("200"));
        let samples: Vec<_> = series[0].samples().collect();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].timestamp(), Some(1704067200.5));
        assert_eq!(samples[0].value(), Some(12.0));
    }

    #[test]
    fn test_matrix_result() {
        let resp = parse(json!({
            "status": "success",
            "data": {
                "resultType": "matrix",
                "result": [
                    {"metric": {}, "values": [[1, "1"], [2, "NaN"], ["3", "x"]]}
                ]
            }
        }));
        let series = resp.into_series().unwrap();
        let values: Vec<_> = series[0].samples().map(|s| s.value()).collect();
        assert_eq!(values, vec![Some(1.0), None, None]);
        assert_eq!(series[0].samples().nth(2).unwrap().timestamp(), Some(3.0));
    }

    #[test]
    fn test_error_status() {
        let resp = parse(json!({
            "status": "error",
            "errorType": "bad_data",
            "error": "parse error at char 5"
        }));
        let err = resp.into_series().unwrap_err();
        assert!(matches!(err, PrometheusError::QueryFailed { ref error_type, .. } if error_type == "bad_data"));
    }

    #[test]
    fn test_scalar_rejected() {
        let resp = parse(json!({
            "status": "success",
            "data": {"resultType": "scalar", "result": [1, "1"]}
        }));
        assert!(matches!(
            resp.into_series(),
            Err(PrometheusError::UnexpectedResult { .. })
        ));
    }
}
