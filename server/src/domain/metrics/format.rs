//! Presentation of processed metric results

use serde_json::{Map, Value};

use super::metric_type::MetricType;

/// Per-type results in request order
#[derive(Debug, Default)]
pub struct MetricsReport {
    entries: Vec<(MetricType, Value)>,
    failed: usize,
    keyed: bool,
}

impl MetricsReport {
    /// `keyed` when the caller asked for more than one type, duplicates included
    pub fn new(keyed: bool) -> Self {
        Self {
            keyed,
            ..Self::default()
        }
    }

    pub fn push(&mut self, metric: MetricType, value: Value) {
        self.entries.push((metric, value));
    }

    /// Record an `{error, message}` entry
    pub fn push_failed(&mut self, metric: MetricType, value: Value) {
        self.failed += 1;
        self.entries.push((metric, value));
    }

    /// Every requested type ended in an error entry
    pub fn all_failed(&self) -> bool {
        !self.entries.is_empty() && self.failed == self.entries.len()
    }

    /// A single requested type is emitted as-is; otherwise results are keyed by type name
    pub fn into_value(self) -> Value {
        if !self.keyed {
            return self
                .entries
                .into_iter()
                .next()
                .map(|(_, value)| value)
                .unwrap_or(Value::Null);
        }
        Value::Object(
            self.entries
                .into_iter()
                .map(|(metric, value)| (metric.as_str().to_string(), value))
                .collect::<Map<String, Value>>(),
        )
    }

    pub fn into_text(self) -> String {
        let value = self.into_value();
        serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_type_is_unwrapped() {
        let mut report = MetricsReport::new(false);
        report.push(MetricType::Requests, json!({"all-resources": {"t": 1}}));
        assert_eq!(report.into_value(), json!({"all-resources": {"t": 1}}));
    }

    #[test]
    fn test_multiple_types_keyed_in_request_order() {
        let mut report = MetricsReport::new(true);
        report.push(MetricType::Qps, json!({"no_data": true}));
        report.push(MetricType::Requests, json!({"a": 1}));
        let value = report.into_value();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["api-qps", "api-requests"]);
    }

    #[test]
    fn test_keyed_report_with_one_entry_keeps_wrapper() {
        let mut report = MetricsReport::new(true);
        report.push(MetricType::Requests, json!({"all-resources": {"t": 1}}));
        assert_eq!(
            report.into_value(),
            json!({"api-requests": {"all-resources": {"t": 1}}})
        );
    }

    #[test]
    fn test_all_failed() {
        let mut report = MetricsReport::new(true);
        assert!(!report.all_failed());
        report.push_failed(MetricType::Qps, json!({"error": "x"}));
        assert!(report.all_failed());
        report.push(MetricType::Requests, json!({}));
        assert!(!report.all_failed());
    }

    #[test]
    fn test_into_text_pretty() {
        let mut report = MetricsReport::new(false);
        report.push(MetricType::Latency, json!({"no_data": true}));
        assert_eq!(report.into_text(), "{\n  \"no_data\": true\n}");
    }
}
