//! Series post-processing: zero filtering, grouping, shaping and compression

use std::collections::{BTreeMap, HashMap};

use chrono_tz::Tz;
use serde_json::{Map, Value, json};

use crate::core::constants::ALL_RESOURCES_GROUP;
use crate::data::prometheus::PrometheusSeries;
use crate::utils::number::{json_number, round2};
use crate::utils::time::format_sample_time;

use super::error::MetricsError;
use super::metric_type::{GroupDimension, MetricType};

/// Formatted timestamp -> value, ordered by time
pub type Series = BTreeMap<String, f64>;

/// Keep only the points where the value changes, plus the end of each run
///
/// Series with two or fewer points are returned unchanged.
pub fn compress(series: &Series) -> Series {
    if series.len() <= 2 {
        return series.clone();
    }

    let mut points = series.iter();
    let Some((first_time, first_value)) = points.next() else {
        return Series::new();
    };

    let mut out = Series::new();
    out.insert(first_time.clone(), *first_value);

    let mut current = *first_value;
    let mut run_start = first_time;
    let mut last = first_time;

    for (time, value) in points {
        if *value != current {
            if last != run_start {
                out.insert(last.clone(), current);
            }
            out.insert(time.clone(), *value);
            current = *value;
            run_start = time;
        }
        last = time;
    }

    if last != run_start {
        out.insert(last.clone(), current);
    }
    out
}

/// `service:<id> route:<id> instance:<id> gateway_group:<id>` for the labels present
pub fn group_key(labels: &HashMap<String, String>) -> String {
    let parts: Vec<String> = GroupDimension::KEY_ORDER
        .iter()
        .filter_map(|dim| {
            labels
                .get(dim.label())
                .filter(|v| !v.is_empty())
                .map(|v| format!("{}:{}", dim.key_prefix(), v))
        })
        .collect();

    if parts.is_empty() {
        ALL_RESOURCES_GROUP.to_string()
    } else {
        parts.join(" ")
    }
}

/// Groups and their sub-series in first-seen order
#[derive(Default)]
struct Grouped {
    groups: Vec<(String, Vec<(String, Series)>)>,
}

impl Grouped {
    fn entry(&mut self, group: &str, sub: &str) -> &mut Series {
        let gi = match self.groups.iter().position(|(g, _)| g == group) {
            Some(i) => i,
            None => {
                self.groups.push((group.to_string(), Vec::new()));
                self.groups.len() - 1
            }
        };
        let subs = &mut self.groups[gi].1;
        let si = match subs.iter().position(|(s, _)| s == sub) {
            Some(i) => i,
            None => {
                subs.push((sub.to_string(), Series::new()));
                subs.len() - 1
            }
        };
        &mut subs[si].1
    }

    fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

fn series_value(series: &Series) -> Value {
    Value::Object(
        series
            .iter()
            .map(|(time, value)| (time.clone(), json_number(*value)))
            .collect(),
    )
}

fn collect(
    metric: MetricType,
    raw: &[PrometheusSeries],
    tz: &Tz,
) -> Result<Grouped, MetricsError> {
    let mut grouped = Grouped::default();

    for series in raw {
        let group = group_key(&series.metric);
        let sub = match metric.sub_label() {
            Some((label, prefix)) => format!(
                "{}{}",
                prefix,
                series.label(label).filter(|v| !v.is_empty()).unwrap_or("unknown")
            ),
            None => String::new(),
        };

        for sample in series.samples() {
            let Some(value) = sample.value() else {
                continue;
            };
            let value = if metric.is_count() {
                value.round()
            } else {
                round2(value)
            };
            if value == 0.0 {
                continue;
            }

            let ts = sample.timestamp().ok_or(MetricsError::InvalidSample(f64::NAN))?;
            let time = format_sample_time(ts, tz).ok_or(MetricsError::InvalidSample(ts))?;
            grouped.entry(&group, &sub).insert(time, value);
        }
    }

    Ok(grouped)
}

fn render(metric: MetricType, grouped: Grouped) -> Map<String, Value> {
    let mut result = Map::new();

    for (group, subs) in grouped.groups {
        let rendered = match metric {
            MetricType::StatusDist => {
                let codes: BTreeMap<String, Series> = subs
                    .into_iter()
                    .map(|(code, series)| (code, compress(&series)))
                    .collect();
                let sums: Vec<(String, f64, Series)> = codes
                    .into_iter()
                    .map(|(code, series)| {
                        let sum = series.values().sum::<f64>();
                        (code, sum, series)
                    })
                    .collect();
                let total: f64 = sums.iter().map(|(_, sum, _)| sum).sum();
                if total <= 0.0 {
                    continue;
                }
                let map: Map<String, Value> = sums
                    .into_iter()
                    .map(|(code, sum, series)| {
                        let percent = round2(sum / total * 100.0);
                        (
                            code,
                            json!({ "count": series_value(&series), "percent": json_number(percent) }),
                        )
                    })
                    .collect();
                Value::Object(map)
            }
            MetricType::FailureRequests | MetricType::Requests => {
                let mut merged = Series::new();
                for (_, series) in subs {
                    merged.extend(series);
                }
                series_value(&compress(&merged))
            }
            MetricType::Latency => {
                let mut merged = Series::new();
                for (_, series) in subs {
                    merged.extend(series);
                }
                json!({ "latency": series_value(&compress(&merged)) })
            }
            MetricType::Bandwidth | MetricType::Connections | MetricType::Qps => Value::Object(
                subs.into_iter()
                    .map(|(sub, series)| (sub, series_value(&compress(&series))))
                    .collect(),
            ),
        };
        result.insert(group, rendered);
    }

    result
}

/// Processed result for one metric type, or an error
pub fn process(
    metric: MetricType,
    raw: &[PrometheusSeries],
    tz: &Tz,
) -> Result<Value, MetricsError> {
    let grouped = collect(metric, raw, tz)?;
    let result = if grouped.is_empty() {
        Map::new()
    } else {
        render(metric, grouped)
    };

    if result.is_empty() {
        return Ok(no_data(metric));
    }
    Ok(Value::Object(result))
}

/// Like [`process`], but a shaping failure becomes an inline error object
pub fn shape(metric: MetricType, raw: &[PrometheusSeries], tz: &Tz) -> (Value, bool) {
    match process(metric, raw, tz) {
        Ok(value) => (value, true),
        Err(e) => {
            tracing::error!(metric = %metric, error = %e, "Error processing metric");
            (error_entry("Error processing metric", metric, &e), false)
        }
    }
}

pub fn no_data(metric: MetricType) -> Value {
    json!({ "no_data": true, "message": metric.no_data_message() })
}

pub fn error_entry(what: &str, metric: MetricType, err: &MetricsError) -> Value {
    json!({ "error": format!("{} {}", what, metric), "message": err.to_string() })
}
