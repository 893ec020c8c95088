//! Time utility functions

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::core::constants::SAMPLE_TIME_FORMAT;

/// Render a Prometheus sample timestamp (fractional epoch seconds) in `tz`
///
/// Returns `None` for non-finite or out-of-range input.
pub fn format_sample_time(secs: f64, tz: &Tz) -> Option<String> {
    if !secs.is_finite() {
        return None;
    }
    let millis = (secs * 1000.0).round();
    if millis.abs() > i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp_millis(millis as i64)
        .map(|dt| dt.with_timezone(tz).format(SAMPLE_TIME_FORMAT).to_string())
}

/// Render unix seconds in `tz`, or an empty string when out of range
pub fn format_unix(secs: i64, tz: &Tz) -> String {
    DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.with_timezone(tz).format(SAMPLE_TIME_FORMAT).to_string())
        .unwrap_or_default()
}

/// Parse an RFC 3339 timestamp into UTC
pub fn parse_iso_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(ts.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
