//! Time-range resolution: duration specs, absolute windows and sampling steps

use std::sync::OnceLock;

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};

use crate::core::constants::{DEFAULT_STEP, MAX_DATA_POINTS};

/// Steps for common ranges, tuned for the dashboard charts
const STEP_TABLE: [(&str, &str); 10] = [
    ("5m", "15s"),
    ("15m", "15s"),
    ("30m", "15s"),
    ("1h", "15s"),
    ("6h", "84s"),
    ("12h", "168s"),
    ("24h", "504s"),
    ("1d", "504s"),
    ("7d", "1800s"),
    ("10d", "3600s"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationUnit {
    Minutes,
    Hours,
    Days,
}

impl DurationUnit {
    fn seconds(&self) -> u64 {
        match self {
            DurationUnit::Minutes => 60,
            DurationUnit::Hours => 60 * 60,
            DurationUnit::Days => 24 * 60 * 60,
        }
    }
}

/// `<integer><m|h|d>`, e.g. `15m`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationSpec {
    pub amount: u64,
    pub unit: DurationUnit,
}

impl DurationSpec {
    pub fn parse(raw: &str) -> Option<Self> {
        static RE_DURATION: OnceLock<regex::Regex> = OnceLock::new();
        let re = RE_DURATION
            .get_or_init(|| regex::Regex::new(r"^(\d+)([mhd])$").expect("Invalid regex"));

        let caps = re.captures(raw)?;
        let amount = caps[1].parse::<u64>().ok()?;
        let unit = match &caps[2] {
            "m" => DurationUnit::Minutes,
            "h" => DurationUnit::Hours,
            "d" => DurationUnit::Days,
            _ => return None,
        };
        Some(Self { amount, unit })
    }

    /// Span in seconds, `None` on overflow
    pub fn total_seconds(&self) -> Option<u64> {
        self.amount.checked_mul(self.unit.seconds())
    }

    fn to_delta(self) -> Option<TimeDelta> {
        self.total_seconds()
            .and_then(|s| i64::try_from(s).ok())
            .and_then(TimeDelta::try_seconds)
    }
}

/// Absolute query window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn start_iso(&self) -> String {
        self.start.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn end_iso(&self) -> String {
        self.end.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Window length in whole seconds (zero when inverted)
    pub fn seconds(&self) -> u64 {
        u64::try_from((self.end - self.start).num_seconds()).unwrap_or(0)
    }
}

/// Window ending at `now` and spanning `raw`; `None` for a malformed spec
pub fn calculate_time_range(raw: &str, now: DateTime<Utc>) -> Option<TimeWindow> {
    let delta = DurationSpec::parse(raw)?.to_delta()?;
    let start = now.checked_sub_signed(delta)?;
    Some(TimeWindow { start, end: now })
}

/// Table step for a common range
pub fn step_lookup(raw: &str) -> Option<&'static str> {
    STEP_TABLE
        .iter()
        .find(|(range, _)| *range == raw)
        .map(|(_, step)| *step)
}

/// Smallest ladder step that keeps `total_seconds / step` within the point budget
pub fn step_for_seconds(total_seconds: u64) -> String {
    let min_step = total_seconds.div_ceil(MAX_DATA_POINTS);

    let step = match min_step {
        0..=15 => "15s",
        16..=30 => "30s",
        31..=60 => "60s",
        61..=120 => "2m",
        121..=300 => "5m",
        301..=600 => "10m",
        601..=1800 => "30m",
        1801..=3600 => "1h",
        _ => return format!("{}h", min_step.div_ceil(3600)),
    };
    step.to_string()
}

/// Sampling step for a duration spec: table entry, else the computed ladder step
pub fn calculate_time_step(raw: &str) -> String {
    if let Some(step) = step_lookup(raw) {
        return step.to_string();
    }
    DurationSpec::parse(raw)
        .and_then(|d| d.total_seconds())
        .map(step_for_seconds)
        .unwrap_or_else(|| DEFAULT_STEP.to_string())
}

/// Seconds in a Prometheus step such as `15s`, `2m`, `1h` or a bare `30`
pub fn parse_step_seconds(step: &str) -> Option<u64> {
    static RE_STEP: OnceLock<regex::Regex> = OnceLock::new();
    let re = RE_STEP.get_or_init(|| regex::Regex::new(r"^(\d+)([smhd]?)$").expect("Invalid regex"));

    let caps = re.captures(step.trim())?;
    let amount = caps[1].parse::<u64>().ok()?;
    let unit = match &caps[2] {
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        _ => return None,
    };
    amount.checked_mul(unit)
}

/// Step for a ranged query over `window`
///
/// The table entry for `raw_time` wins when the window spans exactly `raw_time`,
/// then a caller-supplied step that stays within the point budget, then the
/// computed ladder step.
pub fn resolve_step(raw_time: &str, window: &TimeWindow, requested: Option<&str>) -> String {
    let window_secs = window.seconds();
    let raw_span = DurationSpec::parse(raw_time).and_then(|d| d.total_seconds());

    let spans_raw_time = raw_span == Some(window_secs);

    if spans_raw_time && step_lookup(raw_time).is_some() {
        return calculate_time_step(raw_time);
    }

    let computed = if spans_raw_time {
        calculate_time_step(raw_time)
    } else {
        step_for_seconds(window_secs)
    };
    if let Some(requested) = requested.filter(|s| !s.trim().is_empty()) {
        let within_budget = parse_step_seconds(requested)
            .filter(|s| *s > 0)
            .and_then(|s| s.checked_mul(MAX_DATA_POINTS))
            .is_some_and(|max_span| window_secs <= max_span);
        if within_budget {
            return requested.trim().to_string();
        }
        tracing::warn!(
            requested = %requested,
            computed = %computed,
            window_secs,
            "Requested step exceeds the point budget or is malformed, using computed step"
        );
    }
    computed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 10, 3, 4, 0).unwrap()
    }

    #[test]
    fn test_duration_spec_parse() {
        assert_eq!(
            DurationSpec::parse("15m"),
            Some(DurationSpec {
                amount: 15,
                unit: DurationUnit::Minutes
            })
        );
        assert_eq!(DurationSpec::parse("7d").unwrap().total_seconds(), Some(604_800));
        assert!(DurationSpec::parse("15").is_none());
        assert!(DurationSpec::parse("1w").is_none());
        assert!(DurationSpec::parse("-5m").is_none());
        assert!(DurationSpec::parse(" 5m").is_none());
        assert!(DurationSpec::parse("1.5h").is_none());
    }

    #[test]
    fn test_calculate_time_range_six_hours() {
        let window = calculate_time_range("6h", now()).unwrap();
        assert_eq!(window.end, now());
        assert_eq!(window.end - window.start, TimeDelta::hours(6));
        assert_eq!(window.start_iso(), "2025-04-09T21:04:00.000Z");
        assert_eq!(window.end_iso(), "2025-04-10T03:04:00.000Z");
    }

    #[test]
    fn test_calculate_time_range_malformed() {
        assert!(calculate_time_range("yesterday", now()).is_none());
        assert!(calculate_time_range("99999999999999999999d", now()).is_none());
    }

    #[test]
    fn test_step_table() {
        assert_eq!(calculate_time_step("6h"), "84s");
        assert_eq!(calculate_time_step("5m"), "15s");
        assert_eq!(calculate_time_step("24h"), "504s");
        assert_eq!(calculate_time_step("10d"), "3600s");
    }

    #[test]
    fn test_step_ladder() {
        // 2h / 5000 rounds up to 2s
        assert_eq!(calculate_time_step("2h"), "15s");
        // 3d = 259200s -> 52s
        assert_eq!(calculate_time_step("3d"), "60s");
        // 30d = 2592000s -> 519s
        assert_eq!(calculate_time_step("30d"), "10m");
        // 400d -> 6912s -> 2h
        assert_eq!(calculate_time_step("400d"), "2h");
        assert_eq!(calculate_time_step("bogus"), "15s");
    }

    #[test]
    fn test_step_budget_holds() {
        for raw in ["1m", "5m", "6h", "12h", "1d", "7d", "10d", "45d", "90d", "365d", "1000d"] {
            let total = DurationSpec::parse(raw).unwrap().total_seconds().unwrap();
            let step = parse_step_seconds(&calculate_time_step(raw)).unwrap();
            assert!(
                total / step <= MAX_DATA_POINTS,
                "{raw}: {total}s / {step}s exceeds budget"
            );
        }
    }

    #[test]
    fn test_parse_step_seconds() {
        assert_eq!(parse_step_seconds("15s"), Some(15));
        assert_eq!(parse_step_seconds("2m"), Some(120));
        assert_eq!(parse_step_seconds("1h"), Some(3600));
        assert_eq!(parse_step_seconds("30"), Some(30));
        assert_eq!(parse_step_seconds("1h30m"), None);
    }

    #[test]
    fn test_resolve_step_prefers_table() {
        let window = calculate_time_range("6h", now()).unwrap();
        assert_eq!(resolve_step("6h", &window, Some("1s")), "84s");
    }

    #[test]
    fn test_resolve_step_accepts_in_budget_override() {
        let window = calculate_time_range("3h", now()).unwrap();
        assert_eq!(resolve_step("3h", &window, Some("30s")), "30s");
        assert_eq!(resolve_step("3h", &window, None), "15s");
    }

    #[test]
    fn test_resolve_step_replaces_over_budget_override() {
        let window = calculate_time_range("30d", now()).unwrap();
        assert_eq!(resolve_step("30d", &window, Some("15s")), "10m");
        assert_eq!(resolve_step("30d", &window, Some("fast")), "10m");
    }

    #[test]
    fn test_resolve_step_relative_window_uses_time_step() {
        for raw in ["5m", "6h", "3d", "30d", "400d"] {
            let window = calculate_time_range(raw, now()).unwrap();
            assert_eq!(resolve_step(raw, &window, None), calculate_time_step(raw), "{raw}");
        }
    }

    #[test]
    fn test_resolve_step_uses_explicit_window() {
        // 15m raw_time, but an explicit 2-day window
        let window = TimeWindow {
            start: now() - TimeDelta::days(2),
            end: now(),
        };
        assert_eq!(resolve_step("15m", &window, None), "60s");
    }
}
