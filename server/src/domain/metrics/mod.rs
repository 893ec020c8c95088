//! Gateway metrics pipeline
//!
//! Duration spec -> time window and step -> one PromQL query per metric type ->
//! raw series -> grouped, zero-filtered, compressed series -> formatted report.

mod error;
mod format;
mod metric_type;
mod process;
mod query;
mod service;
mod time_range;

pub use error::MetricsError;
pub use format::MetricsReport;
pub use metric_type::{GroupDimension, MetricType, QueryKind};
pub use process::{Series, compress, group_key, process};
pub use query::{MetricFilters, MetricQuery, RangeParams, build_expr};
pub use service::{MetricsRequest, MetricsService};
pub use time_range::{
    DurationSpec, TimeWindow, calculate_time_range, calculate_time_step, parse_step_seconds,
    resolve_step,
};
