//! Transformation module.
//!
//! - Dates: loose calendar-date parsing
//! - Clean: column normalization, de-duplication, date validation
//! - Aggregate: scalar metrics, grouped sums, time series
//! - Dashboard: payload for the chart renderer
//! - Pipeline: one-shot orchestration

pub mod aggregate;
pub mod clean;
pub mod dashboard;
pub mod dates;
pub mod pipeline;

pub use aggregate::{grouped_sum, scalar_metrics, summarize, time_series};
pub use clean::{clean, normalize_column_name, normalize_headers, CleanOutput, CleanReport};
pub use dashboard::{build_dashboard, format_thousands, Dashboard};
pub use dates::{month_name, parse_date, parse_date_str};
pub use pipeline::{check_schema, run, run_bytes, run_source, PipelineRun, SourceInfo};
