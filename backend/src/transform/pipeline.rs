//! High-level pipeline API: raw table → clean table → summary.
//!
//! One run is one synchronous pass: schema check, cleaning, aggregation.
//! Any error aborts the run; there are no partial results.
//!
//! # Example
//!
//! ```rust,ignore
//! use salesboard::{run_source, CsvFileSource, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = CsvFileSource::new("sales.csv");
//!     let (_, run) = run_source(&source, &PipelineConfig::default()).await?;
//!
//!     println!("Total revenue: {}", run.summary.metrics.total);
//!     Ok(())
//! }
//! ```

use serde::Serialize;
use serde_json::{json, Value};

use super::aggregate::summarize;
use super::clean::{clean, normalize_column_name, CleanReport};
use super::dashboard::{build_dashboard, Dashboard};
use crate::api::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::config::PipelineConfig;
use crate::error::{CleanError, CleanResult, PipelineResult};
use crate::models::{CleanTable, RawTable, Summary};
use crate::parser::{parse_bytes_auto, ParsedSheet};
use crate::source::SheetSource;

/// Where the raw table came from.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceInfo {
    pub origin: String,
    pub encoding: String,
    pub delimiter: char,
    pub headers: Vec<String>,
    pub row_count: usize,
}

/// Result of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub table: CleanTable,
    pub report: CleanReport,
    pub summary: Summary,
}

impl PipelineRun {
    /// Dashboard payload for the chart renderer.
    pub fn dashboard(&self) -> Dashboard {
        build_dashboard(&self.table, &self.summary)
    }

    /// Clean table, report and summary as one JSON document.
    pub fn to_json(&self) -> Value {
        json!({
            "report": self.report,
            "summary": self.summary,
            "records": self.table.to_json_records(),
        })
    }
}

/// Fail before any row work if a required column is absent after normalization.
pub fn check_schema(raw: &RawTable, required: &[String]) -> CleanResult<()> {
    let normalized: Vec<String> = raw.headers.iter().map(|h| normalize_column_name(h)).collect();

    match required.iter().find(|c| !normalized.contains(c)) {
        Some(missing) => Err(CleanError::MissingColumn(missing.clone())),
        None => Ok(()),
    }
}

/// Run the cleaning and aggregation stages on an in-memory table.
pub fn run(raw: &RawTable, config: &PipelineConfig) -> PipelineResult<PipelineRun> {
    log_info("🔎 Checking columns...");
    check_schema(raw, &config.required_columns)?;
    log_success(format!("{} columns, {} rows", raw.headers.len(), raw.len()));

    log_info("🧹 Cleaning...");
    let output = clean(raw)?;
    print_clean_report(&output.report);

    log_info("📊 Aggregating...");
    let summary = summarize(&output.table, &config.measure, &config.group_columns)?;
    log_success(format!(
        "Total {}: {:.2} over {} rows",
        config.measure, summary.metrics.total, summary.metrics.row_count
    ));
    for group in &summary.grouped {
        log_info_indent(format!("{}: {} groups", group.column, group.summary.len()), 1);
    }
    log_info_indent(format!("order_date: {} dates", summary.time_series.len()), 1);

    Ok(PipelineRun {
        table: output.table,
        report: output.report,
        summary,
    })
}

/// Parse CSV bytes (auto-detected encoding and delimiter), then run.
pub fn run_bytes(bytes: &[u8], config: &PipelineConfig) -> PipelineResult<(SourceInfo, PipelineRun)> {
    let sheet = parse_bytes_auto(bytes)?;
    let info = source_info("upload", &sheet);
    let run = run(&sheet.table, config)?;
    Ok((info, run))
}

/// Fetch from a source, then run.
pub async fn run_source<S: SheetSource>(
    source: &S,
    config: &PipelineConfig,
) -> PipelineResult<(SourceInfo, PipelineRun)> {
    log_info(format!("📖 Reading {}...", source.describe()));
    let sheet = source.fetch().await?;
    let info = source_info(&source.describe(), &sheet);
    log_success(format!(
        "Detected encoding {} and separator '{}'",
        info.encoding,
        format_delimiter(info.delimiter)
    ));

    let run = run(&sheet.table, config)?;
    Ok((info, run))
}

fn source_info(origin: &str, sheet: &ParsedSheet) -> SourceInfo {
    SourceInfo {
        origin: origin.to_string(),
        encoding: sheet.encoding.clone(),
        delimiter: sheet.delimiter,
        headers: sheet.table.headers.clone(),
        row_count: sheet.table.len(),
    }
}

/// Format delimiter for display
pub fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "TAB".to_string(),
        c => c.to_string(),
    }
}

fn print_clean_report(report: &CleanReport) {
    log_success(format!("{} clean rows", report.output_rows));
    if report.duplicate_rows > 0 {
        log_warning(format!("{} duplicate rows removed", report.duplicate_rows));
    }
    if report.invalid_date_rows > 0 {
        log_warning(format!("{} rows without a valid order_date dropped", report.invalid_date_rows));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AggregateError, PipelineError};
    use serde_json::json;

    fn example_raw() -> RawTable {
        RawTable::from_json_records(&[
            json!({"city": "A", "region": "R", "category": "C", "sub_category": "S",
                   "sales": 10, "order_date": "2024-01-01", "discount": 0.1}),
            json!({"city": "B", "region": "R", "category": "C", "sub_category": "S",
                   "sales": 5, "order_date": "bad-date", "discount": 0}),
            json!({"city": "A", "region": "R", "category": "C", "sub_category": "S",
                   "sales": 10, "order_date": "2024-01-01", "discount": 0.1}),
        ])
    }

    #[test]
    fn test_example_run() {
        let run = run(&example_raw(), &PipelineConfig::default()).unwrap();

        assert_eq!(run.table.len(), 1);
        assert!((run.table.rows[0].discount_pct.unwrap() - 10.0).abs() < 1e-9);
        let by_city = run.summary.grouped("city").unwrap();
        assert_eq!(by_city.len(), 1);
        assert_eq!(by_city.get(&"A".to_string()), Some(10.0));
        assert_eq!(run.summary.metrics.total, 10.0);
    }

    #[test]
    fn test_schema_check_before_rows() {
        let raw = RawTable::from_json_records(&[json!({"Order Date": "2024-01-01", "Sales": 1})]);
        let err = run(&raw, &PipelineConfig::default()).unwrap_err();
        assert!(matches!(err, PipelineError::Clean(CleanError::MissingColumn(c)) if c == "discount"));
    }

    #[test]
    fn test_schema_check_uses_normalized_names() {
        let raw = RawTable::new(
            vec![" Order Date".into(), "SALES".into(), "Discount ".into()],
            vec![],
        );
        assert!(check_schema(&raw, &PipelineConfig::default().required_columns).is_ok());
    }

    #[test]
    fn test_missing_group_column_aborts() {
        let raw = RawTable::from_json_records(&[
            json!({"order_date": "2024-01-01", "sales": 1, "discount": 0}),
        ]);
        let err = run(&raw, &PipelineConfig::default()).unwrap_err();
        assert!(matches!(err, PipelineError::Aggregate(AggregateError::MissingColumn(_))));
    }

    #[test]
    fn test_run_bytes() {
        let csv = "Order Date,City,Region,Category,Sub Category,Sales,Discount\n\
                   2024-01-02,Paris,North,Food,Dairy,12.5,0.2\n\
                   2024-01-01,Lyon,East,Home,Decor,7.5,0\n\
                   not a date,Nice,South,Home,Decor,100,0\n";
        let (info, run) = run_bytes(csv.as_bytes(), &PipelineConfig::default()).unwrap();

        assert_eq!(info.row_count, 3);
        assert_eq!(info.delimiter, ',');
        assert_eq!(run.table.len(), 2);
        assert_eq!(run.summary.metrics.total, 20.0);
        assert_eq!(run.summary.metrics.mean, Some(10.0));

        let dates: Vec<String> = run.summary.time_series.keys().map(|d| d.to_string()).collect();
        assert_eq!(dates, vec!["2024-01-01", "2024-01-02"]);
    }

    #[test]
    fn test_to_json_shape() {
        let run = run(&example_raw(), &PipelineConfig::default()).unwrap();
        let v = run.to_json();

        assert_eq!(v["records"][0]["order_date"], "2024-01-01");
        assert_eq!(v["records"][0]["month"], "January");
        assert_eq!(v["records"][0]["year"], 2024);
        assert_eq!(v["summary"]["metrics"]["total"], 10.0);
        assert_eq!(v["report"]["duplicateRows"], 1);
    }

    #[test]
    fn test_format_delimiter() {
        assert_eq!(format_delimiter('\t'), "TAB");
        assert_eq!(format_delimiter(';'), ";");
    }
}
