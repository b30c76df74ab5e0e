//! # Salesboard - spreadsheet sales cleaning and aggregation
//!
//! Salesboard pulls a sales sheet (Google Sheets export or local CSV),
//! cleans it and computes the aggregates behind a sales dashboard.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Sheet / CSV │────▶│   Parser    │────▶│    Clean    │────▶│  Aggregate  │──▶ Dashboard JSON
//! │  (source)   │     │  (auto-enc) │     │ (dedup/date)│     │ (sums/mean) │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use salesboard::{run_source, CsvFileSource, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let source = CsvFileSource::new("sales.csv");
//!     let (_, run) = run_source(&source, &PipelineConfig::default()).await.unwrap();
//!     println!("{} clean rows", run.table.len());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types per layer
//! - [`config`] - Source and pipeline configuration
//! - [`models`] - Cells, raw/clean tables, aggregates
//! - [`parser`] - CSV parsing with auto-detection
//! - [`source`] - Spreadsheet sources
//! - [`transform`] - Cleaning, aggregation, dashboard, pipeline
//! - [`api`] - HTTP API server

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Input
pub mod parser;
pub mod source;

// Transformation
pub mod transform;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Errors
// =============================================================================

pub use error::{
    AggregateError, CleanError, CsvError, PipelineError, ServerError, SourceError,
};

// =============================================================================
// Re-exports - Config & Models
// =============================================================================

pub use config::{PipelineConfig, SourceConfig};

pub use models::{
    AggregateSummary, CellValue, CleanRecord, CleanTable, Metrics, RawTable, Summary,
    SummaryEntry,
};

// =============================================================================
// Re-exports - Parsing & Sources
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, parse_bytes_auto, parse_csv_file_auto,
    parse_csv_str, ParsedSheet,
};

pub use source::{CsvFileSource, GoogleSheetSource, SheetSource};

// =============================================================================
// Re-exports - Transform
// =============================================================================

pub use transform::{
    build_dashboard, check_schema, clean, grouped_sum, run, run_bytes, run_source,
    scalar_metrics, summarize, time_series, CleanOutput, CleanReport, Dashboard, PipelineRun,
    SourceInfo,
};

// Server
pub mod server {
    pub use crate::api::server::{router, start_server, AppState};
}
