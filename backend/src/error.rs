//! Error types for the Salesboard pipeline.
//!
//! One enum per layer:
//!
//! - [`CsvError`] - CSV decoding and parsing errors
//! - [`SourceError`] - Spreadsheet source configuration and fetch errors
//! - [`CleanError`] - Cleaning stage errors (schema check, column collisions)
//! - [`AggregateError`] - Aggregation stage errors
//! - [`PipelineError`] - Top-level orchestration errors
//! - [`ServerError`] - HTTP server errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// CSV Parsing Errors
// =============================================================================

/// Errors during CSV parsing.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to decode bytes with the detected encoding.
    #[error("Failed to decode content as {encoding}: {message}")]
    EncodingError { encoding: String, message: String },

    /// Malformed CSV record.
    #[error("Line {line}: {message}")]
    ParseError { line: usize, message: String },

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in CSV")]
    NoHeaders,
}

// =============================================================================
// Source Errors
// =============================================================================

/// Errors from the spreadsheet source collaborators.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Required configuration value is missing.
    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    /// Sheet URL could not be turned into an export URL.
    #[error("Invalid sheet URL: {0}")]
    InvalidUrl(String),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Remote answered with a non-success status.
    #[error("Sheet request returned status {status}: {message}")]
    BadStatus { status: u16, message: String },

    /// Downloaded content is not a parseable table.
    #[error("Sheet content error: {0}")]
    Csv(#[from] CsvError),
}

// =============================================================================
// Cleaning Errors
// =============================================================================

/// Errors during the cleaning stage.
#[derive(Debug, Error)]
pub enum CleanError {
    /// Required column absent after normalization.
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// Two source columns normalize to the same name.
    #[error("Columns '{first}' and '{second}' both normalize to '{normalized}'")]
    ColumnCollision {
        first: String,
        second: String,
        normalized: String,
    },
}

// =============================================================================
// Aggregation Errors
// =============================================================================

/// Errors during the aggregation stage.
#[derive(Debug, Error)]
pub enum AggregateError {
    /// Grouping or measure column absent from the clean table.
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// Measure cell holds text that is not a number.
    #[error("Non-numeric value '{value}' in column '{column}' (row {row})")]
    NonNumeric {
        row: usize,
        column: String,
        value: String,
    },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the main error type returned by [`crate::transform::pipeline::run`].
/// It wraps all lower-level errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// CSV parsing error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Source error.
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Cleaning error.
    #[error("Clean error: {0}")]
    Clean(#[from] CleanError),

    /// Aggregation error.
    #[error("Aggregate error: {0}")]
    Aggregate(#[from] AggregateError),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Failed to bind or serve.
    #[error("Server IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for source operations.
pub type SourceResult<T> = Result<T, SourceError>;

/// Result type for cleaning operations.
pub type CleanResult<T> = Result<T, CleanError>;

/// Result type for aggregation operations.
pub type AggregateResult<T> = Result<T, AggregateError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // CsvError -> PipelineError
        let csv_err = CsvError::EmptyFile;
        let pipeline_err: PipelineError = csv_err.into();
        assert!(pipeline_err.to_string().contains("empty"));

        // CleanError -> PipelineError
        let clean_err = CleanError::MissingColumn("order_date".into());
        let pipeline_err: PipelineError = clean_err.into();
        assert!(pipeline_err.to_string().contains("order_date"));

        // CsvError -> SourceError -> PipelineError
        let source_err: SourceError = CsvError::NoHeaders.into();
        let pipeline_err: PipelineError = source_err.into();
        assert!(pipeline_err.to_string().contains("headers"));
    }

    #[test]
    fn test_collision_error_format() {
        let err = CleanError::ColumnCollision {
            first: "City".into(),
            second: " city ".into(),
            normalized: "city".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("'City'"));
        assert!(msg.contains("'city'"));
    }

    #[test]
    fn test_non_numeric_format() {
        let err = AggregateError::NonNumeric {
            row: 3,
            column: "sales".into(),
            value: "n/a".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("n/a"));
        assert!(msg.contains("row 3"));
    }
}
