//! REST API types for dashboard clients.
//!
//! Every successful pipeline run is answered with a [`DashboardResponse`];
//! failures use [`error_response`] so clients can rely on the same envelope.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::transform::clean::CleanReport;
use crate::transform::dashboard::Dashboard;
use crate::transform::pipeline::{format_delimiter, PipelineRun, SourceInfo};

/// Response sent after a pipeline run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    /// Unique run identifier
    pub job_id: String,

    /// "ready" or "warning" (rows were dropped)
    pub status: String,

    /// Payload for the chart renderer
    pub dashboard: Dashboard,

    /// Cleaned rows, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<Vec<Value>>,

    pub metadata: ResponseMetadata,
}

/// Metadata about the run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub source: SourceMetadata,
    pub cleaning: CleanReport,
    pub measure: String,
}

/// Source file metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMetadata {
    pub origin: String,
    pub encoding: String,
    pub delimiter: String,
    pub row_count: usize,
    pub columns: Vec<String>,
}

impl From<SourceInfo> for SourceMetadata {
    fn from(info: SourceInfo) -> Self {
        Self {
            origin: info.origin,
            encoding: info.encoding,
            delimiter: format_delimiter(info.delimiter),
            row_count: info.row_count,
            columns: info.headers,
        }
    }
}

impl DashboardResponse {
    pub fn new(info: SourceInfo, run: &PipelineRun, include_records: bool) -> Self {
        let dropped = run.report.duplicate_rows + run.report.invalid_date_rows;

        Self {
            job_id: Uuid::new_v4().to_string(),
            status: if dropped == 0 { "ready" } else { "warning" }.to_string(),
            dashboard: run.dashboard(),
            records: include_records.then(|| run.table.to_json_records()),
            metadata: ResponseMetadata {
                source: info.into(),
                cleaning: run.report.clone(),
                measure: run.summary.measure.clone(),
            },
        }
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
        "dashboard": null,
        "metadata": null
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::transform::pipeline::run_bytes;

    const CSV: &str = "Order Date,City,Region,Category,Sub Category,Sales,Discount\n\
                       2024-01-02,Paris,North,Food,Dairy,12.5,0.2\n\
                       2024-01-02,Paris,North,Food,Dairy,12.5,0.2\n";

    #[test]
    fn test_response_from_run() {
        let (info, run) = run_bytes(CSV.as_bytes(), &PipelineConfig::default()).unwrap();
        let response = DashboardResponse::new(info, &run, false);

        assert_eq!(response.status, "warning");
        assert_eq!(response.metadata.cleaning.duplicate_rows, 1);
        assert_eq!(response.metadata.source.delimiter, ",");
        assert!(response.records.is_none());

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("records").is_none());
        assert_eq!(json["dashboard"]["metrics"][0]["display"], "12.50");
    }

    #[test]
    fn test_error_response() {
        let v = error_response("boom");
        assert_eq!(v["status"], "error");
        assert_eq!(v["error"], "boom");
    }
}
