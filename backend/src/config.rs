//! Application configuration.
//!
//! Defaults live in constants. Secrets and the sheet location come from the
//! environment (or a `.env` file) and are only read by [`SourceConfig::from_env`];
//! the pipeline itself receives explicit config values.

use serde::{Deserialize, Serialize};
use std::env;

use crate::error::{SourceError, SourceResult};

/// Environment variable holding the spreadsheet URL (or bare sheet id).
pub const ENV_SHEET_URL: &str = "SALESBOARD_SHEET_URL";

/// Environment variable holding an optional OAuth bearer token.
pub const ENV_ACCESS_TOKEN: &str = "SALESBOARD_ACCESS_TOKEN";

/// Environment variable overriding the default server port.
pub const ENV_PORT: &str = "SALESBOARD_PORT";

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 3000;

/// Maximum CSV upload size (in bytes).
///
/// 20 MB limit.
pub const MAX_UPLOAD_SIZE: usize = 20 * 1024 * 1024;

/// Measure column summed by every aggregate.
pub const MEASURE_COLUMN: &str = "sales";

/// Categorical columns with a grouped sum.
pub const GROUP_COLUMNS: [&str; 4] = ["city", "region", "category", "sub_category"];

/// Columns the pipeline refuses to run without.
pub const REQUIRED_COLUMNS: [&str; 3] = ["order_date", "sales", "discount"];

/// Where the Spreadsheet Reader fetches from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Full sheet URL (`https://docs.google.com/spreadsheets/d/<id>/...`) or bare id.
    pub sheet_url: String,
    /// Bearer token for private sheets.
    #[serde(default, skip_serializing)]
    pub access_token: Option<String>,
    /// Worksheet gid; first worksheet when absent.
    #[serde(default)]
    pub gid: Option<String>,
}

impl SourceConfig {
    pub fn new(sheet_url: impl Into<String>) -> Self {
        Self {
            sheet_url: sheet_url.into(),
            access_token: None,
            gid: None,
        }
    }

    /// Load from `SALESBOARD_SHEET_URL` / `SALESBOARD_ACCESS_TOKEN`.
    pub fn from_env() -> SourceResult<Self> {
        // Try loading .env file
        let _ = dotenvy::dotenv();

        let sheet_url = env::var(ENV_SHEET_URL)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| SourceError::MissingConfig(format!("{} not set", ENV_SHEET_URL)))?;

        let access_token = env::var(ENV_ACCESS_TOKEN)
            .ok()
            .filter(|v| !v.trim().is_empty());

        Ok(Self {
            sheet_url,
            access_token,
            gid: None,
        })
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn with_gid(mut self, gid: impl Into<String>) -> Self {
        self.gid = Some(gid.into());
        self
    }
}

/// Column roles for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Measure column (after normalization).
    pub measure: String,
    /// Grouping columns (after normalization).
    pub group_columns: Vec<String>,
    /// Columns checked before any row is processed.
    pub required_columns: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            measure: MEASURE_COLUMN.to_string(),
            group_columns: GROUP_COLUMNS.iter().map(|c| c.to_string()).collect(),
            required_columns: REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Port from `SALESBOARD_PORT`, falling back to [`DEFAULT_PORT`].
pub fn port_from_env() -> u16 {
    env::var(ENV_PORT)
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT)
}
