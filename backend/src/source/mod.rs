//! Spreadsheet sources.
//!
//! A [`SheetSource`] delivers one [`ParsedSheet`] per pipeline run. Two
//! implementations are provided:
//!
//! - [`CsvFileSource`] - local CSV export
//! - [`GoogleSheetSource`] - Google Sheets CSV export endpoint over HTTP
//!
//! Sources get their configuration at construction time; nothing here reads
//! the environment.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::PathBuf;

use crate::config::SourceConfig;
use crate::error::{SourceError, SourceResult};
use crate::parser::{parse_bytes_auto, ParsedSheet};

static SHEET_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/spreadsheets/d/([A-Za-z0-9_-]+)").expect("valid sheet id pattern")
});

static BARE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{10,}$").expect("valid bare id pattern"));

static GID: Lazy<Regex> = Lazy::new(|| Regex::new(r"[#?&]gid=(\d+)").expect("valid gid pattern"));

/// Anything that can hand the pipeline a raw table.
#[allow(async_fn_in_trait)]
pub trait SheetSource {
    /// Human-readable origin, used in logs.
    fn describe(&self) -> String;

    /// Fetch and parse the whole sheet.
    async fn fetch(&self) -> SourceResult<ParsedSheet>;
}

/// Local CSV file.
#[derive(Debug, Clone)]
pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SheetSource for CsvFileSource {
    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }

    async fn fetch(&self) -> SourceResult<ParsedSheet> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| SourceError::Csv(e.into()))?;
        Ok(parse_bytes_auto(&bytes)?)
    }
}

/// Google Sheets worksheet fetched through its CSV export endpoint.
#[derive(Debug, Clone)]
pub struct GoogleSheetSource {
    config: SourceConfig,
    client: reqwest::Client,
}

impl GoogleSheetSource {
    pub fn new(config: SourceConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// CSV export URL for the configured sheet.
    pub fn export_url(&self) -> SourceResult<String> {
        export_url(&self.config)
    }
}

impl SheetSource for GoogleSheetSource {
    fn describe(&self) -> String {
        format!("sheet {}", self.config.sheet_url)
    }

    async fn fetch(&self) -> SourceResult<ParsedSheet> {
        let url = self.export_url()?;

        let mut request = self.client.get(&url);
        if let Some(ref token) = self.config.access_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SourceError::HttpError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::BadStatus {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SourceError::HttpError(e.to_string()))?;

        Ok(parse_bytes_auto(&bytes)?)
    }
}

/// Build the CSV export URL from a sheet URL or bare id.
///
/// The worksheet gid comes from the config first, then from the URL.
pub fn export_url(config: &SourceConfig) -> SourceResult<String> {
    let raw = config.sheet_url.trim();

    let id = SHEET_ID
        .captures(raw)
        .map(|c| c[1].to_string())
        .or_else(|| BARE_ID.is_match(raw).then(|| raw.to_string()))
        .ok_or_else(|| SourceError::InvalidUrl(raw.to_string()))?;

    let gid = config
        .gid
        .clone()
        .or_else(|| GID.captures(raw).map(|c| c[1].to_string()));

    let mut url = format!("https://docs.google.com/spreadsheets/d/{}/export?format=csv", id);
    if let Some(gid) = gid {
        url.push_str("&gid=");
        url.push_str(&gid);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SHEET: &str = "1E-r-5RQSWYt1hKc_7WUlGVtbAGh8AAIisb2sbWBNTpk";

    #[test]
    fn test_export_url_from_full_url() {
        let config = SourceConfig::new(format!("https://docs.google.com/spreadsheets/d/{}/edit#gid=7", SHEET));
        assert_eq!(
            export_url(&config).unwrap(),
            format!("https://docs.google.com/spreadsheets/d/{}/export?format=csv&gid=7", SHEET)
        );
    }

    #[test]
    fn test_export_url_from_bare_id() {
        let config = SourceConfig::new(SHEET).with_gid("0");
        assert!(export_url(&config).unwrap().ends_with("/export?format=csv&gid=0"));
    }

    #[test]
    fn test_export_url_rejects_garbage() {
        let config = SourceConfig::new("not a sheet");
        assert!(matches!(export_url(&config), Err(SourceError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_csv_file_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Order Date,City,Sales").unwrap();
        writeln!(file, "2024-01-01,Paris,10").unwrap();

        let source = CsvFileSource::new(file.path());
        let sheet = source.fetch().await.unwrap();
        assert_eq!(sheet.table.len(), 1);
        assert!(source.describe().starts_with("file "));
    }

    #[tokio::test]
    async fn test_csv_file_source_missing_file() {
        let source = CsvFileSource::new("/definitely/not/here.csv");
        assert!(matches!(source.fetch().await, Err(SourceError::Csv(_))));
    }
}
