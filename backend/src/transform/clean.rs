//! Cleaning stage: [`RawTable`] → [`CleanTable`].
//!
//! ```text
//! headers ──normalize──▶ drop duplicates ──▶ parse order_date ──▶ derive month/year/day
//!                                              (drop bad rows)      derive discount_pct
//! ```
//!
//! Duplicate and bad-date rows are removed silently; only the
//! [`CleanReport`] counters record them.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use super::dates::{month_name, parse_date};
use crate::error::{CleanError, CleanResult};
use crate::models::{CellKey, CellValue, CleanRecord, CleanTable, RawTable};
use chrono::Datelike;

/// Column holding the order date.
pub const DATE_COLUMN: &str = "order_date";

/// Column holding the discount ratio.
pub const DISCOUNT_COLUMN: &str = "discount";

/// Counters describing what the cleaning stage removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanReport {
    pub input_rows: usize,
    pub duplicate_rows: usize,
    pub invalid_date_rows: usize,
    pub output_rows: usize,
}

/// Clean table plus the counters of the pass that produced it.
#[derive(Debug, Clone)]
pub struct CleanOutput {
    pub table: CleanTable,
    pub report: CleanReport,
}

/// Normalize a column name: trim, lowercase, spaces → underscores.
pub fn normalize_column_name(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

/// Normalize every header, failing if two headers end up identical.
pub fn normalize_headers(headers: &[String]) -> CleanResult<Vec<String>> {
    let mut seen: HashMap<String, &str> = HashMap::new();
    let mut normalized = Vec::with_capacity(headers.len());

    for header in headers {
        let name = normalize_column_name(header);
        if let Some(first) = seen.get(&name) {
            return Err(CleanError::ColumnCollision {
                first: first.to_string(),
                second: header.clone(),
                normalized: name,
            });
        }
        seen.insert(name.clone(), header);
        normalized.push(name);
    }

    Ok(normalized)
}

/// Run the cleaning stage.
///
/// Fails only on schema problems: a header collision or a missing
/// `order_date` column.
pub fn clean(raw: &RawTable) -> CleanResult<CleanOutput> {
    let normalized = normalize_headers(&raw.headers)?;
    let has_discount = normalized.iter().any(|c| c == DISCOUNT_COLUMN);

    // Input columns that collide with derived ones are replaced by the derived values
    let kept: Vec<usize> = normalized
        .iter()
        .enumerate()
        .filter(|(_, name)| !is_derived(name, has_discount))
        .map(|(i, _)| i)
        .collect();
    let columns: Vec<String> = kept.iter().map(|&i| normalized[i].clone()).collect();

    let date_idx = columns
        .iter()
        .position(|c| c == DATE_COLUMN)
        .ok_or_else(|| CleanError::MissingColumn(DATE_COLUMN.to_string()))?;
    let discount_idx = columns.iter().position(|c| c == DISCOUNT_COLUMN);

    let mut report = CleanReport {
        input_rows: raw.len(),
        ..CleanReport::default()
    };
    let mut seen: HashSet<Vec<CellKey>> = HashSet::with_capacity(raw.len());
    let mut rows = Vec::new();
    let empty = CellValue::Empty;

    for raw_row in &raw.rows {
        // Duplicates compare every input column, including those replaced below
        let key: Vec<CellKey> = (0..normalized.len())
            .map(|i| raw_row.get(i).unwrap_or(&empty).dedup_key())
            .collect();
        if !seen.insert(key) {
            report.duplicate_rows += 1;
            continue;
        }

        let values: Vec<CellValue> = kept
            .iter()
            .map(|&i| raw_row.get(i).cloned().unwrap_or(CellValue::Empty))
            .collect();

        let Some(order_date) = parse_date(&values[date_idx]) else {
            report.invalid_date_rows += 1;
            continue;
        };

        let discount_pct = discount_idx
            .and_then(|i| values[i].as_f64())
            .map(|d| d * 100.0);

        rows.push(CleanRecord {
            order_date,
            month: month_name(order_date).to_string(),
            year: order_date.year(),
            day: order_date.day(),
            discount_pct,
            values,
        });
    }

    report.output_rows = rows.len();

    Ok(CleanOutput {
        table: CleanTable {
            columns,
            rows,
            has_discount,
        },
        report,
    })
}

fn is_derived(name: &str, has_discount: bool) -> bool {
    match name {
        "month" | "year" | "day" => true,
        "discount_pct" => has_discount,
        _ => false,
    }
}
