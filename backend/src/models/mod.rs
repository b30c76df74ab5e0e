//! Domain models for the Salesboard pipeline.
//!
//! This module contains the core data structures passed between stages:
//!
//! - [`CellValue`] - Loosely-typed spreadsheet scalar (empty, number, text)
//! - [`RawTable`] - Header row + rows exactly as received from the source
//! - [`CleanRecord`] / [`CleanTable`] - Normalized, de-duplicated, date-validated rows
//! - [`AggregateSummary`] - Ordered key → sum mapping
//! - [`Metrics`] / [`Summary`] - Scalar metrics and the named aggregate set

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

/// Columns derived by the cleaning stage. Input columns with these names are
/// replaced by the derived values.
pub const DERIVED_COLUMNS: [&str; 4] = ["month", "year", "day", "discount_pct"];

// =============================================================================
// Cell Values
// =============================================================================

/// A single spreadsheet cell.
///
/// Serializes untagged: `null`, a JSON number, or a JSON string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Blank cell.
    Empty,
    /// Numeric cell.
    Number(f64),
    /// Anything else.
    Text(String),
}

impl CellValue {
    /// Coerce a raw text cell the way spreadsheet clients do:
    /// blank → `Empty`, finite number → `Number`, otherwise `Text`.
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => CellValue::Number(n),
            _ => CellValue::Text(trimmed.to_string()),
        }
    }

    /// Convert a JSON scalar. Booleans become text, nested values are
    /// rendered as their JSON text.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => CellValue::Empty,
            Value::Number(n) => n
                .as_f64()
                .filter(|f| f.is_finite())
                .map(CellValue::Number)
                .unwrap_or(CellValue::Empty),
            Value::String(s) => CellValue::from_raw(s),
            Value::Bool(b) => CellValue::Text(b.to_string()),
            other => CellValue::Text(other.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Numeric view of the cell. Text is accepted when it parses as a finite number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            CellValue::Empty => None,
        }
    }

    /// Grouping key for the cell. Integral numbers drop the trailing `.0`,
    /// blanks group under `""`.
    pub fn as_key(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Text(s) => s.clone(),
        }
    }

    /// Hashable identity used for duplicate detection.
    pub fn dedup_key(&self) -> CellKey {
        match self {
            CellValue::Empty => CellKey::Empty,
            // -0.0 and 0.0 compare equal as values
            CellValue::Number(n) if *n == 0.0 => CellKey::Number(0f64.to_bits()),
            CellValue::Number(n) => CellKey::Number(n.to_bits()),
            CellValue::Text(s) => CellKey::Text(s.clone()),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            CellValue::Empty => Value::Null,
            CellValue::Number(n) => json!(n),
            CellValue::Text(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_key())
    }
}

/// Hashable counterpart of [`CellValue`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CellKey {
    Empty,
    Number(u64),
    Text(String),
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

// =============================================================================
// Raw Table
// =============================================================================

/// Rectangular table as delivered by a spreadsheet source.
///
/// Every row has exactly `headers.len()` cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    /// Column names as received (untrimmed, any case).
    pub headers: Vec<String>,
    /// Cells aligned with `headers`.
    pub rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    /// Build a table, padding short rows with `Empty` and dropping extra cells.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, CellValue::Empty);
                row
            })
            .collect();
        Self { headers, rows }
    }

    /// Build a table from a list of JSON objects (one per row).
    ///
    /// Headers are the union of keys in first-seen order; keys missing from a
    /// row become `Empty`. Non-object entries are skipped.
    pub fn from_json_records(records: &[Value]) -> Self {
        let mut headers: Vec<String> = Vec::new();
        for record in records {
            if let Some(obj) = record.as_object() {
                for key in obj.keys() {
                    if !headers.iter().any(|h| h == key) {
                        headers.push(key.clone());
                    }
                }
            }
        }

        let rows = records
            .iter()
            .filter_map(|r| r.as_object())
            .map(|obj| {
                headers
                    .iter()
                    .map(|h| obj.get(h).map(CellValue::from_json).unwrap_or(CellValue::Empty))
                    .collect()
            })
            .collect();

        Self { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a header, compared exactly.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Rows as JSON objects keyed by header.
    pub fn to_json_records(&self) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| {
                let obj: Map<String, Value> = self
                    .headers
                    .iter()
                    .zip(row)
                    .map(|(h, c)| (h.clone(), c.to_json()))
                    .collect();
                Value::Object(obj)
            })
            .collect()
    }
}

// =============================================================================
// Clean Table
// =============================================================================

/// One cleaned row.
///
/// `values` keeps the source cells (aligned with [`CleanTable::columns`]),
/// including the raw `order_date` cell; the typed fields are derived from them.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanRecord {
    pub order_date: NaiveDate,
    /// English month name of `order_date`.
    pub month: String,
    pub year: i32,
    pub day: u32,
    /// `discount * 100`; `None` when the table has no discount column or the
    /// cell is blank/non-numeric.
    pub discount_pct: Option<f64>,
    pub values: Vec<CellValue>,
}

/// De-duplicated, date-validated table with normalized column names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanTable {
    /// Normalized source column names, derived columns excluded.
    pub columns: Vec<String>,
    pub rows: Vec<CleanRecord>,
    /// Whether the source carried a `discount` column.
    pub has_discount: bool,
}

impl CleanTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cell of `record` in column `name`, if the column exists.
    pub fn cell<'a>(&self, record: &'a CleanRecord, name: &str) -> Option<&'a CellValue> {
        self.column_index(name).and_then(|i| record.values.get(i))
    }

    /// Convert back to a raw table (source columns + derived columns), e.g.
    /// to run the cleaning stage again.
    pub fn to_raw(&self) -> RawTable {
        let mut headers = self.columns.clone();
        headers.extend(self.derived_columns().iter().map(|c| c.to_string()));

        let rows = self
            .rows
            .iter()
            .map(|r| {
                let mut row = r.values.clone();
                row.push(CellValue::Text(r.month.clone()));
                row.push(CellValue::Number(r.year as f64));
                row.push(CellValue::Number(r.day as f64));
                if self.has_discount {
                    row.push(r.discount_pct.map(CellValue::Number).unwrap_or(CellValue::Empty));
                }
                row
            })
            .collect();

        RawTable { headers, rows }
    }

    /// Rows as JSON objects: source columns with `order_date` rendered as an
    /// ISO date, followed by the derived columns.
    pub fn to_json_records(&self) -> Vec<Value> {
        let date_idx = self.column_index("order_date");
        self.rows
            .iter()
            .map(|r| {
                let mut obj = Map::new();
                for (i, (col, cell)) in self.columns.iter().zip(&r.values).enumerate() {
                    let value = if Some(i) == date_idx {
                        json!(r.order_date.format("%Y-%m-%d").to_string())
                    } else {
                        cell.to_json()
                    };
                    obj.insert(col.clone(), value);
                }
                obj.insert("month".to_string(), json!(r.month));
                obj.insert("year".to_string(), json!(r.year));
                obj.insert("day".to_string(), json!(r.day));
                if self.has_discount {
                    obj.insert("discount_pct".to_string(), json!(r.discount_pct));
                }
                Value::Object(obj)
            })
            .collect()
    }

    fn derived_columns(&self) -> &'static [&'static str] {
        if self.has_discount {
            &DERIVED_COLUMNS
        } else {
            &DERIVED_COLUMNS[..3]
        }
    }
}

// =============================================================================
// Aggregates
// =============================================================================

/// One `key → value` pair of an aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryEntry<K> {
    pub key: K,
    pub value: f64,
}

/// Ordered mapping from grouping key to the sum of a measure column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateSummary<K> {
    pub entries: Vec<SummaryEntry<K>>,
}

impl<K> Default for AggregateSummary<K> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<K: PartialEq> AggregateSummary<K> {
    pub fn new(entries: Vec<SummaryEntry<K>>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value for `key`, if the group exists.
    pub fn get(&self, key: &K) -> Option<f64> {
        self.entries.iter().find(|e| &e.key == key).map(|e| e.value)
    }

    /// Sum of all group values.
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|e| e.value).sum()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|e| &e.key)
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.iter().map(|e| e.value)
    }
}

/// Scalar metrics over the measure column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    /// Sum of the measure; blanks contribute 0.
    pub total: f64,
    /// Mean over non-blank cells; `None` when there are none.
    pub mean: Option<f64>,
    /// Rows in the clean table.
    pub row_count: usize,
    /// Rows with a non-blank measure.
    pub measured_count: usize,
}

/// Grouped sum for one categorical column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedSummary {
    pub column: String,
    pub summary: AggregateSummary<String>,
}

/// The named aggregate set produced by the aggregation stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub measure: String,
    pub metrics: Metrics,
    pub grouped: Vec<GroupedSummary>,
    pub time_series: AggregateSummary<NaiveDate>,
}

impl Summary {
    /// Grouped sum for `column`, if it was requested.
    pub fn grouped(&self, column: &str) -> Option<&AggregateSummary<String>> {
        self.grouped
            .iter()
            .find(|g| g.column == column)
            .map(|g| &g.summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_coercion() {
        assert_eq!(CellValue::from_raw("  "), CellValue::Empty);
        assert_eq!(CellValue::from_raw(" 12.5 "), CellValue::Number(12.5));
        assert_eq!(CellValue::from_raw("Paris "), CellValue::Text("Paris".into()));
        assert_eq!(CellValue::from_raw("NaN"), CellValue::Text("NaN".into()));
        assert_eq!(CellValue::from_raw("inf"), CellValue::Text("inf".into()));
    }

    #[test]
    fn test_key_formatting() {
        assert_eq!(CellValue::Number(10.0).as_key(), "10");
        assert_eq!(CellValue::Number(2.5).as_key(), "2.5");
        assert_eq!(CellValue::Empty.as_key(), "");
    }

    #[test]
    fn test_dedup_key_zero_sign() {
        assert_eq!(
            CellValue::Number(0.0).dedup_key(),
            CellValue::Number(-0.0).dedup_key()
        );
        assert_ne!(
            CellValue::Number(1.0).dedup_key(),
            CellValue::Text("1".into()).dedup_key()
        );
    }

    #[test]
    fn test_raw_table_pads_rows() {
        let table = RawTable::new(
            vec!["a".into(), "b".into()],
            vec![vec![CellValue::Number(1.0)], vec![
                CellValue::Number(1.0),
                CellValue::Number(2.0),
                CellValue::Number(3.0),
            ]],
        );
        assert_eq!(table.rows[0], vec![CellValue::Number(1.0), CellValue::Empty]);
        assert_eq!(table.rows[1].len(), 2);
    }

    #[test]
    fn test_from_json_records_union_of_keys() {
        let records = vec![
            json!({"city": "A", "sales": 10}),
            json!({"city": "B", "region": "West"}),
        ];
        let table = RawTable::from_json_records(&records);
        assert_eq!(table.headers.len(), 3);
        let region = table.column_index("region").unwrap();
        assert_eq!(table.rows[0][region], CellValue::Empty);
        assert_eq!(table.rows[1][region], CellValue::Text("West".into()));
    }

    #[test]
    fn test_summary_total_and_get() {
        let summary = AggregateSummary::new(vec![
            SummaryEntry { key: "A".to_string(), value: 10.0 },
            SummaryEntry { key: "B".to_string(), value: 5.0 },
        ]);
        assert_eq!(summary.total(), 15.0);
        assert_eq!(summary.get(&"B".to_string()), Some(5.0));
        assert_eq!(summary.get(&"C".to_string()), None);
    }

    #[test]
    fn test_summary_serializes_as_list() {
        let summary = AggregateSummary::new(vec![SummaryEntry { key: "A".to_string(), value: 1.0 }]);
        let v = serde_json::to_value(&summary).unwrap();
        assert_eq!(v, json!([{"key": "A", "value": 1.0}]));
    }
}
