//! Aggregation stage: [`CleanTable`] → [`Summary`].
//!
//! # Null measures
//!
//! A blank measure cell contributes `0` to every sum and is left out of the
//! mean's denominator. Text that does not parse as a number is an error.
//!
//! # Ordering
//!
//! - Grouped sums: descending by value, ties keep first-appearance order.
//! - Time series: ascending by date.
//!
//! # Time of day
//!
//! The time series is keyed by calendar date. `order_date` values carrying a
//! time are truncated to their date when cleaned, so orders placed on the
//! same day at different times share one point.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

use crate::error::{AggregateError, AggregateResult};
use crate::models::{
    AggregateSummary, CellValue, CleanTable, GroupedSummary, Metrics, Summary, SummaryEntry,
};

/// Numeric view of the measure column, one entry per clean row.
///
/// `None` marks a blank cell.
pub fn measure_values(table: &CleanTable, measure: &str) -> AggregateResult<Vec<Option<f64>>> {
    let idx = table
        .column_index(measure)
        .ok_or_else(|| AggregateError::MissingColumn(measure.to_string()))?;

    table
        .rows
        .iter()
        .enumerate()
        .map(|(row, record)| match &record.values[idx] {
            CellValue::Empty => Ok(None),
            cell => cell.as_f64().map(Some).ok_or_else(|| AggregateError::NonNumeric {
                row,
                column: measure.to_string(),
                value: cell.to_string(),
            }),
        })
        .collect()
}

/// Sum and mean of the measure column.
pub fn scalar_metrics(table: &CleanTable, measure: &str) -> AggregateResult<Metrics> {
    let values = measure_values(table, measure)?;
    Ok(metrics_from_values(&values))
}

/// Sum of the measure per distinct value of `column`, largest first.
pub fn grouped_sum(
    table: &CleanTable,
    column: &str,
    measure: &str,
) -> AggregateResult<AggregateSummary<String>> {
    let values = measure_values(table, measure)?;
    grouped_from_values(table, column, &values)
}

/// Sum of the measure per order date, oldest first.
///
/// Times of day are already truncated, see the module docs.
pub fn time_series(table: &CleanTable, measure: &str) -> AggregateResult<AggregateSummary<NaiveDate>> {
    let values = measure_values(table, measure)?;
    Ok(time_series_from_values(table, &values))
}

/// Compute every named aggregate in one pass over the measure column.
pub fn summarize(
    table: &CleanTable,
    measure: &str,
    group_columns: &[String],
) -> AggregateResult<Summary> {
    let values = measure_values(table, measure)?;

    let grouped = group_columns
        .iter()
        .map(|column| {
            grouped_from_values(table, column, &values).map(|summary| GroupedSummary {
                column: column.clone(),
                summary,
            })
        })
        .collect::<AggregateResult<Vec<_>>>()?;

    Ok(Summary {
        measure: measure.to_string(),
        metrics: metrics_from_values(&values),
        grouped,
        time_series: time_series_from_values(table, &values),
    })
}

fn metrics_from_values(values: &[Option<f64>]) -> Metrics {
    let measured: Vec<f64> = values.iter().flatten().copied().collect();
    let total: f64 = measured.iter().sum();
    let mean = if measured.is_empty() {
        None
    } else {
        Some(total / measured.len() as f64)
    };

    Metrics {
        total,
        mean,
        row_count: values.len(),
        measured_count: measured.len(),
    }
}

fn grouped_from_values(
    table: &CleanTable,
    column: &str,
    values: &[Option<f64>],
) -> AggregateResult<AggregateSummary<String>> {
    let idx = table
        .column_index(column)
        .ok_or_else(|| AggregateError::MissingColumn(column.to_string()))?;

    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut entries: Vec<SummaryEntry<String>> = Vec::new();

    for (record, value) in table.rows.iter().zip(values) {
        let key = record.values[idx].as_key();
        let pos = *positions.entry(key.clone()).or_insert_with(|| {
            entries.push(SummaryEntry { key, value: 0.0 });
            entries.len() - 1
        });
        entries[pos].value += value.unwrap_or(0.0);
    }

    // sort_by is stable: equal sums keep first-appearance order
    entries.sort_by(|a, b| b.value.total_cmp(&a.value));

    Ok(AggregateSummary::new(entries))
}

fn time_series_from_values(table: &CleanTable, values: &[Option<f64>]) -> AggregateSummary<NaiveDate> {
    let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for (record, value) in table.rows.iter().zip(values) {
        *by_date.entry(record.order_date).or_insert(0.0) += value.unwrap_or(0.0);
    }

    AggregateSummary::new(
        by_date
            .into_iter()
            .map(|(key, value)| SummaryEntry { key, value })
            .collect(),
    )
}
