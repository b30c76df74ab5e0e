//! Dashboard payload handed to the chart renderer.
//!
//! Nothing is drawn here: the payload lists metric cards, one series per
//! chart panel and the points of the discount/profit scatter plot.

use serde::{Deserialize, Serialize};

use crate::models::{CleanRecord, CleanTable, Summary};

/// Grouped panels, in display order.
const GROUP_PANELS: [(&str, &str); 4] = [
    ("city", "Revenue by City"),
    ("region", "Revenue by Region"),
    ("category", "Revenue by Category"),
    ("sub_category", "Revenue by Sub-Category"),
];

const TIME_SERIES_TITLE: &str = "Monthly Sales Trend";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Line,
}

/// One chart: category labels on x, sums on y.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPanel {
    pub id: String,
    pub title: String,
    pub kind: ChartKind,
    pub x: Vec<String>,
    pub y: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricCard {
    pub label: String,
    pub value: Option<f64>,
    /// Value with thousands separators and two decimals.
    pub display: String,
}

/// A point of the "Discount vs Profit by Category" chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScatterPoint {
    pub discount_pct: f64,
    pub profit: f64,
    pub category: String,
    /// Marker size.
    pub sales: f64,
    pub customer_name: String,
    pub city: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub title: String,
    pub metrics: Vec<MetricCard>,
    pub panels: Vec<ChartPanel>,
    pub scatter: Vec<ScatterPoint>,
}

/// Assemble the dashboard from a clean table and its summary.
pub fn build_dashboard(table: &CleanTable, summary: &Summary) -> Dashboard {
    let metrics = vec![
        metric_card("Total Revenue", Some(summary.metrics.total)),
        metric_card("Avg Sale per Invoice", summary.metrics.mean),
    ];

    let mut panels: Vec<ChartPanel> = GROUP_PANELS
        .iter()
        .filter_map(|(column, title)| {
            summary.grouped(column).map(|s| ChartPanel {
                id: column.to_string(),
                title: title.to_string(),
                kind: ChartKind::Bar,
                x: s.keys().cloned().collect(),
                y: s.values().collect(),
            })
        })
        .collect();

    // Trend is the third panel of the 2x2 grid
    let trend = ChartPanel {
        id: "order_date".to_string(),
        title: TIME_SERIES_TITLE.to_string(),
        kind: ChartKind::Line,
        x: summary
            .time_series
            .keys()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .collect(),
        y: summary.time_series.values().collect(),
    };
    panels.insert(panels.len().min(2), trend);

    Dashboard {
        title: "Supermarket Sales Dashboard".to_string(),
        metrics,
        panels,
        scatter: scatter_points(table, &summary.measure),
    }
}

/// Points for the discount/profit scatter plot.
///
/// Empty when the table has no `profit` column. Rows without a numeric
/// profit or a discount percentage are skipped.
pub fn scatter_points(table: &CleanTable, measure: &str) -> Vec<ScatterPoint> {
    if !table.has_column("profit") {
        return Vec::new();
    }

    let text = |record: &CleanRecord, column: &str| -> String {
        table
            .cell(record, column)
            .map(|c| c.as_key())
            .unwrap_or_default()
    };

    table
        .rows
        .iter()
        .filter_map(|record| {
            let profit = table.cell(record, "profit")?.as_f64()?;
            let discount_pct = record.discount_pct?;
            let sales = table
                .cell(record, measure)
                .and_then(|c| c.as_f64())
                .unwrap_or(0.0);

            Some(ScatterPoint {
                discount_pct,
                profit,
                category: text(record, "category"),
                sales,
                customer_name: text(record, "customer_name"),
                city: text(record, "city"),
            })
        })
        .collect()
}

/// Format with thousands separators and two decimals: `1234567.891` → `1,234,567.89`.
pub fn format_thousands(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };
    format!("{}{}.{}", sign, grouped, frac_part)
}

fn metric_card(label: &str, value: Option<f64>) -> MetricCard {
    MetricCard {
        label: label.to_string(),
        value,
        display: value.map(format_thousands).unwrap_or_else(|| "-".to_string()),
    }
}
