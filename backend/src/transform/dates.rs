//! Loose calendar-date parsing for spreadsheet cells.
//!
//! Accepted shapes (first match wins):
//!
//! | Shape                         | Example                 |
//! |-------------------------------|-------------------------|
//! | year first, optional time     | `2024-01-05`, `2024/1/5 10:30`, `2024-01-05T10:30:00Z` |
//! | month first (day first if the month is out of range) | `01/05/2024`, `13/01/2024` |
//! | dotted day first              | `05.01.2024`            |
//! | month names                   | `January 5, 2024`, `5 Jan 2024` |
//! | spreadsheet serial number     | `45296` (days since 1899-12-30) |
//!
//! Only the calendar date is kept; any time-of-day is discarded.

use chrono::{Datelike, Month, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::CellValue;

const TIME_SUFFIX: &str = r"(?:[T ]\d{1,2}:\d{2}(?::\d{2}(?:\.\d+)?)?(?:\s*[AaPp][Mm])?(?:Z|[+-]\d{2}:?\d{2})?)?";

static YEAR_FIRST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^(\d{{4}})[-/.](\d{{1,2}})[-/.](\d{{1,2}}){}$", TIME_SUFFIX))
        .expect("valid year-first pattern")
});

static MONTH_FIRST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^(\d{{1,2}})([-/])(\d{{1,2}})[-/](\d{{4}}){}$", TIME_SUFFIX))
        .expect("valid month-first pattern")
});

static DOTTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})\.(\d{1,2})\.(\d{4})$").expect("valid dotted pattern"));

/// Formats with a month name. `%B` also accepts the three-letter abbreviation.
const NAMED_FORMATS: [&str; 5] = ["%B %d, %Y", "%B %d %Y", "%d %B %Y", "%d %B, %Y", "%d-%B-%Y"];

/// Largest serial number a spreadsheet accepts (9999-12-31).
const MAX_SERIAL_DAY: f64 = 2_958_465.0;

/// Parse a cell into a calendar date. `None` means the row is unusable.
pub fn parse_date(cell: &CellValue) -> Option<NaiveDate> {
    match cell {
        CellValue::Empty => None,
        CellValue::Number(n) => from_serial_day(*n),
        CellValue::Text(s) => parse_date_str(s),
    }
}

/// Parse a date string in any of the accepted shapes.
pub fn parse_date_str(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(caps) = YEAR_FIRST.captures(s) {
        return ymd(&caps[1], &caps[2], &caps[3]);
    }

    if let Some(caps) = MONTH_FIRST.captures(s) {
        let (first, second, year) = (&caps[1], &caps[3], &caps[4]);
        return ymd(year, first, second).or_else(|| ymd(year, second, first));
    }

    if let Some(caps) = DOTTED.captures(s) {
        return ymd(&caps[3], &caps[2], &caps[1]);
    }

    NAMED_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Spreadsheet serial day (fractional part = time of day) to a date.
pub fn from_serial_day(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(1.0..=MAX_SERIAL_DAY).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_days(chrono::Days::new(serial.floor() as u64))
}

/// English month name of a date, independent of locale.
pub fn month_name(date: NaiveDate) -> &'static str {
    u8::try_from(date.month())
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map(|m| m.name())
        .unwrap_or("")
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_iso_dates() {
        assert_eq!(parse_date_str("2024-01-05"), Some(date(2024, 1, 5)));
        assert_eq!(parse_date_str("2024/1/5"), Some(date(2024, 1, 5)));
        assert_eq!(parse_date_str(" 2024-01-05 "), Some(date(2024, 1, 5)));
    }

    #[test]
    fn test_iso_datetime_keeps_date() {
        assert_eq!(parse_date_str("2024-03-09 14:22:01"), Some(date(2024, 3, 9)));
        assert_eq!(parse_date_str("2024-03-09T14:22:01.250Z"), Some(date(2024, 3, 9)));
        assert_eq!(parse_date_str("2024-03-09T14:22+02:00"), Some(date(2024, 3, 9)));
    }

    #[test]
    fn test_month_first_with_day_first_fallback() {
        assert_eq!(parse_date_str("01/05/2024"), Some(date(2024, 1, 5)));
        assert_eq!(parse_date_str("13/01/2024"), Some(date(2024, 1, 13)));
        assert_eq!(parse_date_str("2-29-2024"), Some(date(2024, 2, 29)));
        assert_eq!(parse_date_str("11/8/2017 3:15 PM"), Some(date(2017, 11, 8)));
    }

    #[test]
    fn test_dotted_and_named() {
        assert_eq!(parse_date_str("05.01.2024"), Some(date(2024, 1, 5)));
        assert_eq!(parse_date_str("January 5, 2024"), Some(date(2024, 1, 5)));
        assert_eq!(parse_date_str("Jan 5, 2024"), Some(date(2024, 1, 5)));
        assert_eq!(parse_date_str("5 March 2024"), Some(date(2024, 3, 5)));
    }

    #[test]
    fn test_invalid_dates() {
        assert_eq!(parse_date_str("bad-date"), None);
        assert_eq!(parse_date_str("2024-02-30"), None);
        assert_eq!(parse_date_str("13/13/2024"), None);
        assert_eq!(parse_date_str(""), None);
        assert_eq!(parse_date(&CellValue::Empty), None);
    }

    #[test]
    fn test_serial_days() {
        assert_eq!(from_serial_day(45296.0), Some(date(2024, 1, 5)));
        assert_eq!(from_serial_day(45296.75), Some(date(2024, 1, 5)));
        assert_eq!(from_serial_day(0.0), None);
        assert_eq!(from_serial_day(20240105.0), None);
        assert_eq!(parse_date(&CellValue::Number(45296.0)), Some(date(2024, 1, 5)));
    }

    #[test]
    fn test_month_name() {
        assert_eq!(month_name(date(2024, 1, 5)), "January");
        assert_eq!(month_name(date(2024, 12, 31)), "December");
    }
}
