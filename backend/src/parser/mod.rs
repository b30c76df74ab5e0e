//! CSV to [`RawTable`] parser with encoding and delimiter auto-detection.
//!
//! Cells are coerced the way spreadsheet clients hand them out: blank cells
//! become [`CellValue::Empty`], numeric text becomes [`CellValue::Number`],
//! anything else stays text. Headers are kept exactly as written so the
//! cleaning stage can normalize them.

use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::models::{CellValue, RawTable};

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParsedSheet {
    /// Parsed table
    pub table: RawTable,
    /// Detected or used encoding
    pub encoding: String,
    /// Detected or used delimiter
    pub delimiter: char,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "utf-8-sig" | "" => "utf-8".to_string(),
        "iso-8859-1" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "iso-8859-15" | "latin-9" | "latin9" => "iso-8859-15".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes to string using the specified encoding
pub fn decode_content(bytes: &[u8], encoding: &str) -> CsvResult<String> {
    let decoded = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => match std::str::from_utf8(bytes) {
            Ok(s) => s.to_string(),
            Err(_) => String::from_utf8_lossy(bytes).to_string(),
        },
        // windows-1252 agrees with Latin-1 on every printable byte
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::WINDOWS_1252.decode(bytes).0.to_string(),
        "iso-8859-15" | "latin-9" | "latin9" => encoding_rs::ISO_8859_15.decode(bytes).0.to_string(),
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.to_string(),
        "utf-16le" | "utf-16be" | "utf-16" => {
            let codec = if encoding.eq_ignore_ascii_case("utf-16be") {
                encoding_rs::UTF_16BE
            } else {
                encoding_rs::UTF_16LE
            };
            let (text, _, had_errors) = codec.decode(bytes);
            if had_errors {
                return Err(CsvError::EncodingError {
                    encoding: encoding.to_string(),
                    message: "invalid UTF-16 sequence".to_string(),
                });
            }
            text.to_string()
        }
        // Fallback: UTF-8 with lossy conversion
        _ => String::from_utf8_lossy(bytes).to_string(),
    };

    Ok(decoded.trim_start_matches('\u{feff}').to_string())
}

/// Detect the delimiter by counting occurrences in the first line.
///
/// Falls back to `,` (spreadsheet CSV export) when no candidate appears.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse CSV text with an explicit delimiter.
///
/// # Example
/// ```ignore
/// use salesboard::parse_csv_str;
///
/// let table = parse_csv_str("City,Sales\nParis,10", ',').unwrap();
/// assert_eq!(table.headers, vec!["City", "Sales"]);
/// ```
pub fn parse_csv_str(content: &str, delimiter: char) -> CsvResult<RawTable> {
    if content.trim().is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let delimiter = u8::try_from(delimiter).map_err(|_| CsvError::ParseError {
        line: 1,
        message: format!("Delimiter '{}' is not a single byte", delimiter),
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Fields)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(to_csv_error)?
        .iter()
        .map(|h| h.to_string())
        .collect();

    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(CsvError::NoHeaders);
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(to_csv_error)?;
        let row: Vec<CellValue> = record.iter().map(CellValue::from_raw).collect();

        // Fully blank rows are spreadsheet padding, not data
        if row.iter().all(CellValue::is_empty) {
            continue;
        }
        rows.push(row);
    }

    Ok(RawTable::new(headers, rows))
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> CsvResult<ParsedSheet> {
    if bytes.is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(&content);
    let table = parse_csv_str(&content, delimiter)?;

    Ok(ParsedSheet {
        table,
        encoding,
        delimiter,
    })
}

/// Parse a CSV file with auto-detection of encoding and delimiter.
///
/// # Example
/// ```ignore
/// let sheet = parse_csv_file_auto("/path/to/export.csv")?;
/// println!("Encoding: {}, Delimiter: '{}'", sheet.encoding, sheet.delimiter);
/// println!("Rows: {}", sheet.table.len());
/// ```
pub fn parse_csv_file_auto<P: AsRef<Path>>(path: P) -> CsvResult<ParsedSheet> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes_auto(&bytes)
}

fn to_csv_error(err: csv::Error) -> CsvError {
    let line = err.position().map(|p| p.line() as usize).unwrap_or(0);
    CsvError::ParseError {
        line,
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_simple_csv() {
        let table = parse_csv_str("City,Sales\nParis,10\nLyon,2.5", ',').unwrap();

        assert_eq!(table.headers, vec!["City", "Sales"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0][0], CellValue::Text("Paris".into()));
        assert_eq!(table.rows[0][1], CellValue::Number(10.0));
        assert_eq!(table.rows[1][1], CellValue::Number(2.5));
    }

    #[test]
    fn test_headers_kept_verbatim() {
        let table = parse_csv_str(" Order Date ,Sales\n2024-01-01,1", ',').unwrap();
        assert_eq!(table.headers[0], " Order Date ");
    }

    #[test]
    fn test_quoted_values_with_delimiter() {
        let csv = "name,city\n\"Doe, Jane\",\"New York\"";
        let table = parse_csv_str(csv, ',').unwrap();

        assert_eq!(table.rows[0][0], CellValue::Text("Doe, Jane".into()));
        assert_eq!(table.rows[0][1], CellValue::Text("New York".into()));
    }

    #[test]
    fn test_blank_rows_skipped() {
        let table = parse_csv_str("a,b\n1,2\n,\n\n3,4\n", ',').unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_missing_and_extra_cells() {
        let table = parse_csv_str("a;b;c\n1;;3\n1;2;3;4", ';').unwrap();

        assert_eq!(table.rows[0][1], CellValue::Empty);
        assert_eq!(table.rows[1].len(), 3);
    }

    #[test]
    fn test_empty_csv_error() {
        assert!(matches!(parse_csv_str("", ','), Err(CsvError::EmptyFile)));
        assert!(matches!(parse_bytes_auto(b""), Err(CsvError::EmptyFile)));
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
        assert_eq!(detect_delimiter("a|b|c\n1|2|3"), '|');
        assert_eq!(detect_delimiter("single"), ',');
    }

    #[test]
    fn test_auto_parse() {
        let result = parse_bytes_auto(b"City;Sales\nParis;30\nLyon;25").unwrap();

        assert_eq!(result.delimiter, ';');
        assert_eq!(result.encoding, "utf-8");
        assert_eq!(result.table.len(), 2);
    }

    #[test]
    fn test_bom_stripped() {
        let bytes = "\u{feff}City,Sales\nParis,1".as_bytes();
        let result = parse_bytes_auto(bytes).unwrap();
        assert_eq!(result.table.headers[0], "City");
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1").unwrap();
        assert_eq!(decoded, "Société");
    }

    #[test]
    fn test_latin1_currency_sign_and_fractions() {
        let bytes: &[u8] = &[0xA4, 0xBC, 0xBD, 0xBE];
        assert_eq!(decode_content(bytes, "iso-8859-1").unwrap(), "¤¼½¾");
        assert_eq!(decode_content(&[0xA4], "iso-8859-15").unwrap(), "€");
    }

    #[test]
    fn test_parse_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Order Date,Sales").unwrap();
        writeln!(file, "2024-01-01,10").unwrap();

        let sheet = parse_csv_file_auto(file.path()).unwrap();
        assert_eq!(sheet.table.len(), 1);
        assert_eq!(sheet.table.rows[0][1], CellValue::Number(10.0));
    }
}
