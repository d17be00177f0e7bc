use std::collections::HashSet;
use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use regex::Regex;

use crate::error::ExtractError;

/// Device identifiers are exactly 15 digits starting with 35.
const IDENTIFIER_PATTERN: &str = r"\b35\d{13}\b";

/// Header names that mark a column as identifier-bearing, matched as
/// case-insensitive substrings of the trimmed header.
const IDENTIFIER_COLUMN_NAMES: [&str; 12] = [
    "imei",
    "serial",
    "serial no",
    "serial number",
    "serialnumber",
    "serial_no",
    "serial_number",
    "imei number",
    "imei_number",
    "device serial",
    "device_serial",
    "sn",
];

/// Identifiers found in an evidence file, first-seen order, no duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub identifiers: Vec<String>,
    pub count: usize,
}

/// Evidence file classes, selected by filename extension. Each class knows how
/// to pull identifiers out of its own byte layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvidenceKind {
    /// Tabular formats with a header row and addressable columns.
    Spreadsheet(SpreadsheetFormat),
    /// Free text scanned whole; no column concept.
    PlainText,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadsheetFormat {
    Excel,
    Csv,
}

impl EvidenceKind {
    /// Classify by the final dot-suffix, case-insensitively.
    pub fn from_filename(filename: &str) -> Result<Self, ExtractError> {
        let ext = filename
            .rsplit('.')
            .next()
            .unwrap_or(filename)
            .to_ascii_lowercase();
        match ext.as_str() {
            "xlsx" | "xls" => Ok(Self::Spreadsheet(SpreadsheetFormat::Excel)),
            "csv" => Ok(Self::Spreadsheet(SpreadsheetFormat::Csv)),
            "txt" => Ok(Self::PlainText),
            _ => Err(ExtractError::UnsupportedFormat(ext)),
        }
    }

    pub fn extract(&self, data: &[u8]) -> Result<Extraction, ExtractError> {
        match self {
            Self::Spreadsheet(SpreadsheetFormat::Excel) => {
                Ok(extract_from_table(&read_excel_table(data)?))
            }
            Self::Spreadsheet(SpreadsheetFormat::Csv) => {
                Ok(extract_from_table(&read_csv_table(data)?))
            }
            Self::PlainText => {
                let re = identifier_regex();
                Ok(collect(scan(&re, &decode_text(data))))
            }
        }
    }
}

/// Extract identifiers from evidence bytes, dispatching on the filename.
pub fn extract(data: &[u8], filename: &str) -> Result<Extraction, ExtractError> {
    EvidenceKind::from_filename(filename)?.extract(data)
}

/// Read a tabular file into rows of strings, dispatching on the filename the
/// same way `extract` does. Plain text has no table shape, so only the
/// spreadsheet formats qualify.
pub fn read_table(data: &[u8], filename: &str) -> Result<Vec<Vec<String>>, ExtractError> {
    match EvidenceKind::from_filename(filename)? {
        EvidenceKind::Spreadsheet(SpreadsheetFormat::Excel) => read_excel_table(data),
        EvidenceKind::Spreadsheet(SpreadsheetFormat::Csv) => read_csv_table(data),
        EvidenceKind::PlainText => Err(ExtractError::UnsupportedFormat("txt".into())),
    }
}

/// True iff `s` trims to exactly 15 ASCII digits starting with 35. Spot-check
/// helper; `extract` relies on the scan pattern instead.
pub fn is_valid_identifier(s: &str) -> bool {
    let trimmed = s.trim();
    trimmed.len() == 15
        && trimmed.starts_with("35")
        && trimmed.bytes().all(|b| b.is_ascii_digit())
}

// ---------------------------------------------------------------------------
// Table readers
// ---------------------------------------------------------------------------

fn read_excel_table(data: &[u8]) -> Result<Vec<Vec<String>>, ExtractError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(data))
        .map_err(|e| ExtractError::Parse(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ExtractError::Parse("workbook has no sheets".into()))?
        .map_err(|e| ExtractError::Parse(e.to_string()))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect())
}

fn read_csv_table(data: &[u8]) -> Result<Vec<Vec<String>>, ExtractError> {
    let content = decode_text(data);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ExtractError::Parse(e.to_string()))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

/// Identifiers exported from Excel often arrive as numeric cells; a 15-digit
/// integer is exactly representable in an f64, so render it without decimals.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}

/// Decode evidence bytes as UTF-8, falling back to Windows-1252 (common for
/// Excel-exported text files).
fn decode_text(data: &[u8]) -> String {
    match std::str::from_utf8(data) {
        Ok(s) => s.to_string(),
        Err(_) => encoding_rs::WINDOWS_1252.decode(data).0.into_owned(),
    }
}

// ---------------------------------------------------------------------------
// Scanning
// ---------------------------------------------------------------------------

/// Scan matched identifier columns, or every cell when no header matches.
fn extract_from_table(rows: &[Vec<String>]) -> Extraction {
    let Some((headers, data_rows)) = rows.split_first() else {
        return Extraction::default();
    };

    let matched: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| {
            let header = h.trim().to_lowercase();
            IDENTIFIER_COLUMN_NAMES.iter().any(|name| header.contains(name))
        })
        .map(|(i, _)| i)
        .collect();

    let re = identifier_regex();
    let mut found = Vec::new();
    for row in data_rows {
        if matched.is_empty() {
            // No identifier column declared; fall back to scanning everything.
            for cell in row {
                found.extend(scan(&re, cell));
            }
        } else {
            for &i in &matched {
                if let Some(cell) = row.get(i) {
                    found.extend(scan(&re, cell));
                }
            }
        }
    }
    collect(found)
}

fn identifier_regex() -> Regex {
    Regex::new(IDENTIFIER_PATTERN).unwrap()
}

fn scan(re: &Regex, text: &str) -> Vec<String> {
    re.find_iter(text).map(|m| m.as_str().to_string()).collect()
}

/// Dedupe preserving first-seen order.
fn collect(found: Vec<String>) -> Extraction {
    let mut seen = HashSet::new();
    let identifiers: Vec<String> = found
        .into_iter()
        .filter(|id| seen.insert(id.clone()))
        .collect();
    let count = identifiers.len();
    Extraction { identifiers, count }
}
