use std::collections::HashMap;

use crate::error::LedgerError;
use crate::model::CanonicalOrderRow;

/// Column name that marks the header row.
pub const ORDER_KEY_COLUMN: &str = "INVOICE";

/// Columns every ledger table must carry after header cleaning.
pub const REQUIRED_COLUMNS: [&str; 5] = ["INVOICE", "MODEL", "CAPACITY", "GRADE", "QTY"];

/// Normalize a raw ledger table into canonical rows.
///
/// The first or second row must contain the `INVOICE` marker; the second row
/// wins when both do (the source sheet puts a banner row above the real
/// header). Everything after the header row is data. Rows with an empty order
/// key are dropped. Pure function over its input.
pub fn normalize(raw: &[Vec<String>]) -> Result<Vec<CanonicalOrderRow>, LedgerError> {
    let header_idx = find_header_row(raw)
        .ok_or_else(|| LedgerError::Format("header not found".into()))?;

    let headers = clean_headers(&raw[header_idx]);

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !headers.iter().any(|h| h == *c))
        .copied()
        .collect();
    if !missing.is_empty() {
        return Err(LedgerError::Format(format!(
            "missing required columns: {}",
            missing.join(", ")
        )));
    }

    // Presence of all five was just verified, so indexing cannot miss.
    let column_index: HashMap<&str, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.as_str(), i))
        .collect();
    let key_idx = column_index[ORDER_KEY_COLUMN];
    let model_idx = column_index["MODEL"];
    let capacity_idx = column_index["CAPACITY"];
    let grade_idx = column_index["GRADE"];
    let qty_idx = column_index["QTY"];
    let required_idx = [key_idx, model_idx, capacity_idx, grade_idx, qty_idx];

    let mut rows = Vec::new();
    for record in &raw[header_idx + 1..] {
        let cell = |i: usize| record.get(i).map(String::as_str).unwrap_or("");

        let order_key = cell(key_idx).trim();
        if order_key.is_empty() {
            continue;
        }

        let mut extra = HashMap::new();
        for (i, header) in headers.iter().enumerate() {
            if required_idx.contains(&i) {
                continue;
            }
            extra.insert(header.clone(), cell(i).to_string());
        }

        rows.push(CanonicalOrderRow {
            order_key: order_key.to_string(),
            model: cell(model_idx).to_string(),
            capacity: cell(capacity_idx).to_string(),
            grade: cell(grade_idx).to_string(),
            quantity: parse_quantity(cell(qty_idx)),
            extra,
        });
    }

    Ok(rows)
}

fn find_header_row(raw: &[Vec<String>]) -> Option<usize> {
    let contains_marker = |row: &Vec<String>| row.iter().any(|c| c.trim() == ORDER_KEY_COLUMN);
    match (raw.first(), raw.get(1)) {
        (_, Some(second)) if contains_marker(second) => Some(1),
        (Some(first), _) if contains_marker(first) => Some(0),
        _ => None,
    }
}

/// Trim headers, name blank ones positionally, and suffix repeats so every
/// column name is unique: `["A", "A", "A"]` becomes `["A", "A_1", "A_2"]`.
fn clean_headers(raw_headers: &[String]) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(raw_headers.len());
    for (i, raw) in raw_headers.iter().enumerate() {
        let mut header = raw.trim().to_string();
        if header.is_empty() {
            header = format!("Unnamed_{i}");
        }
        let base = header.clone();
        let mut counter = 1;
        while cleaned.contains(&header) {
            header = format!("{base}_{counter}");
            counter += 1;
        }
        cleaned.push(header);
    }
    cleaned
}

/// Best-effort quantity coercion, a documented normalization rule: trim, parse
/// as integer, else parse as float and truncate; anything non-numeric,
/// negative, or missing becomes 0. Never fails the row.
pub fn parse_quantity(raw: &str) -> u32 {
    let trimmed = raw.trim();
    if let Ok(n) = trimmed.parse::<u32>() {
        return n;
    }
    match trimmed.parse::<f64>() {
        Ok(f) if f.is_finite() && f > 0.0 => f as u32,
        _ => 0,
    }
}
