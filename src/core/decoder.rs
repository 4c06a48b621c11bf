use crate::core::token;
use crate::domain::model::{DecodedResult, DecodedRow, Mark};
use crate::utils::error::{AppError, Result};
use serde_json::Value;
use std::collections::HashMap;

/// Decode a token and optionally project marks for `filter_names`.
///
/// With no names every row comes back verbatim. With names, the result holds
/// one entry per requested name, in request order, null where no row matched.
pub fn decode(token: &str, filter_names: &[String]) -> Result<DecodedResult> {
    decode_with_limit(token, filter_names, token::DEFAULT_MAX_DECODED_BYTES)
}

/// [`decode`] with an explicit cap on the inflated payload size.
pub fn decode_with_limit(
    token: &str,
    filter_names: &[String],
    max_decoded_bytes: usize,
) -> Result<DecodedResult> {
    let records = decode_rows(token, max_decoded_bytes)?;

    if filter_names.is_empty() {
        let count = records.len();
        return Ok(DecodedResult::Rows { records, count });
    }

    Ok(DecodedResult::Marks {
        marks: project_marks(&records, filter_names),
    })
}

/// base64url -> zlib -> UTF-8 -> CSV rows.
pub fn decode_rows(token: &str, max_decoded_bytes: usize) -> Result<Vec<DecodedRow>> {
    let bytes = token::open(token, max_decoded_bytes)?;
    let text = String::from_utf8(bytes)
        .map_err(|e| AppError::corrupt_token(format!("Payload is not UTF-8: {}", e)))?;

    let rows = parse_csv(&text)?;
    tracing::debug!("Decoded {} rows from token", rows.len());
    Ok(rows)
}

fn parse_csv(text: &str) -> Result<Vec<DecodedRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| AppError::corrupt_token(format!("Invalid CSV header: {}", e)))?
        .clone();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record =
            result.map_err(|e| AppError::corrupt_token(format!("Invalid CSV row: {}", e)))?;

        if record.len() > headers.len() {
            tracing::debug!(
                "Row has {} cells for {} columns, extra cells dropped",
                record.len(),
                headers.len()
            );
        }

        let mut row = DecodedRow::new();
        for (index, column) in headers.iter().enumerate() {
            let value = record
                .get(index)
                .map(|cell| Value::String(cell.to_string()))
                .unwrap_or(Value::Null);
            row.insert(column.to_string(), value);
        }
        rows.push(row);
    }

    Ok(rows)
}

/// Look up the `marks` cell for each requested name. Later rows win when a
/// name repeats.
pub fn project_marks(records: &[DecodedRow], names: &[String]) -> Vec<Option<Mark>> {
    let mut lookup: HashMap<&str, Option<&str>> = HashMap::new();
    for row in records {
        if let Some(Value::String(name)) = row.get("name") {
            lookup.insert(name.as_str(), row.get("marks").and_then(Value::as_str));
        }
    }

    names
        .iter()
        .map(|name| {
            lookup
                .get(name.as_str())
                .copied()
                .flatten()
                .map(normalize_mark)
        })
        .collect()
}

/// Digit-only text becomes an integer; anything else, including the empty
/// string and digit strings too long for a u64, stays text.
pub fn normalize_mark(raw: &str) -> Mark {
    if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(value) = raw.parse::<u64>() {
            return Mark::Integer(value);
        }
    }
    Mark::Text(raw.to_string())
}
