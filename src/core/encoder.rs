use crate::core::token;
use crate::domain::model::Dataset;
use crate::utils::error::{AppError, Result};

/// Parse an uploaded JSON document and encode it as a token.
pub fn encode_json(raw: &[u8]) -> Result<String> {
    let dataset = Dataset::from_json_slice(raw)?;
    encode(&dataset)
}

/// Dataset -> CSV -> zlib -> base64url.
///
/// Deterministic: the same dataset always yields the same token.
pub fn encode(dataset: &Dataset) -> Result<String> {
    let csv_text = to_csv(dataset)?;
    let token = token::seal(csv_text.as_bytes())?;

    tracing::debug!(
        "Encoded {} records ({} CSV bytes) into a {} character token",
        dataset.len(),
        csv_text.len(),
        token.len()
    );

    Ok(token)
}

/// Serialize a dataset as CSV with CRLF line endings.
///
/// The header is the first record's keys. Every record is written in header
/// order; keys missing from a record become empty cells and keys the first
/// record did not have are dropped.
pub fn to_csv(dataset: &Dataset) -> Result<String> {
    let header = dataset.header();
    if header.is_empty() {
        return Ok(String::new());
    }

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());

    writer.write_record(&header)?;
    for record in &dataset.records {
        writer.write_record(header.iter().map(|key| record.cell(key)))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::IoError(e.into_error()))?;

    String::from_utf8(bytes).map_err(|e| AppError::format(format!("CSV is not UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(raw: &str) -> Dataset {
        Dataset::from_json_slice(raw.as_bytes()).unwrap()
    }

    #[test]
    fn test_to_csv_with_valid_data() {
        let csv_text = to_csv(&dataset(
            r#"[{"name": "a", "marks": 10}, {"name": "b", "marks": 20}]"#,
        ))
        .unwrap();

        assert_eq!(csv_text, "name,marks\r\na,10\r\nb,20\r\n");
    }

    #[test]
    fn test_to_csv_quotes_when_needed() {
        let csv_text = to_csv(&dataset(
            r#"[{"name": "Doe, Jane", "note": "said \"hi\""}]"#,
        ))
        .unwrap();

        assert_eq!(csv_text, "name,note\r\n\"Doe, Jane\",\"said \"\"hi\"\"\"\r\n");
    }

    #[test]
    fn test_to_csv_uses_first_record_header_order() {
        let csv_text = to_csv(&dataset(
            r#"[{"name": "a", "marks": 1}, {"marks": 2, "name": "b"}]"#,
        ))
        .unwrap();

        assert_eq!(csv_text, "name,marks\r\na,1\r\nb,2\r\n");
    }

    #[test]
    fn test_to_csv_with_heterogeneous_records() {
        let csv_text = to_csv(&dataset(
            r#"[{"name": "a", "marks": 1}, {"name": "b", "grade": "B"}]"#,
        ))
        .unwrap();

        // "grade" is not in the header and is lost; "marks" is blank
        assert_eq!(csv_text, "name,marks\r\na,1\r\nb,\r\n");
    }

    #[test]
    fn test_to_csv_with_empty_data() {
        assert_eq!(to_csv(&Dataset::default()).unwrap(), "");
    }

    #[test]
    fn test_encode_is_deterministic() {
        let data = dataset(r#"[{"name": "x", "marks": 5}]"#);
        assert_eq!(encode(&data).unwrap(), encode(&data).unwrap());
    }

    #[test]
    fn test_encode_json_rejects_non_list() {
        let err = encode_json(br#""just a string""#).unwrap_err();
        assert!(matches!(err, AppError::FormatError { .. }));
    }
}
