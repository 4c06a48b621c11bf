use crate::utils::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// One flat row of uploaded tabular data.
///
/// Keys keep the order they had in the uploaded JSON, so the first record of a
/// dataset can serve as the CSV header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    pub data: Map<String, Value>,
}

impl Record {
    /// Accepts a JSON object whose values are all strings or numbers.
    pub fn from_value(value: Value, index: usize) -> Result<Self> {
        let Value::Object(data) = value else {
            return Err(AppError::format(format!(
                "record {} is not a JSON object",
                index
            )));
        };

        for (key, field) in &data {
            if !matches!(field, Value::String(_) | Value::Number(_)) {
                return Err(AppError::format(format!(
                    "record {} field '{}' must be a string or number, found {}",
                    index,
                    key,
                    json_kind(field)
                )));
            }
        }

        Ok(Record { data })
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    /// Text form of a field as it is written into a CSV cell.
    /// Numbers keep the digits they were uploaded with, so integers wider
    /// than 64 bits survive. A key this record does not carry becomes an
    /// empty cell.
    pub fn cell(&self, key: &str) -> String {
        match self.data.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// An uploaded JSON array of records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub records: Vec<Record>,
}

impl Dataset {
    pub fn from_json_slice(raw: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(raw)
            .map_err(|e| AppError::format(format!("invalid JSON: {}", e)))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Array(items) = value else {
            return Err(AppError::format(format!(
                "expected a JSON array of objects, found {}",
                json_kind(&value)
            )));
        };

        let records = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| Record::from_value(item, index))
            .collect::<Result<Vec<_>>>()?;

        Ok(Dataset { records })
    }

    /// Column names, taken from the first record only.
    pub fn header(&self) -> Vec<&str> {
        self.records
            .first()
            .map(|record| record.keys().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A row parsed back out of a token: header column -> text, or null when the
/// row was shorter than the header.
pub type DecodedRow = Map<String, Value>;

/// A projected marks value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Mark {
    Integer(u64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DecodedResult {
    Rows { records: Vec<DecodedRow>, count: usize },
    Marks { marks: Vec<Option<Mark>> },
}

impl DecodedResult {
    /// JSON body served by the check endpoint.
    pub fn to_json(&self) -> Value {
        match self {
            DecodedResult::Rows { records, count } => json!({
                "success": true,
                "data": records,
                "count": count,
            }),
            DecodedResult::Marks { marks } => json!({ "marks": marks }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub name: String,
    pub marks: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_keeps_key_order() {
        let dataset =
            Dataset::from_json_slice(br#"[{"zeta": 1, "alpha": "a", "mid": 2.5}]"#).unwrap();

        assert_eq!(dataset.header(), vec!["zeta", "alpha", "mid"]);
        assert_eq!(dataset.records[0].cell("mid"), "2.5");
        assert_eq!(dataset.records[0].cell("missing"), "");
    }

    #[test]
    fn test_numbers_keep_their_uploaded_text() {
        let dataset = Dataset::from_json_slice(
            br#"[{"id": 123456789012345678901234567890, "price": 2.50, "n": -7}]"#,
        )
        .unwrap();

        let record = &dataset.records[0];
        assert_eq!(record.cell("id"), "123456789012345678901234567890");
        assert_eq!(record.cell("price"), "2.50");
        assert_eq!(record.cell("n"), "-7");
    }

    #[test]
    fn test_dataset_rejects_non_array() {
        let err = Dataset::from_json_slice(br#"{"name": "x"}"#).unwrap_err();
        assert!(matches!(err, AppError::FormatError { .. }));
    }

    #[test]
    fn test_dataset_rejects_nested_values() {
        let err = Dataset::from_json_slice(br#"[{"name": "x", "tags": ["a"]}]"#).unwrap_err();
        assert!(err.to_string().contains("tags"));

        let err = Dataset::from_json_slice(br#"[{"name": "x", "ok": true}]"#).unwrap_err();
        assert!(err.to_string().contains("boolean"));

        let err = Dataset::from_json_slice(br#"[1, 2]"#).unwrap_err();
        assert!(matches!(err, AppError::FormatError { .. }));
    }

    #[test]
    fn test_dataset_rejects_invalid_json() {
        let err = Dataset::from_json_slice(b"[{").unwrap_err();
        assert!(matches!(err, AppError::FormatError { .. }));
    }

    #[test]
    fn test_empty_dataset_has_no_header() {
        let dataset = Dataset::from_json_slice(b"[]").unwrap();
        assert!(dataset.is_empty());
        assert!(dataset.header().is_empty());
    }

    #[test]
    fn test_marks_serialize_untagged() {
        let result = DecodedResult::Marks {
            marks: vec![
                Some(Mark::Integer(20)),
                Some(Mark::Text("A+".to_string())),
                None,
            ],
        };
        assert_eq!(result.to_json(), json!({ "marks": [20, "A+", null] }));
    }
}
