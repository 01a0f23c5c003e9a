//! Lenient accessors over native JSON records.
//!
//! Optional sub-structures that are missing or shaped unexpectedly read as
//! empty values. Structural fields (ids, references) go through [`required_str`]
//! and [`reference`], which fail instead.

use archway_core::{ArchiveError, DateRange, Result};
use serde_json::{Map, Value};

/// A string or number field as text.
pub fn text(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A string field, or an empty string.
pub fn text_or_empty(value: &Value, key: &str) -> String {
    text(value, key).unwrap_or_default()
}

pub fn required_str(value: &Value, key: &str) -> Result<String> {
    text(value, key).ok_or_else(|| {
        ArchiveError::Backend(format!("Response is missing the required field '{key}'"))
    })
}

/// The `ref` of a `{"ref": ...}` link stored under `key`.
pub fn reference(value: &Value, key: &str) -> Result<String> {
    value
        .get(key)
        .and_then(|link| link.get("ref"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ArchiveError::Backend(format!("Response has no '{key}' reference")))
}

pub fn array<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// The first entry of a record's `dates`, read with the given field names.
pub fn first_date(record: &Value, begin: &str, end: &str, expression: &str) -> DateRange {
    match array(record, "dates").first() {
        Some(date) => DateRange::new(text(date, begin), text(date, end), text(date, expression)),
        None => DateRange::default(),
    }
}

/// The object behind `value`, or a backend error naming `what`.
pub fn object_mut<'a>(value: &'a mut Value, what: &str) -> Result<&'a mut Map<String, Value>> {
    value
        .as_object_mut()
        .ok_or_else(|| ArchiveError::Backend(format!("Expected {what} to be a JSON object")))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_text_accepts_numbers() {
        let value = json!({"begin": 1880, "end": "1889", "notes": []});
        assert_eq!(text(&value, "begin").as_deref(), Some("1880"));
        assert_eq!(text(&value, "end").as_deref(), Some("1889"));
        assert_eq!(text(&value, "notes"), None);
        assert_eq!(text_or_empty(&value, "title"), "");
    }

    #[test]
    fn test_reference() {
        let value = json!({"resource": {"ref": "/repositories/2/resources/1"}});
        assert_eq!(reference(&value, "resource").unwrap(), "/repositories/2/resources/1");
        assert!(reference(&value, "parent").is_err());
    }

    #[test]
    fn test_first_date_degrades_to_empty() {
        let record = json!({"dates": "not a list"});
        assert!(first_date(&record, "begin", "end", "expression").is_empty());

        let record = json!({"dates": [{"begin": "1880", "end": "1889"}]});
        assert_eq!(first_date(&record, "begin", "end", "expression").dates(), "1880-1889");
    }
}
