//! Detector-response JSON reader.
//!
//! This module reads raw detection records from the JSON shapes the
//! detection service produces. Two top-level shapes are accepted:
//!
//! - An object with a `predictions` array (the hosted detector's response
//!   envelope; other envelope fields are ignored)
//! - A bare array of records
//!
//! # Tolerance Contract
//!
//! Individual records are decoded field-by-field: a record with a missing or
//! non-numeric field still yields a [`RawDetection`] with that field unset,
//! so the normalizer can skip and report it without poisoning the batch.
//! Only a structurally wrong document (not an array, no `predictions` key)
//! is a parse error. That keeps "no detections" distinguishable from
//! "wrong file".

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::de::Error as _;
use serde_json::Value;

use super::RawDetection;
use crate::error::OrtholayError;

/// Reads detection records from a JSON file.
///
/// # Arguments
/// * `path` - Path to the JSON file
///
/// # Errors
/// Returns an error if the file cannot be read or is not a detection array
/// or response envelope. Malformed individual records do not error here;
/// they surface through [`normalize`](super::normalize).
///
/// # Example
/// ```no_run
/// use std::path::Path;
/// use ortholay::regions::io_json::read_detections_json;
///
/// let records = read_detections_json(Path::new("detections.json"))?;
/// # Ok::<(), ortholay::OrtholayError>(())
/// ```
pub fn read_detections_json(path: &Path) -> Result<Vec<RawDetection>, OrtholayError> {
    let file = File::open(path).map_err(OrtholayError::Io)?;
    let mut reader = BufReader::new(file);

    let mut contents = String::new();
    reader.read_to_string(&mut contents).map_err(OrtholayError::Io)?;

    from_json_str(&contents).map_err(|source| OrtholayError::DetectionsJsonParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads detection records from a JSON string.
///
/// Useful for testing without file I/O.
pub fn from_json_str(json: &str) -> Result<Vec<RawDetection>, serde_json::Error> {
    let value: Value = serde_json::from_str(json)?;
    records_from_value(&value)
}

/// Extracts the record array from either accepted top-level shape.
fn records_from_value(value: &Value) -> Result<Vec<RawDetection>, serde_json::Error> {
    let records = match value {
        Value::Array(records) => records,
        Value::Object(envelope) => match envelope.get("predictions") {
            Some(Value::Array(records)) => records,
            Some(other) => {
                return Err(serde_json::Error::custom(format!(
                    "'predictions' should be an array, found {}",
                    json_type_name(other)
                )));
            }
            None => {
                return Err(serde_json::Error::custom(
                    "expected a detection array or an object with a 'predictions' field",
                ));
            }
        },
        other => {
            return Err(serde_json::Error::custom(format!(
                "expected a detection array, found {}",
                json_type_name(other)
            )));
        }
    };

    Ok(records.iter().map(record_from_value).collect())
}

/// Decodes one record, leaving unusable fields unset.
fn record_from_value(value: &Value) -> RawDetection {
    RawDetection {
        x: number_field(value, "x"),
        y: number_field(value, "y"),
        width: number_field(value, "width"),
        height: number_field(value, "height"),
        confidence: number_field(value, "confidence"),
    }
}

/// Reads a numeric field, treating absent and non-numeric values alike.
fn number_field(record: &Value, name: &str) -> Option<f64> {
    record.get(name)?.as_f64()
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
