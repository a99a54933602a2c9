//! Detections CSV reader.
//!
//! Some detector deployments export their predictions as CSV rather than
//! JSON. This module reads that shape: one record per row, with a header
//! naming at least `x`, `y`, `width`, `height`, and optionally
//! `confidence`. Extra columns (class labels, frame ids) are ignored.
//!
//! The tolerance contract matches the JSON reader: a cell that is empty or
//! fails to parse as a number leaves that field unset on the
//! [`RawDetection`], so the normalizer reports the record instead of the
//! whole file failing.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use csv::StringRecord;

use super::RawDetection;
use crate::error::OrtholayError;

/// Column positions resolved from the CSV header.
#[derive(Clone, Copy, Debug, Default)]
struct ColumnMap {
    x: Option<usize>,
    y: Option<usize>,
    width: Option<usize>,
    height: Option<usize>,
    confidence: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Self {
        let mut map = Self::default();
        for (idx, name) in headers.iter().enumerate() {
            match name.trim() {
                "x" => map.x = Some(idx),
                "y" => map.y = Some(idx),
                "width" => map.width = Some(idx),
                "height" => map.height = Some(idx),
                "confidence" => map.confidence = Some(idx),
                _ => {}
            }
        }
        map
    }
}

/// Reads detection records from a CSV file.
///
/// # Arguments
/// * `path` - Path to the CSV file
///
/// # Errors
/// Returns an error if the file cannot be read or its CSV structure is
/// broken (unbalanced quotes, inconsistent row lengths). Cell-level
/// problems do not error here; they surface through
/// [`normalize`](super::normalize).
pub fn read_detections_csv(path: &Path) -> Result<Vec<RawDetection>, OrtholayError> {
    let file = File::open(path).map_err(OrtholayError::Io)?;
    let reader = BufReader::new(file);

    parse_reader(csv::Reader::from_reader(reader)).map_err(|source| {
        OrtholayError::DetectionsCsvParse {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Reads detection records from a CSV string.
///
/// Useful for testing without file I/O.
pub fn from_csv_str(csv_str: &str) -> Result<Vec<RawDetection>, csv::Error> {
    parse_reader(csv::Reader::from_reader(csv_str.as_bytes()))
}

fn parse_reader<R: std::io::Read>(
    mut reader: csv::Reader<R>,
) -> Result<Vec<RawDetection>, csv::Error> {
    let columns = ColumnMap::from_headers(reader.headers()?);

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        records.push(RawDetection {
            x: number_cell(&row, columns.x),
            y: number_cell(&row, columns.y),
            width: number_cell(&row, columns.width),
            height: number_cell(&row, columns.height),
            confidence: number_cell(&row, columns.confidence),
        });
    }

    Ok(records)
}

/// Parses one cell, treating absent, empty, and non-numeric values alike.
fn number_cell(row: &StringRecord, column: Option<usize>) -> Option<f64> {
    let cell = row.get(column?)?.trim();
    if cell.is_empty() {
        return None;
    }
    cell.parse().ok()
}
