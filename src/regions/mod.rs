//! Region normalization for detector output.
//!
//! This module converts the raw records produced by an external tooth
//! detector into a validated, ordered list of [`ToothRegion`] values in a
//! canonical shape (center x/y, width, height, confidence).
//!
//! # Design Principles
//!
//! 1. **Verbatim Mapping**: Detector coordinates are assumed to already be
//!    in photograph pixel space. The normalizer never converts units,
//!    reorders, filters by confidence, or deduplicates; overlap and
//!    confidence thresholds are the detector's responsibility.
//!
//! 2. **Per-Record Recovery**: A malformed record (missing or non-finite
//!    required field) is skipped and reported, never fatal to the batch.
//!    Partial results are surfaced with counts via [`NormalizeReport`].
//!
//! 3. **Order Preservation**: The output sequence keeps the detector's
//!    record order. Downstream compositing paints regions in this order, so
//!    overlapping brackets resolve deterministically.

pub mod io_csv;
pub mod io_json;

use std::fmt;

use serde::{Deserialize, Serialize};

/// A raw record as produced by the detection service.
///
/// All fields are optional so that incomplete records can be represented
/// and reported, rather than failing the whole batch during parsing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    /// Center x coordinate in photograph pixels.
    pub x: Option<f64>,

    /// Center y coordinate in photograph pixels.
    pub y: Option<f64>,

    /// Region width in photograph pixels.
    pub width: Option<f64>,

    /// Region height in photograph pixels.
    pub height: Option<f64>,

    /// Detector confidence in [0, 1]. Optional; defaults to 0 downstream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl RawDetection {
    /// Creates a complete record with the given geometry and no confidence.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            width: Some(width),
            height: Some(height),
            confidence: None,
        }
    }

    /// Adds a confidence score to the record.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }
}

/// A detected tooth's bounding geometry in photograph pixel coordinates.
///
/// The box is described by its center and extent, matching the detector's
/// output convention. Regions are independent; their only meaningful
/// ordering is the sequence in which the detector returned them.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToothRegion {
    /// Center x coordinate in photograph pixels.
    pub center_x: f64,

    /// Center y coordinate in photograph pixels.
    pub center_y: f64,

    /// Box width in photograph pixels.
    pub width: f64,

    /// Box height in photograph pixels.
    pub height: f64,

    /// Detector confidence, 0 when the detector did not report one.
    #[serde(default)]
    pub confidence: f64,
}

impl ToothRegion {
    /// Creates a region with the given geometry and zero confidence.
    pub fn new(center_x: f64, center_y: f64, width: f64, height: f64) -> Self {
        Self {
            center_x,
            center_y,
            width,
            height,
            confidence: 0.0,
        }
    }

    /// Sets the confidence score for this region.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }
}

/// Normalizes raw detector records into tooth regions.
///
/// Records are mapped verbatim, in input order. A record missing a required
/// numeric field, or carrying a non-finite one, is skipped and recorded in
/// the report; the remaining records still normalize. A missing confidence
/// defaults to 0.
///
/// # Example
/// ```
/// use ortholay::regions::{normalize, RawDetection};
///
/// let records = vec![
///     RawDetection::new(120.0, 80.0, 30.0, 40.0).with_confidence(0.92),
///     RawDetection { x: None, ..Default::default() },
/// ];
/// let (regions, report) = normalize(&records);
/// assert_eq!(regions.len(), 1);
/// assert_eq!(report.skipped_count(), 1);
/// ```
pub fn normalize(records: &[RawDetection]) -> (Vec<ToothRegion>, NormalizeReport) {
    let mut regions = Vec::with_capacity(records.len());
    let mut report = NormalizeReport::new();

    for (idx, record) in records.iter().enumerate() {
        match normalize_record(record) {
            Ok(region) => {
                if !(0.0..=1.0).contains(&region.confidence) {
                    report.add(RegionIssue::note(
                        RegionIssueCode::ConfidenceOutOfRange,
                        idx,
                        format!("confidence {} outside [0, 1]", region.confidence),
                    ));
                }
                regions.push(region);
            }
            Err((code, message)) => {
                report.add(RegionIssue::skip(code, idx, message));
            }
        }
    }

    report.accepted = regions.len();
    (regions, report)
}

/// Maps a single record, or explains why it cannot be mapped.
fn normalize_record(record: &RawDetection) -> Result<ToothRegion, (RegionIssueCode, String)> {
    let center_x = require(record.x, "x")?;
    let center_y = require(record.y, "y")?;
    let width = require(record.width, "width")?;
    let height = require(record.height, "height")?;

    let confidence = match record.confidence {
        Some(c) if !c.is_finite() => {
            return Err((
                RegionIssueCode::NonFiniteField,
                format!("field 'confidence' is not finite ({c})"),
            ));
        }
        Some(c) => c,
        None => 0.0,
    };

    Ok(ToothRegion {
        center_x,
        center_y,
        width,
        height,
        confidence,
    })
}

/// Extracts a required numeric field.
fn require(field: Option<f64>, name: &str) -> Result<f64, (RegionIssueCode, String)> {
    match field {
        None => Err((
            RegionIssueCode::MissingField,
            format!("missing required field '{name}'"),
        )),
        Some(v) if !v.is_finite() => Err((
            RegionIssueCode::NonFiniteField,
            format!("field '{name}' is not finite ({v})"),
        )),
        Some(v) => Ok(v),
    }
}

/// The result of normalizing a batch of detector records.
///
/// Tracks accepted/skipped counts and the individual issues, so callers can
/// report partial-success metadata alongside the normalized regions.
#[derive(Clone, Debug, Default, Serialize)]
pub struct NormalizeReport {
    /// Number of records successfully normalized.
    pub accepted: usize,

    /// All issues found while normalizing.
    pub issues: Vec<RegionIssue>,
}

impl NormalizeReport {
    /// Creates a new empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an issue to the report.
    pub fn add(&mut self, issue: RegionIssue) {
        self.issues.push(issue);
    }

    /// Returns the number of records that were skipped as malformed.
    pub fn skipped_count(&self) -> usize {
        self.issues.iter().filter(|i| i.skipped).count()
    }

    /// Returns the number of non-fatal notes (record still accepted).
    pub fn note_count(&self) -> usize {
        self.issues.iter().filter(|i| !i.skipped).count()
    }

    /// Returns true if every record normalized without any issue.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

impl fmt::Display for NormalizeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Normalized {} region(s), skipped {} malformed record(s)",
            self.accepted,
            self.skipped_count()
        )?;

        if !self.issues.is_empty() {
            writeln!(f)?;
            for issue in &self.issues {
                writeln!(f, "  {}", issue)?;
            }
        }

        Ok(())
    }
}

/// A single issue discovered while normalizing detector records.
#[derive(Clone, Debug, Serialize)]
pub struct RegionIssue {
    /// A stable code for the issue type.
    pub code: RegionIssueCode,

    /// Index of the offending record in the input sequence.
    pub record_index: usize,

    /// Whether the record was dropped from the output.
    pub skipped: bool,

    /// A human-readable description of the issue.
    pub message: String,
}

impl RegionIssue {
    /// Creates an issue for a record that was dropped.
    pub fn skip(code: RegionIssueCode, record_index: usize, message: impl Into<String>) -> Self {
        Self {
            code,
            record_index,
            skipped: true,
            message: message.into(),
        }
    }

    /// Creates an informational issue; the record is still accepted.
    pub fn note(code: RegionIssueCode, record_index: usize, message: impl Into<String>) -> Self {
        Self {
            code,
            record_index,
            skipped: false,
            message: message.into(),
        }
    }
}

impl fmt::Display for RegionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = if self.skipped { "SKIP" } else { "NOTE" };
        write!(
            f,
            "[{}] {:?} in record {}: {}",
            action, self.code, self.record_index, self.message
        )
    }
}

/// A stable code identifying the type of normalization issue.
///
/// These codes are part of the JSON report schema and should remain stable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionIssueCode {
    /// A required numeric field (x, y, width, height) is absent.
    MissingField,
    /// A numeric field is NaN or infinite.
    NonFiniteField,
    /// Confidence falls outside [0, 1]; the record is kept verbatim.
    ConfidenceOutOfRange,
}
