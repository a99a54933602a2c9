use std::path::PathBuf;
use thiserror::Error;

/// The main error type for ortholay operations.
#[derive(Debug, Error)]
pub enum OrtholayError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse detections JSON from {path}: {source}")]
    DetectionsJsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to read detections CSV from {path}: {source}")]
    DetectionsCsvParse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to decode image {path}: {source}")]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to encode image {path}: {source}")]
    ImageEncode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Normalization found {skipped} malformed record(s)")]
    NormalizationFailed { skipped: usize },

    #[error("Unsupported detections format: {0}")]
    UnsupportedFormat(String),

    #[error("Unsupported bracket type: '{0}' (supported: metal, ceramic)")]
    UnsupportedBracketType(String),

    #[error("Missing bracket asset for '{kind}': {path}")]
    MissingBracketAsset { kind: String, path: PathBuf },

    #[error(
        "Overlay layer dimensions {layer_width}x{layer_height} do not match \
         photograph dimensions {photo_width}x{photo_height}"
    )]
    DimensionMismatch {
        photo_width: u32,
        photo_height: u32,
        layer_width: u32,
        layer_height: u32,
    },
}
