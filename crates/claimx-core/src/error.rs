//! Error types for the claimx-core library.

use thiserror::Error;

/// Main error type for the claimx library.
///
/// Only programmer and configuration mistakes end up here. A field that
/// simply could not be read is not an error: it is absent from the record.
#[derive(Error, Debug)]
pub enum ClaimxError {
    /// Field policy error.
    #[error("policy error: {0}")]
    Policy(#[from] PolicyError),

    /// Malformed OCR analysis document.
    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to field policies.
#[derive(Error, Debug, PartialEq)]
pub enum PolicyError {
    /// No policy is registered for the field name.
    #[error("no policy registered for field '{0}'")]
    UnknownField(String),

    /// A threshold is not a finite positive number.
    #[error("invalid {name} for field '{field}': {value}")]
    InvalidThreshold {
        field: String,
        name: &'static str,
        value: f32,
    },

    /// The field would never emit a row.
    #[error("field '{0}' has zero cardinality")]
    ZeroCardinality(String),

    /// The abort gap is tighter than the row gap.
    #[error("max_row_gap ({max_row_gap}) is below line_threshold ({line_threshold}) for field '{field}'")]
    GapBelowLineThreshold {
        field: String,
        line_threshold: f32,
        max_row_gap: f32,
    },
}

/// Errors related to OCR analysis documents.
#[derive(Error, Debug, PartialEq)]
pub enum DocumentError {
    /// Word geometry is neither a quadrilateral nor a bbox.
    #[error("word '{content}' has {len} coordinates, expected 8 (polygon) or 4 (bbox)")]
    MalformedPolygon { content: String, len: usize },

    /// The same field appears twice in one document.
    #[error("field '{0}' appears more than once")]
    DuplicateField(String),
}

/// Result type for the claimx library.
pub type Result<T> = std::result::Result<T, ClaimxError>;
