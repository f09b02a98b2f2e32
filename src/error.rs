//! Error types for leave-one-out kNN evaluation

use thiserror::Error;

/// Result type alias for knn_cv operations
pub type Result<T> = std::result::Result<T, KnnCvError>;

/// Fitness reported in place of an accuracy when a mask produces too many ties.
///
/// Lies outside `[0, 1]`, so it can never be mistaken for a real accuracy.
pub const TOO_MANY_TIES_SENTINEL: f64 = -2.0;

/// Main error type for the knn_cv crate
#[derive(Error, Debug)]
pub enum KnnCvError {
    #[error("Attempted to create a classifier for an empty dataset")]
    EmptyDataset,

    #[error("Leave-one-out needs at least 2 rows, got {rows}")]
    TooFewRows { rows: usize },

    #[error("Ragged dataset: row {row} has {actual} columns, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Non-numeric value {value:?} at row {row}, column {column}")]
    NonNumeric {
        row: usize,
        column: usize,
        value: String,
    },

    #[error("Label count mismatch: expected {expected} labels, got {actual}")]
    LabelCountMismatch { expected: usize, actual: usize },

    #[error("Numeric flag count mismatch: expected {expected} flags, got {actual}")]
    NumericMaskMismatch { expected: usize, actual: usize },

    #[error("Label {label} at row {row} is outside 0..{n_classes}")]
    LabelOutOfRange {
        row: usize,
        label: usize,
        n_classes: usize,
    },

    #[error("Invalid feature mask: expected {expected} entries, got {actual}")]
    InvalidMask { expected: usize, actual: usize },

    #[error("Too many ties: neighbor buffer capacity of {capacity} exceeded")]
    TooManyTies { capacity: usize },

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Data error: {0}")]
    DataError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl KnnCvError {
    /// Whether this error was raised while building a dataset or classifier.
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            KnnCvError::EmptyDataset
                | KnnCvError::TooFewRows { .. }
                | KnnCvError::RaggedRow { .. }
                | KnnCvError::NonNumeric { .. }
                | KnnCvError::LabelCountMismatch { .. }
                | KnnCvError::NumericMaskMismatch { .. }
                | KnnCvError::LabelOutOfRange { .. }
        )
    }

    pub(crate) fn invalid_parameter(
        name: &str,
        value: impl ToString,
        reason: &str,
    ) -> Self {
        KnnCvError::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<polars::error::PolarsError> for KnnCvError {
    fn from(err: polars::error::PolarsError) -> Self {
        KnnCvError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for KnnCvError {
    fn from(err: serde_json::Error) -> Self {
        KnnCvError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for KnnCvError {
    fn from(err: ndarray::ShapeError) -> Self {
        KnnCvError::DataError(err.to_string())
    }
}
