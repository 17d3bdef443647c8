//! Error types for grade computation.

use thiserror::Error;

use crs_model::FormatError;

/// Errors that can occur while computing grades.
#[derive(Debug, Error)]
pub enum GradeError {
    /// Malformed input (missing score columns).
    #[error(transparent)]
    Format(#[from] FormatError),

    /// No grader registered under the requested name.
    #[error("unknown grader '{name}', available: {available}")]
    UnknownGrader { name: String, available: String },

    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },

    /// Table access through the ingestion helpers failed.
    #[error(transparent)]
    Ingest(#[from] crs_ingest::IngestError),
}

impl From<polars::prelude::PolarsError> for GradeError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

/// Result type for grading operations.
pub type Result<T> = std::result::Result<T, GradeError>;
