//! Error types for roster merging.

use thiserror::Error;

use crs_model::ConsistencyError;

/// Errors that can occur while merging rosters.
#[derive(Debug, Error)]
pub enum MergeError {
    /// Contradicting registrations that require manual correction.
    #[error(transparent)]
    Consistency(#[from] ConsistencyError),

    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },

    /// Table access through the ingestion helpers failed.
    #[error(transparent)]
    Ingest(#[from] crs_ingest::IngestError),
}

impl From<polars::prelude::PolarsError> for MergeError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

/// Result type for merge operations.
pub type Result<T> = std::result::Result<T, MergeError>;
