//! Error types for submission splitting.

use std::path::PathBuf;
use thiserror::Error;

use crs_model::{ConsistencyError, FormatError};

/// Errors that can occur while splitting a submission archive.
#[derive(Debug, Error)]
pub enum SplitError {
    /// Malformed input (archive entry names, tutor entries, IDs).
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Contradicting data that requires manual correction.
    #[error(transparent)]
    Consistency(#[from] ConsistencyError),

    /// Failed to read or write a file.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed ZIP archive operation.
    #[error("archive error on {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },

    /// Table access through the ingestion helpers failed.
    #[error(transparent)]
    Ingest(#[from] crs_ingest::IngestError),
}

impl From<polars::prelude::PolarsError> for SplitError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

/// Result type for splitting operations.
pub type Result<T> = std::result::Result<T, SplitError>;
