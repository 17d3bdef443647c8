//! Error types for roster ingestion.

use std::path::PathBuf;
use thiserror::Error;

use crs_model::FormatError;

/// Errors that can occur while reading roster exports.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Malformed input content (fatal, never auto-corrected).
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Failed to read an export file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse a CSV export.
    #[error("failed to parse CSV {path}: {message}")]
    CsvParse { path: PathBuf, message: String },

    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl From<polars::prelude::PolarsError> for IngestError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
