//! Roster ingestion.
//!
//! Two independent export sources feed a roster:
//!
//! - the LMS ("Moodle") grading export: comma-separated UTF-8, `-` as the
//!   missing-value sentinel, column names in either the localized or the
//!   canonical vocabulary;
//! - the registry ("KUSSS") participant export: semicolon-separated
//!   Windows-1252, institutional IDs carrying a single-letter prefix.
//!
//! Both readers return a polars [`polars::prelude::DataFrame`] with canonical
//! column names plus the non-fatal diagnostics gathered along the way.

pub mod error;
pub mod kusss;
pub mod moodle;
pub mod table;
pub mod translate;

pub use error::{IngestError, Result};
pub use kusss::{KusssReadOptions, read_kusss_participants};
pub use moodle::{MoodleReadOptions, read_moodle_roster};
pub use table::{column_values, format_rows, value_string};
pub use translate::translate_columns;
