//! Shared data model for Course Roster Studio.
//!
//! Defines the canonical column vocabulary used across all tables, the
//! two-level fatal error taxonomy (format vs. consistency), and the
//! non-fatal diagnostic type that ingestion and merging surface alongside
//! their results.

pub mod columns;
pub mod diagnostics;
pub mod error;

pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use error::{ConsistencyError, FormatError};
