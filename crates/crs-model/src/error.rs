//! Fatal error taxonomy.
//!
//! Two families, both always fatal and never auto-corrected:
//!
//! - [`FormatError`]: malformed input that cannot be interpreted at all
//!   (bad institutional IDs, untranslatable columns, unparseable submission
//!   entry names). Guessing here would silently corrupt grading and
//!   assignment downstream.
//! - [`ConsistencyError`]: well-formed inputs that contradict each other
//!   (duplicate IDs, conflicting registrations, ambiguous names). These
//!   carry the offending record subset rendered as text so the operator can
//!   correct the source data manually.
//!
//! Non-fatal findings are [`crate::Diagnostic`]s, not errors.

use thiserror::Error;

/// Malformed input that cannot be interpreted.
#[derive(Debug, Error)]
pub enum FormatError {
    /// Institutional ID does not match the expected `k<8 digits>` form.
    #[error("invalid institutional ID '{value}': expected a single-letter prefix followed by exactly 8 digits")]
    InvalidStudentId { value: String },

    /// Column translation produced a name identical to its original.
    #[error("could not translate column '{column}' into the canonical vocabulary")]
    UntranslatableColumn { column: String },

    /// A submission archive entry does not follow the filename-embedding protocol.
    #[error("submission '{entry}' does not contain pattern '{pattern}' for field '{column}'")]
    UnparsableSubmission {
        entry: String,
        column: String,
        pattern: String,
    },

    /// A required column is absent from an input table.
    #[error("required column '{column}' not found")]
    MissingColumn { column: String },

    /// No course number could be found in a registry export filename.
    #[error("could not extract a course ID from file name '{file}'")]
    CourseIdNotFound { file: String },

    /// The exercise number was neither given nor inferable from the archive name.
    #[error("could not infer exercise number from '{file}', must specify it manually")]
    ExerciseNumberNotFound { file: String },

    /// A tutor list entry mixes weighted and unweighted syntax.
    #[error("malformed tutor entry '{entry}': {reason}")]
    TutorEntry { entry: String, reason: String },
}

/// Inputs that contradict each other and require manual correction.
#[derive(Debug, Error)]
pub enum ConsistencyError {
    /// More than one roster row carries the same institutional ID.
    #[error("multiple roster rows for institutional ID {id}:\n{listing}")]
    DuplicateStudentId { id: String, listing: String },

    /// A student appears with two different program IDs.
    #[error("student {id} has differing study IDs ('{existing}' vs '{incoming}')")]
    StudyIdConflict {
        id: String,
        existing: String,
        incoming: String,
    },

    /// A student is already assigned a course in the given column.
    #[error("student {id} already has an assigned '{column}':\n{listing}")]
    CourseAlreadyAssigned {
        id: String,
        column: String,
        listing: String,
    },

    /// Several roster rows share one full name; submissions cannot be joined safely.
    #[error("duplicate names detected:\n{listing}")]
    DuplicateFullNames { listing: String },

    /// Submissions whose full names do not appear in the roster at all.
    #[error(
        "the following submissions are not part of the roster (wrong course? \
         stale export?):\n{listing}"
    )]
    SubmissionsNotInRoster { listing: String },

    /// No ordered column pair reproduces all observed full names.
    #[error(
        "could not identify first/last name columns; closest mismatch for \
         columns '{first}' and '{second}', unmatched names: {unmatched:?}"
    )]
    NameColumnsNotFound {
        first: String,
        second: String,
        unmatched: Vec<String>,
    },
}
