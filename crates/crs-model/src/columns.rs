//! Canonical column names shared by rosters, tutor tables and result tables.
//!
//! Every table that crosses a crate boundary uses these names. The column
//! translator maps the localized Moodle export vocabulary onto the canonical
//! one; the KUSSS reader renames its source columns on ingestion.

/// Student first name (identity column).
pub const FIRST_NAME: &str = "First name";
/// Student surname (identity column).
pub const SURNAME: &str = "Surname";
/// Canonical 8-digit institutional ID, zero-padded, prefix stripped.
pub const ID_NUMBER: &str = "ID number";
/// Student e-mail address.
pub const EMAIL: &str = "Email address";
/// Program (study) identifier from the registry export.
pub const STUDY_ID: &str = "Study ID";

/// Display position of [`STUDY_ID`] after a merge.
pub const STUDY_ID_POSITION: usize = 4;

/// Full name as embedded in submission archive entries.
pub const FULL_NAME: &str = "full_name";
/// 7-digit ID the LMS embeds in submission entry names.
pub const MOODLE_ID: &str = "moodle_id";
/// Relative path of a submission inside the archive.
pub const SUBMISSION: &str = "Submission file";

/// Tutor name column of a normalized tutor table.
pub const TUTOR_NAME: &str = "name";
/// Tutor weight column of a normalized tutor table.
pub const TUTOR_WEIGHT: &str = "weight";

/// Assigned tutor, attached to the split result table.
pub const RESULT_TUTOR_NAME: &str = "Tutor name";
/// Assigned tutor weight, attached to the split result table.
pub const RESULT_TUTOR_WEIGHT: &str = "Tutor weight";
/// Per-tutor output archive path.
pub const RESULT_TUTOR_FILE: &str = "Tutor file";
/// Anonymized submission name inside the per-tutor archive.
pub const RESULT_NEW_SUBMISSION: &str = "New submission file";

/// Computed grade (1-5, or -1 when no data exists).
pub const GRADE: &str = "Grade";
/// Reason accompanying a grade (empty unless failed or missing data).
pub const REASON: &str = "Reason";

/// Prefix of assignment score columns in the canonical vocabulary.
pub const ASSIGNMENT_PREFIX: &str = "Assignment:";
/// Prefix of quiz score columns in the canonical vocabulary.
pub const QUIZ_PREFIX: &str = "Quiz:";

/// The identity columns every roster carries, in display order.
pub const IDENTITY_COLUMNS: [&str; 4] = [FIRST_NAME, SURNAME, ID_NUMBER, EMAIL];
