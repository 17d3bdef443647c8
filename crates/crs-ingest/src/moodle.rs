//! LMS ("Moodle") grading export reader.
//!
//! Produces the primary roster: identity columns plus every assignment and
//! quiz score column, with institutional IDs normalized to their canonical
//! 8-digit form. Rows that cannot belong to registered students (non-numeric
//! IDs from manually added accounts, non-student e-mail addresses) are
//! dropped with a diagnostic, never silently.

use std::path::Path;

use polars::prelude::{
    BooleanChunked, CsvParseOptions, CsvReadOptions, DataFrame, NamedFrom, NewChunkedArray,
    NullValues, SerReader, Series,
};
use tracing::{debug, warn};

use crs_model::columns::{ASSIGNMENT_PREFIX, EMAIL, ID_NUMBER, IDENTITY_COLUMNS, QUIZ_PREFIX};
use crs_model::{Diagnostic, DiagnosticKind, FormatError};

use crate::error::{IngestError, Result};
use crate::table::{column_values, format_rows};
use crate::translate::translate_columns;

/// Options for reading the LMS grading export.
#[derive(Debug, Clone)]
pub struct MoodleReadOptions {
    /// Columns to keep in addition to the identity and score columns.
    pub keep_columns: Vec<String>,
    /// Case-insensitive words that mark an assignment column as ignorable.
    pub ignore_assignment_words: Vec<String>,
    /// Case-insensitive words that mark a quiz column as ignorable.
    pub ignore_quiz_words: Vec<String>,
    /// Substring a student e-mail address must contain; rows failing the
    /// check are dropped (lecturers and tutors enrolled in the course).
    pub student_email_marker: String,
}

impl Default for MoodleReadOptions {
    fn default() -> Self {
        Self {
            keep_columns: Vec::new(),
            ignore_assignment_words: Vec::new(),
            ignore_quiz_words: vec!["dummy".to_string()],
            student_email_marker: "@students.jku.at".to_string(),
        }
    }
}

/// Reads, translates and normalizes the LMS grading export.
pub fn read_moodle_roster(
    path: &Path,
    options: &MoodleReadOptions,
) -> Result<(DataFrame, Vec<Diagnostic>)> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_parse_options(
            CsvParseOptions::default()
                .with_null_values(Some(NullValues::AllColumnsSingle("-".into()))),
        )
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .finish()
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    debug!(rows = df.height(), columns = df.width(), "read LMS export");

    let df = translate_columns(&df)?;
    let df = filter_columns(&df, options)?;
    normalize_ids(df, options)
}

/// Keeps the identity columns, the non-ignored score columns and any
/// explicitly requested extras, in that order.
fn filter_columns(df: &DataFrame, options: &MoodleReadOptions) -> Result<DataFrame> {
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();
    for required in IDENTITY_COLUMNS {
        if !names.iter().any(|n| n == required) {
            return Err(FormatError::MissingColumn {
                column: required.to_string(),
            }
            .into());
        }
    }

    let ignore_assignments: Vec<String> = options
        .ignore_assignment_words
        .iter()
        .map(|w| w.to_lowercase())
        .collect();
    let ignore_quizzes: Vec<String> = options
        .ignore_quiz_words
        .iter()
        .map(|w| w.to_lowercase())
        .collect();

    // Identity first, then all assignment columns, then all quiz columns.
    let mut keep: Vec<String> = IDENTITY_COLUMNS.iter().map(|c| (*c).to_string()).collect();
    let mut assignments = Vec::new();
    let mut quizzes = Vec::new();
    for name in &names {
        let lowered = name.to_lowercase();
        if name.starts_with(ASSIGNMENT_PREFIX)
            && !ignore_assignments.iter().any(|w| lowered.contains(w))
        {
            assignments.push(name.clone());
        } else if name.starts_with(QUIZ_PREFIX)
            && !ignore_quizzes.iter().any(|w| lowered.contains(w))
        {
            quizzes.push(name.clone());
        }
    }
    keep.extend(assignments);
    keep.extend(quizzes);
    for extra in &options.keep_columns {
        if !keep.contains(extra) {
            keep.push(extra.clone());
        }
    }

    let dropped: Vec<&String> = names.iter().filter(|n| !keep.contains(n)).collect();
    if !dropped.is_empty() {
        debug!(?dropped, "dropped LMS export columns");
    }
    Ok(df.select(keep)?)
}

/// Drops rows with non-numeric IDs or non-student e-mail addresses and
/// zero-pads the remaining IDs to 8 digits.
fn normalize_ids(
    df: DataFrame,
    options: &MoodleReadOptions,
) -> Result<(DataFrame, Vec<Diagnostic>)> {
    let ids = column_values(&df, ID_NUMBER)?;
    let emails = column_values(&df, EMAIL)?;

    let mut keep = vec![true; df.height()];
    let mut invalid_ids = Vec::new();
    let mut non_students = Vec::new();
    for idx in 0..df.height() {
        if ids[idx].is_empty() || ids[idx].chars().any(|c| !c.is_ascii_digit()) {
            keep[idx] = false;
            invalid_ids.push(idx);
        } else if !emails[idx].contains(&options.student_email_marker) {
            keep[idx] = false;
            non_students.push(idx);
        }
    }

    let mut diagnostics = Vec::new();
    let identity = df.select(IDENTITY_COLUMNS)?;
    if !invalid_ids.is_empty() {
        let diag = Diagnostic::new(
            DiagnosticKind::InvalidIdDropped,
            format!(
                "{} entries dropped due to invalid institutional IDs:\n{}",
                invalid_ids.len(),
                format_rows(&identity, &invalid_ids)
            ),
        );
        warn!("{diag}");
        diagnostics.push(diag);
    }
    if !non_students.is_empty() {
        let diag = Diagnostic::new(
            DiagnosticKind::NonStudentEmailDropped,
            format!(
                "{} entries dropped due to non-student e-mail addresses:\n{}",
                non_students.len(),
                format_rows(&identity, &non_students)
            ),
        );
        warn!("{diag}");
        diagnostics.push(diag);
    }

    let mut out = df.filter(&BooleanChunked::from_slice("keep".into(), &keep))?;
    let padded: Vec<String> = ids
        .iter()
        .zip(&keep)
        .filter(|(_, kept)| **kept)
        .map(|(id, _)| match id.parse::<u64>() {
            Ok(numeric) => format!("{numeric:08}"),
            Err(_) => id.clone(),
        })
        .collect();
    out.replace(ID_NUMBER, Series::new(ID_NUMBER.into(), padded))?;
    Ok((out, diagnostics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    const EXPORT: &str = "\
First name,Surname,ID number,Email address,Assignment: Ex 1 (Real),Quiz: Dummy run (Real),Quiz: Exam (Real),Status
Ada,Lovelace,1234567,ada@students.jku.at,10,1,24,ok
Grace,Hopper,7654321,grace@students.jku.at,-,2,17,ok
Eve,Intruder,x99,eve@students.jku.at,3,3,3,ok
Tom,Tutor,1111111,tom@jku.at,4,4,4,ok
";

    #[test]
    fn reads_and_filters_roster() {
        let file = write_csv(EXPORT);
        let (df, diagnostics) =
            read_moodle_roster(file.path(), &MoodleReadOptions::default()).unwrap();

        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        // Dummy quiz and the Status column are gone, identity columns first.
        assert_eq!(
            names,
            vec![
                "First name",
                "Surname",
                "ID number",
                "Email address",
                "Assignment: Ex 1 (Real)",
                "Quiz: Exam (Real)",
            ]
        );
        // Invalid ID and non-student e-mail rows are dropped with diagnostics.
        assert_eq!(df.height(), 2);
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::InvalidIdDropped);
        assert_eq!(diagnostics[1].kind, DiagnosticKind::NonStudentEmailDropped);
    }

    #[test]
    fn ids_are_zero_padded() {
        let file = write_csv(EXPORT);
        let (df, _) = read_moodle_roster(file.path(), &MoodleReadOptions::default()).unwrap();
        let ids = column_values(&df, ID_NUMBER).unwrap();
        assert_eq!(ids, vec!["01234567", "07654321"]);
    }

    #[test]
    fn missing_value_sentinel_becomes_null() {
        let file = write_csv(EXPORT);
        let (df, _) = read_moodle_roster(file.path(), &MoodleReadOptions::default()).unwrap();
        let col = df.column("Assignment: Ex 1 (Real)").unwrap();
        assert_eq!(col.null_count(), 1);
    }

    #[test]
    fn score_columns_are_grouped_by_kind() {
        // Exports interleave assignment and quiz columns; the roster keeps
        // all assignments together, followed by all quizzes.
        let file = write_csv(
            "\
First name,Surname,ID number,Email address,Quiz: Exam (Real),Assignment: Ex 1 (Real),Quiz: Retry Exam (Real),Assignment: Ex 2 (Real)
Ada,Lovelace,1234567,ada@students.jku.at,24,10,20,9
",
        );
        let (df, _) = read_moodle_roster(file.path(), &MoodleReadOptions::default()).unwrap();
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "First name",
                "Surname",
                "ID number",
                "Email address",
                "Assignment: Ex 1 (Real)",
                "Assignment: Ex 2 (Real)",
                "Quiz: Exam (Real)",
                "Quiz: Retry Exam (Real)",
            ]
        );
    }

    #[test]
    fn missing_identity_column_is_fatal() {
        let file = write_csv("First name,Surname,ID number\nAda,Lovelace,1\n");
        let err = read_moodle_roster(file.path(), &MoodleReadOptions::default()).unwrap_err();
        assert!(err.to_string().contains("Email address"));
    }
}
