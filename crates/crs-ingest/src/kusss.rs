//! Registry ("KUSSS") participant export reader.
//!
//! The registry exports one semicolon-separated, Windows-1252 encoded CSV per
//! course. Only the matriculation-ID and program-ID columns are kept; the
//! course ID is not part of the data and is recovered from the file name.
//! IDs must match `k<8 digits>` exactly, anything else is a hard format
//! error. Exact duplicate rows (stale registrations) are dropped with a
//! diagnostic.

use std::collections::HashSet;
use std::io::Cursor;
use std::path::Path;
use std::sync::LazyLock;

use polars::prelude::{
    AnyValue, BooleanChunked, CsvParseOptions, CsvReadOptions, DataFrame, NamedFrom,
    NewChunkedArray, SerReader, Series,
};
use regex::Regex;
use tracing::{debug, warn};

use crs_model::columns::{ID_NUMBER, STUDY_ID};
use crs_model::{Diagnostic, DiagnosticKind, FormatError};

use crate::error::{IngestError, Result};
use crate::table::{column_values, format_rows};

/// `123.456` or `123456` somewhere in the export file name.
static COURSE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{3}\.\d{3}|\d{6}").expect("valid course ID regex"));

/// Single-letter prefix followed by exactly 8 digits.
static MATR_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^k\d{8}$").expect("valid matriculation ID regex"));

/// Options for reading registry participant exports.
#[derive(Debug, Clone)]
pub struct KusssReadOptions {
    /// Source column holding the prefixed matriculation ID.
    pub id_column: String,
    /// Source column holding the program (study) ID.
    pub study_column: String,
}

impl Default for KusssReadOptions {
    fn default() -> Self {
        Self {
            id_column: "Matrikelnummer".to_string(),
            study_column: "SKZ".to_string(),
        }
    }
}

/// Reads one or more registry exports into a single participant table with
/// canonical `ID number` / `Study ID` columns plus the supplied course-ID
/// column.
pub fn read_kusss_participants(
    files: &[impl AsRef<Path>],
    course_column: &str,
    options: &KusssReadOptions,
) -> Result<(DataFrame, Vec<Diagnostic>)> {
    let mut combined: Option<DataFrame> = None;
    for file in files {
        let df = read_one(file.as_ref(), course_column, options)?;
        combined = Some(match combined {
            Some(mut base) => {
                base.vstack_mut(&df)?;
                base
            }
            None => df,
        });
    }
    let Some(full) = combined else {
        return Err(IngestError::DataFrame {
            message: "no registry export files given".to_string(),
        });
    };

    let full = strip_id_prefixes(full, options)?;
    let (mut deduped, diagnostics) = drop_duplicate_rows(full)?;
    deduped.rename(&options.id_column, ID_NUMBER.into())?;
    deduped.rename(&options.study_column, STUDY_ID.into())?;
    Ok((deduped, diagnostics))
}

fn read_one(path: &Path, course_column: &str, options: &KusssReadOptions) -> Result<DataFrame> {
    let bytes = std::fs::read(path).map_err(|source| IngestError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    // The registry exports in a legacy single-byte encoding; decode before
    // handing UTF-8 to the CSV reader.
    let (text, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
    let cursor = Cursor::new(text.into_owned().into_bytes());

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .with_parse_options(CsvParseOptions::default().with_separator(b';'))
        .into_reader_with_file_handle(cursor)
        .finish()
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    let mut df = df.select([options.id_column.as_str(), options.study_column.as_str()])?;
    debug!(rows = df.height(), path = %path.display(), "read registry export");

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let course_id = COURSE_ID_RE
        .find(&file_name)
        .map(|m| m.as_str().replace('.', ""))
        .ok_or_else(|| FormatError::CourseIdNotFound {
            file: file_name.clone(),
        })?;
    let course = vec![course_id; df.height()];
    df.with_column(Series::new(course_column.into(), course))?;
    Ok(df)
}

/// Validates every ID against the `k<8 digits>` form and strips the prefix.
fn strip_id_prefixes(mut df: DataFrame, options: &KusssReadOptions) -> Result<DataFrame> {
    let ids = column_values(&df, &options.id_column)?;
    let mut stripped = Vec::with_capacity(ids.len());
    for id in &ids {
        if !MATR_ID_RE.is_match(id) {
            return Err(FormatError::InvalidStudentId { value: id.clone() }.into());
        }
        stripped.push(id[1..].to_string());
    }
    df.replace(
        &options.id_column,
        Series::new(options.id_column.as_str().into(), stripped),
    )?;
    Ok(df)
}

/// Drops exact duplicate rows, keeping the first occurrence. Duplicates can
/// legitimately appear when a student was unregistered from one course but
/// the export still carries an entry.
fn drop_duplicate_rows(df: DataFrame) -> Result<(DataFrame, Vec<Diagnostic>)> {
    let mut seen = HashSet::new();
    let mut keep = Vec::with_capacity(df.height());
    let mut dropped = Vec::new();
    for idx in 0..df.height() {
        let key: Vec<String> = df
            .get_columns()
            .iter()
            .map(|col| crate::table::any_to_string(col.get(idx).unwrap_or(AnyValue::Null)))
            .collect();
        if seen.insert(key) {
            keep.push(true);
        } else {
            keep.push(false);
            dropped.push(idx);
        }
    }

    let mut diagnostics = Vec::new();
    if !dropped.is_empty() {
        let diag = Diagnostic::new(
            DiagnosticKind::DuplicateRegistryRows,
            format!(
                "{} duplicate registry entries dropped (might be OK, e.g. a student \
                 unregistered from one course but the export still contains an entry):\n{}",
                dropped.len(),
                format_rows(&df, &dropped)
            ),
        );
        warn!("{diag}");
        diagnostics.push(diag);
    }
    let filtered = df.filter(&BooleanChunked::from_slice("keep".into(), &keep))?;
    Ok((filtered, diagnostics))
}
