//! Splitting one submission archive into per-tutor archives.
//!
//! The LMS hands out a single ZIP whose top-level entries are named
//! `<Full name>_<7-digit id>_assignsubmission_file_`. Splitting recovers
//! the identity fields from these names, optionally joins them against the
//! roster, partitions the rows among the tutors, and writes one archive per
//! tutor whose entries are renamed to sortable `First_Surname_ID` folders.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crs_ingest::table::{column_values, format_rows, value_string};
use crs_model::columns::{
    FIRST_NAME, FULL_NAME, ID_NUMBER, MOODLE_ID, RESULT_NEW_SUBMISSION, RESULT_TUTOR_FILE,
    RESULT_TUTOR_NAME, RESULT_TUTOR_WEIGHT, SUBMISSION, SURNAME,
};
use crs_model::error::{ConsistencyError, FormatError};
use polars::prelude::{
    DataFrame, IntoLazy, JoinArgs, JoinType, MaintainOrderJoin, NamedFrom, Series,
    SortMultipleOptions, col,
};
use regex::Regex;
use tempfile::TempDir;
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::error::{Result, SplitError};
use crate::matcher::match_full_names;
use crate::partition::weighted_chunks;
use crate::tutors::{Tutor, normalize_tutors};

static FULL_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(.+)_\d{7}").expect("valid full-name regex"));
static MOODLE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{7}").expect("valid LMS ID regex"));

/// Knobs for [`split_submissions`]. [`SplitOptions::default`] matches the
/// LMS export conventions.
#[derive(Debug, Clone)]
pub struct SplitOptions {
    /// Words scanned (case-insensitively) in the archive name to infer the
    /// exercise number, e.g. `Assignment 3` or `UE-07`.
    pub exercise_names: Vec<String>,
    /// Explicit exercise number; skips inference from the archive name.
    pub exercise_number: Option<usize>,
    /// Name of the intermediate full-name column.
    pub full_name_column: String,
    /// Name of the intermediate LMS-internal ID column.
    pub moodle_id_column: String,
    /// Name of the column holding the original archive entry name.
    pub submission_column: String,
    /// Roster columns the per-tutor rows are sorted by.
    pub sorting_keys: Vec<String>,
    /// Roster columns whose values make up the renamed entry folders.
    pub renaming_keys: Vec<String>,
    /// Separator between the renaming key values.
    pub renaming_separator: String,
    /// Roster column holding first names; `None` probes all column pairs.
    pub first_name_column: Option<String>,
    /// Roster column holding surnames; `None` probes all column pairs.
    pub last_name_column: Option<String>,
    /// Directory for the per-tutor archives; the input archive's directory
    /// when unset.
    pub output_dir: Option<PathBuf>,
    /// Parent directory for the scratch extraction directory; the system
    /// temp directory when unset. The scratch directory itself is removed
    /// on every exit path.
    pub scratch_dir: Option<PathBuf>,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            exercise_names: ["Assignment", "Exercise", "UE", "Übung", "Aufgabe"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            exercise_number: None,
            full_name_column: FULL_NAME.to_string(),
            moodle_id_column: MOODLE_ID.to_string(),
            submission_column: SUBMISSION.to_string(),
            sorting_keys: vec![SURNAME.to_string(), FIRST_NAME.to_string()],
            renaming_keys: vec![
                FIRST_NAME.to_string(),
                SURNAME.to_string(),
                ID_NUMBER.to_string(),
            ],
            renaming_separator: "_".to_string(),
            first_name_column: Some(FIRST_NAME.to_string()),
            last_name_column: Some(SURNAME.to_string()),
            output_dir: None,
            scratch_dir: None,
        }
    }
}

/// What a split produced.
#[derive(Debug)]
pub struct SplitOutcome {
    /// One row per submission: roster fields plus tutor assignment and the
    /// renamed entry name.
    pub table: DataFrame,
    /// Paths of the written per-tutor archives, in tutor order.
    pub archives: Vec<PathBuf>,
    /// The exercise number the split was performed for.
    pub exercise_number: usize,
}

/// Splits `archive` among the tutors in `tutors`, optionally joining each
/// submission against `roster` rows by full name.
///
/// `progress` is invoked once per repackaged submission with the percentage
/// of submissions done.
pub fn split_submissions(
    archive: &Path,
    tutors: &DataFrame,
    roster: Option<&DataFrame>,
    options: &SplitOptions,
    mut progress: Option<&mut dyn FnMut(u8)>,
) -> Result<SplitOutcome> {
    let stem = archive
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let exercise_number = match options.exercise_number {
        Some(n) => n,
        None => infer_exercise_number(&stem, &options.exercise_names).ok_or_else(|| {
            FormatError::ExerciseNumberNotFound {
                file: archive.display().to_string(),
            }
        })?,
    };
    info!(archive = %archive.display(), exercise_number, "splitting submissions");

    let tutor_list = normalize_tutors(tutors, exercise_number)?;

    let scratch = match &options.scratch_dir {
        Some(parent) => TempDir::new_in(parent).map_err(|source| SplitError::Io {
            path: parent.clone(),
            source,
        })?,
        None => TempDir::new().map_err(|source| SplitError::Io {
            path: std::env::temp_dir(),
            source,
        })?,
    };
    extract_archive(archive, scratch.path())?;

    let entries = sorted_entry_names(scratch.path())?;
    let mut df = parse_entries(&entries, options)?;
    df = match roster {
        Some(roster) => join_roster(df, roster, options)?,
        None => df.sort(
            [options.submission_column.as_str()],
            SortMultipleOptions::default().with_maintain_order(true),
        )?,
    };

    // Catch absent renaming columns before any archive is written; silently
    // empty keys would collapse every entry to the same folder name.
    for key in &options.renaming_keys {
        if df.column(key).is_err() {
            return Err(FormatError::MissingColumn {
                column: key.clone(),
            }
            .into());
        }
    }

    let output_dir = match &options.output_dir {
        Some(dir) => dir.clone(),
        None => archive.parent().unwrap_or_else(|| Path::new(".")).to_path_buf(),
    };

    let weights: Vec<f64> = tutor_list.iter().map(|t| t.weight).collect();
    let chunks = weighted_chunks(&df, &weights);
    let total = df.height();
    let mut counter = 0usize;

    let mut archives = Vec::with_capacity(tutor_list.len());
    let mut table: Option<DataFrame> = None;
    for (tutor, chunk) in tutor_list.iter().zip(chunks) {
        let (annotated, path) = repackage_chunk(
            &chunk,
            tutor,
            scratch.path(),
            &output_dir,
            &stem,
            options,
            total,
            &mut counter,
            &mut progress,
        )?;
        archives.push(path);
        match table.as_mut() {
            Some(table) => {
                table.vstack_mut(&annotated)?;
            }
            None => table = Some(annotated),
        }
    }

    let mut table = table.unwrap_or(df);
    table = table.drop_many([
        options.full_name_column.as_str(),
        options.moodle_id_column.as_str(),
    ]);
    // Move the original entry name right before the renamed one.
    let width = table.width();
    let submission = table.drop_in_place(&options.submission_column)?;
    table.insert_column(width - 2, submission)?;

    Ok(SplitOutcome {
        table,
        archives,
        exercise_number,
    })
}

/// Scans `stem` for any of the exercise words followed by a number.
fn infer_exercise_number(stem: &str, exercise_names: &[String]) -> Option<usize> {
    for name in exercise_names {
        let pattern = format!(r"(?i){}[\s\-_]*(\d+)", regex::escape(name));
        let re = Regex::new(&pattern).ok()?;
        if let Some(captures) = re.captures(stem)
            && let Some(number) = captures.get(1)
            && let Ok(number) = number.as_str().parse()
        {
            return Some(number);
        }
    }
    None
}

fn extract_archive(archive: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive).map_err(|source| SplitError::Io {
        path: archive.to_path_buf(),
        source,
    })?;
    let mut zip = ZipArchive::new(file).map_err(|source| SplitError::Archive {
        path: archive.to_path_buf(),
        source,
    })?;
    zip.extract(dest).map_err(|source| SplitError::Archive {
        path: archive.to_path_buf(),
        source,
    })?;
    debug!(entries = zip.len(), "extracted archive");
    Ok(())
}

/// Top-level entry names of the extracted archive, sorted for determinism.
fn sorted_entry_names(dir: &Path) -> Result<Vec<String>> {
    let read_dir = std::fs::read_dir(dir).map_err(|source| SplitError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut names = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|source| SplitError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        names.push(entry.file_name().to_string_lossy().to_string());
    }
    names.sort();
    Ok(names)
}

/// Builds the submission table by matching identity fields out of every
/// entry name.
fn parse_entries(entries: &[String], options: &SplitOptions) -> Result<DataFrame> {
    let fields: [(&str, &Regex, usize); 2] = [
        (options.full_name_column.as_str(), &FULL_NAME_RE, 1),
        (options.moodle_id_column.as_str(), &MOODLE_ID_RE, 0),
    ];

    let mut columns = Vec::with_capacity(fields.len() + 1);
    for (column, re, group) in fields {
        let mut values = Vec::with_capacity(entries.len());
        for entry in entries {
            let value = re
                .captures(entry)
                .and_then(|c| c.get(group))
                .map(|m| m.as_str().to_string())
                .ok_or_else(|| FormatError::UnparsableSubmission {
                    entry: entry.clone(),
                    column: column.to_string(),
                    pattern: re.as_str().to_string(),
                })?;
            values.push(value);
        }
        columns.push(Series::new(column.into(), values).into());
    }
    columns.push(Series::new(options.submission_column.as_str().into(), entries.to_vec()).into());
    Ok(DataFrame::new(columns)?)
}

/// Joins the parsed submissions with the roster by full name and sorts the
/// result by the sorting keys.
fn join_roster(
    submissions: DataFrame,
    roster: &DataFrame,
    options: &SplitOptions,
) -> Result<DataFrame> {
    let (first_column, last_column) =
        match (&options.first_name_column, &options.last_name_column) {
            (Some(first), Some(last)) => (first.clone(), last.clone()),
            _ => {
                let full_names = column_values(&submissions, &options.full_name_column)?;
                match_full_names(&full_names, roster)?
            }
        };

    let first_names = column_values(roster, &first_column)?;
    let last_names = column_values(roster, &last_column)?;
    let roster_names: Vec<String> = first_names
        .iter()
        .zip(&last_names)
        .map(|(first, last)| format!("{first} {last}"))
        .collect();
    let mut roster = roster.clone();
    roster.with_column(Series::new(
        options.full_name_column.as_str().into(),
        roster_names.clone(),
    ))?;

    let joined = submissions
        .clone()
        .lazy()
        .join(
            roster.clone().lazy(),
            [col(options.full_name_column.as_str())],
            [col(options.full_name_column.as_str())],
            JoinArgs {
                maintain_order: MaintainOrderJoin::Left,
                ..JoinArgs::new(JoinType::Inner)
            },
        )
        .collect()?;

    if joined.height() != submissions.height() {
        return Err(join_mismatch(&submissions, &roster, &roster_names, options));
    }

    if options.sorting_keys.is_empty() {
        return Ok(joined);
    }
    let keys: Vec<&str> = options.sorting_keys.iter().map(|k| k.as_str()).collect();
    Ok(joined.sort(keys, SortMultipleOptions::default().with_maintain_order(true))?)
}

/// Explains a row-count change across the roster join: either the roster
/// carries ambiguous names or submissions have no roster counterpart.
fn join_mismatch(
    submissions: &DataFrame,
    roster: &DataFrame,
    roster_names: &[String],
    options: &SplitOptions,
) -> SplitError {
    let submitted: HashSet<String> = (0..submissions.height())
        .map(|idx| value_string(submissions, &options.full_name_column, idx))
        .collect();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for name in roster_names {
        *counts.entry(name.as_str()).or_insert(0) += 1;
    }
    // Only duplicates that actually joined inflate the row count; ambiguous
    // names without a submission are harmless here.
    let duplicated: Vec<usize> = roster_names
        .iter()
        .enumerate()
        .filter(|(_, name)| counts[name.as_str()] > 1 && submitted.contains(name.as_str()))
        .map(|(idx, _)| idx)
        .collect();
    if !duplicated.is_empty() {
        return ConsistencyError::DuplicateFullNames {
            listing: format_rows(roster, &duplicated),
        }
        .into();
    }

    let missing: Vec<usize> = (0..submissions.height())
        .filter(|&idx| {
            let name = value_string(submissions, &options.full_name_column, idx);
            !counts.contains_key(name.as_str())
        })
        .collect();
    ConsistencyError::SubmissionsNotInRoster {
        listing: format_rows(submissions, &missing),
    }
    .into()
}

/// Writes one tutor's archive and returns the chunk annotated with the
/// tutor assignment columns.
#[allow(clippy::too_many_arguments)]
fn repackage_chunk(
    chunk: &DataFrame,
    tutor: &Tutor,
    scratch: &Path,
    output_dir: &Path,
    stem: &str,
    options: &SplitOptions,
    total: usize,
    counter: &mut usize,
    progress: &mut Option<&mut dyn FnMut(u8)>,
) -> Result<(DataFrame, PathBuf)> {
    let archive_name = format!("{stem}_{}.zip", tutor.name);
    let path = output_dir.join(&archive_name);
    let file = File::create(&path).map_err(|source| SplitError::Io {
        path: path.clone(),
        source,
    })?;
    let mut writer = ZipWriter::new(file);

    let mut renamed_names = Vec::with_capacity(chunk.height());
    for row in 0..chunk.height() {
        let entry = value_string(chunk, &options.submission_column, row);
        // Without renaming keys the entries keep their original folder names.
        let renamed = if options.renaming_keys.is_empty() {
            entry.clone()
        } else {
            options
                .renaming_keys
                .iter()
                .map(|key| value_string(chunk, key, row))
                .collect::<Vec<_>>()
                .join(&options.renaming_separator)
        };
        copy_submission(&mut writer, &scratch.join(&entry), &renamed, &path)?;
        renamed_names.push(renamed);

        *counter += 1;
        if total > 0
            && let Some(report) = progress.as_mut()
        {
            report((100 * *counter / total) as u8);
        }
    }
    writer.finish().map_err(|source| SplitError::Archive {
        path: path.clone(),
        source,
    })?;
    debug!(tutor = %tutor.name, submissions = chunk.height(), "wrote tutor archive");

    let mut annotated = chunk.clone();
    annotated.with_column(Series::new(
        RESULT_TUTOR_NAME.into(),
        vec![tutor.name.clone(); chunk.height()],
    ))?;
    annotated.with_column(Series::new(
        RESULT_TUTOR_WEIGHT.into(),
        vec![tutor.weight; chunk.height()],
    ))?;
    annotated.with_column(Series::new(
        RESULT_TUTOR_FILE.into(),
        vec![archive_name.clone(); chunk.height()],
    ))?;
    annotated.with_column(Series::new(RESULT_NEW_SUBMISSION.into(), renamed_names))?;
    Ok((annotated, path))
}

/// Copies one extracted submission into the open archive under the renamed
/// top-level folder, preserving its internal layout.
fn copy_submission(
    writer: &mut ZipWriter<File>,
    source: &Path,
    renamed: &str,
    archive_path: &Path,
) -> Result<()> {
    for file in collect_files(source)? {
        let relative = file.strip_prefix(source).unwrap_or(&file);
        let mut arc_name = format!("{renamed}/{}", relative.display());
        if std::path::MAIN_SEPARATOR != '/' {
            arc_name = arc_name.replace(std::path::MAIN_SEPARATOR, "/");
        }
        writer
            .start_file(&arc_name, SimpleFileOptions::default())
            .map_err(|source| SplitError::Archive {
                path: archive_path.to_path_buf(),
                source,
            })?;
        let mut reader = File::open(&file).map_err(|source| SplitError::Io {
            path: file.clone(),
            source,
        })?;
        io::copy(&mut reader, writer).map_err(|source| SplitError::Io {
            path: file.clone(),
            source,
        })?;
    }
    Ok(())
}

/// All files below `root` (or `root` itself when it is a file), sorted.
fn collect_files(root: &Path) -> Result<Vec<PathBuf>> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let read_dir = std::fs::read_dir(&dir).map_err(|source| SplitError::Io {
            path: dir.clone(),
            source,
        })?;
        for entry in read_dir {
            let entry = entry.map_err(|source| SplitError::Io {
                path: dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}
