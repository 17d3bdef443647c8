//! Subcommand implementations.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use polars::prelude::{CsvReadOptions, CsvWriter, DataFrame, SerReader, SerWriter};
use tracing::info;

use crs_grade::grader;
use crs_ingest::{
    KusssReadOptions, MoodleReadOptions, read_kusss_participants, read_moodle_roster,
};
use crs_model::Diagnostic;
use crs_roster::{MergeOptions, merge_rosters};
use crs_split::{SplitOptions, SplitOutcome, parse_tutor_entries, split_submissions};
use crs_worker::TaskEvent;

use crate::cli::{GradeArgs, RosterArgs, SplitArgs};

pub struct RosterResult {
    pub roster: DataFrame,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn run_roster(args: &RosterArgs) -> Result<RosterResult> {
    let (mut roster, mut diagnostics) =
        read_moodle_roster(&args.moodle, &MoodleReadOptions::default())
            .with_context(|| format!("read LMS export {}", args.moodle.display()))?;

    if !args.kusss.is_empty() {
        let (participants, kusss_diagnostics) = read_kusss_participants(
            &args.kusss,
            &args.course_column,
            &KusssReadOptions::default(),
        )
        .context("read registry exports")?;
        diagnostics.extend(kusss_diagnostics);

        let mut options = MergeOptions::new(args.course_column.clone());
        options.warn_if_not_found_in_kusss_participants = args.warn_missing_kusss;
        let (merged, merge_diagnostics) =
            merge_rosters(&roster, &participants, &options).context("merge rosters")?;
        roster = merged;
        diagnostics.extend(merge_diagnostics);
    }

    if let Some(path) = &args.output {
        write_table(&mut roster, path)?;
        info!(path = %path.display(), "wrote roster");
    }
    Ok(RosterResult {
        roster,
        diagnostics,
    })
}

pub fn run_split(args: &SplitArgs) -> Result<SplitOutcome> {
    let tutors = parse_tutor_entries(&args.tutors)?;
    let roster = match &args.roster {
        Some(path) => Some(read_table(path)?),
        None => None,
    };
    let defaults = SplitOptions::default();
    let options = SplitOptions {
        exercise_number: args.number,
        output_dir: args.output_dir.clone(),
        // Renaming needs roster identity columns; without a roster the
        // entries keep their original names.
        renaming_keys: if roster.is_some() {
            defaults.renaming_keys.clone()
        } else {
            Vec::new()
        },
        ..defaults
    };

    let archive = args.archive.clone();
    let receiver = crs_worker::spawn(move |progress| {
        Ok(split_submissions(
            &archive,
            &tutors,
            roster.as_ref(),
            &options,
            Some(progress),
        )?)
    });

    let bar = ProgressBar::new(100);
    bar.set_style(ProgressStyle::with_template(
        "{bar:40.cyan/blue} {pos:>3}% splitting submissions",
    )?);
    let mut outcome = None;
    let mut failure = None;
    for event in receiver {
        match event {
            TaskEvent::Progress(pct) => bar.set_position(u64::from(pct)),
            TaskEvent::Completed(result) => outcome = Some(result),
            TaskEvent::Failed(error) => failure = Some(error),
            TaskEvent::Finished => break,
        }
    }
    bar.finish_and_clear();
    if let Some(error) = failure {
        return Err(error);
    }
    let mut outcome = outcome.ok_or_else(|| anyhow!("split task ended without a result"))?;

    if let Some(path) = &args.output {
        write_table(&mut outcome.table, path)?;
        info!(path = %path.display(), "wrote assignment table");
    }
    Ok(outcome)
}

pub fn run_grade(args: &GradeArgs) -> Result<DataFrame> {
    let roster = read_table(&args.roster)?;
    let grader = grader(&args.grader, args.max_points)?;
    let mut grades = grader
        .create_grading_file(&roster)
        .with_context(|| format!("apply grader '{}'", args.grader))?;
    info!(students = grades.height(), grader = %args.grader, "computed grades");

    if let Some(path) = &args.output {
        write_table(&mut grades, path)?;
        info!(path = %path.display(), "wrote grade table");
    }
    Ok(grades)
}

/// Reads a CSV written by this tool (or any comma-separated table) with all
/// columns as strings, so downstream cell parsing stays uniform.
fn read_table(path: &Path) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .with_context(|| format!("read table {}", path.display()))
}

fn write_table(df: &mut DataFrame, path: &Path) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("create output file {}", path.display()))?;
    CsvWriter::new(file)
        .finish(df)
        .with_context(|| format!("write table {}", path.display()))?;
    Ok(())
}
