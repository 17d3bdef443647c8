//! Merging a roster with registry participant tables.

use std::collections::HashSet;

use polars::prelude::{
    DataFrame, IntoLazy, JoinArgs, JoinType, MaintainOrderJoin, NamedFrom, Series, col,
};
use tracing::{debug, warn};

use crs_ingest::table::{column_values, format_rows};
use crs_model::columns::{ID_NUMBER, STUDY_ID, STUDY_ID_POSITION};
use crs_model::{ConsistencyError, Diagnostic, DiagnosticKind};

use crate::error::Result;

/// Options for merging a registry participant table into a roster.
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Join key present in both tables.
    pub id_column: String,
    /// Program-ID column carried by the participant table.
    pub study_column: String,
    /// Course-ID column carried by the participant table. Externally
    /// supplied since one roster can accumulate several course columns
    /// (e.g. lecture and exercise).
    pub course_column: String,
    /// Also report roster rows without a registry counterpart.
    pub warn_if_not_found_in_kusss_participants: bool,
}

impl MergeOptions {
    pub fn new(course_column: impl Into<String>) -> Self {
        Self {
            id_column: ID_NUMBER.to_string(),
            study_column: STUDY_ID.to_string(),
            course_column: course_column.into(),
            warn_if_not_found_in_kusss_participants: false,
        }
    }
}

/// Merges a registry participant table into the roster.
///
/// The first merge performs a left outer join on the institutional ID. Once
/// the roster already carries a program-ID or course-ID column, further
/// merges are layered row by row and reject conflicting program IDs,
/// duplicate institutional IDs and multiple course registrations as
/// consistency errors. Missing counterparts in either direction are
/// non-fatal diagnostics.
pub fn merge_rosters(
    roster: &DataFrame,
    participants: &DataFrame,
    options: &MergeOptions,
) -> Result<(DataFrame, Vec<Diagnostic>)> {
    let roster_columns: Vec<String> = roster
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();
    let layered = roster_columns.contains(&options.study_column)
        || roster_columns.contains(&options.course_column);

    let mut merged = if layered {
        merge_layered(roster, participants, options)?
    } else {
        merge_first(roster, participants, options)?
    };
    debug!(
        rows = merged.height(),
        columns = merged.width(),
        "merged registry participants into roster"
    );

    let mut diagnostics = Vec::new();
    report_missing_counterparts(&merged, roster, participants, options, &mut diagnostics)?;

    // Keep the program ID next to the identity columns for display.
    let study = merged.drop_in_place(&options.study_column)?;
    let position = STUDY_ID_POSITION.min(merged.width());
    merged.insert_column(position, study)?;
    Ok((merged, diagnostics))
}

/// Left outer join, dropping duplicate columns the participant table brings
/// along (except the join key).
fn merge_first(
    roster: &DataFrame,
    participants: &DataFrame,
    options: &MergeOptions,
) -> Result<DataFrame> {
    let args = JoinArgs {
        suffix: Some("_y".into()),
        maintain_order: MaintainOrderJoin::Left,
        ..JoinArgs::new(JoinType::Left)
    };
    let joined = roster
        .clone()
        .lazy()
        .join(
            participants.clone().lazy(),
            [col(options.id_column.as_str())],
            [col(options.id_column.as_str())],
            args,
        )
        .collect()?;
    let duplicates: Vec<String> = joined
        .get_column_names()
        .iter()
        .filter(|name| name.ends_with("_y"))
        .map(|name| name.to_string())
        .collect();
    Ok(joined.drop_many(duplicates))
}

/// Row-wise merge for a second course: enrich matching rows, reject
/// conflicting registrations.
fn merge_layered(
    roster: &DataFrame,
    participants: &DataFrame,
    options: &MergeOptions,
) -> Result<DataFrame> {
    let mut merged = roster.clone();
    let height = merged.height();
    if merged.column(&options.course_column).is_err() {
        merged.with_column(Series::new(
            options.course_column.as_str().into(),
            vec![None::<String>; height],
        ))?;
    }
    if merged.column(&options.study_column).is_err() {
        merged.with_column(Series::new(
            options.study_column.as_str().into(),
            vec![None::<String>; height],
        ))?;
    }

    let roster_ids = column_values(&merged, &options.id_column)?;
    let mut studies = optional_values(&merged, &options.study_column)?;
    let mut courses = optional_values(&merged, &options.course_column)?;

    let incoming_ids = column_values(participants, &options.id_column)?;
    let incoming_studies = column_values(participants, &options.study_column)?;
    let incoming_courses = column_values(participants, &options.course_column)?;

    for (row, id) in incoming_ids.iter().enumerate() {
        let matches: Vec<usize> = roster_ids
            .iter()
            .enumerate()
            .filter(|(_, roster_id)| *roster_id == id)
            .map(|(idx, _)| idx)
            .collect();
        match matches.as_slice() {
            // No roster row: student dropped out of the LMS course, reported
            // as a diagnostic afterwards.
            [] => continue,
            [idx] => {
                if let Some(existing) = &studies[*idx]
                    && existing != &incoming_studies[row]
                {
                    return Err(ConsistencyError::StudyIdConflict {
                        id: id.clone(),
                        existing: existing.clone(),
                        incoming: incoming_studies[row].clone(),
                    }
                    .into());
                }
                if courses[*idx].is_some() {
                    // A student registered for several courses of the same
                    // kind is a registry data-entry error.
                    return Err(ConsistencyError::CourseAlreadyAssigned {
                        id: id.clone(),
                        column: options.course_column.clone(),
                        listing: format_rows(&merged, &[*idx]),
                    }
                    .into());
                }
                studies[*idx] = Some(incoming_studies[row].clone());
                courses[*idx] = Some(incoming_courses[row].clone());
            }
            many => {
                return Err(ConsistencyError::DuplicateStudentId {
                    id: id.clone(),
                    listing: format_rows(&merged, many),
                }
                .into());
            }
        }
    }

    merged.replace(
        &options.study_column,
        Series::new(options.study_column.as_str().into(), studies),
    )?;
    merged.replace(
        &options.course_column,
        Series::new(options.course_column.as_str().into(), courses),
    )?;
    Ok(merged)
}

/// Values of a column with empty cells mapped to `None`.
fn optional_values(df: &DataFrame, column: &str) -> Result<Vec<Option<String>>> {
    Ok(column_values(df, column)?
        .into_iter()
        .map(|value| if value.is_empty() { None } else { Some(value) })
        .collect())
}

fn report_missing_counterparts(
    merged: &DataFrame,
    roster: &DataFrame,
    participants: &DataFrame,
    options: &MergeOptions,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<()> {
    let merged_ids: HashSet<String> = column_values(merged, &options.id_column)?
        .into_iter()
        .collect();
    let participant_ids_vec = column_values(participants, &options.id_column)?;

    let dropped_out: Vec<usize> = participant_ids_vec
        .iter()
        .enumerate()
        .filter(|(_, id)| !merged_ids.contains(*id))
        .map(|(idx, _)| idx)
        .collect();
    if !dropped_out.is_empty() {
        let diag = Diagnostic::new(
            DiagnosticKind::NotInRoster,
            format!(
                "{} registry participants are not part of the roster (might be OK, \
                 e.g. students dropped out or are no longer active):\n{}",
                dropped_out.len(),
                format_rows(participants, &dropped_out)
            ),
        );
        warn!("{diag}");
        diagnostics.push(diag);
    }

    if options.warn_if_not_found_in_kusss_participants {
        let participant_ids: HashSet<&String> = participant_ids_vec.iter().collect();
        let roster_ids = column_values(roster, &options.id_column)?;
        let unregistered: Vec<usize> = roster_ids
            .iter()
            .enumerate()
            .filter(|(_, id)| !participant_ids.contains(id))
            .map(|(idx, _)| idx)
            .collect();
        if !unregistered.is_empty() {
            let diag = Diagnostic::new(
                DiagnosticKind::NotInRegistry,
                format!(
                    "{} roster entries are not part of the registry participants, so \
                     they cannot be graded (might be OK, e.g. students deliberately \
                     registered for only one of several related courses):\n{}",
                    unregistered.len(),
                    format_rows(roster, &unregistered)
                ),
            );
            warn!("{diag}");
            diagnostics.push(diag);
        }
    }
    Ok(())
}
