//! Tutor table parsing and normalization.

use std::collections::HashMap;

use crs_ingest::table::{any_to_f64, value_string};
use crs_model::columns::{TUTOR_NAME, TUTOR_WEIGHT};
use crs_model::error::FormatError;
use polars::prelude::{DataFrame, NamedFrom, Series};

use crate::error::{Result, SplitError};

/// A tutor with a normalized display name and a positive share weight.
#[derive(Debug, Clone, PartialEq)]
pub struct Tutor {
    pub name: String,
    pub weight: f64,
}

/// Parses command-line tutor entries into a tutor table.
///
/// Each entry is either a bare name or `name,weight`. Mixing the two forms
/// is rejected, as is a weight that does not parse or a name containing more
/// than one comma.
pub fn parse_tutor_entries(entries: &[String]) -> Result<DataFrame> {
    let mut names = Vec::with_capacity(entries.len());
    let mut weights = Vec::with_capacity(entries.len());
    let mut weighted = None;
    for entry in entries {
        let parts: Vec<&str> = entry.split(',').collect();
        match (parts.as_slice(), weighted) {
            ([name], None | Some(false)) => {
                weighted = Some(false);
                names.push(name.trim().to_string());
            }
            ([name, weight], None | Some(true)) => {
                weighted = Some(true);
                let weight: f64 = weight.trim().parse().map_err(|_| {
                    SplitError::from(FormatError::TutorEntry {
                        entry: entry.clone(),
                        reason: format!("weight {weight:?} is not a number"),
                    })
                })?;
                names.push(name.trim().to_string());
                weights.push(weight);
            }
            ([_], Some(true)) | ([_, _], Some(false)) => {
                return Err(FormatError::TutorEntry {
                    entry: entry.clone(),
                    reason: "either all tutors carry a weight or none do".to_string(),
                }
                .into());
            }
            _ => {
                return Err(FormatError::TutorEntry {
                    entry: entry.clone(),
                    reason: "expected `name` or `name,weight`".to_string(),
                }
                .into());
            }
        }
    }

    let mut columns = vec![Series::new(TUTOR_NAME.into(), names).into()];
    if weighted == Some(true) {
        columns.push(Series::new(TUTOR_WEIGHT.into(), weights).into());
    }
    Ok(DataFrame::new(columns)?)
}

/// Normalizes a tutor table into an ordered tutor list for one exercise.
///
/// The table must have one column (names, all weights default to 1.0) or two
/// columns (names and weights). Tutors are rotated by the exercise number so
/// the roster chunks move across tutors from week to week, and duplicated
/// names get a ` (n)` suffix to keep output archives distinct.
pub fn normalize_tutors(tutors: &DataFrame, exercise_number: usize) -> Result<Vec<Tutor>> {
    if tutors.height() == 0 {
        return Err(FormatError::TutorEntry {
            entry: String::new(),
            reason: "tutor table is empty".to_string(),
        }
        .into());
    }
    if tutors.width() == 0 || tutors.width() > 2 {
        return Err(FormatError::TutorEntry {
            entry: format!("{} columns", tutors.width()),
            reason: "tutor table must have a name column and an optional weight column"
                .to_string(),
        }
        .into());
    }

    let name_column = tutors.get_column_names_str()[0].to_string();
    let weight_column = tutors.get_column_names_str().get(1).map(|c| c.to_string());

    let mut list = Vec::with_capacity(tutors.height());
    for idx in 0..tutors.height() {
        let name = value_string(tutors, &name_column, idx).trim().to_string();
        if name.is_empty() {
            return Err(FormatError::TutorEntry {
                entry: format!("row {idx}"),
                reason: "tutor name is empty".to_string(),
            }
            .into());
        }
        let weight = match &weight_column {
            Some(column) => {
                let cell = tutors
                    .column(column)?
                    .get(idx)
                    .map_err(|e| SplitError::DataFrame {
                        message: e.to_string(),
                    })?;
                any_to_f64(cell).ok_or_else(|| FormatError::TutorEntry {
                    entry: name.clone(),
                    reason: "weight is missing or not a number".to_string(),
                })?
            }
            None => 1.0,
        };
        if weight <= 0.0 {
            return Err(FormatError::TutorEntry {
                entry: name.clone(),
                reason: format!("weight {weight} is not positive"),
            }
            .into());
        }
        list.push(Tutor { name, weight });
    }

    let len = list.len();
    list.rotate_right(exercise_number % len);
    disambiguate_names(&mut list);
    Ok(list)
}

/// Suffixes every occurrence of a duplicated name with a running counter.
fn disambiguate_names(tutors: &mut [Tutor]) {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for tutor in tutors.iter() {
        *counts.entry(tutor.name.clone()).or_insert(0) += 1;
    }
    let mut seen: HashMap<String, usize> = HashMap::new();
    for tutor in tutors.iter_mut() {
        if counts[&tutor.name] > 1 {
            let n = seen.entry(tutor.name.clone()).or_insert(0);
            *n += 1;
            tutor.name = format!("{} ({n})", tutor.name);
        }
    }
}
