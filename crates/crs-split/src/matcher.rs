//! Heuristic detection of the first/last name column pair.
//!
//! Submission directories only carry a combined full name, so when the
//! caller does not say which roster columns hold the name parts we probe
//! every ordered column pair and keep the one whose concatenation covers
//! all submission names.

use std::collections::HashSet;

use crs_ingest::table::column_values;
use crs_model::error::ConsistencyError;
use polars::prelude::DataFrame;
use tracing::debug;

use crate::error::Result;

/// Finds the ordered pair of columns in `info` whose values, joined with a
/// space, reproduce every entry of `full_names`.
///
/// Pairs are tried in column order; the first complete match wins. If no
/// pair covers all names the error reports the pair that came closest and
/// the names it could not account for.
pub fn match_full_names(full_names: &[String], info: &DataFrame) -> Result<(String, String)> {
    let columns: Vec<String> = info
        .get_column_names_str()
        .iter()
        .map(|c| c.to_string())
        .collect();
    let values: Vec<Vec<String>> = columns
        .iter()
        .map(|c| column_values(info, c))
        .collect::<crs_ingest::Result<_>>()?;

    let mut best: Option<(usize, usize, Vec<String>)> = None;
    for i in 0..columns.len() {
        for j in 0..columns.len() {
            if i == j {
                continue;
            }
            let candidates: HashSet<String> = values[i]
                .iter()
                .zip(&values[j])
                .map(|(a, b)| format!("{a} {b}"))
                .collect();
            let unmatched: Vec<String> = full_names
                .iter()
                .filter(|name| !candidates.contains(*name))
                .cloned()
                .collect();
            if unmatched.is_empty() {
                debug!(
                    first = %columns[i],
                    second = %columns[j],
                    "matched name columns"
                );
                return Ok((columns[i].clone(), columns[j].clone()));
            }
            if best
                .as_ref()
                .is_none_or(|(_, _, misses)| unmatched.len() < misses.len())
            {
                best = Some((i, j, unmatched));
            }
        }
    }

    let (i, j, unmatched) = best.unwrap_or((0, 0, full_names.to_vec()));
    Err(ConsistencyError::NameColumnsNotFound {
        first: columns.get(i).cloned().unwrap_or_default(),
        second: columns.get(j).cloned().unwrap_or_default(),
        unmatched,
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{NamedFrom, Series};

    fn info() -> DataFrame {
        DataFrame::new(vec![
            Series::new("First name".into(), &["Ada", "Grace"]).into(),
            Series::new("Surname".into(), &["Lovelace", "Hopper"]).into(),
            Series::new("ID number".into(), &["00000001", "00000002"]).into(),
        ])
        .unwrap()
    }

    #[test]
    fn finds_the_covering_pair() {
        let names = vec!["Grace Hopper".to_string(), "Ada Lovelace".to_string()];
        let (first, second) = match_full_names(&names, &info()).unwrap();
        assert_eq!(first, "First name");
        assert_eq!(second, "Surname");
    }

    #[test]
    fn reversed_order_matches_the_swapped_pair() {
        let names = vec!["Hopper Grace".to_string()];
        let (first, second) = match_full_names(&names, &info()).unwrap();
        assert_eq!(first, "Surname");
        assert_eq!(second, "First name");
    }

    #[test]
    fn reports_closest_pair_on_failure() {
        let names = vec!["Ada Lovelace".to_string(), "Alan Turing".to_string()];
        let err = match_full_names(&names, &info()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Alan Turing"));
        assert!(!message.contains("Ada Lovelace"));
    }
}
