//! Column translation from the localized LMS vocabulary to the canonical one.
//!
//! The LMS exports column names either in English (canonical) or in German.
//! Translation is a pure transform over column names in three passes: exact
//! full-name substitutions for identity/metadata columns, prefix substitutions
//! for score-category columns, and a parenthesized-qualifier substitution at
//! the end of the name. A column that no pass changes cannot be handled
//! downstream (column-prefix filtering relies on canonical names), so it is a
//! hard error rather than a warning.

use std::collections::HashSet;

use polars::prelude::DataFrame;

use crs_model::FormatError;

use crate::error::Result;

/// Exact replacements for identity and metadata columns.
const FULL_REPLACEMENTS: [(&str, &str); 5] = [
    ("Vorname", "First name"),
    ("Nachname", "Surname"),
    ("ID-Nummer", "ID number"),
    ("E-Mail-Adresse", "Email address"),
    (
        "Zuletzt aus diesem Kurs geladen",
        "Last downloaded from this course",
    ),
];

/// Replacements for the category word a score column starts with.
const PREFIX_REPLACEMENTS: [(&str, &str); 3] = [
    ("Aufgabe", "Assignment"),
    ("Test", "Quiz"),
    ("Kurs gesamt", "Course total"),
];

/// Replacements for the parenthesized qualifier a score column ends with.
const SUFFIX_REPLACEMENTS: [(&str, &str); 2] = [("Punkte", "Real"), ("Prozentsatz", "Percentage")];

/// Translates all column names into the canonical vocabulary, or returns the
/// input unchanged if it already is canonical.
pub fn translate_columns(df: &DataFrame) -> Result<DataFrame> {
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();

    // Already canonical if any identity/metadata column is present in English.
    let canonical: HashSet<&str> = FULL_REPLACEMENTS.iter().map(|(_, en)| *en).collect();
    if names.iter().any(|name| canonical.contains(name.as_str())) {
        return Ok(df.clone());
    }

    let mut out = df.clone();
    for original in &names {
        // The LMS inserts non-breaking spaces when exporting localized headers.
        let cleaned = original.replace('\u{a0}', " ");
        let translated = translate_name(&cleaned);
        if translated == cleaned {
            return Err(FormatError::UntranslatableColumn {
                column: original.clone(),
            }
            .into());
        }
        out.rename(original, translated.into())?;
    }
    Ok(out)
}

fn translate_name(name: &str) -> String {
    if let Some((_, en)) = FULL_REPLACEMENTS.iter().find(|(de, _)| *de == name) {
        return (*en).to_string();
    }
    let mut translated = name.to_string();
    for (de, en) in PREFIX_REPLACEMENTS {
        if translated.starts_with(de) {
            translated = translated.replacen(de, en, 1);
        }
    }
    for (de, en) in SUFFIX_REPLACEMENTS {
        if let Some(stripped) = translated.strip_suffix(&format!("({de})")) {
            translated = format!("{stripped}({en})");
        }
    }
    translated
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{NamedFrom, Series};

    fn frame_with_columns(names: &[&str]) -> DataFrame {
        let columns = names
            .iter()
            .map(|name| Series::new((*name).into(), &["x"]).into())
            .collect();
        DataFrame::new(columns).unwrap()
    }

    #[test]
    fn canonical_table_passes_through() {
        let df = frame_with_columns(&["First name", "Surname", "ID number"]);
        let out = translate_columns(&df).unwrap();
        assert_eq!(out.get_column_names(), df.get_column_names());
    }

    #[test]
    fn localized_table_is_translated() {
        let df = frame_with_columns(&[
            "Vorname",
            "Nachname",
            "ID-Nummer",
            "E-Mail-Adresse",
            "Aufgabe: Übung 1 (Punkte)",
            "Test: Exam (Prozentsatz)",
            "Kurs gesamt (Punkte)",
        ]);
        let out = translate_columns(&df).unwrap();
        let names: Vec<String> = out
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
                "Assignment: Übung 1 (Real)",
                "Quiz: Exam (Percentage)",
                "Course total (Real)",
            ]
        );
    }

    #[test]
    fn non_breaking_spaces_are_normalized() {
        let df = frame_with_columns(&["Vorname", "Aufgabe:\u{a0}Übung 1 (Punkte)"]);
        let out = translate_columns(&df).unwrap();
        let names: Vec<String> = out
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(names[1], "Assignment: Übung 1 (Real)");
    }

    #[test]
    fn untranslatable_column_is_fatal() {
        let df = frame_with_columns(&["Vorname", "Mystery column"]);
        let err = translate_columns(&df).unwrap_err();
        assert!(err.to_string().contains("Mystery column"));
    }
}
