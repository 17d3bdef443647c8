//! Result summaries rendered with comfy-table.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use crs_grade::available_graders;
use crs_ingest::table::value_string;
use crs_model::Diagnostic;
use crs_model::columns::{GRADE, RESULT_TUTOR_FILE, RESULT_TUTOR_NAME};
use crs_split::SplitOutcome;
use polars::prelude::DataFrame;

pub fn print_roster_summary(roster: &DataFrame, diagnostics: &[Diagnostic]) {
    println!(
        "Roster: {} students, {} columns",
        roster.height(),
        roster.width()
    );
    if diagnostics.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![header_cell("Finding"), header_cell("Details")]);
    apply_table_style(&mut table);
    for diagnostic in diagnostics {
        table.add_row(vec![
            Cell::new(diagnostic.kind.label()).fg(Color::Yellow),
            Cell::new(&diagnostic.message),
        ]);
    }
    println!("{table}");
}

pub fn print_split_summary(outcome: &SplitOutcome) {
    println!(
        "Exercise {}: {} submissions split into {} archives",
        outcome.exercise_number,
        outcome.table.height(),
        outcome.archives.len()
    );
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Tutor"),
        header_cell("Submissions"),
        header_cell("Archive"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for (tutor, count, archive) in tutor_counts(&outcome.table) {
        table.add_row(vec![
            Cell::new(tutor),
            Cell::new(count),
            Cell::new(archive),
        ]);
    }
    println!("{table}");
}

pub fn print_grade_summary(grades: &DataFrame) {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Grade"), header_cell("Students")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for (grade, count) in grade_counts(grades) {
        let cell = match grade.as_str() {
            "5" => Cell::new(&grade).fg(Color::Red),
            "-1" => Cell::new("no data").fg(Color::Yellow),
            _ => Cell::new(&grade),
        };
        table.add_row(vec![cell, Cell::new(count)]);
    }
    println!("{table}");
}

pub fn print_grader_list() {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Grader"), header_cell("Description")]);
    apply_table_style(&mut table);
    for (name, description) in available_graders() {
        table.add_row(vec![Cell::new(name), Cell::new(description)]);
    }
    println!("{table}");
}

/// Per-tutor submission counts in first-appearance order.
fn tutor_counts(table: &DataFrame) -> Vec<(String, usize, String)> {
    let mut ordered: Vec<(String, usize, String)> = Vec::new();
    for row in 0..table.height() {
        let tutor = value_string(table, RESULT_TUTOR_NAME, row);
        let archive = value_string(table, RESULT_TUTOR_FILE, row);
        match ordered.iter_mut().find(|(name, _, _)| *name == tutor) {
            Some((_, count, _)) => *count += 1,
            None => ordered.push((tutor, 1, archive)),
        }
    }
    ordered
}

/// Grade histogram sorted by grade value, best first.
fn grade_counts(grades: &DataFrame) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for row in 0..grades.height() {
        let grade = value_string(grades, GRADE, row);
        match counts.iter_mut().find(|(g, _)| *g == grade) {
            Some((_, count)) => *count += 1,
            None => counts.push((grade, 1)),
        }
    }
    counts.sort_by(|a, b| {
        let a: i64 = a.0.parse().unwrap_or(i64::MAX);
        let b: i64 = b.0.parse().unwrap_or(i64::MAX);
        // The synthetic -1 grade sorts last.
        (a < 0, a).cmp(&(b < 0, b))
    });
    counts
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn header_cell(text: &str) -> Cell {
    Cell::new(text).add_attribute(Attribute::Bold)
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{NamedFrom, Series};

    #[test]
    fn tutor_counts_keep_first_appearance_order() {
        let table = DataFrame::new(vec![
            Series::new(
                RESULT_TUTOR_NAME.into(),
                &["Ben", "Ben", "Anna", "Ben", "Anna"],
            )
            .into(),
            Series::new(
                RESULT_TUTOR_FILE.into(),
                &["x_Ben.zip", "x_Ben.zip", "x_Anna.zip", "x_Ben.zip", "x_Anna.zip"],
            )
            .into(),
        ])
        .unwrap();
        let counts = tutor_counts(&table);
        assert_eq!(
            counts,
            vec![
                ("Ben".to_string(), 3, "x_Ben.zip".to_string()),
                ("Anna".to_string(), 2, "x_Anna.zip".to_string()),
            ]
        );
    }

    #[test]
    fn grade_counts_sort_no_data_last() {
        let grades = DataFrame::new(vec![
            Series::new(GRADE.into(), &[5i32, 1, -1, 1, 3]).into(),
        ])
        .unwrap();
        let counts = grade_counts(&grades);
        let order: Vec<&str> = counts.iter().map(|(g, _)| g.as_str()).collect();
        assert_eq!(order, vec!["1", "3", "5", "-1"]);
    }
}
