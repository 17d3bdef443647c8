//! Grader variants and their registry.
//!
//! Each variant knows which score columns of the roster feed the grade. The
//! set is closed: graders are looked up by name via [`grader`] and nothing
//! else can be registered.

use crs_ingest::table::{any_to_f64, value_string};
use crs_model::FormatError;
use crs_model::columns::{GRADE, IDENTITY_COLUMNS, REASON};
use polars::prelude::{AnyValue, DataFrame, NamedFrom, Series};
use tracing::debug;

use crate::error::{GradeError, Result};
use crate::scheme::{Grade, GradingScheme};

/// A named grading strategy producing one grade row per roster row.
pub trait Grader {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Builds the grade table: the roster's identity columns plus `Grade`
    /// and `Reason`.
    fn create_grading_file(&self, roster: &DataFrame) -> Result<DataFrame>;
}

/// Grades the most recent exam attempt; later retakes take precedence over
/// earlier ones, missing attempts are skipped.
pub struct ExamRetakeGrader {
    scheme: GradingScheme,
    max_points: f64,
    /// Candidate score columns, oldest attempt first.
    columns: Vec<String>,
}

impl ExamRetakeGrader {
    pub fn new(max_points: f64) -> Self {
        Self {
            scheme: GradingScheme::default(),
            max_points,
            columns: vec![
                "Quiz: Exam (Real)".to_string(),
                "Quiz: Retry Exam (Real)".to_string(),
                "Quiz: Retry Exam 2 (Real)".to_string(),
            ],
        }
    }
}

impl Grader for ExamRetakeGrader {
    fn name(&self) -> &'static str {
        "exam-retake"
    }

    fn description(&self) -> &'static str {
        "grades the most recent non-missing exam attempt"
    }

    fn create_grading_file(&self, roster: &DataFrame) -> Result<DataFrame> {
        let present: Vec<&String> = self
            .columns
            .iter()
            .filter(|c| roster.column(c).is_ok())
            .collect();
        if present.is_empty() {
            return Err(FormatError::MissingColumn {
                column: self.columns.join("' / '"),
            }
            .into());
        }
        debug!(columns = ?present, "grading exam attempts");

        grade_rows(roster, |row| {
            // Walk the attempts newest first and keep the first real score.
            for column in present.iter().rev() {
                let cell = roster
                    .column(column)?
                    .get(row)
                    .unwrap_or(AnyValue::Null);
                if let Some(points) = any_to_f64(cell) {
                    return Ok(Some(self.scheme.create_grade(points, self.max_points)));
                }
            }
            Ok(None)
        })
    }
}

/// Grades the aggregated course total directly.
pub struct CourseTotalGrader {
    scheme: GradingScheme,
    max_points: f64,
    column: String,
}

impl CourseTotalGrader {
    pub fn new(max_points: f64) -> Self {
        Self {
            scheme: GradingScheme::default(),
            max_points,
            column: "Course total (Real)".to_string(),
        }
    }
}

impl Grader for CourseTotalGrader {
    fn name(&self) -> &'static str {
        "course-total"
    }

    fn description(&self) -> &'static str {
        "grades the aggregated course total column"
    }

    fn create_grading_file(&self, roster: &DataFrame) -> Result<DataFrame> {
        if roster.column(&self.column).is_err() {
            return Err(FormatError::MissingColumn {
                column: self.column.clone(),
            }
            .into());
        }
        grade_rows(roster, |row| {
            let cell = roster
                .column(&self.column)?
                .get(row)
                .unwrap_or(AnyValue::Null);
            Ok(any_to_f64(cell).map(|points| self.scheme.create_grade(points, self.max_points)))
        })
    }
}

/// Applies `grade_row` to every roster row and assembles the grade table.
/// `None` from `grade_row` marks a student without score data.
fn grade_rows<F>(roster: &DataFrame, mut grade_row: F) -> Result<DataFrame>
where
    F: FnMut(usize) -> Result<Option<Grade>>,
{
    let mut grades = Vec::with_capacity(roster.height());
    let mut reasons = Vec::with_capacity(roster.height());
    for row in 0..roster.height() {
        let grade = grade_row(row)?.unwrap_or_else(Grade::no_data);
        grades.push(grade.grade);
        reasons.push(grade.reason);
    }

    let mut columns = Vec::new();
    for identity in IDENTITY_COLUMNS {
        if roster.column(identity).is_ok() {
            let values: Vec<String> = (0..roster.height())
                .map(|row| value_string(roster, identity, row))
                .collect();
            columns.push(Series::new(identity.into(), values).into());
        }
    }
    columns.push(Series::new(GRADE.into(), grades).into());
    columns.push(Series::new(REASON.into(), reasons).into());
    Ok(DataFrame::new(columns)?)
}

/// Looks up a grader by name.
pub fn grader(name: &str, max_points: f64) -> Result<Box<dyn Grader>> {
    match name {
        "exam-retake" => Ok(Box::new(ExamRetakeGrader::new(max_points))),
        "course-total" => Ok(Box::new(CourseTotalGrader::new(max_points))),
        _ => Err(GradeError::UnknownGrader {
            name: name.to_string(),
            available: available_graders()
                .iter()
                .map(|(name, _)| *name)
                .collect::<Vec<_>>()
                .join(", "),
        }),
    }
}

/// All registry entries as (name, description) pairs.
pub fn available_graders() -> Vec<(&'static str, &'static str)> {
    vec![
        ("exam-retake", "grades the most recent non-missing exam attempt"),
        ("course-total", "grades the aggregated course total column"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> DataFrame {
        DataFrame::new(vec![
            Series::new("First name".into(), &["Ada", "Grace", "Alan", "Edsger"]).into(),
            Series::new("Surname".into(), &["Lovelace", "Hopper", "Turing", "Dijkstra"]).into(),
            Series::new(
                "Quiz: Exam (Real)".into(),
                &[Some(90.0f64), Some(40.0), None, None],
            )
            .into(),
            Series::new(
                "Quiz: Retry Exam (Real)".into(),
                &[None, Some(80.0f64), Some(10.0), None],
            )
            .into(),
            Series::new(
                "Quiz: Retry Exam 2 (Real)".into(),
                &[None::<f64>, None, None, None],
            )
            .into(),
            Series::new(
                "Course total (Real)".into(),
                &[Some(88.0f64), Some(72.0), None, Some(20.0)],
            )
            .into(),
        ])
        .unwrap()
    }

    fn grade_at(table: &DataFrame, row: usize) -> (String, String) {
        (
            value_string(table, GRADE, row),
            value_string(table, REASON, row),
        )
    }

    #[test]
    fn retake_takes_precedence_over_first_attempt() {
        let table = ExamRetakeGrader::new(100.0)
            .create_grading_file(&roster())
            .unwrap();
        assert_eq!(table.height(), 4);
        // Ada only sat the first exam.
        assert_eq!(grade_at(&table, 0), ("1".to_string(), String::new()));
        // Grace's retake (80) overrides her failed first attempt (40).
        assert_eq!(grade_at(&table, 1), ("2".to_string(), String::new()));
        // Alan only has a failed retake.
        assert_eq!(
            grade_at(&table, 2),
            ("5".to_string(), "total threshold not reached".to_string())
        );
        // Edsger never showed up.
        assert_eq!(
            grade_at(&table, 3),
            ("-1".to_string(), "no data to create grade".to_string())
        );
    }

    #[test]
    fn course_total_grades_single_column() {
        let table = CourseTotalGrader::new(100.0)
            .create_grading_file(&roster())
            .unwrap();
        assert_eq!(grade_at(&table, 0).0, "1");
        assert_eq!(grade_at(&table, 1).0, "3"); // 0.72 reaches the 0.625 threshold
        assert_eq!(grade_at(&table, 2).0, "-1");
        assert_eq!(grade_at(&table, 3).0, "5");
    }

    #[test]
    fn grade_table_carries_identity_columns() {
        let table = CourseTotalGrader::new(100.0)
            .create_grading_file(&roster())
            .unwrap();
        let columns = table.get_column_names_str();
        assert_eq!(columns, vec!["First name", "Surname", GRADE, REASON]);
    }

    #[test]
    fn missing_score_columns_are_fatal() {
        let empty = DataFrame::new(vec![
            Series::new("First name".into(), &["Ada"]).into(),
        ])
        .unwrap();
        assert!(ExamRetakeGrader::new(100.0).create_grading_file(&empty).is_err());
        assert!(CourseTotalGrader::new(100.0).create_grading_file(&empty).is_err());
    }

    #[test]
    fn registry_rejects_unknown_names() {
        assert!(grader("exam-retake", 100.0).is_ok());
        assert!(grader("course-total", 100.0).is_ok());
        let err = grader("bespoke", 100.0).err().unwrap();
        assert!(err.to_string().contains("exam-retake"));
    }
}
