//! Grade computation.
//!
//! A [`GradingScheme`] maps a point percentage to the 1 (best) to 5 (failed)
//! grade scale. Grader variants behind the [`Grader`] trait pick the points
//! out of a roster's score columns and emit a grade table with one row per
//! student. Variants form a closed set looked up by name; there is no way to
//! inject grading logic at runtime.

pub mod error;
pub mod graders;
pub mod scheme;

pub use error::{GradeError, Result};
pub use graders::{Grader, available_graders, grader};
pub use scheme::{Grade, GradingScheme, create_grade};
