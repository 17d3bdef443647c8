//! Threshold-based grade scheme.

/// A computed grade with an explanatory reason.
///
/// The reason is empty for regular grades; grade 5 carries "total threshold
/// not reached" and the synthetic grade -1 marks rows without any score data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grade {
    pub grade: i32,
    pub reason: String,
}

impl Grade {
    /// The placeholder grade for students without any usable score.
    pub fn no_data() -> Self {
        Self {
            grade: -1,
            reason: "no data to create grade".to_string(),
        }
    }
}

/// Ordered lower percentage thresholds, best grade first.
///
/// `create_grade` walks the pairs in order and returns the first grade whose
/// threshold the percentage reaches; grade 5 is the implicit fallback and
/// needs no entry.
#[derive(Debug, Clone, PartialEq)]
pub struct GradingScheme {
    thresholds: Vec<(i32, f64)>,
}

impl Default for GradingScheme {
    fn default() -> Self {
        Self {
            thresholds: vec![(1, 0.875), (2, 0.75), (3, 0.625), (4, 0.50)],
        }
    }
}

impl GradingScheme {
    pub fn new(thresholds: Vec<(i32, f64)>) -> Self {
        Self { thresholds }
    }

    /// Grades `points` out of `max_points` against the thresholds.
    pub fn create_grade(&self, points: f64, max_points: f64) -> Grade {
        let percentage = points / max_points;
        for (grade, threshold) in &self.thresholds {
            if percentage >= *threshold {
                return Grade {
                    grade: *grade,
                    reason: String::new(),
                };
            }
        }
        Grade {
            grade: 5,
            reason: "total threshold not reached".to_string(),
        }
    }
}

/// Grades against the default scheme.
pub fn create_grade(points: f64, max_points: f64) -> Grade {
    GradingScheme::default().create_grade(points, max_points)
}
