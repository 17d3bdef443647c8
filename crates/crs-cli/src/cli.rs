//! CLI argument definitions for Course Roster Studio.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "crs",
    version,
    about = "Course Roster Studio - roster merging, submission splitting and grading",
    long_about = "Administer university courses from the command line.\n\n\
                  Reconciles LMS grading exports with registry participant lists,\n\
                  splits bulk submission archives among weighted tutors, and\n\
                  computes grades from score columns."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Build a roster from an LMS export, optionally merging registry exports.
    Roster(RosterArgs),

    /// Split a submission archive among weighted tutors.
    Split(SplitArgs),

    /// Compute grades for a roster with a named grader.
    Grade(GradeArgs),

    /// List the available graders.
    Graders,
}

#[derive(Parser)]
pub struct RosterArgs {
    /// LMS grading export (comma-separated CSV, '-' marks missing values).
    #[arg(long = "moodle", value_name = "CSV")]
    pub moodle: PathBuf,

    /// Registry participant exports (semicolon-separated, Windows-1252);
    /// may be given multiple times, merged in order.
    #[arg(long = "kusss", value_name = "CSV")]
    pub kusss: Vec<PathBuf>,

    /// Roster column receiving the course IDs extracted from the registry
    /// export filenames.
    #[arg(long = "course-column", value_name = "NAME", default_value = "Course ID")]
    pub course_column: String,

    /// Also warn about registry participants missing from the LMS export.
    #[arg(long = "warn-missing-kusss")]
    pub warn_missing_kusss: bool,

    /// Write the merged roster to a CSV file.
    #[arg(short = 'o', long = "output", value_name = "CSV")]
    pub output: Option<PathBuf>,
}

#[derive(Parser)]
pub struct SplitArgs {
    /// The submission ZIP archive downloaded from the LMS.
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    /// A tutor, either as a bare name or as "name,weight". Either all
    /// tutors carry a weight or none do.
    #[arg(long = "tutor", value_name = "NAME[,WEIGHT]", required = true)]
    pub tutors: Vec<String>,

    /// Roster CSV to join submissions against (enables renaming and
    /// identity columns in the result table).
    #[arg(long = "roster", value_name = "CSV")]
    pub roster: Option<PathBuf>,

    /// Exercise number (otherwise inferred from the archive name).
    #[arg(short = 'n', long = "number", value_name = "NUM")]
    pub number: Option<usize>,

    /// Directory for the per-tutor archives (default: next to the input).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Write the assignment table to a CSV file.
    #[arg(short = 'o', long = "output", value_name = "CSV")]
    pub output: Option<PathBuf>,
}

#[derive(Parser)]
pub struct GradeArgs {
    /// Roster CSV holding the score columns.
    #[arg(long = "roster", value_name = "CSV")]
    pub roster: PathBuf,

    /// Grader to apply (see `crs graders`).
    #[arg(long = "grader", value_name = "NAME")]
    pub grader: String,

    /// Maximum achievable points for the graded score.
    #[arg(long = "max-points", value_name = "POINTS", default_value_t = 100.0)]
    pub max_points: f64,

    /// Write the grade table to a CSV file.
    #[arg(short = 'o', long = "output", value_name = "CSV")]
    pub output: Option<PathBuf>,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
