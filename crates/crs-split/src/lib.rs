//! Submission splitting.
//!
//! Takes a ZIP archive of anonymous LMS submissions, recovers the embedded
//! student identity from every entry name, joins against the roster, and
//! repackages the submissions into one archive per tutor with sizes
//! proportional to the tutor weights.

pub mod error;
pub mod matcher;
pub mod partition;
pub mod splitter;
pub mod tutors;

pub use error::{Result, SplitError};
pub use matcher::match_full_names;
pub use partition::{weighted_chunk_sizes, weighted_chunks};
pub use splitter::{SplitOptions, SplitOutcome, split_submissions};
pub use tutors::{Tutor, normalize_tutors, parse_tutor_entries};
