//! Roster reconciliation.
//!
//! Merges the LMS roster with registry participant tables. The first merge is
//! a left outer join on the institutional ID; further merges for additional
//! courses are layered row by row so that conflicting registrations surface
//! as consistency errors instead of silently overwriting data.

pub mod error;
pub mod merge;

pub use error::{MergeError, Result};
pub use merge::{MergeOptions, merge_rosters};
