//! Non-fatal diagnostics.
//!
//! Ingestion and merging can encounter records that are suspicious but not
//! wrong: students who dropped out, stale registry rows, manually added
//! accounts. Those are reported as [`Diagnostic`]s next to the result and
//! logged at warn level; processing always continues.

use serde::{Deserialize, Serialize};

/// What a diagnostic is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// Exact duplicate rows in a registry export were dropped.
    DuplicateRegistryRows,
    /// Registry participants without a roster row (dropped out / inactive).
    NotInRoster,
    /// Roster rows without a registry counterpart (not registered for this course).
    NotInRegistry,
    /// Roster rows dropped because their ID is not an 8-digit number.
    InvalidIdDropped,
    /// Roster rows dropped because the e-mail address is not a student address.
    NonStudentEmailDropped,
}

impl DiagnosticKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::DuplicateRegistryRows => "duplicate registry rows",
            Self::NotInRoster => "not in roster",
            Self::NotInRegistry => "not in registry",
            Self::InvalidIdDropped => "invalid ID dropped",
            Self::NonStudentEmailDropped => "non-student e-mail dropped",
        }
    }
}

/// A single non-fatal finding, carrying the affected record subset as text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind.label(), self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_serializes() {
        let diag = Diagnostic::new(DiagnosticKind::NotInRoster, "2 participants");
        let json = serde_json::to_string(&diag).expect("serialize diagnostic");
        let round: Diagnostic = serde_json::from_str(&json).expect("deserialize diagnostic");
        assert_eq!(round.kind, DiagnosticKind::NotInRoster);
        assert_eq!(round.message, "2 participants");
    }

    #[test]
    fn display_includes_label() {
        let diag = Diagnostic::new(DiagnosticKind::InvalidIdDropped, "1 row");
        assert_eq!(diag.to_string(), "invalid ID dropped: 1 row");
    }
}
