//! Error taxonomy shared by every component.
//!
//! `spec.md` §7 enumerates the error kinds a long-running operation can
//! surface. Rather than one monolithic enum per crate, each crate defines
//! its own `thiserror` error for the failures only it can produce, and maps
//! into `ErrorKind` at the boundary where a result crosses into the tool
//! dispatch layer. This mirrors the teacher's `DiffError`-per-crate pattern
//! while giving the MCP layer (spec.md §9) one stable vocabulary to report.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The error kinds from spec.md §7, in the order the table lists them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MatcherMissing,
    MatcherFailed,
    RuleInvalid,
    IoError,
    BackupFailed,
    ValidationFailed,
    RollbackFailed,
    ConflictDetected,
    CancelRequested,
    Timeout,
    EnrichmentFailed,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::MatcherMissing => "matcher_missing",
            ErrorKind::MatcherFailed => "matcher_failed",
            ErrorKind::RuleInvalid => "rule_invalid",
            ErrorKind::IoError => "io_error",
            ErrorKind::BackupFailed => "backup_failed",
            ErrorKind::ValidationFailed => "validation_failed",
            ErrorKind::RollbackFailed => "rollback_failed",
            ErrorKind::ConflictDetected => "conflict_detected",
            ErrorKind::CancelRequested => "cancel_requested",
            ErrorKind::Timeout => "timeout",
            ErrorKind::EnrichmentFailed => "enrichment_failed",
            ErrorKind::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// A user-visible failure: always distinguishes kind, message and
/// machine-readable details (spec.md §7 "User-visible failure").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreError {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl CoreError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for CoreError {}

/// Result-shaped status for operations that can partially succeed
/// (spec.md §7: "partial-success results additionally carry
/// `{succeeded[], failed[]}` lists").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum Outcome<T> {
    Success {
        value: T,
    },
    PartialSuccess {
        value: T,
        succeeded: Vec<String>,
        failed: Vec<(String, CoreError)>,
    },
    Failure {
        error: CoreError,
    },
}

impl<T> Outcome<T> {
    pub fn success(value: T) -> Self {
        Outcome::Success { value }
    }

    pub fn failure(error: CoreError) -> Self {
        Outcome::Failure { error }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, Outcome::Failure { .. })
    }

    pub fn into_result(self) -> Result<T, CoreError> {
        match self {
            Outcome::Success { value } => Ok(value),
            Outcome::PartialSuccess { value, .. } => Ok(value),
            Outcome::Failure { error } => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_success_unwraps() {
        let outcome: Outcome<u32> = Outcome::success(42);
        assert!(outcome.is_success());
        assert_eq!(outcome.into_result().unwrap(), 42);
    }

    #[test]
    fn outcome_failure_carries_kind() {
        let err = CoreError::new(ErrorKind::BackupFailed, "disk full");
        let outcome: Outcome<u32> = Outcome::failure(err);
        assert!(!outcome.is_success());
        let err = outcome.into_result().unwrap_err();
        assert_eq!(err.kind, ErrorKind::BackupFailed);
    }

    #[test]
    fn error_kind_display_is_snake_case() {
        assert_eq!(ErrorKind::ConflictDetected.to_string(), "conflict_detected");
    }
}
