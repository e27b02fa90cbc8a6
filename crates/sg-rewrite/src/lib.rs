//! Safe application of structural-replacement plans.
//!
//! Preview never writes to disk; apply proceeds through the phased
//! backup/validate/write/rollback sequence; rollback delegates to the
//! backup store.

pub mod engine;
pub mod error;
pub mod plan;
pub mod validator;

pub use engine::{ApplyOptions, ApplyResult, FileDiff, RewriteEngine};
pub use error::RewriteError;
pub use plan::{EditCause, FileEdit, RewritePlan};
pub use validator::{balanced_delimiters_validator, permissive_validator, SyntaxValidator, ValidationResult};
