//! Test-coverage lookup and refactor impact analysis (spec.md §4.10).

pub mod coverage;
pub mod error;
pub mod impact;
pub mod patterns;

pub use coverage::{has_tests, has_tests_batch, TestFileSet};
pub use error::CoverageError;
pub use impact::{assess_impact, ImpactAssessment, RiskLabel};
