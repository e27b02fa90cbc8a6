//! Complexity/quality metrics, structural linting and the metrics store
//! (spec.md §4.12, §6 "Metrics store").

pub mod complexity;
pub mod error;
pub mod functions;
pub mod lint;
pub mod metrics_store;

pub use complexity::{compute_metrics, FunctionMetrics};
pub use error::QualityError;
pub use functions::{enumerate_functions, FunctionUnit};
pub use lint::{lint_function, run_pattern_lint_rule, LintFinding, Severity};
pub use metrics_store::{MetricsRecord, MetricsStore};
