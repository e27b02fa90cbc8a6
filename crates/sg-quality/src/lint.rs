//! Structural lint rules (spec.md §4.12: "severity ∈ {error, warning,
//! info}. Rule execution reuses C1").
//!
//! Two sources of findings: a handful of built-in rules computed directly
//! from already-measured `FunctionMetrics` (cheap, no subprocess), and
//! arbitrary pattern/rule documents forwarded to the matcher the same way
//! every other structural query is (spec.md §6).

use crate::complexity::FunctionMetrics;
use crate::error::QualityError;
use crate::functions::FunctionUnit;
use sg_core::{CancelToken, MatchRecord, RuleDocument, WireMatch};
use sg_executor::Executor;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct LintFinding {
    pub rule_id: String,
    pub severity: Severity,
    pub message: String,
    pub path: PathBuf,
    pub line: usize,
}

const MAX_FUNCTION_LINES: usize = 50;
const MAX_PARAMETERS: usize = 5;
const MAX_NESTING_DEPTH: usize = 4;
const CYCLOMATIC_WARNING: usize = 10;
const CYCLOMATIC_ERROR: usize = 20;

/// Built-in structural rules over one function's already-computed metrics.
pub fn lint_function(function: &FunctionUnit, metrics: &FunctionMetrics) -> Vec<LintFinding> {
    let mut findings = Vec::new();

    if metrics.line_count > MAX_FUNCTION_LINES {
        findings.push(LintFinding {
            rule_id: "function-too-long".to_string(),
            severity: Severity::Warning,
            message: format!(
                "'{}' is {} lines long (limit {MAX_FUNCTION_LINES})",
                function.name, metrics.line_count
            ),
            path: function.path.clone(),
            line: function.start_line,
        });
    }

    if metrics.parameter_count > MAX_PARAMETERS {
        findings.push(LintFinding {
            rule_id: "too-many-parameters".to_string(),
            severity: Severity::Warning,
            message: format!(
                "'{}' takes {} parameters (limit {MAX_PARAMETERS})",
                function.name, metrics.parameter_count
            ),
            path: function.path.clone(),
            line: function.start_line,
        });
    }

    if metrics.max_nesting_depth > MAX_NESTING_DEPTH {
        findings.push(LintFinding {
            rule_id: "deep-nesting".to_string(),
            severity: Severity::Warning,
            message: format!(
                "'{}' nests {} levels deep (limit {MAX_NESTING_DEPTH})",
                function.name, metrics.max_nesting_depth
            ),
            path: function.path.clone(),
            line: function.start_line,
        });
    }

    if metrics.cyclomatic_complexity > CYCLOMATIC_ERROR {
        findings.push(LintFinding {
            rule_id: "high-cyclomatic-complexity".to_string(),
            severity: Severity::Error,
            message: format!(
                "'{}' has cyclomatic complexity {} (limit {CYCLOMATIC_ERROR})",
                function.name, metrics.cyclomatic_complexity
            ),
            path: function.path.clone(),
            line: function.start_line,
        });
    } else if metrics.cyclomatic_complexity > CYCLOMATIC_WARNING {
        findings.push(LintFinding {
            rule_id: "high-cyclomatic-complexity".to_string(),
            severity: Severity::Warning,
            message: format!(
                "'{}' has cyclomatic complexity {} (limit {CYCLOMATIC_WARNING})",
                function.name, metrics.cyclomatic_complexity
            ),
            path: function.path.clone(),
            line: function.start_line,
        });
    }

    findings
}

/// The severity a pattern-rule document declares via an optional top-level
/// `severity` key; absent or unrecognized values default to `Warning`.
fn rule_severity(raw_yaml: &str) -> Severity {
    #[derive(serde::Deserialize)]
    struct SeverityField {
        #[serde(default)]
        severity: Option<String>,
    }
    let parsed: Option<SeverityField> = serde_yaml::from_str(raw_yaml).ok();
    match parsed.and_then(|f| f.severity) {
        Some(s) if s.eq_ignore_ascii_case("error") => Severity::Error,
        Some(s) if s.eq_ignore_ascii_case("info") => Severity::Info,
        _ => Severity::Warning,
    }
}

/// Runs a structural pattern/rule document as a lint rule, the same
/// streaming invocation every other matcher query uses (spec.md §4.1,
/// "Rule execution reuses C1"). Every match becomes one finding.
pub async fn run_pattern_lint_rule(
    executor: &Executor,
    rule: &RuleDocument,
    roots: &[PathBuf],
    exclude_globs: &[String],
    cancel_token: &CancelToken,
) -> Result<Vec<LintFinding>, QualityError> {
    let severity = rule_severity(&rule.raw_yaml);
    let mut args: Vec<String> = vec!["scan".to_string(), "--json=stream".to_string()];
    for root in roots {
        args.push(root.display().to_string());
    }
    for glob in exclude_globs {
        args.push("--globs".to_string());
        args.push(format!("!{glob}"));
    }

    let mut findings = Vec::new();
    executor
        .stream(
            &args,
            None,
            |line| {
                if let Ok(wire) = serde_json::from_str::<WireMatch>(line) {
                    let record: MatchRecord = wire.into();
                    findings.push(LintFinding {
                        rule_id: rule.header.id.clone(),
                        severity,
                        message: format!("matched rule '{}'", rule.header.id),
                        path: record.file,
                        line: record.range.start.line,
                    });
                }
                true
            },
            cancel_token,
        )
        .await
        .map_err(|e| QualityError::Executor(e.into()))?;

    Ok(findings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn function(name: &str, start_line: usize) -> FunctionUnit {
        FunctionUnit {
            path: PathBuf::from("a.py"),
            name: name.to_string(),
            start_line,
            end_line: start_line,
            signature_line: String::new(),
            body: String::new(),
        }
    }

    #[test]
    fn long_function_flagged() {
        let f = function("big", 1);
        let metrics = FunctionMetrics {
            cyclomatic_complexity: 1,
            cognitive_complexity: 0,
            max_nesting_depth: 0,
            line_count: 80,
            parameter_count: 1,
        };
        let findings = lint_function(&f, &metrics);
        assert!(findings.iter().any(|finding| finding.rule_id == "function-too-long"));
    }

    #[test]
    fn clean_function_has_no_findings() {
        let f = function("small", 1);
        let metrics = FunctionMetrics {
            cyclomatic_complexity: 2,
            cognitive_complexity: 1,
            max_nesting_depth: 1,
            line_count: 5,
            parameter_count: 1,
        };
        assert!(lint_function(&f, &metrics).is_empty());
    }

    #[test]
    fn very_high_complexity_is_an_error() {
        let f = function("tangled", 1);
        let metrics = FunctionMetrics {
            cyclomatic_complexity: 25,
            cognitive_complexity: 40,
            max_nesting_depth: 2,
            line_count: 20,
            parameter_count: 1,
        };
        let findings = lint_function(&f, &metrics);
        let complexity_finding = findings
            .iter()
            .find(|finding| finding.rule_id == "high-cyclomatic-complexity")
            .unwrap();
        assert_eq!(complexity_finding.severity, Severity::Error);
    }

    #[test]
    fn rule_severity_defaults_to_warning() {
        let yaml = "id: x\nlanguage: python\nrule:\n  pattern: foo()\n";
        assert_eq!(rule_severity(yaml), Severity::Warning);
    }

    #[test]
    fn rule_severity_reads_explicit_error() {
        let yaml = "id: x\nlanguage: python\nseverity: error\nrule:\n  pattern: foo()\n";
        assert_eq!(rule_severity(yaml), Severity::Error);
    }
}
