//! Per-function metrics (spec.md §4.12): cyclomatic complexity, cognitive
//! complexity, max nesting depth, line count, parameter count.

use regex::Regex;
use sg_core::Language;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionMetrics {
    pub cyclomatic_complexity: usize,
    pub cognitive_complexity: usize,
    pub max_nesting_depth: usize,
    pub line_count: usize,
    pub parameter_count: usize,
}

fn decision_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(if|elif|else if|for|while|case|catch|except)\b|&&|\|\||\bor\b|\band\b")
            .unwrap()
    })
}

/// Cyclomatic complexity: decision-point count + 1 (spec.md §4.12).
fn cyclomatic_complexity(body: &str) -> usize {
    decision_regex().find_iter(body).count() + 1
}

fn is_brace_language(language: Language) -> bool {
    matches!(
        language,
        Language::JavaScript
            | Language::TypeScript
            | Language::Go
            | Language::Rust
            | Language::Java
            | Language::C
            | Language::Cpp
    )
}

/// Per-line nesting depth, by indentation for indentation-scoped languages
/// and by brace depth for brace-scoped ones.
fn nesting_depths(body: &str, language: Language) -> Vec<usize> {
    if is_brace_language(language) {
        let mut depth: i64 = 0;
        body.lines()
            .map(|line| {
                let opens = line.matches('{').count() as i64;
                let closes = line.matches('}').count() as i64;
                // A line that both opens and closes (or only closes) is
                // attributed to the depth it closes back to.
                let depth_before = depth;
                depth += opens - closes;
                depth_before.max(0) as usize
            })
            .collect()
    } else {
        body.lines()
            .map(|line| {
                let width = line.len() - line.trim_start().len();
                if line.starts_with('\t') {
                    line.chars().take_while(|c| *c == '\t').count()
                } else {
                    width / 4
                }
            })
            .collect()
    }
}

/// Cognitive complexity per the standard nesting-penalty algorithm: each
/// decision point on a line contributes `1 + nesting_depth_at_that_line`.
fn cognitive_complexity(body: &str, language: Language) -> usize {
    let depths = nesting_depths(body, language);
    body.lines()
        .zip(depths.iter())
        .map(|(line, depth)| decision_regex().find_iter(line).count() * (1 + depth))
        .sum()
}

fn max_nesting_depth(body: &str, language: Language) -> usize {
    nesting_depths(body, language).into_iter().max().unwrap_or(0)
}

const SELF_RECEIVER_NAMES: &[&str] = &["self", "this", "cls"];

/// Go method headers carry an optional receiver paren ahead of the real
/// parameter list (`func (r *Reader) Read(p []byte) (int, error)`); find the
/// paren that follows the function name rather than the first one.
fn go_param_paren_start(signature_line: &str) -> Option<usize> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"func\s*(?:\([^)]*\)\s*)?[A-Za-z_][A-Za-z0-9_]*\s*\(").unwrap()
    });
    re.find(signature_line).map(|m| m.end() - 1)
}

/// Parameter count, read from the function's header line. Splits on
/// top-level commas (bracket/paren/angle depth tracked) and excludes
/// the conventional receiver parameter (`self`, `this`, `cls`).
fn parameter_count(signature_line: &str, language: Language) -> usize {
    let open = if language == Language::Go {
        go_param_paren_start(signature_line).or_else(|| signature_line.find('('))
    } else {
        signature_line.find('(')
    };
    let Some(open) = open else {
        return 0;
    };
    let bytes = signature_line.as_bytes();
    let mut depth = 0i32;
    let mut close = None;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        match b {
            b'(' | b'[' | b'<' => depth += 1,
            b')' | b']' | b'>' => {
                depth -= 1;
                if depth == 0 {
                    close = Some(i);
                    break;
                }
            }
            _ => {}
        }
    }
    let Some(close) = close else { return 0 };
    let inner = &signature_line[open + 1..close];

    let mut params = Vec::new();
    let mut current = String::new();
    let mut nested = 0i32;
    for ch in inner.chars() {
        match ch {
            '(' | '[' | '<' => {
                nested += 1;
                current.push(ch);
            }
            ')' | ']' | '>' => {
                nested -= 1;
                current.push(ch);
            }
            ',' if nested == 0 => {
                params.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    if !current.trim().is_empty() {
        params.push(current.trim().to_string());
    }

    params
        .into_iter()
        .filter(|p| !p.is_empty())
        .filter(|p| {
            let name = p.split(':').next().unwrap_or(p).split('=').next().unwrap_or(p).trim();
            !SELF_RECEIVER_NAMES.contains(&name)
        })
        .count()
}

/// Computes the full per-function metric set for one function's raw body
/// text and its signature (header) line.
pub fn compute_metrics(body: &str, signature_line: &str, language: Language) -> FunctionMetrics {
    FunctionMetrics {
        cyclomatic_complexity: cyclomatic_complexity(body),
        cognitive_complexity: cognitive_complexity(body, language),
        max_nesting_depth: max_nesting_depth(body, language),
        line_count: body.lines().count(),
        parameter_count: parameter_count(signature_line, language),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn straight_line_function_has_complexity_one() {
        let body = "def f(a, b):\n    return a + b\n";
        let metrics = compute_metrics(body, "def f(a, b):", Language::Python);
        assert_eq!(metrics.cyclomatic_complexity, 1);
        assert_eq!(metrics.cognitive_complexity, 0);
        assert_eq!(metrics.parameter_count, 2);
    }

    #[test]
    fn nested_conditionals_increase_cognitive_more_than_cyclomatic() {
        let body = "def f(a):\n    if a:\n        if a > 1:\n            return 1\n    return 0\n";
        let metrics = compute_metrics(body, "def f(a):", Language::Python);
        assert_eq!(metrics.cyclomatic_complexity, 3);
        // outer if: depth 1 -> +1*(1+1)=2; inner if: depth 2 -> +1*(1+2)=3
        assert_eq!(metrics.cognitive_complexity, 5);
        assert!(metrics.max_nesting_depth >= 2);
    }

    #[test]
    fn self_receiver_is_excluded_from_parameter_count() {
        assert_eq!(parameter_count("def method(self, a, b):", Language::Python), 2);
    }

    #[test]
    fn go_receiver_paren_is_not_mistaken_for_parameters() {
        assert_eq!(
            parameter_count("func (r *Reader) Read(p []byte) (int, error) {", Language::Go),
            1
        );
    }

    #[test]
    fn empty_parameter_list_counts_zero() {
        assert_eq!(parameter_count("def f():", Language::Python), 0);
    }
}
