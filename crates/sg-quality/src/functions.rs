//! Function enumeration (spec.md §4.12 "Per function").
//!
//! Mirrors the duplication pipeline's construct enumeration: function
//! boundaries come from the scope analyzer rather than a matcher query,
//! since there is no canonical "every function" wire pattern.

use sg_core::Language;
use sg_refactor::{ScopeKind, ScopeTree};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct FunctionUnit {
    pub path: PathBuf,
    pub name: String,
    pub start_line: usize,
    pub end_line: usize,
    /// The line carrying the function's own header (`def foo(...):`,
    /// `func foo(...) {`, ...), used to count parameters.
    pub signature_line: String,
    pub body: String,
}

/// Enumerates every function/method scope in `source`.
pub fn enumerate_functions(path: &Path, source: &str, language: Language) -> Vec<FunctionUnit> {
    let tree = ScopeTree::build(source, language);
    let lines: Vec<&str> = source.lines().collect();

    tree.scopes
        .iter()
        .filter(|s| s.kind == ScopeKind::Function && s.start_line != 0)
        .filter_map(|s| {
            let body_lines = lines.get(s.start_line - 1..s.end_line.min(lines.len()))?;
            Some(FunctionUnit {
                path: path.to_path_buf(),
                name: s.name.clone(),
                start_line: s.start_line,
                end_line: s.end_line,
                signature_line: body_lines.first().map(|l| l.to_string()).unwrap_or_default(),
                body: body_lines.join("\n"),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enumerates_top_level_and_nested_functions() {
        let source = "def outer(a, b):\n    def inner(c):\n        return c\n    return inner(a) + b\n";
        let functions = enumerate_functions(Path::new("a.py"), source, Language::Python);
        let names: Vec<&str> = functions.iter().map(|f| f.name.as_str()).collect();
        assert!(names.contains(&"outer"));
        assert!(names.contains(&"inner"));
    }
}
