//! Construct enumeration (spec.md §4.7 step 1, §3 "Construct record").
//!
//! The wire format only specifies ad-hoc pattern/rule matches (spec.md §6),
//! not a canonical "give me every function" query, so construct boundaries
//! are taken from the scope analyzer's function-kind scopes instead of a
//! streamed matcher call — the scope tree already knows exactly where a
//! function starts and ends.

use sg_core::{Language, Range};
use sg_refactor::{ScopeKind, ScopeTree};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstructKind {
    Function,
    Class,
    Method,
}

#[derive(Debug, Clone)]
pub struct ConstructRecord {
    pub path: PathBuf,
    pub range: Range,
    pub kind: ConstructKind,
    pub name: String,
    pub raw_body: String,
}

/// Enumerates every function/method/class scope in `source` at least
/// `min_lines` long.
pub fn enumerate_constructs(
    path: &Path,
    source: &str,
    language: Language,
    kinds: &[ConstructKind],
    min_lines: usize,
) -> Vec<ConstructRecord> {
    let tree = ScopeTree::build(source, language);
    let lines: Vec<&str> = source.lines().collect();

    tree.scopes
        .iter()
        .filter(|s| s.start_line != 0)
        .filter_map(|s| {
            let kind = match s.kind {
                ScopeKind::Function => {
                    let is_method = tree
                        .scope(s.parent_id.unwrap_or(0))
                        .kind
                        == ScopeKind::Class;
                    if is_method {
                        ConstructKind::Method
                    } else {
                        ConstructKind::Function
                    }
                }
                ScopeKind::Class => ConstructKind::Class,
                _ => return None,
            };
            if !kinds.contains(&kind) {
                return None;
            }
            if s.end_line.saturating_sub(s.start_line) + 1 < min_lines {
                return None;
            }
            let body_lines = lines.get(s.start_line - 1..s.end_line.min(lines.len()))?;
            Some(ConstructRecord {
                path: path.to_path_buf(),
                range: Range {
                    start: sg_core::Position {
                        line: s.start_line,
                        column: 1,
                    },
                    end: sg_core::Position {
                        line: s.end_line,
                        column: body_lines.last().map(|l| l.len() + 1).unwrap_or(1),
                    },
                },
                kind,
                name: s.name.clone(),
                raw_body: body_lines.join("\n"),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_python_functions_above_min_lines() {
        let source = "def tiny():\n    pass\n\ndef bigger():\n    a = 1\n    b = 2\n    c = 3\n    return a + b + c\n";
        let constructs = enumerate_constructs(
            Path::new("a.py"),
            source,
            Language::Python,
            &[ConstructKind::Function],
            3,
        );
        assert_eq!(constructs.len(), 1);
        assert_eq!(constructs[0].name, "bigger");
    }
}
