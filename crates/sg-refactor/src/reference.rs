//! Symbol reference discovery and classification (spec.md §4.5).

use crate::mask::{MaskKind, SourceMask};
use crate::scope::{ScopeKind, ScopeTree};
use regex::Regex;
use sg_core::{Language, Position, Range};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Definition,
    Use,
    Import,
    Export,
    CommentMention,
}

#[derive(Debug, Clone)]
pub struct SymbolReference {
    pub path: PathBuf,
    pub range: Range,
    pub kind: ReferenceKind,
    pub enclosing_scope: Vec<(ScopeKind, String)>,
}

fn comment_syntax(language: Language) -> (&'static str, Option<(&'static str, &'static str)>) {
    match language {
        Language::Python => ("#", None),
        Language::JavaScript | Language::TypeScript | Language::Go | Language::Rust
        | Language::Java | Language::C | Language::Cpp => ("//", Some(("/*", "*/"))),
    }
}

fn definition_keyword(language: Language) -> &'static str {
    match language {
        Language::Python => "def",
        Language::JavaScript | Language::TypeScript => "function",
        Language::Go => "func",
        Language::Rust => "fn",
        Language::Java | Language::C | Language::Cpp => "",
    }
}

fn is_import_line(line: &str, language: Language) -> bool {
    let trimmed = line.trim_start();
    match language {
        Language::Python => trimmed.starts_with("import ") || trimmed.starts_with("from "),
        Language::JavaScript | Language::TypeScript => {
            trimmed.starts_with("import ") || trimmed.contains("require(")
        }
        Language::Go => trimmed.starts_with("import "),
        Language::Rust => trimmed.starts_with("use "),
        Language::Java => trimmed.starts_with("import "),
        Language::C | Language::Cpp => trimmed.starts_with("#include"),
    }
}

fn is_export_line(line: &str, language: Language) -> bool {
    let trimmed = line.trim_start();
    match language {
        Language::JavaScript | Language::TypeScript => trimmed.starts_with("export "),
        Language::Rust => trimmed.starts_with("pub "),
        Language::Go => trimmed
            .chars()
            .next()
            .map(|c| c.is_uppercase())
            .unwrap_or(false),
        _ => false,
    }
}

/// Finds every whole-word occurrence of `symbol` in `source`, classifying
/// each by its surrounding context and tagging it with its enclosing scope.
/// Comment and string occurrences are classified as `CommentMention` but
/// excluded from the returned set unless `include_excluded` is set.
pub fn find_references(
    source: &str,
    symbol: &str,
    language: Language,
    path: &Path,
    scope_tree: &ScopeTree,
    include_excluded: bool,
) -> Vec<SymbolReference> {
    let pattern = format!(r"\b{}\b", regex::escape(symbol));
    let word_regex = Regex::new(&pattern).expect("symbol produces a valid regex");

    let (line_comment, block_comment) = comment_syntax(language);
    let mask = SourceMask::build(source, line_comment, block_comment);
    let def_keyword = definition_keyword(language);

    let mut references = Vec::new();

    for (idx, line) in source.lines().enumerate() {
        let line_no = idx + 1;
        for m in word_regex.find_iter(line) {
            let start_col = line[..m.start()].chars().count() + 1;
            let end_col = line[..m.end()].chars().count() + 1;

            let mask_kind = mask.kind_at(line_no, start_col);
            let kind = if mask_kind != MaskKind::Code {
                ReferenceKind::CommentMention
            } else if !def_keyword.is_empty() && line_defines_symbol(line, def_keyword, symbol) {
                ReferenceKind::Definition
            } else if is_class_or_struct_definition(line, symbol, language) {
                ReferenceKind::Definition
            } else if is_import_line(line, language) {
                ReferenceKind::Import
            } else if is_export_line(line, language) {
                ReferenceKind::Export
            } else {
                ReferenceKind::Use
            };

            if kind == ReferenceKind::CommentMention && !include_excluded {
                continue;
            }

            let scope_id = scope_tree.innermost_containing(line_no);
            references.push(SymbolReference {
                path: path.to_path_buf(),
                range: Range {
                    start: Position {
                        line: line_no,
                        column: start_col,
                    },
                    end: Position {
                        line: line_no,
                        column: end_col,
                    },
                },
                kind,
                enclosing_scope: scope_tree.path_to(scope_id),
            });
        }
    }

    references
}

fn line_defines_symbol(line: &str, keyword: &str, symbol: &str) -> bool {
    let pattern = format!(r"\b{}\s+{}\b", regex::escape(keyword), regex::escape(symbol));
    Regex::new(&pattern).unwrap().is_match(line)
}

fn is_class_or_struct_definition(line: &str, symbol: &str, language: Language) -> bool {
    let keyword = match language {
        Language::Python | Language::JavaScript | Language::TypeScript | Language::Java => "class",
        Language::Rust => "struct|enum|trait",
        Language::Go | Language::C | Language::Cpp => "struct",
    };
    let pattern = format!(r"\b(?:{})\s+{}\b", keyword, regex::escape(symbol));
    Regex::new(&pattern).unwrap().is_match(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::ScopeTree;

    #[test]
    fn definition_is_classified() {
        let source = "def foo():\n    return 1\n";
        let tree = ScopeTree::build(source, Language::Python);
        let refs = find_references(source, "foo", Language::Python, Path::new("a.py"), &tree, false);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].kind, ReferenceKind::Definition);
    }

    #[test]
    fn use_and_comment_are_distinguished() {
        let source = "def foo():\n    pass\n\nfoo()  # calls foo\n";
        let tree = ScopeTree::build(source, Language::Python);
        let refs = find_references(source, "foo", Language::Python, Path::new("a.py"), &tree, false);
        // definition + call; the comment mention is excluded by default.
        assert_eq!(refs.len(), 2);
        assert!(refs.iter().any(|r| r.kind == ReferenceKind::Definition));
        assert!(refs.iter().any(|r| r.kind == ReferenceKind::Use));
    }

    #[test]
    fn partial_identifier_is_not_matched() {
        let source = "foo_bar()\nfoo()\n";
        let tree = ScopeTree::build(source, Language::Python);
        let refs = find_references(source, "foo", Language::Python, Path::new("a.py"), &tree, false);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].range.start.line, 2);
    }

    #[test]
    fn import_line_is_classified() {
        let source = "import foo\nfoo.bar()\n";
        let tree = ScopeTree::build(source, Language::Python);
        let refs = find_references(source, "foo", Language::Python, Path::new("a.py"), &tree, false);
        assert!(refs.iter().any(|r| r.kind == ReferenceKind::Import));
    }
}
