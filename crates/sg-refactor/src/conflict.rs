//! Rename conflict detection (spec.md §4.5 "Conflict detection").

use crate::reference::{ReferenceKind, SymbolReference};
use crate::scope::ScopeTree;
use sg_core::{Language, Range};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Conflict {
    pub file: PathBuf,
    pub range: Option<Range>,
    pub reason: String,
}

/// One file's contribution to conflict detection: its scope tree plus the
/// references already found for `old` and `new` in that file.
pub struct FileRenameContext<'a> {
    pub path: PathBuf,
    pub scope_tree: &'a ScopeTree,
    pub old_references: &'a [SymbolReference],
    pub new_references: &'a [SymbolReference],
}

/// Detects conflicts for `rename(old -> new)` across every file in scope.
/// Returns an empty vec iff the rename can proceed.
pub fn detect_conflicts(
    old: &str,
    new: &str,
    language: Language,
    files: &[FileRenameContext],
) -> Vec<Conflict> {
    let mut conflicts = Vec::new();

    if language.is_reserved_word(new) {
        conflicts.push(Conflict {
            file: PathBuf::new(),
            range: None,
            reason: format!("'{new}' is a reserved word in this language"),
        });
    }

    for file in files {
        let new_defs: Vec<&SymbolReference> = file
            .new_references
            .iter()
            .filter(|r| r.kind == ReferenceKind::Definition)
            .collect();
        let old_defs: Vec<&SymbolReference> = file
            .old_references
            .iter()
            .filter(|r| r.kind == ReferenceKind::Definition)
            .collect();

        // Shadowing: a scope introduces a definition of `new` that is an
        // ancestor of (or equal to) the scope of a reference to `old`.
        for new_def in &new_defs {
            let new_def_scope = file.scope_tree.innermost_containing(new_def.range.start.line);
            for old_ref in file.old_references {
                let old_ref_scope = file.scope_tree.innermost_containing(old_ref.range.start.line);
                let ancestors = file.scope_tree.ancestors(old_ref_scope);
                if ancestors.contains(&new_def_scope) {
                    conflicts.push(Conflict {
                        file: file.path.clone(),
                        range: Some(new_def.range),
                        reason: format!(
                            "'{new}' is already defined in a scope that would shadow a use of '{old}'"
                        ),
                    });
                    break;
                }
            }
        }

        // Collapse: the same scope directly defines both `old` and `new`.
        for old_def in &old_defs {
            let old_scope = file.scope_tree.innermost_containing(old_def.range.start.line);
            for new_def in &new_defs {
                let new_scope = file.scope_tree.innermost_containing(new_def.range.start.line);
                if old_scope == new_scope {
                    conflicts.push(Conflict {
                        file: file.path.clone(),
                        range: Some(new_def.range),
                        reason: format!(
                            "renaming '{old}' to '{new}' would merge two distinct bindings in the same scope"
                        ),
                    });
                }
            }
        }
    }

    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::find_references;
    use std::path::Path;

    #[test]
    fn reserved_word_target_is_always_a_conflict() {
        let conflicts = detect_conflicts("bar", "fn", Language::Rust, &[]);
        assert!(conflicts.iter().any(|c| c.reason.contains("reserved word")));
    }

    #[test]
    fn shadowing_definition_is_a_conflict() {
        let source = "def foo():\n    pass\n\ndef bar():\n    bar()\n";
        let tree = ScopeTree::build(source, Language::Python);
        let old_refs = find_references(source, "bar", Language::Python, Path::new("a.py"), &tree, false);
        let new_refs = find_references(source, "foo", Language::Python, Path::new("a.py"), &tree, false);

        let contexts = vec![FileRenameContext {
            path: PathBuf::from("a.py"),
            scope_tree: &tree,
            old_references: &old_refs,
            new_references: &new_refs,
        }];
        let conflicts = detect_conflicts("bar", "foo", Language::Python, &contexts);
        assert!(!conflicts.is_empty());
    }

    #[test]
    fn independent_symbols_have_no_conflict() {
        let source = "def foo():\n    pass\n\ndef baz():\n    foo()\n";
        let tree = ScopeTree::build(source, Language::Python);
        let old_refs = find_references(source, "foo", Language::Python, Path::new("a.py"), &tree, false);
        let new_refs = find_references(source, "qux", Language::Python, Path::new("a.py"), &tree, false);

        let contexts = vec![FileRenameContext {
            path: PathBuf::from("a.py"),
            scope_tree: &tree,
            old_references: &old_refs,
            new_references: &new_refs,
        }];
        let conflicts = detect_conflicts("foo", "qux", Language::Python, &contexts);
        assert!(conflicts.is_empty());
    }
}
