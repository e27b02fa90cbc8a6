//! `rename_symbol` (spec.md §4.6).

use crate::conflict::{detect_conflicts, Conflict, FileRenameContext};
use crate::error::RefactorError;
use crate::reference::{find_references, SymbolReference};
use crate::scope::{ScopeKind, ScopeTree};
use sg_core::{CoreError, Language};
use sg_executor::Executor;
use sg_rewrite::{ApplyOptions, EditCause, FileDiff, FileEdit, RewriteEngine, RewritePlan};
use std::path::PathBuf;

/// What `rename_symbol` should touch.
pub enum RenameScope {
    Project { root: PathBuf },
    File { path: PathBuf },
    Function { path: PathBuf, function_name: String },
}

pub enum RenameOutcome {
    Applied {
        applied_paths: Vec<PathBuf>,
        backup_id: Option<String>,
    },
    Preview(Vec<FileDiff>),
    Conflict(Vec<Conflict>),
}

struct FileData {
    path: PathBuf,
    source: String,
    scope_tree: ScopeTree,
    old_references: Vec<SymbolReference>,
    new_references: Vec<SymbolReference>,
}

fn target_files(
    executor: &Executor,
    scope: &RenameScope,
    language: Language,
) -> Result<Vec<PathBuf>, RefactorError> {
    match scope {
        RenameScope::Project { root } => Ok(executor
            .filter_paths(&[root.clone()], language, None, &[])
            .map_err(|e| RefactorError::Io(std::io::Error::other(e.to_string())))?),
        RenameScope::File { path } => Ok(vec![path.clone()]),
        RenameScope::Function { path, .. } => Ok(vec![path.clone()]),
    }
}

fn load_file_data(
    path: &PathBuf,
    old: &str,
    new: &str,
    language: Language,
) -> Result<FileData, RefactorError> {
    let source = std::fs::read_to_string(path)?;
    let scope_tree = ScopeTree::build(&source, language);
    let old_references = find_references(&source, old, language, path, &scope_tree, false);
    let new_references = find_references(&source, new, language, path, &scope_tree, false);
    Ok(FileData {
        path: path.clone(),
        source,
        scope_tree,
        old_references,
        new_references,
    })
}

fn filter_by_function_scope(
    references: Vec<SymbolReference>,
    function_name: &str,
) -> Vec<SymbolReference> {
    references
        .into_iter()
        .filter(|r| {
            r.enclosing_scope
                .iter()
                .any(|(kind, name)| *kind == ScopeKind::Function && name == function_name)
        })
        .collect()
}

/// Replaces every reference's text span with `new`, processing each line
/// right-to-left so earlier replacements on the same line don't shift the
/// columns of references still to be applied.
fn apply_renames_to_source(source: &str, references: &[SymbolReference], new: &str) -> String {
    let mut by_line: std::collections::HashMap<usize, Vec<&SymbolReference>> =
        std::collections::HashMap::new();
    for r in references {
        by_line.entry(r.range.start.line).or_default().push(r);
    }

    let mut output_lines: Vec<String> = source.lines().map(|l| l.to_string()).collect();
    for (line_no, mut refs) in by_line {
        refs.sort_by(|a, b| b.range.start.column.cmp(&a.range.start.column));
        let line_idx = line_no - 1;
        if line_idx >= output_lines.len() {
            continue;
        }
        let mut chars: Vec<char> = output_lines[line_idx].chars().collect();
        for r in refs {
            let start = r.range.start.column - 1;
            let end = (r.range.end.column - 1).min(chars.len());
            if start <= end && end <= chars.len() {
                chars.splice(start..end, new.chars());
            }
        }
        output_lines[line_idx] = chars.into_iter().collect();
    }

    let mut result = output_lines.join("\n");
    if source.ends_with('\n') {
        result.push('\n');
    }
    result
}

/// Renames `old` to `new` across `scope`. Atomic across files: either every
/// reference is replaced and disk reflects it, or a conflict report is
/// returned and nothing changes.
pub fn rename_symbol(
    executor: &Executor,
    rewrite_engine: &RewriteEngine,
    old: &str,
    new: &str,
    language: Language,
    scope: RenameScope,
    dry_run: bool,
) -> Result<RenameOutcome, CoreError> {
    let paths = target_files(executor, &scope, language)?;

    let mut files: Vec<FileData> = Vec::with_capacity(paths.len());
    for path in &paths {
        let mut data = load_file_data(path, old, new, language)?;
        if let RenameScope::Function { function_name, .. } = &scope {
            data.old_references =
                filter_by_function_scope(std::mem::take(&mut data.old_references), function_name);
        }
        files.push(data);
    }

    let contexts: Vec<FileRenameContext> = files
        .iter()
        .map(|f| FileRenameContext {
            path: f.path.clone(),
            scope_tree: &f.scope_tree,
            old_references: &f.old_references,
            new_references: &f.new_references,
        })
        .collect();

    let conflicts = detect_conflicts(old, new, language, &contexts);
    if !conflicts.is_empty() {
        return Ok(RenameOutcome::Conflict(conflicts));
    }

    let edits: Vec<FileEdit> = files
        .iter()
        .filter(|f| !f.old_references.is_empty())
        .map(|f| {
            let new_source = apply_renames_to_source(&f.source, &f.old_references, new);
            FileEdit {
                path: f.path.clone(),
                new_bytes: new_source.into_bytes(),
                cause: EditCause::SymbolRename {
                    old: old.to_string(),
                    new: new.to_string(),
                },
            }
        })
        .collect();

    let plan = RewritePlan::new(edits);

    if dry_run {
        return Ok(RenameOutcome::Preview(rewrite_engine.preview(&plan)?));
    }

    let options = ApplyOptions {
        validate_syntax: true,
        make_backup: true,
        dry_run: false,
        language: language.name().to_string(),
    };
    let result = rewrite_engine.apply(&plan, &options)?;
    Ok(RenameOutcome::Applied {
        applied_paths: result.applied_paths,
        backup_id: result.backup_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applying_rename_replaces_every_use_right_to_left() {
        let source = "def foo():\n    pass\n\nfoo()\nfoo()\n";
        let tree = ScopeTree::build(source, Language::Python);
        let refs = find_references(source, "foo", Language::Python, &PathBuf::from("a.py"), &tree, false);
        let result = apply_renames_to_source(source, &refs, "bar");
        assert!(!result.contains("foo"));
        assert_eq!(result.matches("bar").count(), 3);
    }
}
