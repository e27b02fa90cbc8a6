//! Preview, apply and rollback (spec.md §4.4).

use crate::error::RewriteError;
use crate::plan::RewritePlan;
use crate::validator::SyntaxValidator;
use sg_backup::BackupStore;
use sg_core::{CoreError, Outcome};
use similar::TextDiff;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct FileDiff {
    pub path: PathBuf,
    pub unified_diff: String,
}

#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    pub validate_syntax: bool,
    pub make_backup: bool,
    pub dry_run: bool,
    /// Language passed through to the syntax validator, one value for the
    /// whole plan (callers with mixed-language plans split into per-language
    /// plans before calling apply).
    pub language: String,
}

#[derive(Debug, Clone)]
pub struct ApplyResult {
    pub applied_paths: Vec<PathBuf>,
    pub backup_id: Option<String>,
}

pub struct RewriteEngine<'a> {
    backup_store: &'a BackupStore,
    validator: &'a SyntaxValidator,
}

impl<'a> RewriteEngine<'a> {
    pub fn new(backup_store: &'a BackupStore, validator: &'a SyntaxValidator) -> Self {
        Self {
            backup_store,
            validator,
        }
    }

    /// Computes the unified diff per file without writing anything.
    pub fn preview(&self, plan: &RewritePlan) -> Result<Vec<FileDiff>, CoreError> {
        let mut diffs = Vec::with_capacity(plan.edits.len());
        for edit in &plan.edits {
            let current = std::fs::read(&edit.path).map_err(|source| RewriteError::ReadFailed {
                path: edit.path.clone(),
                source,
            })?;
            let current_text = String::from_utf8_lossy(&current);
            let new_text = String::from_utf8_lossy(&edit.new_bytes);
            let text_diff = TextDiff::from_lines(current_text.as_ref(), new_text.as_ref());
            let unified = text_diff
                .unified_diff()
                .header(&edit.path.to_string_lossy(), &edit.path.to_string_lossy())
                .to_string();
            diffs.push(FileDiff {
                path: edit.path.clone(),
                unified_diff: unified,
            });
        }
        Ok(diffs)
    }

    /// Applies a plan in the phases spec.md §4.4 describes. `dry_run` skips
    /// phases 2 and 5 (backup creation and writes) and returns what preview
    /// would, with no on-disk effect.
    pub fn apply(
        &self,
        plan: &RewritePlan,
        options: &ApplyOptions,
    ) -> Result<ApplyResult, CoreError> {
        if options.dry_run {
            // dry_run must be indistinguishable from preview plus a
            // verification that no file changes: touch nothing, compute
            // nothing persisted.
            self.preview(plan)?;
            return Ok(ApplyResult {
                applied_paths: Vec::new(),
                backup_id: None,
            });
        }

        // Phase 1: gather candidate files.
        let paths = plan.sorted_paths();

        // Phase 2: backup.
        let backup_id = if options.make_backup {
            Some(self.backup_store.create(&paths)?)
        } else {
            None
        };

        // Phase 3/4: compute + validate in deterministic (sorted) order.
        let mut ordered_edits = plan.edits.clone();
        ordered_edits.sort_by(|a, b| a.path.cmp(&b.path));

        if options.validate_syntax {
            for edit in &ordered_edits {
                let result = (self.validator)(&options.language, &edit.new_bytes);
                if !result.ok {
                    if let Some(id) = &backup_id {
                        let _ = self.backup_store.restore(id);
                    }
                    return Err(RewriteError::ValidationFailed {
                        path: edit.path.clone(),
                        errors: result.errors,
                    }
                    .into());
                }
            }
        }

        // Phase 5: write, atomically per file.
        let mut applied_paths = Vec::with_capacity(ordered_edits.len());
        for edit in &ordered_edits {
            if let Err(write_err) = Self::write_atomic(&edit.path, &edit.new_bytes) {
                // Phase 6: on any write failure, roll back what's already
                // been written and surface both errors distinctly.
                if let Some(id) = &backup_id {
                    match self.backup_store.restore(id) {
                        Ok(Outcome::Success { .. }) => {}
                        Ok(Outcome::PartialSuccess { failed, .. }) => {
                            let rollback_error = failed
                                .into_iter()
                                .map(|(p, e)| format!("{p}: {e}"))
                                .collect::<Vec<_>>()
                                .join("; ");
                            return Err(RewriteError::RollbackAlsoFailed {
                                apply_error: write_err.to_string(),
                                rollback_error,
                            }
                            .into());
                        }
                        Ok(Outcome::Failure { error }) | Err(error) => {
                            return Err(RewriteError::RollbackAlsoFailed {
                                apply_error: write_err.to_string(),
                                rollback_error: error.to_string(),
                            }
                            .into());
                        }
                    }
                }
                return Err(RewriteError::WriteFailed {
                    path: edit.path.clone(),
                    source: write_err,
                }
                .into());
            }
            applied_paths.push(edit.path.clone());
        }

        Ok(ApplyResult {
            applied_paths,
            backup_id,
        })
    }

    fn write_atomic(path: &std::path::Path, bytes: &[u8]) -> std::io::Result<()> {
        let temp = path.with_extension(format!(
            "{}.tmp",
            path.extension().and_then(|e| e.to_str()).unwrap_or("new")
        ));
        std::fs::write(&temp, bytes)?;
        std::fs::rename(&temp, path)
    }

    /// Delegates to the backup store.
    pub fn rollback(&self, backup_id: &str) -> Result<Outcome<Vec<PathBuf>>, CoreError> {
        self.backup_store.restore(backup_id)
    }

    /// Runs syntax validation against a plan's edits without writing
    /// anything. Lets callers validate several plans up front before
    /// deciding whether to apply any of them (e.g. the deduplication
    /// applicator's all-or-nothing mode).
    pub fn validate(&self, plan: &RewritePlan, language: &str) -> Vec<(PathBuf, crate::validator::ValidationResult)> {
        plan.edits
            .iter()
            .map(|edit| (edit.path.clone(), (self.validator)(language, &edit.new_bytes)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{EditCause, FileEdit};
    use crate::validator::{balanced_delimiters_validator, permissive_validator};
    use tempfile::tempdir;

    fn make_edit(path: PathBuf, new_bytes: &str) -> FileEdit {
        FileEdit {
            path,
            new_bytes: new_bytes.as_bytes().to_vec(),
            cause: EditCause::Pattern {
                pattern: "x".to_string(),
                replacement_template: "y".to_string(),
            },
        }
    }

    #[test]
    fn preview_does_not_write_to_disk() {
        let dir = tempdir().unwrap();
        let backup_root = tempdir().unwrap();
        let file = dir.path().join("a.py");
        std::fs::write(&file, "old = 1\n").unwrap();

        let backup_store = BackupStore::new(backup_root.path());
        let validator = permissive_validator();
        let engine = RewriteEngine::new(&backup_store, &validator);

        let plan = RewritePlan::new(vec![make_edit(file.clone(), "new = 1\n")]);
        let diffs = engine.preview(&plan).unwrap();

        assert_eq!(diffs.len(), 1);
        assert!(diffs[0].unified_diff.contains("-old = 1"));
        assert!(diffs[0].unified_diff.contains("+new = 1"));
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "old = 1\n");
    }

    #[test]
    fn apply_writes_new_bytes_and_creates_backup() {
        let dir = tempdir().unwrap();
        let backup_root = tempdir().unwrap();
        let file = dir.path().join("a.py");
        std::fs::write(&file, "old = 1\n").unwrap();

        let backup_store = BackupStore::new(backup_root.path());
        let validator = permissive_validator();
        let engine = RewriteEngine::new(&backup_store, &validator);

        let plan = RewritePlan::new(vec![make_edit(file.clone(), "new = 1\n")]);
        let options = ApplyOptions {
            validate_syntax: false,
            make_backup: true,
            dry_run: false,
            language: "python".to_string(),
        };
        let result = engine.apply(&plan, &options).unwrap();

        assert_eq!(result.applied_paths, vec![file.clone()]);
        assert!(result.backup_id.is_some());
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "new = 1\n");
    }

    #[test]
    fn apply_restores_backup_on_validation_failure() {
        let dir = tempdir().unwrap();
        let backup_root = tempdir().unwrap();
        let file = dir.path().join("a.py");
        std::fs::write(&file, "old = 1\n").unwrap();

        let backup_store = BackupStore::new(backup_root.path());
        let validator = balanced_delimiters_validator();
        let engine = RewriteEngine::new(&backup_store, &validator);

        let plan = RewritePlan::new(vec![make_edit(file.clone(), "new = (1\n")]);
        let options = ApplyOptions {
            validate_syntax: true,
            make_backup: true,
            dry_run: false,
            language: "python".to_string(),
        };
        let result = engine.apply(&plan, &options);

        assert!(result.is_err());
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "old = 1\n");
    }

    #[test]
    fn dry_run_never_touches_disk() {
        let dir = tempdir().unwrap();
        let backup_root = tempdir().unwrap();
        let file = dir.path().join("a.py");
        std::fs::write(&file, "old = 1\n").unwrap();

        let backup_store = BackupStore::new(backup_root.path());
        let validator = permissive_validator();
        let engine = RewriteEngine::new(&backup_store, &validator);

        let plan = RewritePlan::new(vec![make_edit(file.clone(), "new = 1\n")]);
        let options = ApplyOptions {
            validate_syntax: true,
            make_backup: true,
            dry_run: true,
            language: "python".to_string(),
        };
        let result = engine.apply(&plan, &options).unwrap();

        assert!(result.applied_paths.is_empty());
        assert!(result.backup_id.is_none());
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "old = 1\n");
    }
}
