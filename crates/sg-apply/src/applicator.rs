//! The deduplication applicator (spec.md §4.11).

use crate::candidate::{ApplyCandidate, CandidateTemplate};
use crate::imports::ensure_imports;
use sg_backup::BackupStore;
use sg_core::CoreError;
use sg_rewrite::{FileEdit, RewriteEngine, RewritePlan};
use std::collections::HashSet;
use std::path::PathBuf;

#[derive(Debug, Clone, Default)]
pub struct ApplyReport {
    pub applied: Vec<String>,
    pub skipped_validation: Vec<(String, String)>,
    pub skipped_conflict: Vec<(String, String)>,
}

struct ValidatedCandidate {
    candidate_id: String,
    plan: RewritePlan,
}

/// Applies `candidates` in order, using `template` to generate each one's
/// replacement code. Steps follow spec.md §4.11: plan + conflict check,
/// single backup, validate every candidate up front, optionally abort
/// all-or-nothing, then apply what validated.
pub fn apply_candidates(
    candidates: &[ApplyCandidate],
    template: &dyn CandidateTemplate,
    backup_store: &BackupStore,
    rewrite_engine: &RewriteEngine,
    all_or_nothing: bool,
) -> Result<ApplyReport, CoreError> {
    let mut report = ApplyReport::default();

    // Step 1: plan ordering + conflict detection. A candidate whose files
    // overlap with one already claimed by an earlier candidate is skipped
    // rather than risking edits racing each other within one run.
    let mut claimed: HashSet<PathBuf> = HashSet::new();
    let mut accepted: Vec<&ApplyCandidate> = Vec::new();
    for candidate in candidates {
        let conflicts = candidate.files.iter().any(|f| claimed.contains(f));
        if conflicts {
            report.skipped_conflict.push((
                candidate.id.clone(),
                "overlaps with an earlier candidate's files in this run".to_string(),
            ));
            continue;
        }
        claimed.extend(candidate.files.iter().cloned());
        accepted.push(candidate);
    }

    if accepted.is_empty() {
        return Ok(report);
    }

    // Step 2: a single backup covering every file any accepted candidate
    // touches.
    let all_paths: Vec<PathBuf> = claimed.into_iter().collect();
    let backup_id = backup_store.create(&all_paths)?;

    // Step 3: generate + validate every candidate before writing anything.
    let mut validated = Vec::new();
    for candidate in &accepted {
        let output = match template.generate(candidate) {
            Ok(output) => output,
            Err(e) => {
                report
                    .skipped_validation
                    .push((candidate.id.clone(), e.to_string()));
                continue;
            }
        };

        let edits: Vec<FileEdit> = output
            .edits
            .into_iter()
            .map(|mut edit| {
                if let Some((_, imports)) =
                    output.required_imports.iter().find(|(p, _)| *p == edit.path)
                {
                    let text = String::from_utf8_lossy(&edit.new_bytes).into_owned();
                    let with_imports = ensure_imports(&text, &candidate.language, imports);
                    edit.new_bytes = with_imports.into_bytes();
                }
                edit
            })
            .collect();

        let plan = RewritePlan::new(edits);
        let results = rewrite_engine.validate(&plan, &candidate.language);
        if let Some((path, result)) = results.iter().find(|(_, r)| !r.ok) {
            report.skipped_validation.push((
                candidate.id.clone(),
                format!("{}: {}", path.display(), result.errors.join("; ")),
            ));
            continue;
        }

        validated.push(ValidatedCandidate {
            candidate_id: candidate.id.clone(),
            plan,
        });
    }

    // Step 4: all-or-nothing abort.
    if all_or_nothing && !report.skipped_validation.is_empty() {
        backup_store.restore(&backup_id)?;
        for v in validated {
            report
                .skipped_validation
                .push((v.candidate_id, "aborted: all-or-nothing run had a validation failure elsewhere".to_string()));
        }
        return Ok(report);
    }

    // Step 5: apply everything that validated. The shared backup already
    // exists, so per-candidate applies skip making their own.
    for v in validated {
        let options = sg_rewrite::ApplyOptions {
            validate_syntax: false,
            make_backup: false,
            dry_run: false,
            language: String::new(),
        };
        rewrite_engine.apply(&v.plan, &options)?;
        report.applied.push(v.candidate_id);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::{RefactorStrategy, TemplateOutput};
    use crate::error::ApplyError;
    use sg_rewrite::{permissive_validator, EditCause};
    use tempfile::tempdir;

    struct StaticTemplate;
    impl CandidateTemplate for StaticTemplate {
        fn generate(&self, candidate: &ApplyCandidate) -> Result<TemplateOutput, ApplyError> {
            let edits = candidate
                .files
                .iter()
                .map(|path| FileEdit {
                    path: path.clone(),
                    new_bytes: b"def shared_helper():\n    pass\n".to_vec(),
                    cause: EditCause::Pattern {
                        pattern: "dup".to_string(),
                        replacement_template: "shared_helper".to_string(),
                    },
                })
                .collect();
            Ok(TemplateOutput {
                edits,
                required_imports: Vec::new(),
            })
        }
    }

    #[test]
    fn overlapping_candidates_are_skipped_as_conflicts() {
        let dir = tempdir().unwrap();
        let backup_root = tempdir().unwrap();
        let file = dir.path().join("a.py");
        std::fs::write(&file, "def a():\n    pass\n").unwrap();

        let backup_store = BackupStore::new(backup_root.path());
        let validator = permissive_validator();
        let engine = RewriteEngine::new(&backup_store, &validator);

        let candidates = vec![
            ApplyCandidate {
                id: "c1".to_string(),
                strategy: RefactorStrategy::ExtractFunction,
                files: vec![file.clone()],
                language: "python".to_string(),
            },
            ApplyCandidate {
                id: "c2".to_string(),
                strategy: RefactorStrategy::ExtractFunction,
                files: vec![file.clone()],
                language: "python".to_string(),
            },
        ];

        let report =
            apply_candidates(&candidates, &StaticTemplate, &backup_store, &engine, false).unwrap();
        assert_eq!(report.applied, vec!["c1".to_string()]);
        assert_eq!(report.skipped_conflict.len(), 1);
    }

    #[test]
    fn all_or_nothing_aborts_on_any_validation_failure() {
        let dir = tempdir().unwrap();
        let backup_root = tempdir().unwrap();
        let good = dir.path().join("good.py");
        let bad = dir.path().join("bad.py");
        std::fs::write(&good, "def a():\n    pass\n").unwrap();
        std::fs::write(&bad, "def b():\n    pass\n").unwrap();

        let backup_store = BackupStore::new(backup_root.path());
        let validator = sg_rewrite::balanced_delimiters_validator();
        let engine = RewriteEngine::new(&backup_store, &validator);

        struct MixedTemplate;
        impl CandidateTemplate for MixedTemplate {
            fn generate(&self, candidate: &ApplyCandidate) -> Result<TemplateOutput, ApplyError> {
                let bytes = if candidate.id == "bad" {
                    b"def broken(:\n    pass\n".to_vec()
                } else {
                    b"def fine():\n    pass\n".to_vec()
                };
                Ok(TemplateOutput {
                    edits: vec![FileEdit {
                        path: candidate.files[0].clone(),
                        new_bytes: bytes,
                        cause: EditCause::Pattern {
                            pattern: "x".to_string(),
                            replacement_template: "y".to_string(),
                        },
                    }],
                    required_imports: Vec::new(),
                })
            }
        }

        let candidates = vec![
            ApplyCandidate {
                id: "good".to_string(),
                strategy: RefactorStrategy::ExtractFunction,
                files: vec![good.clone()],
                language: "python".to_string(),
            },
            ApplyCandidate {
                id: "bad".to_string(),
                strategy: RefactorStrategy::ExtractFunction,
                files: vec![bad.clone()],
                language: "python".to_string(),
            },
        ];

        let report =
            apply_candidates(&candidates, &MixedTemplate, &backup_store, &engine, true).unwrap();
        assert!(report.applied.is_empty());
        assert_eq!(std::fs::read_to_string(&good).unwrap(), "def a():\n    pass\n");
    }
}
