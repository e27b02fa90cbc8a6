//! Candidate and template types (spec.md §4.11).

use crate::error::ApplyError;
use sg_rewrite::FileEdit;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefactorStrategy {
    ExtractFunction,
    ExtractClass,
    Inline,
}

/// One duplication group, ready to be applied via `strategy`.
#[derive(Debug, Clone)]
pub struct ApplyCandidate {
    pub id: String,
    pub strategy: RefactorStrategy,
    pub files: Vec<PathBuf>,
    pub language: String,
}

/// What a template produces for a candidate: the file edits, plus any
/// import lines it requires inserted (spec.md §4.11 "Import management").
pub struct TemplateOutput {
    pub edits: Vec<FileEdit>,
    pub required_imports: Vec<(PathBuf, Vec<String>)>,
}

/// Generates replacement code for a candidate. The applicator only
/// requires that this produce a valid string per file and declare the
/// imports it needs; the template itself is refactor-strategy specific and
/// owned by the caller (spec.md §4.11: "delegated to templates").
pub trait CandidateTemplate {
    fn generate(&self, candidate: &ApplyCandidate) -> Result<TemplateOutput, ApplyError>;
}
