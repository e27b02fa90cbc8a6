//! Rewrite plans (spec.md §3 "Rewrite plan").

use std::path::PathBuf;

/// What produced an edit, carried through for reporting and for the
/// deduplication applicator's conflict checks.
#[derive(Debug, Clone)]
pub enum EditCause {
    Pattern {
        pattern: String,
        replacement_template: String,
    },
    SymbolRename {
        old: String,
        new: String,
    },
}

/// A single file's replacement bytes.
#[derive(Debug, Clone)]
pub struct FileEdit {
    pub path: PathBuf,
    pub new_bytes: Vec<u8>,
    pub cause: EditCause,
}

/// An ordered list of file edits to apply together.
#[derive(Debug, Clone, Default)]
pub struct RewritePlan {
    pub edits: Vec<FileEdit>,
}

impl RewritePlan {
    pub fn new(edits: Vec<FileEdit>) -> Self {
        Self { edits }
    }

    /// Paths touched by this plan, in the deterministic order apply uses:
    /// sorted so independent runs of the same plan always write in the same
    /// order.
    pub fn sorted_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.edits.iter().map(|e| e.path.clone()).collect();
        paths.sort();
        paths
    }
}
