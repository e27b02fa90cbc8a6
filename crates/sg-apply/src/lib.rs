//! Deduplication applicator (spec.md §4.11).

pub mod applicator;
pub mod candidate;
pub mod error;
pub mod imports;

pub use applicator::{apply_candidates, ApplyReport};
pub use candidate::{ApplyCandidate, CandidateTemplate, RefactorStrategy, TemplateOutput};
pub use error::ApplyError;
pub use imports::ensure_imports;
