//! Scope-aware refactoring: symbol rename and function extraction
//! (spec.md §4.5 "Scope/reference analysis", §4.6 "Refactoring operations").

pub mod conflict;
pub mod error;
pub mod extract;
pub mod mask;
pub mod reference;
pub mod rename;
pub mod scope;

pub use conflict::{detect_conflicts, Conflict, FileRenameContext};
pub use error::RefactorError;
pub use extract::{extract_function, ExtractFunctionRequest, ExtractOutcome};
pub use mask::{MaskKind, SourceMask};
pub use reference::{find_references, ReferenceKind, SymbolReference};
pub use rename::{rename_symbol, RenameOutcome, RenameScope};
pub use scope::{Scope, ScopeId, ScopeKind, ScopeTree};
