//! Shared foundations for the ast-grep MCP core.
//!
//! This crate carries nothing language-specific and no subprocess logic; it
//! defines the vocabulary the rest of the workspace builds on: the error
//! taxonomy, match records, the query fingerprint, the `Runtime`/`Config`
//! pair, cancellation tokens and structured events.

pub mod cancel;
pub mod config;
pub mod error;
pub mod events;
pub mod match_record;
pub mod rule;

pub use cancel::{CancelToken, ProgressCallback};
pub use config::{Config, Runtime};
pub use error::{CoreError, ErrorKind, Outcome};
pub use events::EventScope;
pub use match_record::{
    Binding, CommandKind, MatchRecord, Position, QueryFingerprint, Range, WireMatch, WirePosition,
    WireRange,
};
pub use rule::{RuleDocument, RuleHeader};

/// Languages the matcher is expected to support. Kept as an open string in
/// wire formats (spec.md §6 forwards language unchanged); this enum is a
/// convenience for call sites that need to branch on language-specific
/// conventions (test-file globs, reserved words, comment syntax).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Go,
    Rust,
    Java,
    C,
    Cpp,
}

impl Language {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "python" | "py" => Some(Language::Python),
            "javascript" | "js" => Some(Language::JavaScript),
            "typescript" | "ts" => Some(Language::TypeScript),
            "go" | "golang" => Some(Language::Go),
            "rust" | "rs" => Some(Language::Rust),
            "java" => Some(Language::Java),
            "c" => Some(Language::C),
            "cpp" | "c++" | "cxx" => Some(Language::Cpp),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::Java => "java",
            Language::C => "c",
            Language::Cpp => "cpp",
        }
    }

    /// Source file extensions the executor's `filter_paths` enumerates for
    /// this language (spec.md §4.1).
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Language::Python => &["py", "pyi"],
            Language::JavaScript => &["js", "jsx", "mjs", "cjs"],
            Language::TypeScript => &["ts", "tsx"],
            Language::Go => &["go"],
            Language::Rust => &["rs"],
            Language::Java => &["java"],
            Language::C => &["c", "h"],
            Language::Cpp => &["cpp", "cc", "cxx", "hpp", "hh"],
        }
    }

    /// Reserved words, used by conflict detection in the scope analyzer
    /// (spec.md §4.5). Not exhaustive; covers the keywords relevant to
    /// binder shadowing checks.
    pub fn is_reserved_word(&self, name: &str) -> bool {
        let words: &[&str] = match self {
            Language::Python => &[
                "def", "class", "return", "import", "from", "if", "else", "elif", "for", "while",
                "with", "as", "lambda", "yield", "None", "True", "False", "global", "nonlocal",
            ],
            Language::JavaScript | Language::TypeScript => &[
                "function", "class", "return", "import", "export", "const", "let", "var", "if",
                "else", "for", "while", "this", "new", "typeof", "interface", "type",
            ],
            Language::Go => &[
                "func", "package", "import", "return", "if", "else", "for", "range", "var",
                "const", "type", "struct", "interface", "go", "defer", "chan",
            ],
            Language::Rust => &[
                "fn", "let", "mut", "return", "use", "mod", "struct", "enum", "impl", "trait",
                "match", "if", "else", "for", "while", "loop", "pub", "const", "static",
            ],
            Language::Java => &[
                "class", "interface", "return", "import", "package", "if", "else", "for", "while",
                "public", "private", "protected", "static", "final", "new",
            ],
            Language::C | Language::Cpp => &[
                "return", "if", "else", "for", "while", "struct", "typedef", "static", "const",
                "void", "int", "char", "class", "namespace", "template",
            ],
        };
        words.contains(&name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_round_trips_through_name() {
        for lang in [
            Language::Python,
            Language::JavaScript,
            Language::TypeScript,
            Language::Go,
            Language::Rust,
            Language::Java,
            Language::C,
            Language::Cpp,
        ] {
            assert_eq!(Language::from_name(lang.name()), Some(lang));
        }
    }

    #[test]
    fn unknown_language_name_is_none() {
        assert_eq!(Language::from_name("cobol"), None);
    }

    #[test]
    fn reserved_word_detection() {
        assert!(Language::Python.is_reserved_word("def"));
        assert!(!Language::Python.is_reserved_word("foo"));
    }
}
