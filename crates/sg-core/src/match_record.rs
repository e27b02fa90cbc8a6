//! Match records, metavariable bindings and the query fingerprint.
//!
//! The matcher's wire form is dynamically typed JSON; per spec.md §9's
//! redesign note ("dynamic duck-typed match records") we convert at the
//! process boundary into a tagged, immutable `MatchRecord`. Line/column
//! indexes on the wire are 0-based (spec.md §6); everything past the
//! boundary in this crate is 1-based.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A position, 1-indexed, as used everywhere past the matcher boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// A half-open range: `start` inclusive, `end` exclusive (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    /// Whether `self` and `other` describe overlapping regions of the same
    /// file. Both ranges are half-open, so touching endpoints don't count.
    pub fn overlaps(&self, other: &Range) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// The two observed shapes of a metavariable binding on the wire
/// (spec.md §9: "two observed forms"): a plain captured text, or a
/// full sub-match with its own range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Binding {
    Text { text: String },
    FullMatch { text: String, range: Range },
}

impl Binding {
    pub fn text(&self) -> &str {
        match self {
            Binding::Text { text } => text,
            Binding::FullMatch { text, .. } => text,
        }
    }
}

/// An immutable structural match, produced per query and interned into the
/// cache as a unit (spec.md §3 "Match record").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub file: PathBuf,
    pub range: Range,
    pub text: String,
    pub meta_variables: BTreeMap<String, Binding>,
}

/// The raw wire shape emitted by the matcher (spec.md §6). Converted to
/// `MatchRecord` immediately; never stored past that point.
#[derive(Debug, Clone, Deserialize)]
pub struct WireMatch {
    pub file: String,
    pub range: WireRange,
    pub text: String,
    #[serde(default, rename = "metaVariables")]
    pub meta_variables: BTreeMap<String, Binding>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireRange {
    pub start: WirePosition,
    pub end: WirePosition,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WirePosition {
    pub line: usize,
    pub column: usize,
}

impl From<WireMatch> for MatchRecord {
    /// Converts 0-based wire positions to the 1-based convention used
    /// everywhere past this boundary (spec.md §6).
    fn from(wire: WireMatch) -> Self {
        MatchRecord {
            file: PathBuf::from(wire.file),
            range: Range {
                start: Position {
                    line: wire.range.start.line + 1,
                    column: wire.range.start.column + 1,
                },
                end: Position {
                    line: wire.range.end.line + 1,
                    column: wire.range.end.column + 1,
                },
            },
            text: wire.text,
            meta_variables: wire.meta_variables,
        }
    }
}

/// The command kind a query fingerprint derives from (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    Find,
    FindByRule,
}

/// Deterministic identity of a structural query, independent of output
/// format (spec.md §3 "Query fingerprint"). Two fingerprints are equal iff
/// they would produce the same structural result set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryFingerprint {
    pub command: CommandKind,
    pub pattern_or_rule: String,
    pub language: String,
    pub roots: Vec<PathBuf>,
    pub max_file_size: Option<u64>,
    pub exclude_globs: Vec<String>,
}

impl QueryFingerprint {
    pub fn new(
        command: CommandKind,
        pattern_or_rule: impl Into<String>,
        language: impl Into<String>,
        mut roots: Vec<PathBuf>,
        max_file_size: Option<u64>,
        mut exclude_globs: Vec<String>,
    ) -> Self {
        // Order must not affect identity.
        roots.sort();
        exclude_globs.sort();
        Self {
            command,
            pattern_or_rule: pattern_or_rule.into(),
            language: language.into(),
            roots,
            max_file_size,
            exclude_globs,
        }
    }

    /// A stable string key derived from the fingerprint, used by the cache.
    /// Stability holds only within a process unless the inputs themselves
    /// are stable (spec.md §4.2).
    pub fn cache_key(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(format!("{:?}", self.command));
        hasher.update(&self.pattern_or_rule);
        hasher.update(&self.language);
        for root in &self.roots {
            hasher.update(root.to_string_lossy().as_bytes());
        }
        if let Some(cap) = self.max_file_size {
            hasher.update(cap.to_be_bytes());
        }
        for glob in &self.exclude_globs {
            hasher.update(glob.as_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_match_converts_0_based_to_1_based() {
        let wire = WireMatch {
            file: "a.py".to_string(),
            range: WireRange {
                start: WirePosition { line: 0, column: 0 },
                end: WirePosition { line: 0, column: 5 },
            },
            text: "foo()".to_string(),
            meta_variables: BTreeMap::new(),
        };
        let record: MatchRecord = wire.into();
        assert_eq!(record.range.start, Position { line: 1, column: 1 });
        assert_eq!(record.range.end, Position { line: 1, column: 6 });
    }

    #[test]
    fn fingerprint_is_order_independent_over_roots() {
        let a = QueryFingerprint::new(
            CommandKind::Find,
            "foo()",
            "python",
            vec![PathBuf::from("b"), PathBuf::from("a")],
            None,
            vec![],
        );
        let b = QueryFingerprint::new(
            CommandKind::Find,
            "foo()",
            "python",
            vec![PathBuf::from("a"), PathBuf::from("b")],
            None,
            vec![],
        );
        assert_eq!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn binding_text_unwraps_both_forms() {
        let a = Binding::Text {
            text: "x".to_string(),
        };
        let b = Binding::FullMatch {
            text: "x".to_string(),
            range: Range {
                start: Position { line: 1, column: 1 },
                end: Position { line: 1, column: 2 },
            },
        };
        assert_eq!(a.text(), "x");
        assert_eq!(b.text(), "x");
    }

    #[test]
    fn adjacent_ranges_do_not_overlap() {
        let a = Range {
            start: Position { line: 1, column: 1 },
            end: Position { line: 1, column: 5 },
        };
        let b = Range {
            start: Position { line: 1, column: 5 },
            end: Position { line: 1, column: 9 },
        };
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn crossing_ranges_overlap() {
        let a = Range {
            start: Position { line: 1, column: 1 },
            end: Position { line: 1, column: 6 },
        };
        let b = Range {
            start: Position { line: 1, column: 4 },
            end: Position { line: 1, column: 9 },
        };
        assert!(a.overlaps(&b));
    }
}
