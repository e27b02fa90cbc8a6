//! Body normalization (spec.md §4.7 step 2, §4.8 "Normalize both bodies").

use sg_core::Language;
use sg_refactor::{MaskKind, SourceMask};

fn comment_syntax(language: Language) -> (&'static str, Option<(&'static str, &'static str)>) {
    match language {
        Language::Python => ("#", None),
        _ => ("//", Some(("/*", "*/"))),
    }
}

/// Strips comments, collapses whitespace runs and trims indentation, so two
/// structurally identical bodies compare equal regardless of formatting.
pub fn normalize_body(source: &str, language: Language) -> String {
    let (line_comment, block_comment) = comment_syntax(language);
    let mask = SourceMask::build(source, line_comment, block_comment);

    let mut normalized_lines = Vec::new();
    for (idx, line) in source.lines().enumerate() {
        let line_no = idx + 1;
        let mut kept = String::new();
        for (col, ch) in line.chars().enumerate() {
            if mask.kind_at(line_no, col + 1) == MaskKind::Comment {
                break;
            }
            kept.push(ch);
        }
        let collapsed: Vec<&str> = kept.split_whitespace().collect();
        if collapsed.is_empty() {
            continue;
        }
        normalized_lines.push(collapsed.join(" "));
    }
    normalized_lines.join("\n")
}

/// Crude token count used for the small-code fallback gate (spec.md §4.8).
pub fn token_count(normalized_body: &str) -> usize {
    normalized_body.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_comments_and_collapses_whitespace() {
        let source = "def foo():  # comment\n    x   =    1\n";
        let normalized = normalize_body(source, Language::Python);
        assert!(!normalized.contains("comment"));
        assert!(normalized.contains("x = 1"));
    }

    #[test]
    fn identical_bodies_with_different_formatting_normalize_equal() {
        let a = normalize_body("def f():\n    return  1\n", Language::Python);
        let b = normalize_body("def f():\n   return 1\n", Language::Python);
        assert_eq!(a, b);
    }
}
