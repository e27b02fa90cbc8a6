//! Multi-factor structural bucketing (spec.md §4.7 step 3).
//!
//! Blends five cheap signals into one bucket key so that pairwise similarity
//! (expensive) only ever runs within a bucket, not across the whole corpus.

use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

fn call_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b([A-Za-z_][A-Za-z0-9_]*)\s*\(").unwrap())
}

fn decision_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(if|elif|else if|for|while|case|catch|except)\b|&&|\|\||\bor\b|\band\b")
            .unwrap()
    })
}

/// Decision-point count, a rough proxy for cyclomatic complexity without a
/// real parser (refined per-language in `sg-quality`).
pub fn approx_cyclomatic(normalized_body: &str) -> usize {
    decision_regex().find_iter(normalized_body).count() + 1
}

fn called_function_signature_hash(normalized_body: &str) -> String {
    let mut names: Vec<String> = call_regex()
        .captures_iter(normalized_body)
        .map(|c| c[1].to_string())
        .collect();
    names.sort();
    names.dedup();
    let mut hasher = Sha256::new();
    hasher.update(names.join(",").as_bytes());
    hex::encode(hasher.finalize())[..8].to_string()
}

fn indentation_depth_estimate(raw_body: &str) -> usize {
    raw_body
        .lines()
        .map(|l| {
            let width = l.len() - l.trim_start().len();
            // Treat a tab as one indent level, four spaces as one level.
            if l.starts_with('\t') {
                l.chars().take_while(|c| *c == '\t').count()
            } else {
                width / 4
            }
        })
        .max()
        .unwrap_or(0)
}

fn logarithmic_size_bucket(token_count: usize) -> usize {
    if token_count == 0 {
        0
    } else {
        (token_count as f64).log2().floor() as usize
    }
}

/// A bucket key blending first-N structural tokens, an approximate
/// complexity bucket, a hash of the called-function signature set, an
/// indentation-depth estimate and a logarithmic size bucket.
pub fn structural_bucket_key(raw_body: &str, normalized_body: &str, token_count: usize) -> String {
    let first_tokens: Vec<&str> = normalized_body.split_whitespace().take(8).collect();
    let mut hasher = Sha256::new();
    hasher.update(first_tokens.join(" ").as_bytes());
    let token_hash = hex::encode(hasher.finalize())[..8].to_string();

    let complexity_bucket = approx_cyclomatic(normalized_body) / 3;
    let call_sig_hash = called_function_signature_hash(normalized_body);
    let indent_bucket = indentation_depth_estimate(raw_body) / 2;
    let size_bucket = logarithmic_size_bucket(token_count);

    format!("{token_hash}:{complexity_bucket}:{call_sig_hash}:{indent_bucket}:{size_bucket}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{normalize_body, token_count};
    use sg_core::Language;

    #[test]
    fn identical_functions_land_in_the_same_bucket() {
        let a_raw = "def f(a, b):\n    if a:\n        return b\n    return a\n";
        let b_raw = "def f(x, y):\n    if x:\n        return y\n    return x\n";
        let a_norm = normalize_body(a_raw, Language::Python);
        let b_norm = normalize_body(b_raw, Language::Python);
        let a_key = structural_bucket_key(a_raw, &a_norm, token_count(&a_norm));
        let b_key = structural_bucket_key(b_raw, &b_norm, token_count(&b_norm));
        assert_eq!(a_key, b_key);
    }

    #[test]
    fn unrelated_functions_differ() {
        let a_raw = "def f(a, b):\n    return a + b\n";
        let b_raw = "def g():\n    for i in range(100):\n        print(i)\n    return None\n";
        let a_norm = normalize_body(a_raw, Language::Python);
        let b_norm = normalize_body(b_raw, Language::Python);
        let a_key = structural_bucket_key(a_raw, &a_norm, token_count(&a_norm));
        let b_key = structural_bucket_key(b_raw, &b_norm, token_count(&b_norm));
        assert_ne!(a_key, b_key);
    }
}
