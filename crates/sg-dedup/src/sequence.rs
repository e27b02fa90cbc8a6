//! AST-normalized sequence similarity (spec.md §4.8 Stage 2).

const LARGE_BODY_LINE_THRESHOLD: usize = 500;

/// Longest-common-subsequence length over two token sequences.
fn lcs_len(a: &[&str], b: &[&str]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for ai in a {
        for (j, bj) in b.iter().enumerate() {
            curr[j + 1] = if ai == bj {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

fn lcs_ratio(a: &[&str], b: &[&str]) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }
    lcs_len(a, b) as f64 / longest as f64
}

/// Extracts the bare control-flow keyword sequence, the cheap fallback for
/// bodies too large for a full LCS (spec.md §4.8: "compare only extracted
/// structural patterns").
fn control_flow_sequence(normalized_body: &str) -> Vec<&str> {
    const KEYWORDS: &[&str] = &[
        "if", "elif", "else", "for", "while", "return", "break", "continue", "try", "except",
        "catch", "switch", "case", "match",
    ];
    normalized_body
        .split_whitespace()
        .filter(|tok| KEYWORDS.contains(tok))
        .collect()
}

/// Similarity in [0, 1] between two normalized bodies. Bodies longer than
/// `LARGE_BODY_LINE_THRESHOLD` lines fall back to comparing their
/// control-flow sequence rather than the full token stream.
pub fn sequence_similarity(normalized_a: &str, normalized_b: &str) -> f64 {
    let lines_a = normalized_a.lines().count();
    let lines_b = normalized_b.lines().count();

    if lines_a > LARGE_BODY_LINE_THRESHOLD || lines_b > LARGE_BODY_LINE_THRESHOLD {
        let seq_a = control_flow_sequence(normalized_a);
        let seq_b = control_flow_sequence(normalized_b);
        return lcs_ratio(&seq_a, &seq_b);
    }

    let tokens_a: Vec<&str> = normalized_a.split_whitespace().collect();
    let tokens_b: Vec<&str> = normalized_b.split_whitespace().collect();
    lcs_ratio(&tokens_a, &tokens_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_bodies_are_fully_similar() {
        let body = "def f ( a , b ) : return a + b";
        assert_eq!(sequence_similarity(body, body), 1.0);
    }

    #[test]
    fn renamed_identifiers_still_score_highly() {
        let a = "def f ( a , b ) : if a : return b return a";
        let b = "def g ( x , y ) : if x : return y return x";
        assert!(sequence_similarity(a, b) > 0.5);
    }

    #[test]
    fn large_bodies_fall_back_to_control_flow_sequence() {
        let big_a = std::iter::repeat("if x : pass")
            .take(600)
            .collect::<Vec<_>>()
            .join("\n");
        let big_b = big_a.clone();
        assert_eq!(sequence_similarity(&big_a, &big_b), 1.0);
    }
}
