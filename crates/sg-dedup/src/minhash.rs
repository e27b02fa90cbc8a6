//! MinHash + LSH (spec.md §4.8 Stage 1).

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

const NUM_PERMUTATIONS: usize = 128;
const BAND_SIZE: usize = 4;
const NUM_BANDS: usize = NUM_PERMUTATIONS / BAND_SIZE;
const MERSENNE_PRIME: u64 = (1u64 << 61) - 1;

#[derive(Debug, Clone)]
pub struct MinHashSignature(pub Vec<u64>);

fn hash_u64(value: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Deterministic (a, b) coefficient pairs for each permutation, generated
/// with a fixed splitmix64-style expansion so the same k-gram set always
/// yields the same signature across runs.
fn permutation_coefficients() -> Vec<(u64, u64)> {
    let mut seed: u64 = 0x9E3779B97F4A7C15;
    let mut out = Vec::with_capacity(NUM_PERMUTATIONS);
    for _ in 0..NUM_PERMUTATIONS {
        seed = seed.wrapping_add(0x9E3779B97F4A7C15);
        let mut a = seed;
        a ^= a >> 30;
        a = a.wrapping_mul(0xBF58476D1CE4E5B9);
        a ^= a >> 27;
        a = a.wrapping_mul(0x94D049BB133111EB);
        a ^= a >> 31;

        let mut b = seed.wrapping_add(0x1234567);
        b ^= b >> 30;
        b = b.wrapping_mul(0xBF58476D1CE4E5B9);
        b ^= b >> 27;

        out.push((a | 1, b));
    }
    out
}

pub fn k_grams(tokens: &[&str], k: usize) -> Vec<u64> {
    if tokens.len() < k {
        return tokens
            .iter()
            .map(|t| hash_u64(t))
            .collect();
    }
    tokens
        .windows(k)
        .map(|w| hash_u64(&w.join(" ")))
        .collect()
}

/// Computes a 128-permutation MinHash signature over `tokens`'s k-grams.
pub fn compute_signature(tokens: &[&str], k: usize) -> MinHashSignature {
    let grams = k_grams(tokens, k);
    let coefficients = permutation_coefficients();

    let signature: Vec<u64> = coefficients
        .iter()
        .map(|(a, b)| {
            grams
                .iter()
                .map(|h| {
                    ((a.wrapping_mul(*h).wrapping_add(*b)) as u128 % MERSENNE_PRIME as u128) as u64
                })
                .min()
                .unwrap_or(0)
        })
        .collect();

    MinHashSignature(signature)
}

/// Estimated Jaccard similarity: fraction of agreeing signature slots.
pub fn estimated_jaccard(a: &MinHashSignature, b: &MinHashSignature) -> f64 {
    if a.0.is_empty() || b.0.is_empty() || a.0.len() != b.0.len() {
        return 0.0;
    }
    let agree = a.0.iter().zip(b.0.iter()).filter(|(x, y)| x == y).count();
    agree as f64 / a.0.len() as f64
}

/// An LSH index banding MinHash signatures so `query_candidates` runs in
/// near-O(1) instead of comparing against every inserted item.
#[derive(Default)]
pub struct LshIndex {
    bands: Vec<HashMap<u64, Vec<usize>>>,
}

impl LshIndex {
    pub fn new() -> Self {
        Self {
            bands: (0..NUM_BANDS).map(|_| HashMap::new()).collect(),
        }
    }

    pub fn insert(&mut self, id: usize, signature: &MinHashSignature) {
        for (band_idx, band) in self.bands.iter_mut().enumerate() {
            let start = band_idx * BAND_SIZE;
            let end = (start + BAND_SIZE).min(signature.0.len());
            if start >= end {
                continue;
            }
            let key = band_hash(&signature.0[start..end]);
            band.entry(key).or_default().push(id);
        }
    }

    /// Ids that share at least one LSH band with `signature`.
    pub fn query_candidates(&self, signature: &MinHashSignature) -> Vec<usize> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for (band_idx, band) in self.bands.iter().enumerate() {
            let start = band_idx * BAND_SIZE;
            let end = (start + BAND_SIZE).min(signature.0.len());
            if start >= end {
                continue;
            }
            let key = band_hash(&signature.0[start..end]);
            if let Some(ids) = band.get(&key) {
                for id in ids {
                    if seen.insert(*id) {
                        out.push(*id);
                    }
                }
            }
        }
        out
    }
}

fn band_hash(slice: &[u64]) -> u64 {
    let mut hasher = DefaultHasher::new();
    for v in slice {
        v.hash(&mut hasher);
    }
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_token_streams_have_identical_signatures() {
        let tokens = vec!["a", "b", "c", "d", "e"];
        let sig1 = compute_signature(&tokens, 3);
        let sig2 = compute_signature(&tokens, 3);
        assert_eq!(estimated_jaccard(&sig1, &sig2), 1.0);
    }

    #[test]
    fn disjoint_token_streams_have_low_estimated_similarity() {
        let a: Vec<&str> = vec!["alpha", "beta", "gamma", "delta"];
        let b: Vec<&str> = vec!["zulu", "yankee", "xray", "whiskey"];
        let sig_a = compute_signature(&a, 3);
        let sig_b = compute_signature(&b, 3);
        assert!(estimated_jaccard(&sig_a, &sig_b) < 0.5);
    }

    #[test]
    fn lsh_index_finds_near_duplicate_via_shared_band() {
        let mut index = LshIndex::new();
        let a = vec!["a", "b", "c", "d", "e", "f"];
        let b = vec!["a", "b", "c", "d", "e", "g"];
        let sig_a = compute_signature(&a, 3);
        let sig_b = compute_signature(&b, 3);
        index.insert(0, &sig_a);
        let candidates = index.query_candidates(&sig_b);
        assert!(candidates.contains(&0));
    }
}
