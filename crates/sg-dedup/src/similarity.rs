//! Hybrid similarity pipeline combining Stages 1-3 (spec.md §4.8).

use crate::error::DedupError;
use crate::minhash::{compute_signature, estimated_jaccard, MinHashSignature};
use crate::sequence::sequence_similarity;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub struct SimilarityConfig {
    pub stage1_early_exit: f64,
    pub stage3_enabled: bool,
    pub stage3_gate: f64,
    pub small_code_token_threshold: usize,
    pub k_gram_size: usize,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            stage1_early_exit: 0.3,
            stage3_enabled: false,
            stage3_gate: 0.6,
            small_code_token_threshold: 15,
            k_gram_size: 3,
        }
    }
}

/// Combiner weights; shift when Stage 3 is active (spec.md §4.8).
fn weights(stage3_active: bool) -> (f64, f64, f64) {
    if stage3_active {
        (0.2, 0.5, 0.3)
    } else {
        (0.4, 0.6, 0.0)
    }
}

pub trait EmbeddingBackend: Send + Sync {
    fn embed(&self, normalized_body: &str) -> Result<Vec<f32>, DedupError>;
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        (dot / (norm_a * norm_b)) as f64
    }
}

pub fn body_hash(normalized_body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalized_body.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Default)]
struct SimilarityCache {
    signatures: HashMap<String, MinHashSignature>,
    embeddings: HashMap<String, Vec<f32>>,
}

pub struct NormalizedItem {
    pub body_hash: String,
    pub normalized_body: String,
}

impl NormalizedItem {
    pub fn new(normalized_body: String) -> Self {
        Self {
            body_hash: body_hash(&normalized_body),
            normalized_body,
        }
    }

    fn token_count(&self) -> usize {
        self.normalized_body.split_whitespace().count()
    }
}

/// Runs the three-stage similarity pipeline, with per-run caching of
/// MinHash signatures and embeddings keyed by normalized-body hash
/// (spec.md §4.8 "Cache").
pub struct SimilarityPipeline<'a> {
    config: SimilarityConfig,
    cache: Mutex<SimilarityCache>,
    embedder: Option<&'a dyn EmbeddingBackend>,
}

impl<'a> SimilarityPipeline<'a> {
    pub fn new(config: SimilarityConfig, embedder: Option<&'a dyn EmbeddingBackend>) -> Self {
        Self {
            config,
            cache: Mutex::new(SimilarityCache::default()),
            embedder,
        }
    }

    fn signature(&self, item: &NormalizedItem) -> MinHashSignature {
        let mut cache = self.cache.lock().unwrap();
        if let Some(sig) = cache.signatures.get(&item.body_hash) {
            return sig.clone();
        }
        let tokens: Vec<&str> = item.normalized_body.split_whitespace().collect();
        let sig = compute_signature(&tokens, self.config.k_gram_size);
        cache.signatures.insert(item.body_hash.clone(), sig.clone());
        sig
    }

    fn embedding(&self, item: &NormalizedItem) -> Result<Option<Vec<f32>>, DedupError> {
        let Some(backend) = self.embedder else {
            return Ok(None);
        };
        {
            let cache = self.cache.lock().unwrap();
            if let Some(v) = cache.embeddings.get(&item.body_hash) {
                return Ok(Some(v.clone()));
            }
        }
        let vector = backend.embed(&item.normalized_body)?;
        self.cache
            .lock()
            .unwrap()
            .embeddings
            .insert(item.body_hash.clone(), vector.clone());
        Ok(Some(vector))
    }

    /// Computes the final hybrid similarity score in `[0, 1]`.
    pub fn similarity(&self, a: &NormalizedItem, b: &NormalizedItem) -> Result<f64, DedupError> {
        let small_code = a.token_count() < self.config.small_code_token_threshold
            || b.token_count() < self.config.small_code_token_threshold;

        if small_code {
            return Ok(sequence_similarity(&a.normalized_body, &b.normalized_body));
        }

        let sig_a = self.signature(a);
        let sig_b = self.signature(b);
        let minhash_score = estimated_jaccard(&sig_a, &sig_b);

        if minhash_score < self.config.stage1_early_exit {
            return Ok(minhash_score);
        }

        let ast_score = sequence_similarity(&a.normalized_body, &b.normalized_body);

        let stage3_active = self.config.stage3_enabled && ast_score >= self.config.stage3_gate;
        let (w_minhash, w_ast, w_embed) = weights(stage3_active);

        if !stage3_active {
            return Ok(w_minhash * minhash_score + w_ast * ast_score);
        }

        let embed_score = match (self.embedding(a)?, self.embedding(b)?) {
            (Some(ea), Some(eb)) => cosine_similarity(&ea, &eb),
            _ => 0.0,
        };

        Ok(w_minhash * minhash_score + w_ast * ast_score + w_embed * embed_score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_bodies_score_one() {
        let pipeline = SimilarityPipeline::new(SimilarityConfig::default(), None);
        let body = "def f ( a , b ) : if a : return b return a extra tokens to clear fallback gate"
            .to_string();
        let item_a = NormalizedItem::new(body.clone());
        let item_b = NormalizedItem::new(body);
        let score = pipeline.similarity(&item_a, &item_b).unwrap();
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn small_code_skips_minhash() {
        let pipeline = SimilarityPipeline::new(SimilarityConfig::default(), None);
        let a = NormalizedItem::new("return a".to_string());
        let b = NormalizedItem::new("return b".to_string());
        let score = pipeline.similarity(&a, &b).unwrap();
        assert!(score > 0.0);
    }

    #[test]
    fn unrelated_large_bodies_score_low() {
        let pipeline = SimilarityPipeline::new(SimilarityConfig::default(), None);
        let a = NormalizedItem::new(
            "def alpha ( ) : value = compute_something ( ) return value plus extra padding tokens"
                .to_string(),
        );
        let b = NormalizedItem::new(
            "class Completely Different : def method ( ) : loop over things and print results here"
                .to_string(),
        );
        let score = pipeline.similarity(&a, &b).unwrap();
        assert!(score < 0.6);
    }
}
