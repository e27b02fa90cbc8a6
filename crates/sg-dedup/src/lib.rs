//! Duplication detection, similarity scoring and candidate ranking
//! (spec.md §4.7 Duplication detector, §4.8 Similarity pipeline,
//! §4.9 Ranker).

pub mod bucket;
pub mod construct;
pub mod error;
pub mod group;
pub mod minhash;
pub mod normalize;
pub mod rank;
pub mod sequence;
pub mod similarity;

pub use construct::{enumerate_constructs, ConstructKind, ConstructRecord};
pub use error::DedupError;
pub use group::{build_groups, DuplicationGroup};
pub use rank::{rank_groups, CandidateScore, RankingInputs};
pub use similarity::{EmbeddingBackend, NormalizedItem, SimilarityConfig, SimilarityPipeline};

use normalize::normalize_body;
use rayon::prelude::*;
use sg_core::Language;
use sg_executor::Executor;
use std::path::PathBuf;

/// Finds duplication groups across every file under `roots`. Performs steps
/// 1-6 of spec.md §4.7: enumerate constructs, normalize, bucket, score
/// pairwise similarity within each bucket, and merge into groups.
pub fn find_duplicate_groups(
    executor: &Executor,
    roots: &[PathBuf],
    language: Language,
    kinds: &[ConstructKind],
    min_lines: usize,
    exclude_globs: &[String],
    pipeline: &SimilarityPipeline,
    threshold: f64,
) -> Result<(Vec<ConstructRecord>, Vec<DuplicationGroup>), DedupError> {
    let paths = executor
        .filter_paths(roots, language, None, exclude_globs)
        .map_err(|e| DedupError::ScanFailed(e.to_string()))?;

    // Reading and scope-scanning each file is independent work; spread it
    // across the bounded worker pool (spec.md §5 default width 4).
    let per_file: Vec<Result<Vec<ConstructRecord>, DedupError>> = paths
        .par_iter()
        .map(|path| {
            let source = std::fs::read_to_string(path).map_err(|source| DedupError::ReadFailed {
                path: path.display().to_string(),
                source,
            })?;
            Ok(construct::enumerate_constructs(
                path, &source, language, kinds, min_lines,
            ))
        })
        .collect();

    let mut constructs = Vec::new();
    for result in per_file {
        constructs.extend(result?);
    }

    let normalized: Vec<NormalizedItem> = constructs
        .iter()
        .map(|c| NormalizedItem::new(normalize_body(&c.raw_body, language)))
        .collect();

    let groups = group::build_groups(&constructs, &normalized, pipeline, threshold)?;
    Ok((constructs, groups))
}
