//! Duplication group construction (spec.md §4.7 steps 3-6, §3 "Duplication group").

use crate::bucket::structural_bucket_key;
use crate::construct::ConstructRecord;
use crate::error::DedupError;
use crate::similarity::{NormalizedItem, SimilarityPipeline};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct DuplicationGroup {
    pub members: Vec<usize>,
    pub representative: usize,
    pub min_pairwise_similarity: f64,
    pub total_lines: usize,
    pub lines_saved_estimate: f64,
    pub files: HashSet<PathBuf>,
}

struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[ra] = rb;
        }
    }
}

fn construct_lines(c: &ConstructRecord) -> usize {
    c.range.end.line.saturating_sub(c.range.start.line) + 1
}

/// Buckets `constructs`, computes pairwise similarity within each bucket,
/// and forms duplication groups by transitive closure of edges at or above
/// `threshold`, subject to a merge guard: a merge only proceeds if the
/// merged group's minimum pairwise similarity stays at or above threshold.
pub fn build_groups(
    constructs: &[ConstructRecord],
    normalized: &[NormalizedItem],
    pipeline: &SimilarityPipeline,
    threshold: f64,
) -> Result<Vec<DuplicationGroup>, DedupError> {
    assert_eq!(constructs.len(), normalized.len());

    let mut buckets: HashMap<String, Vec<usize>> = HashMap::new();
    for (idx, (construct, item)) in constructs.iter().zip(normalized.iter()).enumerate() {
        let key = structural_bucket_key(
            &construct.raw_body,
            &item.normalized_body,
            item.normalized_body.split_whitespace().count(),
        );
        buckets.entry(key).or_default().push(idx);
    }

    let mut pair_sims: HashMap<(usize, usize), f64> = HashMap::new();
    let mut edges: Vec<(usize, usize, f64)> = Vec::new();

    for members in buckets.values() {
        for i in 0..members.len() {
            for j in (i + 1)..members.len() {
                let (a, b) = (members[i], members[j]);
                let sim = pipeline.similarity(&normalized[a], &normalized[b])?;
                pair_sims.insert((a.min(b), a.max(b)), sim);
                if sim >= threshold {
                    edges.push((a, b, sim));
                }
            }
        }
    }

    edges.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap());

    let mut dsu = DisjointSet::new(constructs.len());
    let mut group_members: HashMap<usize, HashSet<usize>> = HashMap::new();
    let mut group_min_sim: HashMap<usize, f64> = HashMap::new();
    for i in 0..constructs.len() {
        group_members.insert(i, HashSet::from([i]));
        group_min_sim.insert(i, 1.0);
    }

    for (a, b, sim) in edges {
        let ra = dsu.find(a);
        let rb = dsu.find(b);
        if ra == rb {
            continue;
        }

        let members_a = &group_members[&ra];
        let members_b = &group_members[&rb];
        let mut cross_min = sim;
        for &x in members_a {
            for &y in members_b {
                let key = (x.min(y), x.max(y));
                if let Some(&s) = pair_sims.get(&key) {
                    if s < cross_min {
                        cross_min = s;
                    }
                } else {
                    // Different bucket: never scored, treat as dissimilar.
                    cross_min = 0.0;
                }
            }
        }
        let merged_min = cross_min
            .min(group_min_sim[&ra])
            .min(group_min_sim[&rb]);

        if merged_min < threshold {
            continue;
        }

        let mut merged: HashSet<usize> = members_a.union(members_b).copied().collect();
        dsu.union(a, b);
        let new_root = dsu.find(a);
        merged.insert(a);
        merged.insert(b);
        group_members.insert(new_root, merged);
        group_min_sim.insert(new_root, merged_min);
    }

    let mut by_root: HashMap<usize, Vec<usize>> = HashMap::new();
    for i in 0..constructs.len() {
        let root = dsu.find(i);
        by_root.entry(root).or_default().push(i);
    }

    let mut groups = Vec::new();
    for (root, mut members) in by_root {
        if members.len() < 2 {
            continue;
        }
        members.sort();

        let representative = *members
            .iter()
            .max_by(|&&a, &&b| {
                let score_a: f64 = members
                    .iter()
                    .filter(|&&m| m != a)
                    .map(|&m| pair_sims.get(&(a.min(m), a.max(m))).copied().unwrap_or(0.0))
                    .sum();
                let score_b: f64 = members
                    .iter()
                    .filter(|&&m| m != b)
                    .map(|&m| pair_sims.get(&(b.min(m), b.max(m))).copied().unwrap_or(0.0))
                    .sum();
                score_a.partial_cmp(&score_b).unwrap()
            })
            .unwrap();

        let total_lines: usize = members.iter().map(|&i| construct_lines(&constructs[i])).sum();
        let avg_body_lines = total_lines as f64 / members.len() as f64;
        let lines_saved_estimate = (members.len() as f64 - 1.0) * avg_body_lines;
        let files: HashSet<PathBuf> = members.iter().map(|&i| constructs[i].path.clone()).collect();

        groups.push(DuplicationGroup {
            min_pairwise_similarity: group_min_sim[&root],
            members,
            representative,
            total_lines,
            lines_saved_estimate,
            files,
        });
    }

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construct::ConstructKind;
    use crate::normalize::normalize_body;
    use crate::similarity::SimilarityConfig;
    use sg_core::{Language, Position, Range};
    use std::path::PathBuf;

    fn make_construct(path: &str, body: &str) -> ConstructRecord {
        ConstructRecord {
            path: PathBuf::from(path),
            range: Range {
                start: Position { line: 1, column: 1 },
                end: Position {
                    line: body.lines().count(),
                    column: 1,
                },
            },
            kind: ConstructKind::Function,
            name: "f".to_string(),
            raw_body: body.to_string(),
        }
    }

    #[test]
    fn every_construct_belongs_to_at_most_one_group() {
        let bodies = [
            "def f(a, b):\n    if a:\n        return b\n    return a\n",
            "def g(x, y):\n    if x:\n        return y\n    return x\n",
            "def unrelated():\n    for i in range(10):\n        print(i)\n    return None\n",
        ];
        let constructs: Vec<ConstructRecord> = bodies
            .iter()
            .enumerate()
            .map(|(i, b)| make_construct(&format!("f{i}.py"), b))
            .collect();
        let normalized: Vec<NormalizedItem> = constructs
            .iter()
            .map(|c| NormalizedItem::new(normalize_body(&c.raw_body, Language::Python)))
            .collect();

        let pipeline = SimilarityPipeline::new(SimilarityConfig::default(), None);
        let groups = build_groups(&constructs, &normalized, &pipeline, 0.5).unwrap();

        let mut seen = HashSet::new();
        for group in &groups {
            for &m in &group.members {
                assert!(seen.insert(m), "construct {m} appeared in more than one group");
            }
        }
        assert!(groups.iter().any(|g| g.members.len() == 2));
    }
}
