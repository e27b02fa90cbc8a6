//! Candidate ranking (spec.md §4.9, §3 "Candidate score").

use crate::group::DuplicationGroup;

/// Signals a caller supplies per group to avoid coupling this crate to the
/// coverage and quality analyzers that actually compute them.
#[derive(Debug, Clone, Copy)]
pub struct RankingInputs {
    pub avg_cyclomatic: f64,
    pub any_member_lacks_test_coverage: bool,
    pub call_site_count: usize,
}

#[derive(Debug, Clone)]
pub struct CandidateScore {
    pub group_index: usize,
    pub savings: f64,
    pub complexity: f64,
    pub risk: f64,
    pub effort: f64,
    pub score: f64,
}

const W_SAVINGS: f64 = 0.40;
const W_COMPLEXITY: f64 = 0.20;
const W_RISK: f64 = 0.25;
const W_EFFORT: f64 = 0.15;

fn savings_score(lines_saved: f64) -> f64 {
    (lines_saved / 500.0 * 100.0).clamp(0.0, 100.0)
}

fn complexity_score(avg_cyclomatic: f64) -> f64 {
    100.0 - avg_cyclomatic.min(10.0) * 10.0
}

fn risk_score(lacks_coverage: bool, call_site_count: usize) -> f64 {
    let mut score: f64 = 100.0;
    if lacks_coverage {
        score -= 30.0;
    }
    // Heavier penalty the more call sites a rename/extraction would touch.
    score -= (call_site_count as f64).min(10.0) * 4.0;
    score.clamp(0.0, 100.0)
}

fn effort_score(files_affected: usize) -> f64 {
    (100.0 - (files_affected as f64).min(20.0) * 4.0).clamp(0.0, 100.0)
}

/// Scores and ranks `groups`, highest score first. Ties break by savings
/// descending, then by files-affected ascending. `max_results` truncates
/// after the sort.
pub fn rank_groups(
    groups: &[DuplicationGroup],
    inputs: &[RankingInputs],
    max_results: Option<usize>,
) -> Vec<CandidateScore> {
    assert_eq!(groups.len(), inputs.len());

    let mut scored: Vec<CandidateScore> = groups
        .iter()
        .zip(inputs.iter())
        .enumerate()
        .map(|(idx, (group, input))| {
            let savings = savings_score(group.lines_saved_estimate);
            let complexity = complexity_score(input.avg_cyclomatic);
            let risk = risk_score(input.any_member_lacks_test_coverage, input.call_site_count);
            let effort = effort_score(group.files.len());
            let score =
                W_SAVINGS * savings + W_COMPLEXITY * complexity + W_RISK * risk + W_EFFORT * effort;
            CandidateScore {
                group_index: idx,
                savings,
                complexity,
                risk,
                effort,
                score,
            }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap()
            .then_with(|| b.savings.partial_cmp(&a.savings).unwrap())
            .then_with(|| {
                groups[a.group_index]
                    .files
                    .len()
                    .cmp(&groups[b.group_index].files.len())
            })
    });

    if let Some(max) = max_results {
        scored.truncate(max);
    }
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::path::PathBuf;

    fn group(lines_saved: f64, files: usize) -> DuplicationGroup {
        DuplicationGroup {
            members: vec![0, 1],
            representative: 0,
            min_pairwise_similarity: 0.9,
            total_lines: 20,
            lines_saved_estimate: lines_saved,
            files: (0..files).map(|i| PathBuf::from(format!("f{i}.py"))).collect::<HashSet<_>>(),
        }
    }

    #[test]
    fn higher_savings_ranks_first_all_else_equal() {
        let groups = vec![group(10.0, 1), group(200.0, 1)];
        let inputs = vec![
            RankingInputs {
                avg_cyclomatic: 2.0,
                any_member_lacks_test_coverage: false,
                call_site_count: 1,
            };
            2
        ];
        let ranked = rank_groups(&groups, &inputs, None);
        assert_eq!(ranked[0].group_index, 1);
    }

    #[test]
    fn max_results_truncates_after_sort() {
        let groups = vec![group(10.0, 1), group(200.0, 1), group(50.0, 1)];
        let inputs = vec![
            RankingInputs {
                avg_cyclomatic: 2.0,
                any_member_lacks_test_coverage: false,
                call_site_count: 1,
            };
            3
        ];
        let ranked = rank_groups(&groups, &inputs, Some(2));
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].group_index, 1);
    }

    #[test]
    fn ranker_is_deterministic_across_runs() {
        let groups = vec![group(50.0, 2), group(50.0, 1)];
        let inputs = vec![
            RankingInputs {
                avg_cyclomatic: 3.0,
                any_member_lacks_test_coverage: false,
                call_site_count: 0,
            };
            2
        ];
        let a = rank_groups(&groups, &inputs, None);
        let b = rank_groups(&groups, &inputs, None);
        assert_eq!(a[0].group_index, b[0].group_index);
        // Equal savings, so the tie breaks by files_affected ascending.
        assert_eq!(a[0].group_index, 1);
    }
}
