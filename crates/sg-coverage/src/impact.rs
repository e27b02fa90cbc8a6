//! Impact / breaking-change risk analysis (spec.md §4.10).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLabel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone)]
pub struct ImpactAssessment {
    pub affected_files: usize,
    pub is_public_symbol: bool,
    pub callers_count: usize,
    pub cross_file: bool,
    pub risk: RiskLabel,
}

/// Combines (public-symbol?, caller count, cross-file?) into a risk label.
/// Public symbols touched across file boundaries with many call sites are
/// the likeliest to break unrelated code.
pub fn assess_impact(
    affected_files: usize,
    is_public_symbol: bool,
    callers_count: usize,
    cross_file: bool,
) -> ImpactAssessment {
    let mut score = 0.0;
    if is_public_symbol {
        score += 40.0;
    }
    if cross_file {
        score += 30.0;
    }
    score += callers_count.min(10) as f64 * 3.0;

    let risk = if score >= 60.0 {
        RiskLabel::High
    } else if score >= 30.0 {
        RiskLabel::Medium
    } else {
        RiskLabel::Low
    };

    ImpactAssessment {
        affected_files,
        is_public_symbol,
        callers_count,
        cross_file,
        risk,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn private_single_file_symbol_is_low_risk() {
        let impact = assess_impact(1, false, 0, false);
        assert_eq!(impact.risk, RiskLabel::Low);
    }

    #[test]
    fn public_cross_file_symbol_with_many_callers_is_high_risk() {
        let impact = assess_impact(5, true, 8, true);
        assert_eq!(impact.risk, RiskLabel::High);
    }

    #[test]
    fn single_factor_lands_in_medium() {
        let impact = assess_impact(2, true, 0, false);
        assert_eq!(impact.risk, RiskLabel::Medium);
    }
}
