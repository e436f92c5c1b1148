use super::dimensions::RawDimensionScore;
use super::domain::{ConfigSource, DimensionScore};
use crate::policy::{ConfigSourceTable, DimensionWeights};

/// Attach weights to the raw scores and sum them.
///
/// The weight table was validated when the policy loaded; the base score is returned unclamped
/// so a bad table cannot hide behind the bonus applier's clamp.
pub(crate) fn weigh(
    raw: Vec<RawDimensionScore>,
    weights: &DimensionWeights,
) -> (Vec<DimensionScore>, f64) {
    let dimensions: Vec<DimensionScore> = raw
        .into_iter()
        .map(|score| {
            let weight = weights.get(score.dimension);
            DimensionScore {
                dimension: score.dimension,
                raw_score: score.raw_score,
                weight,
                weighted_score: score.raw_score * weight,
                source: score.source,
                details: score.details,
            }
        })
        .collect();

    let base_score = dimensions.iter().map(|score| score.weighted_score).sum();
    (dimensions, base_score)
}

/// Result of adding the configuration specificity bonus.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BonusApplied {
    pub overall_score: f64,
    pub bonus: f64,
}

pub(crate) fn apply_config_bonus(
    base_score: f64,
    source: ConfigSource,
    bonuses: &ConfigSourceTable,
) -> BonusApplied {
    let bonus = bonuses.get(source);
    BonusApplied {
        overall_score: (base_score + bonus).clamp(0.0, 100.0),
        bonus,
    }
}
