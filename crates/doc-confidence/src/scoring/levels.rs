use super::domain::ConfidenceLevel;
use crate::policy::LevelTable;

/// A score reached the classifier outside `[0, 100]`. Upstream clamping is broken if this fires.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("confidence score {score} is outside [0, 100]")]
pub struct ScoreOutOfRange {
    pub score: f64,
}

/// Map a score to its tier. Boundary values belong to the higher tier.
pub fn classify(score: f64, table: &LevelTable) -> Result<ConfidenceLevel, ScoreOutOfRange> {
    if !score.is_finite() || !(0.0..=100.0).contains(&score) {
        return Err(ScoreOutOfRange { score });
    }

    table.level_for(score).ok_or(ScoreOutOfRange { score })
}
