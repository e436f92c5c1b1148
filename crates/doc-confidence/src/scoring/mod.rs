//! Multi-dimensional confidence scoring.
//!
//! Raw upstream signals flow through the dimension evaluator, the weighted aggregator, the
//! configuration bonus, and the level classifier. Every step is pure and reads only the policy
//! snapshot the engine was built with.

mod aggregate;
mod dimensions;
pub mod domain;
pub mod input;
mod legacy;
mod levels;

#[cfg(test)]
mod tests;

pub use domain::{
    ConfidenceLevel, ConfidenceResult, ConfigSource, Dimension, DimensionScore, ResultId,
};
pub use input::{
    ConfidenceCalculationInput, ExtractionMethod, ExtractionSignal, FieldCompletenessSignal,
    FormatSignal, HistoricalAccuracy, IdentificationMethod, IssuerSignal, TermMatchingSignal,
};
pub use legacy::LegacyConfidence;
pub use levels::{classify, ScoreOutOfRange};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error};

use crate::policy::ConfidencePolicy;

/// Stateless scorer bound to one policy snapshot.
#[derive(Debug, Clone)]
pub struct ConfidenceEngine {
    policy: Arc<ConfidencePolicy>,
}

impl ConfidenceEngine {
    pub fn new(policy: Arc<ConfidencePolicy>) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ConfidencePolicy {
        &self.policy
    }

    pub fn calculate(&self, input: &ConfidenceCalculationInput) -> ConfidenceResult {
        self.calculate_at(ResultId::generate(), input, Utc::now())
    }

    /// Deterministic variant used for replays: same id, input, and timestamp give the same result.
    pub fn calculate_at(
        &self,
        id: ResultId,
        input: &ConfidenceCalculationInput,
        calculated_at: DateTime<Utc>,
    ) -> ConfidenceResult {
        let policy = self.policy.as_ref();
        let evaluated = dimensions::evaluate_dimensions(input, policy);
        let (dimensions, base_score) = aggregate::weigh(evaluated.scores, policy.weights());
        let applied =
            aggregate::apply_config_bonus(base_score, evaluated.config_source, policy.config_bonuses());

        let level = match classify(applied.overall_score, policy.levels()) {
            Ok(level) => level,
            Err(err) => {
                error!(result_id = %id, %err, "confidence score escaped clamping");
                debug_assert!(false, "{err}");
                ConfidenceLevel::VeryLow
            }
        };

        debug!(
            result_id = %id,
            overall_score = applied.overall_score,
            base_score,
            level = level.label(),
            config_source = evaluated.config_source.label(),
            warnings = evaluated.warnings.len(),
            "confidence calculated"
        );

        ConfidenceResult {
            id,
            overall_score: applied.overall_score,
            level,
            dimensions,
            base_score,
            config_source_bonus: applied.bonus,
            config_source: evaluated.config_source,
            calculated_at,
            warnings: evaluated.warnings,
        }
    }
}

impl Default for ConfidenceEngine {
    fn default() -> Self {
        Self::new(Arc::new(ConfidencePolicy::default()))
    }
}
