use serde::{Deserialize, Serialize};

use super::PolicyError;
use crate::routing::RoutingDecision;
use crate::scoring::{ConfidenceLevel, ConfigSource, Dimension};

/// Tolerance applied when checking that weight tables sum to one.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

const SCORE_MIN: f64 = 0.0;
const SCORE_MAX: f64 = 100.0;

/// Per-dimension weights. Must sum to 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DimensionWeights {
    pub extraction: f64,
    pub issuer_identification: f64,
    pub format_matching: f64,
    pub config_match: f64,
    pub historical_accuracy: f64,
    pub field_completeness: f64,
    pub term_matching: f64,
}

impl Default for DimensionWeights {
    fn default() -> Self {
        Self {
            extraction: 0.25,
            issuer_identification: 0.15,
            format_matching: 0.15,
            config_match: 0.10,
            historical_accuracy: 0.15,
            field_completeness: 0.10,
            term_matching: 0.10,
        }
    }
}

impl DimensionWeights {
    pub fn get(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Extraction => self.extraction,
            Dimension::IssuerIdentification => self.issuer_identification,
            Dimension::FormatMatching => self.format_matching,
            Dimension::ConfigMatch => self.config_match,
            Dimension::HistoricalAccuracy => self.historical_accuracy,
            Dimension::FieldCompleteness => self.field_completeness,
            Dimension::TermMatching => self.term_matching,
        }
    }

    pub fn sum(&self) -> f64 {
        Dimension::ALL.iter().map(|dimension| self.get(*dimension)).sum()
    }

    pub(crate) fn validate(&self) -> Result<(), PolicyError> {
        for dimension in Dimension::ALL {
            let weight = self.get(dimension);
            if !weight.is_finite() || !(0.0..=1.0).contains(&weight) {
                return Err(PolicyError::InvalidWeight { dimension, weight });
            }
        }

        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(PolicyError::WeightSum { sum });
        }

        Ok(())
    }
}

/// One value per configuration tier, most specific first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSourceTable {
    pub specific: f64,
    pub company: f64,
    pub format: f64,
    pub global: f64,
    pub default: f64,
}

impl ConfigSourceTable {
    /// Calibration bonus added after weighting.
    pub fn default_bonuses() -> Self {
        Self {
            specific: 5.0,
            company: 3.0,
            format: 2.0,
            global: 1.0,
            default: 0.0,
        }
    }

    /// Raw CONFIG_MATCH dimension scores.
    pub fn default_match_scores() -> Self {
        Self {
            specific: 100.0,
            company: 85.0,
            format: 70.0,
            global: 55.0,
            default: 40.0,
        }
    }

    pub fn get(&self, source: ConfigSource) -> f64 {
        match source {
            ConfigSource::Specific => self.specific,
            ConfigSource::Company => self.company,
            ConfigSource::Format => self.format,
            ConfigSource::Global => self.global,
            ConfigSource::Default => self.default,
        }
    }

    fn validate_strictly_decreasing(&self, table: &'static str) -> Result<(), PolicyError> {
        for source in ConfigSource::ALL {
            let value = self.get(source);
            if !value.is_finite() || !(SCORE_MIN..=SCORE_MAX).contains(&value) {
                return Err(PolicyError::ConfigSourceValue {
                    table,
                    tier: source,
                    value,
                });
            }
        }

        for pair in ConfigSource::ALL.windows(2) {
            let (more_specific, less_specific) = (pair[0], pair[1]);
            if self.get(more_specific) <= self.get(less_specific) {
                return Err(PolicyError::ConfigSourceOrder {
                    table,
                    more_specific,
                    less_specific,
                });
            }
        }

        Ok(())
    }

    pub(crate) fn validate_bonuses(&self, cap: f64) -> Result<(), PolicyError> {
        if !cap.is_finite() || !(SCORE_MIN..=SCORE_MAX).contains(&cap) {
            return Err(PolicyError::BonusCap { cap });
        }
        self.validate_strictly_decreasing("config_bonuses")?;
        if self.default != 0.0 {
            return Err(PolicyError::DefaultBonus {
                value: self.default,
            });
        }
        if self.specific > cap {
            return Err(PolicyError::BonusAboveCap {
                value: self.specific,
                cap,
            });
        }
        Ok(())
    }

    pub(crate) fn validate_match_scores(&self) -> Result<(), PolicyError> {
        self.validate_strictly_decreasing("config_match_scores")
    }
}

/// Half-open `[min, max)` score band for one level; the top band also includes 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelRange {
    pub level: ConfidenceLevel,
    pub min: f64,
    pub max: f64,
}

/// Validated, ascending partition of `[0, 100]` into confidence levels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelTable {
    ranges: Vec<LevelRange>,
}

impl LevelTable {
    pub fn default_ranges() -> Vec<LevelRange> {
        vec![
            LevelRange {
                level: ConfidenceLevel::VeryHigh,
                min: 95.0,
                max: 100.0,
            },
            LevelRange {
                level: ConfidenceLevel::High,
                min: 85.0,
                max: 95.0,
            },
            LevelRange {
                level: ConfidenceLevel::Medium,
                min: 70.0,
                max: 85.0,
            },
            LevelRange {
                level: ConfidenceLevel::Low,
                min: 50.0,
                max: 70.0,
            },
            LevelRange {
                level: ConfidenceLevel::VeryLow,
                min: 0.0,
                max: 50.0,
            },
        ]
    }

    pub fn new(mut ranges: Vec<LevelRange>) -> Result<Self, PolicyError> {
        if ranges
            .iter()
            .any(|range| !range.min.is_finite() || !range.max.is_finite() || range.min >= range.max)
        {
            return Err(PolicyError::LevelRanges(
                "every range needs finite bounds with min < max".to_string(),
            ));
        }

        for level in ConfidenceLevel::ALL {
            let count = ranges.iter().filter(|range| range.level == level).count();
            if count != 1 {
                return Err(PolicyError::LevelRanges(format!(
                    "level {} must appear exactly once (found {count})",
                    level.label()
                )));
            }
        }

        ranges.sort_by(|left, right| left.min.total_cmp(&right.min));

        let first = &ranges[0];
        let last = &ranges[ranges.len() - 1];
        if first.min != SCORE_MIN || last.max != SCORE_MAX {
            return Err(PolicyError::LevelRanges(format!(
                "ranges must cover [0, 100] (found [{}, {}])",
                first.min, last.max
            )));
        }

        for pair in ranges.windows(2) {
            let (lower, upper) = (&pair[0], &pair[1]);
            if lower.max != upper.min {
                return Err(PolicyError::LevelRanges(format!(
                    "{} ends at {} but {} starts at {}",
                    lower.level.label(),
                    lower.max,
                    upper.level.label(),
                    upper.min
                )));
            }
            // Higher bands must map to higher (earlier-declared) levels.
            if upper.level >= lower.level {
                return Err(PolicyError::LevelRanges(format!(
                    "{} must rank above {}",
                    upper.level.label(),
                    lower.level.label()
                )));
            }
        }

        Ok(Self { ranges })
    }

    pub fn ranges(&self) -> &[LevelRange] {
        &self.ranges
    }

    /// Exclusive upper bound of `level`'s band.
    pub fn upper_bound(&self, level: ConfidenceLevel) -> f64 {
        self.ranges
            .iter()
            .find(|range| range.level == level)
            .map_or(SCORE_MAX, |range| range.max)
    }

    pub(crate) fn level_for(&self, score: f64) -> Option<ConfidenceLevel> {
        let top = self.ranges.len() - 1;
        self.ranges
            .iter()
            .enumerate()
            .find(|(index, range)| {
                score >= range.min && (score < range.max || (*index == top && score <= range.max))
            })
            .map(|(_, range)| range.level)
    }
}

impl Default for LevelTable {
    fn default() -> Self {
        Self {
            ranges: {
                let mut ranges = Self::default_ranges();
                ranges.sort_by(|left, right| left.min.total_cmp(&right.min));
                ranges
            },
        }
    }
}

/// Cut-points separating the three routing outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoutingThresholds {
    pub auto_approve: f64,
    pub quick_review: f64,
}

impl Default for RoutingThresholds {
    fn default() -> Self {
        Self {
            auto_approve: 90.0,
            quick_review: 70.0,
        }
    }
}

impl RoutingThresholds {
    pub(crate) fn validate(&self) -> Result<(), PolicyError> {
        let in_range = |value: f64| value.is_finite() && (SCORE_MIN..=SCORE_MAX).contains(&value);
        if !in_range(self.auto_approve) || !in_range(self.quick_review) {
            return Err(PolicyError::ThresholdRange {
                auto_approve: self.auto_approve,
                quick_review: self.quick_review,
            });
        }
        if self.auto_approve <= self.quick_review {
            return Err(PolicyError::ThresholdOrder {
                auto_approve: self.auto_approve,
                quick_review: self.quick_review,
            });
        }
        Ok(())
    }
}

/// Reviewer workload attached to a routing outcome.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReviewEffort {
    pub priority: u8,
    pub estimated_minutes: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewTable {
    pub auto_approve: ReviewEffort,
    pub quick_review: ReviewEffort,
    pub full_review: ReviewEffort,
}

impl Default for ReviewTable {
    fn default() -> Self {
        Self {
            auto_approve: ReviewEffort {
                priority: 5,
                estimated_minutes: 0.0,
            },
            quick_review: ReviewEffort {
                priority: 3,
                estimated_minutes: 2.0,
            },
            full_review: ReviewEffort {
                priority: 1,
                estimated_minutes: 10.0,
            },
        }
    }
}

impl ReviewTable {
    pub fn get(&self, decision: RoutingDecision) -> ReviewEffort {
        match decision {
            RoutingDecision::AutoApprove => self.auto_approve,
            RoutingDecision::QuickReview => self.quick_review,
            RoutingDecision::FullReview => self.full_review,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), PolicyError> {
        for decision in RoutingDecision::ALL {
            let effort = self.get(decision);
            if !(1..=5).contains(&effort.priority)
                || !effort.estimated_minutes.is_finite()
                || effort.estimated_minutes < 0.0
            {
                return Err(PolicyError::ReviewEffort {
                    decision,
                    priority: effort.priority,
                    minutes: effort.estimated_minutes,
                });
            }
        }
        Ok(())
    }
}

/// Blend of the overall and required-field ratios for FIELD_COMPLETENESS.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompletenessWeights {
    pub overall: f64,
    pub required: f64,
}

impl Default for CompletenessWeights {
    fn default() -> Self {
        Self {
            overall: 0.4,
            required: 0.6,
        }
    }
}

impl CompletenessWeights {
    pub(crate) fn validate(&self) -> Result<(), PolicyError> {
        let valid = self.overall.is_finite()
            && self.required.is_finite()
            && self.overall >= 0.0
            && self.required >= self.overall
            && ((self.overall + self.required) - 1.0).abs() <= WEIGHT_SUM_TOLERANCE;
        if valid {
            Ok(())
        } else {
            Err(PolicyError::CompletenessWeights {
                overall: self.overall,
                required: self.required,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_sum_to_one() {
        let weights = DimensionWeights::default();
        assert!((weights.sum() - 1.0).abs() <= WEIGHT_SUM_TOLERANCE);
        assert!(weights.validate().is_ok());
    }

    #[test]
    fn weights_off_by_more_than_tolerance_are_rejected() {
        let weights = DimensionWeights {
            term_matching: 0.11,
            ..DimensionWeights::default()
        };

        match weights.validate() {
            Err(PolicyError::WeightSum { sum }) => assert!((sum - 1.01).abs() < 1e-9),
            other => panic!("expected weight sum error, got {other:?}"),
        }
    }

    #[test]
    fn negative_weight_is_rejected_even_when_sum_is_one() {
        let weights = DimensionWeights {
            extraction: 0.45,
            term_matching: -0.10,
            ..DimensionWeights::default()
        };

        assert!(matches!(
            weights.validate(),
            Err(PolicyError::InvalidWeight {
                dimension: Dimension::TermMatching,
                ..
            })
        ));
    }

    #[test]
    fn level_table_rejects_gaps_and_duplicates() {
        let mut gap = LevelTable::default_ranges();
        gap[1].min = 86.0;
        assert!(matches!(
            LevelTable::new(gap),
            Err(PolicyError::LevelRanges(_))
        ));

        let mut duplicate = LevelTable::default_ranges();
        duplicate[4].level = ConfidenceLevel::Low;
        assert!(matches!(
            LevelTable::new(duplicate),
            Err(PolicyError::LevelRanges(_))
        ));
    }

    #[test]
    fn level_table_rejects_inverted_levels() {
        let mut inverted = LevelTable::default_ranges();
        inverted[0].level = ConfidenceLevel::High;
        inverted[1].level = ConfidenceLevel::VeryHigh;
        assert!(matches!(
            LevelTable::new(inverted),
            Err(PolicyError::LevelRanges(_))
        ));
    }

    #[test]
    fn level_table_assigns_boundaries_to_higher_tier() {
        let table = LevelTable::new(LevelTable::default_ranges()).expect("defaults valid");
        assert_eq!(table.level_for(95.0), Some(ConfidenceLevel::VeryHigh));
        assert_eq!(table.level_for(94.999), Some(ConfidenceLevel::High));
        assert_eq!(table.level_for(100.0), Some(ConfidenceLevel::VeryHigh));
        assert_eq!(table.level_for(0.0), Some(ConfidenceLevel::VeryLow));
        assert_eq!(table.level_for(100.5), None);
        assert_eq!(table.level_for(-0.1), None);
    }

    #[test]
    fn bonus_table_requires_zero_default_and_strict_order() {
        let mut bonuses = ConfigSourceTable::default_bonuses();
        assert!(bonuses.validate_bonuses(10.0).is_ok());

        bonuses.default = 0.5;
        assert!(matches!(
            bonuses.validate_bonuses(10.0),
            Err(PolicyError::DefaultBonus { .. })
        ));

        let mut flat = ConfigSourceTable::default_bonuses();
        flat.company = flat.specific;
        assert!(matches!(
            flat.validate_bonuses(10.0),
            Err(PolicyError::ConfigSourceOrder {
                more_specific: ConfigSource::Specific,
                less_specific: ConfigSource::Company,
                ..
            })
        ));

        let generous = ConfigSourceTable::default_bonuses();
        assert!(matches!(
            generous.validate_bonuses(4.0),
            Err(PolicyError::BonusAboveCap { .. })
        ));
    }

    #[test]
    fn thresholds_must_be_ordered() {
        let equal = RoutingThresholds {
            auto_approve: 80.0,
            quick_review: 80.0,
        };
        assert!(matches!(
            equal.validate(),
            Err(PolicyError::ThresholdOrder { .. })
        ));

        let negative = RoutingThresholds {
            auto_approve: 80.0,
            quick_review: -1.0,
        };
        assert!(matches!(
            negative.validate(),
            Err(PolicyError::ThresholdRange { .. })
        ));
    }

    #[test]
    fn completeness_weights_favour_required_fields() {
        assert!(CompletenessWeights::default().validate().is_ok());
        let inverted = CompletenessWeights {
            overall: 0.7,
            required: 0.3,
        };
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn review_priorities_stay_within_one_to_five() {
        let mut table = ReviewTable::default();
        assert!(table.validate().is_ok());
        table.full_review.priority = 0;
        assert!(matches!(
            table.validate(),
            Err(PolicyError::ReviewEffort {
                decision: RoutingDecision::FullReview,
                ..
            })
        ));
    }
}
