//! Scoring and routing policy.
//!
//! A [`PolicyDocument`] is the editable, serializable shape handed over by the admin settings
//! surface. It only becomes usable once converted into a [`ConfidencePolicy`], which checks every
//! table invariant up front so the scoring pipeline never has to.

mod handle;
mod tables;

pub use handle::PolicyHandle;
pub use tables::{
    CompletenessWeights, ConfigSourceTable, DimensionWeights, LevelRange, LevelTable,
    ReviewEffort, ReviewTable, RoutingThresholds, WEIGHT_SUM_TOLERANCE,
};

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::routing::RoutingDecision;
use crate::scoring::{ConfidenceLevel, ConfigSource, Dimension};

/// Configuration errors raised while loading a policy. A policy that fails any check never
/// becomes active.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("weight for {} must be a finite value in [0, 1] (found {weight})", .dimension.label())]
    InvalidWeight { dimension: Dimension, weight: f64 },
    #[error("dimension weights must sum to 1.0 (found {sum:.6})")]
    WeightSum { sum: f64 },
    #[error("{table} value for {} must be within [0, 100] (found {value})", .tier.label())]
    ConfigSourceValue {
        table: &'static str,
        tier: ConfigSource,
        value: f64,
    },
    #[error(
        "{table} must strictly decrease with specificity ({} must exceed {})",
        .more_specific.label(),
        .less_specific.label()
    )]
    ConfigSourceOrder {
        table: &'static str,
        more_specific: ConfigSource,
        less_specific: ConfigSource,
    },
    #[error("default configuration bonus must be 0 (found {value})")]
    DefaultBonus { value: f64 },
    #[error("configuration bonus cap must be within [0, 100] (found {cap})")]
    BonusCap { cap: f64 },
    #[error("configuration bonus {value} exceeds cap {cap}")]
    BonusAboveCap { value: f64, cap: f64 },
    #[error(
        "specific configuration bonus {bonus} would lift a VERY_LOW score into auto-approval (must stay below {limit})"
    )]
    BonusReachesAutoApprove { bonus: f64, limit: f64 },
    #[error("invalid confidence level ranges: {0}")]
    LevelRanges(String),
    #[error("routing thresholds must lie within [0, 100] (auto_approve {auto_approve}, quick_review {quick_review})")]
    ThresholdRange { auto_approve: f64, quick_review: f64 },
    #[error("auto_approve threshold {auto_approve} must exceed quick_review threshold {quick_review}")]
    ThresholdOrder { auto_approve: f64, quick_review: f64 },
    #[error("review effort for {} is invalid (priority {priority}, minutes {minutes})", .decision.label())]
    ReviewEffort {
        decision: RoutingDecision,
        priority: u8,
        minutes: f64,
    },
    #[error("field completeness weights must be non-negative, sum to 1, and favour required fields (overall {overall}, required {required})")]
    CompletenessWeights { overall: f64, required: f64 },
    #[error("neutral score must be within [0, 100] (found {value})")]
    NeutralScore { value: f64 },
    #[error("failed to read policy document: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse policy document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Serializable policy as edited by administrators. Missing fields take the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyDocument {
    pub weights: DimensionWeights,
    pub config_bonuses: ConfigSourceTable,
    pub max_config_bonus: f64,
    pub config_match_scores: ConfigSourceTable,
    pub level_ranges: Vec<LevelRange>,
    pub thresholds: RoutingThresholds,
    pub review: ReviewTable,
    pub completeness: CompletenessWeights,
    pub neutral_score: f64,
    pub min_historical_sample: u64,
}

impl Default for PolicyDocument {
    fn default() -> Self {
        Self {
            weights: DimensionWeights::default(),
            config_bonuses: ConfigSourceTable::default_bonuses(),
            max_config_bonus: 10.0,
            config_match_scores: ConfigSourceTable::default_match_scores(),
            level_ranges: LevelTable::default_ranges(),
            thresholds: RoutingThresholds::default(),
            review: ReviewTable::default(),
            completeness: CompletenessWeights::default(),
            neutral_score: 50.0,
            min_historical_sample: 10,
        }
    }
}

impl PolicyDocument {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, PolicyError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, PolicyError> {
        Ok(serde_json::from_reader(reader)?)
    }
}

/// Validated, immutable policy snapshot shared by every calculation in a policy epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfidencePolicy {
    weights: DimensionWeights,
    config_bonuses: ConfigSourceTable,
    config_match_scores: ConfigSourceTable,
    levels: LevelTable,
    thresholds: RoutingThresholds,
    review: ReviewTable,
    completeness: CompletenessWeights,
    max_config_bonus: f64,
    neutral_score: f64,
    min_historical_sample: u64,
}

impl ConfidencePolicy {
    pub fn from_document(document: PolicyDocument) -> Result<Self, PolicyError> {
        let PolicyDocument {
            weights,
            config_bonuses,
            max_config_bonus,
            config_match_scores,
            level_ranges,
            thresholds,
            review,
            completeness,
            neutral_score,
            min_historical_sample,
        } = document;

        weights.validate()?;
        config_bonuses.validate_bonuses(max_config_bonus)?;
        config_match_scores.validate_match_scores()?;
        let levels = LevelTable::new(level_ranges)?;
        thresholds.validate()?;
        let limit = thresholds.auto_approve - levels.upper_bound(ConfidenceLevel::VeryLow);
        if config_bonuses.specific >= limit {
            return Err(PolicyError::BonusReachesAutoApprove {
                bonus: config_bonuses.specific,
                limit,
            });
        }
        review.validate()?;
        completeness.validate()?;
        if !neutral_score.is_finite() || !(0.0..=100.0).contains(&neutral_score) {
            return Err(PolicyError::NeutralScore {
                value: neutral_score,
            });
        }

        Ok(Self {
            weights,
            config_bonuses,
            config_match_scores,
            levels,
            thresholds,
            review,
            completeness,
            max_config_bonus,
            neutral_score,
            min_historical_sample,
        })
    }

    /// Round-trips the snapshot back into its editable form.
    pub fn to_document(&self) -> PolicyDocument {
        PolicyDocument {
            weights: self.weights.clone(),
            config_bonuses: self.config_bonuses.clone(),
            max_config_bonus: self.max_config_bonus,
            config_match_scores: self.config_match_scores.clone(),
            level_ranges: self.levels.ranges().to_vec(),
            thresholds: self.thresholds,
            review: self.review.clone(),
            completeness: self.completeness,
            neutral_score: self.neutral_score,
            min_historical_sample: self.min_historical_sample,
        }
    }

    pub fn weights(&self) -> &DimensionWeights {
        &self.weights
    }

    pub fn config_bonuses(&self) -> &ConfigSourceTable {
        &self.config_bonuses
    }

    pub fn config_match_scores(&self) -> &ConfigSourceTable {
        &self.config_match_scores
    }

    pub fn levels(&self) -> &LevelTable {
        &self.levels
    }

    pub fn thresholds(&self) -> RoutingThresholds {
        self.thresholds
    }

    pub fn review(&self) -> &ReviewTable {
        &self.review
    }

    pub fn completeness(&self) -> CompletenessWeights {
        self.completeness
    }

    pub fn neutral_score(&self) -> f64 {
        self.neutral_score
    }

    pub fn min_historical_sample(&self) -> u64 {
        self.min_historical_sample
    }
}

impl Default for ConfidencePolicy {
    fn default() -> Self {
        let document = PolicyDocument::default();
        Self {
            weights: document.weights,
            config_bonuses: document.config_bonuses,
            config_match_scores: document.config_match_scores,
            levels: LevelTable::default(),
            thresholds: document.thresholds,
            review: document.review,
            completeness: document.completeness,
            max_config_bonus: document.max_config_bonus,
            neutral_score: document.neutral_score,
            min_historical_sample: document.min_historical_sample,
        }
    }
}

impl TryFrom<PolicyDocument> for ConfidencePolicy {
    type Error = PolicyError;

    fn try_from(document: PolicyDocument) -> Result<Self, Self::Error> {
        Self::from_document(document)
    }
}
