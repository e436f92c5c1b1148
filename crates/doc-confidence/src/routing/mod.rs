//! Review routing for scored documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::policy::{ConfidencePolicy, RoutingThresholds};
use crate::scoring::{ConfidenceLevel, ConfidenceResult};

/// Terminal routing outcome, ordered by the scrutiny it demands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoutingDecision {
    AutoApprove,
    QuickReview,
    FullReview,
}

impl RoutingDecision {
    pub const ALL: [RoutingDecision; 3] = [
        RoutingDecision::AutoApprove,
        RoutingDecision::QuickReview,
        RoutingDecision::FullReview,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            RoutingDecision::AutoApprove => "auto_approve",
            RoutingDecision::QuickReview => "quick_review",
            RoutingDecision::FullReview => "full_review",
        }
    }

    pub fn for_score(score: f64, thresholds: RoutingThresholds) -> Self {
        if score >= thresholds.auto_approve {
            RoutingDecision::AutoApprove
        } else if score >= thresholds.quick_review {
            RoutingDecision::QuickReview
        } else {
            RoutingDecision::FullReview
        }
    }
}

/// Routing outcome handed to the review workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingResult {
    pub decision: RoutingDecision,
    pub confidence_score: f64,
    pub confidence_level: ConfidenceLevel,
    pub reason: String,
    pub thresholds: RoutingThresholds,
    pub review_priority: u8,
    pub estimated_review_minutes: f64,
    pub decided_at: DateTime<Utc>,
}

impl RoutingResult {
    pub fn requires_review(&self) -> bool {
        self.decision != RoutingDecision::AutoApprove
    }
}

/// Maps a confidence result onto one of the three routing outcomes.
pub struct RoutingDecider<'a> {
    policy: &'a ConfidencePolicy,
}

impl<'a> RoutingDecider<'a> {
    pub fn new(policy: &'a ConfidencePolicy) -> Self {
        Self { policy }
    }

    pub fn decide(&self, result: &ConfidenceResult) -> RoutingResult {
        self.decide_at(result, Utc::now())
    }

    pub fn decide_at(&self, result: &ConfidenceResult, decided_at: DateTime<Utc>) -> RoutingResult {
        let thresholds = self.policy.thresholds();
        let decision = RoutingDecision::for_score(result.overall_score, thresholds);
        let effort = self.policy.review().get(decision);
        let reason = explain(decision, result, thresholds);

        debug!(
            result_id = %result.id,
            decision = decision.label(),
            score = result.overall_score,
            "document routed"
        );

        RoutingResult {
            decision,
            confidence_score: result.overall_score,
            confidence_level: result.level,
            reason,
            thresholds,
            review_priority: effort.priority,
            estimated_review_minutes: effort.estimated_minutes,
            decided_at,
        }
    }
}

fn explain(
    decision: RoutingDecision,
    result: &ConfidenceResult,
    thresholds: RoutingThresholds,
) -> String {
    let score = result.overall_score;
    let mut reason = match decision {
        RoutingDecision::AutoApprove => {
            return format!(
                "auto-approved: confidence {score:.1} ({}) meets auto-approve threshold {:.1}",
                result.level.label(),
                thresholds.auto_approve
            );
        }
        RoutingDecision::QuickReview => format!(
            "quick review: confidence {score:.1} ({}) is below auto-approve threshold {:.1}",
            result.level.label(),
            thresholds.auto_approve
        ),
        RoutingDecision::FullReview => format!(
            "full review: confidence {score:.1} ({}) is below quick-review threshold {:.1}",
            result.level.label(),
            thresholds.quick_review
        ),
    };

    let weakest: Vec<String> = result
        .weakest_dimensions()
        .iter()
        .map(|score| {
            format!(
                "{} (raw {:.1}, weighted {:.2})",
                score.dimension.label(),
                score.raw_score,
                score.weighted_score
            )
        })
        .collect();

    if !weakest.is_empty() {
        let noun = if weakest.len() == 1 {
            "weakest dimension"
        } else {
            "weakest dimensions"
        };
        reason.push_str(&format!("; {noun}: {}", weakest.join(", ")));
    }

    if !result.warnings.is_empty() {
        reason.push_str(&format!("; {} signal warning(s)", result.warnings.len()));
    }

    reason
}
