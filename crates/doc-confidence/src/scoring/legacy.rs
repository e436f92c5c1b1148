use serde::{Deserialize, Serialize};

use super::domain::{ConfidenceResult, Dimension};

/// Three-factor percentage breakdown still read by older report consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyConfidence {
    pub ocr_confidence: f64,
    pub forwarder_match: f64,
    pub historical_accuracy: f64,
    pub overall: f64,
}

impl LegacyConfidence {
    /// Project a seven-dimension result onto the older shape. The overall score is carried over
    /// unchanged rather than recomputed from the three factors.
    pub fn from_result(result: &ConfidenceResult) -> Self {
        let raw = |dimension: Dimension| {
            result
                .dimension(dimension)
                .map(|score| round_percent(score.raw_score))
                .unwrap_or_default()
        };

        Self {
            ocr_confidence: raw(Dimension::Extraction),
            forwarder_match: raw(Dimension::IssuerIdentification),
            historical_accuracy: raw(Dimension::HistoricalAccuracy),
            overall: round_percent(result.overall_score),
        }
    }
}

fn round_percent(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
