use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier wrapper for a single confidence calculation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResultId(pub String);

impl ResultId {
    pub fn generate() -> Self {
        Self(format!("cr-{}", Uuid::new_v4()))
    }
}

impl std::fmt::Display for ResultId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Independent evidence axes feeding the overall confidence score.
///
/// Declaration order is the order in which dimensions appear on a [`ConfidenceResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Dimension {
    Extraction,
    IssuerIdentification,
    FormatMatching,
    ConfigMatch,
    HistoricalAccuracy,
    FieldCompleteness,
    TermMatching,
}

impl Dimension {
    pub const ALL: [Dimension; 7] = [
        Dimension::Extraction,
        Dimension::IssuerIdentification,
        Dimension::FormatMatching,
        Dimension::ConfigMatch,
        Dimension::HistoricalAccuracy,
        Dimension::FieldCompleteness,
        Dimension::TermMatching,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Dimension::Extraction => "extraction",
            Dimension::IssuerIdentification => "issuer identification",
            Dimension::FormatMatching => "format matching",
            Dimension::ConfigMatch => "config match",
            Dimension::HistoricalAccuracy => "historical accuracy",
            Dimension::FieldCompleteness => "field completeness",
            Dimension::TermMatching => "term matching",
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Specificity tier of the mapping configuration that matched a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfigSource {
    Specific,
    Company,
    Format,
    Global,
    Default,
}

impl ConfigSource {
    /// Most specific first.
    pub const ALL: [ConfigSource; 5] = [
        ConfigSource::Specific,
        ConfigSource::Company,
        ConfigSource::Format,
        ConfigSource::Global,
        ConfigSource::Default,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ConfigSource::Specific => "document-specific",
            ConfigSource::Company => "company",
            ConfigSource::Format => "format",
            ConfigSource::Global => "global",
            ConfigSource::Default => "default",
        }
    }
}

/// Ordered confidence tiers, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfidenceLevel {
    VeryHigh,
    High,
    Medium,
    Low,
    VeryLow,
}

impl ConfidenceLevel {
    pub const ALL: [ConfidenceLevel; 5] = [
        ConfidenceLevel::VeryHigh,
        ConfidenceLevel::High,
        ConfidenceLevel::Medium,
        ConfidenceLevel::Low,
        ConfidenceLevel::VeryLow,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ConfidenceLevel::VeryHigh => "very_high",
            ConfidenceLevel::High => "high",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::Low => "low",
            ConfidenceLevel::VeryLow => "very_low",
        }
    }
}

/// Scored contribution of a single dimension, kept for audits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub dimension: Dimension,
    pub raw_score: f64,
    pub weight: f64,
    pub weighted_score: f64,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Complete output of one confidence calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceResult {
    pub id: ResultId,
    pub overall_score: f64,
    pub level: ConfidenceLevel,
    pub dimensions: Vec<DimensionScore>,
    pub base_score: f64,
    pub config_source_bonus: f64,
    pub config_source: ConfigSource,
    pub calculated_at: DateTime<Utc>,
    pub warnings: Vec<String>,
}

impl ConfidenceResult {
    pub fn dimension(&self, dimension: Dimension) -> Option<&DimensionScore> {
        self.dimensions
            .iter()
            .find(|score| score.dimension == dimension)
    }

    /// Dimensions sharing the lowest weighted contribution, in declaration order.
    ///
    /// Zero-weight dimensions never contribute and are skipped.
    pub fn weakest_dimensions(&self) -> Vec<&DimensionScore> {
        const TIE_EPSILON: f64 = 1e-9;

        let weighted = || self.dimensions.iter().filter(|score| score.weight > 0.0);
        let lowest = weighted()
            .map(|score| score.weighted_score)
            .fold(f64::INFINITY, f64::min);

        if !lowest.is_finite() {
            return Vec::new();
        }

        weighted()
            .filter(|score| (score.weighted_score - lowest).abs() <= TIE_EPSILON)
            .collect()
    }
}
