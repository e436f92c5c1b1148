use serde::{Deserialize, Serialize};

use super::domain::ConfigSource;

/// Partial evidence gathered by the extraction and matching pipeline for one document.
///
/// Every field is optional; absent signals fall back to the policy's neutral score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceCalculationInput {
    #[serde(default)]
    pub extraction: Option<ExtractionSignal>,
    #[serde(default)]
    pub issuer: Option<IssuerSignal>,
    #[serde(default)]
    pub format: Option<FormatSignal>,
    #[serde(default)]
    pub config_source: Option<ConfigSource>,
    #[serde(default)]
    pub historical: Option<HistoricalAccuracy>,
    #[serde(default)]
    pub completeness: Option<FieldCompletenessSignal>,
    #[serde(default)]
    pub terms: Option<TermMatchingSignal>,
}

/// OCR or vision engine that produced the extracted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    AzureDocumentIntelligence,
    GptVision,
    DualProcessing,
}

impl ExtractionMethod {
    pub const fn label(self) -> &'static str {
        match self {
            ExtractionMethod::AzureDocumentIntelligence => "azure_document_intelligence",
            ExtractionMethod::GptVision => "gpt_vision",
            ExtractionMethod::DualProcessing => "dual_processing",
        }
    }
}

/// Extraction quality on a 0–100 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionSignal {
    pub confidence: f64,
    #[serde(default)]
    pub method: Option<ExtractionMethod>,
}

impl ExtractionSignal {
    pub fn new(confidence: f64, method: ExtractionMethod) -> Self {
        Self {
            confidence,
            method: Some(method),
        }
    }

    /// Document Intelligence reports the mean field confidence as a 0–1 fraction.
    pub fn from_fraction(fraction: f64, method: ExtractionMethod) -> Self {
        Self::new(fraction * 100.0, method)
    }
}

/// How the issuing company was recognised on the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentificationMethod {
    Name,
    Keyword,
    Format,
    LogoText,
    Manual,
}

impl IdentificationMethod {
    pub const fn label(self) -> &'static str {
        match self {
            IdentificationMethod::Name => "name",
            IdentificationMethod::Keyword => "keyword",
            IdentificationMethod::Format => "format",
            IdentificationMethod::LogoText => "logo_text",
            IdentificationMethod::Manual => "manual",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuerSignal {
    pub identified: bool,
    pub confidence: f64,
    #[serde(default)]
    pub method: Option<IdentificationMethod>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatSignal {
    pub matched: bool,
    pub confidence: f64,
    #[serde(default)]
    pub format_id: Option<String>,
}

/// Aggregated outcome counts for a company and field, produced by the outcome tracker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoricalAccuracy {
    pub total_processed: u64,
    pub successfully_mapped: u64,
    #[serde(default)]
    pub average_accuracy: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldCompletenessSignal {
    pub total_fields: u32,
    pub filled_fields: u32,
    pub required_fields: u32,
    pub filled_required_fields: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermMatchingSignal {
    pub total_terms: u32,
    pub matched_terms: u32,
    #[serde(default)]
    pub new_terms: u32,
}
