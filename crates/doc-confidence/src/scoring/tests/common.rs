use chrono::{DateTime, TimeZone, Utc};

use crate::scoring::input::{
    ConfidenceCalculationInput, ExtractionMethod, ExtractionSignal, FieldCompletenessSignal,
    FormatSignal, HistoricalAccuracy, IdentificationMethod, IssuerSignal, TermMatchingSignal,
};
use crate::scoring::{ConfigSource, ResultId};

pub(super) fn calculated_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 14, 30, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn result_id(suffix: &str) -> ResultId {
    ResultId(format!("cr-test-{suffix}"))
}

/// Every signal present and strong, matched against a document-specific configuration.
pub(super) fn strong_input() -> ConfidenceCalculationInput {
    ConfidenceCalculationInput {
        extraction: Some(ExtractionSignal::new(
            95.0,
            ExtractionMethod::AzureDocumentIntelligence,
        )),
        issuer: Some(IssuerSignal {
            identified: true,
            confidence: 90.0,
            method: Some(IdentificationMethod::Name),
        }),
        format: Some(FormatSignal {
            matched: true,
            confidence: 92.0,
            format_id: Some("dhl-invoice-v2".to_string()),
        }),
        config_source: Some(ConfigSource::Specific),
        historical: Some(HistoricalAccuracy {
            total_processed: 50,
            successfully_mapped: 50,
            average_accuracy: Some(100.0),
        }),
        completeness: Some(FieldCompletenessSignal {
            total_fields: 10,
            filled_fields: 10,
            required_fields: 5,
            filled_required_fields: 5,
        }),
        terms: Some(TermMatchingSignal {
            total_terms: 8,
            matched_terms: 8,
            new_terms: 0,
        }),
    }
}

pub(super) fn unidentified_issuer_input() -> ConfidenceCalculationInput {
    let mut input = strong_input();
    input.issuer = Some(IssuerSignal {
        identified: false,
        confidence: 90.0,
        method: None,
    });
    input
}

pub(super) fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
