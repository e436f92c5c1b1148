//! End-to-end routing behavior through the public service facade.
//!
//! Each scenario feeds a complete extraction result through scoring and routing using the
//! default policy, the way the extraction pipeline hands documents over.

mod common {
    use std::sync::Arc;

    use doc_confidence::scoring::{
        ConfigSource, ExtractionMethod, ExtractionSignal, FieldCompletenessSignal, FormatSignal,
        HistoricalAccuracy, IdentificationMethod, IssuerSignal, TermMatchingSignal,
    };
    use doc_confidence::{
        CompanyId, ConfidenceCalculationInput, ConfidencePolicy, DocumentRequest,
        DocumentRoutingService, InMemoryOutcomeStore,
    };

    pub(super) fn service() -> DocumentRoutingService<InMemoryOutcomeStore> {
        DocumentRoutingService::new(
            Arc::new(InMemoryOutcomeStore::default()),
            ConfidencePolicy::default(),
        )
    }

    pub(super) fn strong_input() -> ConfidenceCalculationInput {
        ConfidenceCalculationInput {
            extraction: Some(ExtractionSignal::new(95.0, ExtractionMethod::DualProcessing)),
            issuer: Some(IssuerSignal {
                identified: true,
                confidence: 90.0,
                method: Some(IdentificationMethod::LogoText),
            }),
            format: Some(FormatSignal {
                matched: true,
                confidence: 92.0,
                format_id: Some("maersk-freight-2024".to_string()),
            }),
            config_source: Some(ConfigSource::Specific),
            historical: Some(HistoricalAccuracy {
                total_processed: 50,
                successfully_mapped: 50,
                average_accuracy: None,
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

    pub(super) fn request(document_id: &str, input: ConfidenceCalculationInput) -> DocumentRequest {
        DocumentRequest {
            document_id: document_id.to_string(),
            company_id: Some(CompanyId("MAERSK".to_string())),
            field_names: vec!["invoice_number".to_string(), "total_amount".to_string()],
            input,
        }
    }
}

use common::*;
use doc_confidence::audit::write_audit_csv;
use doc_confidence::scoring::{Dimension, IssuerSignal};
use doc_confidence::{ConfidenceCalculationInput, ConfidenceLevel, RoutingDecision};

#[test]
fn fully_matched_document_is_auto_approved() {
    let service = service();
    let processed = service
        .process(request("INV-1001", strong_input()))
        .expect("document processes");

    assert!(processed.confidence.overall_score >= 95.0);
    assert_eq!(processed.confidence.level, ConfidenceLevel::VeryHigh);
    assert_eq!(processed.routing.decision, RoutingDecision::AutoApprove);
    assert_eq!(
        processed.routing.confidence_score,
        processed.confidence.overall_score
    );
    assert!(processed.routing.reason.starts_with("auto-approved"));
}

#[test]
fn failed_issuer_identification_requires_quick_review() {
    let service = service();
    let mut input = strong_input();
    input.issuer = Some(IssuerSignal {
        identified: false,
        confidence: 35.0,
        method: None,
    });

    let processed = service
        .process(request("INV-1002", input))
        .expect("document processes");

    let score = processed.confidence.overall_score;
    assert!((70.0..90.0).contains(&score), "score {score} outside quick-review band");
    assert_eq!(processed.routing.decision, RoutingDecision::QuickReview);
    assert_eq!(
        processed
            .confidence
            .weakest_dimensions()
            .first()
            .map(|score| score.dimension),
        Some(Dimension::IssuerIdentification)
    );
    assert!(processed.routing.reason.contains("issuer identification"));
}

#[test]
fn empty_input_is_routed_without_failing() {
    let service = service();
    let mut req = request("INV-1003", ConfidenceCalculationInput::default());
    req.company_id = None;

    let processed = service.process(req).expect("document processes");

    assert_eq!(processed.confidence.warnings.len(), 7);
    assert_eq!(processed.confidence.level, ConfidenceLevel::Low);
    assert_eq!(processed.routing.decision, RoutingDecision::FullReview);
    assert!(processed.routing.requires_review());
}

#[test]
fn audit_export_covers_every_processed_dimension() {
    let service = service();
    let documents = vec![
        service
            .process(request("INV-2001", strong_input()))
            .expect("first document"),
        service
            .process(request("INV-2002", ConfidenceCalculationInput::default()))
            .expect("second document"),
    ];

    let mut buffer = Vec::new();
    let rows = write_audit_csv(&mut buffer, &documents).expect("audit export");
    assert_eq!(rows, 14);

    let mut reader = csv::Reader::from_reader(buffer.as_slice());
    let headers = reader.headers().expect("headers").clone();
    assert_eq!(&headers[0], "document_id");
    assert_eq!(&headers[6], "dimension");

    let decisions: Vec<String> = reader
        .records()
        .map(|record| record.expect("row")[4].to_string())
        .collect();
    assert_eq!(decisions.len(), 14);
    assert!(decisions[..7].iter().all(|value| value == "auto_approve"));
    assert!(decisions[7..].iter().all(|value| value == "full_review"));
}

#[test]
fn document_request_accepts_partial_json() {
    let service = service();
    let request: doc_confidence::DocumentRequest = serde_json::from_str(
        r#"{
            "document_id": "INV-3001",
            "input": {
                "extraction": {"confidence": 88.0, "method": "gpt_vision"},
                "config_source": "COMPANY"
            }
        }"#,
    )
    .expect("request parses");

    let processed = service.process(request).expect("document processes");
    assert_eq!(processed.confidence.config_source_bonus, 3.0);
    assert_eq!(processed.confidence.warnings.len(), 5);
}
