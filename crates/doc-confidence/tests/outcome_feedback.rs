//! Reviewer outcomes feeding the historical-accuracy dimension of later documents.

mod common {
    use std::sync::Arc;

    use chrono::{DateTime, TimeZone, Utc};
    use doc_confidence::scoring::{ConfigSource, ExtractionMethod, ExtractionSignal};
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

    pub(super) fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 30, 12, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    pub(super) fn request(document_id: &str, company: &str) -> DocumentRequest {
        DocumentRequest {
            document_id: document_id.to_string(),
            company_id: Some(CompanyId(company.to_string())),
            field_names: vec!["total_amount".to_string()],
            input: ConfidenceCalculationInput {
                extraction: Some(ExtractionSignal::new(
                    90.0,
                    ExtractionMethod::AzureDocumentIntelligence,
                )),
                config_source: Some(ConfigSource::Company),
                ..Default::default()
            },
        }
    }
}

use common::*;
use doc_confidence::outcomes::import::parse_outcome_csv;
use doc_confidence::outcomes::TrackerError;
use doc_confidence::scoring::{Dimension, ResultId};
use doc_confidence::{CompanyId, FinalOutcome, RoutingServiceError};

fn historical_raw(processed: &doc_confidence::ProcessedDocument) -> (f64, String) {
    let score = processed
        .confidence
        .dimension(Dimension::HistoricalAccuracy)
        .expect("historical dimension present");
    (score.raw_score, score.source.clone())
}

#[test]
fn confirmed_outcomes_drive_historical_accuracy() {
    let service = service();

    for index in 0..10 {
        let processed = service
            .process(request(&format!("DOC-{index}"), "DHL"))
            .expect("document processes");
        let outcome = if index == 0 {
            FinalOutcome::Incorrect
        } else {
            FinalOutcome::Correct
        };
        service
            .confirm(&processed.confidence.id, outcome)
            .expect("outcome recorded");
    }

    let next = service
        .process(request("DOC-next", "DHL"))
        .expect("document processes");
    let (raw, source) = historical_raw(&next);
    assert!((raw - 90.0).abs() < 1e-9, "raw historical {raw}");
    assert_eq!(source, "outcome_history");

    let other_company = service
        .process(request("DOC-other", "FEDEX"))
        .expect("document processes");
    let (raw, source) = historical_raw(&other_company);
    assert_eq!(raw, 50.0);
    assert_eq!(source, "neutral_default");
}

#[test]
fn too_few_outcomes_keep_the_neutral_score() {
    let service = service();
    for index in 0..9 {
        let processed = service
            .process(request(&format!("DOC-{index}"), "DHL"))
            .expect("document processes");
        service
            .confirm(&processed.confidence.id, FinalOutcome::Correct)
            .expect("outcome recorded");
    }

    let next = service
        .process(request("DOC-next", "DHL"))
        .expect("document processes");
    assert_eq!(historical_raw(&next).0, 50.0);
    assert!(next
        .confidence
        .warnings
        .iter()
        .any(|warning| warning.contains("insufficient sample size (9 < 10)")));
}

#[test]
fn confirming_an_unknown_result_is_rejected() {
    let service = service();
    match service.confirm(&ResultId("cr-never-issued".to_string()), FinalOutcome::Correct) {
        Err(RoutingServiceError::Tracker(TrackerError::UnknownResult(id))) => {
            assert_eq!(id.0, "cr-never-issued");
        }
        other => panic!("expected unknown result error, got {other:?}"),
    }
}

#[test]
fn backfilled_outcomes_respect_the_history_window() {
    let service = service().with_history_window(30);

    let mut csv = String::from("result_id,company_id,fields,outcome,recorded_at\n");
    for index in 0..12 {
        csv.push_str(&format!("old-{index},DHL,total_amount,incorrect,2025-01-15\n"));
    }
    for index in 0..12 {
        let outcome = if index < 9 { "correct" } else { "partial" };
        csv.push_str(&format!(
            "new-{index},DHL,total_amount|vendor,{outcome},2025-09-20T08:00:00Z\n"
        ));
    }

    let records = parse_outcome_csv(csv.as_bytes()).expect("export parses");
    assert_eq!(
        service.tracker().backfill(records).expect("backfill"),
        24
    );

    let history = service
        .tracker()
        .compute_historical_accuracy(
            &CompanyId("DHL".to_string()),
            "total_amount",
            now() - chrono::Duration::days(30),
        )
        .expect("aggregate");
    assert_eq!(history.total_processed, 12);
    assert_eq!(history.successfully_mapped, 9);
    let average = history.average_accuracy.expect("average present");
    assert!((average - 87.5).abs() < 1e-9);

    let processed = service
        .process_at(request("DOC-window", "DHL"), now())
        .expect("document processes");
    assert!((historical_raw(&processed).0 - 75.0).abs() < 1e-9);
}

#[test]
fn multi_field_documents_count_once_toward_the_sample() {
    let service = service();
    let two_fields = |document_id: &str| {
        let mut req = request(document_id, "DHL");
        req.field_names = vec!["invoice_number".to_string(), "total_amount".to_string()];
        req
    };

    for index in 0..5 {
        let processed = service
            .process(two_fields(&format!("DOC-{index}")))
            .expect("document processes");
        service
            .confirm(&processed.confidence.id, FinalOutcome::Correct)
            .expect("outcome recorded");
    }

    let next = service
        .process(two_fields("DOC-next"))
        .expect("document processes");
    let (raw, source) = historical_raw(&next);
    assert_eq!(raw, 50.0);
    assert_eq!(source, "neutral_default");
    assert!(next
        .confidence
        .warnings
        .iter()
        .any(|warning| warning.contains("insufficient sample size (5 < 10)")));
}
