use crate::commands::active_policy;
use doc_confidence::config::AppConfig;
use doc_confidence::error::AppError;
use doc_confidence::scoring::{
    ConfigSource, ExtractionMethod, ExtractionSignal, FieldCompletenessSignal, FormatSignal,
    HistoricalAccuracy, IdentificationMethod, IssuerSignal, TermMatchingSignal,
};
use doc_confidence::{
    CompanyId, ConfidenceCalculationInput, DocumentRequest, DocumentRoutingService, FinalOutcome,
    InMemoryOutcomeStore, ProcessedDocument,
};
use std::sync::Arc;

pub(crate) fn run_demo(config: &AppConfig) -> Result<(), AppError> {
    let policy = active_policy(config, None)?;
    let service = DocumentRoutingService::new(Arc::new(InMemoryOutcomeStore::default()), policy)
        .with_history_window(config.policy.history_window_days);

    println!("Document confidence routing demo");
    let thresholds = service.policy().thresholds();
    println!(
        "Thresholds: auto-approve >= {:.1} | quick review >= {:.1}",
        thresholds.auto_approve, thresholds.quick_review
    );

    for (title, request) in scenarios() {
        let processed = service.process(request)?;
        render_processed(title, &processed);
    }

    println!("\nOutcome feedback");
    let follow_up = service.process(DocumentRequest {
        document_id: "DEMO-FEEDBACK".to_string(),
        company_id: Some(CompanyId("DHL".to_string())),
        field_names: vec!["total_amount".to_string()],
        input: ConfidenceCalculationInput::default(),
    })?;
    let record = service.confirm(&follow_up.confidence.id, FinalOutcome::Correct)?;
    println!(
        "- {} confirmed {} for {} ({} field(s))",
        record.result_id,
        record.final_outcome.label(),
        record.company_id,
        record.field_names.len()
    );

    Ok(())
}

fn render_processed(title: &str, processed: &ProcessedDocument) {
    let confidence = &processed.confidence;
    let routing = &processed.routing;

    println!("\n{title} [{}]", processed.document_id);
    println!(
        "- score {:.2} (base {:.2} + bonus {:.1} from {} configuration) -> {}",
        confidence.overall_score,
        confidence.base_score,
        confidence.config_source_bonus,
        confidence.config_source.label(),
        confidence.level.label()
    );
    println!(
        "- decision {} | priority {} | ~{:.0} min review",
        routing.decision.label(),
        routing.review_priority,
        routing.estimated_review_minutes
    );
    println!("- reason: {}", routing.reason);
    for score in &confidence.dimensions {
        println!(
            "    {:<22} raw {:>6.2} x {:.2} = {:>6.2} ({})",
            score.dimension.label(),
            score.raw_score,
            score.weight,
            score.weighted_score,
            score.source
        );
    }
    if !confidence.warnings.is_empty() {
        println!("- warnings:");
        for warning in &confidence.warnings {
            println!("    {warning}");
        }
    }
}

fn scenarios() -> Vec<(&'static str, DocumentRequest)> {
    let mut failed_issuer = matched_invoice();
    failed_issuer.issuer = Some(IssuerSignal {
        identified: false,
        confidence: 41.0,
        method: None,
    });

    vec![
        (
            "Fully matched invoice",
            request("DEMO-001", matched_invoice()),
        ),
        (
            "Issuer not identified",
            request("DEMO-002", failed_issuer),
        ),
        (
            "No upstream signals",
            DocumentRequest {
                document_id: "DEMO-003".to_string(),
                company_id: None,
                field_names: Vec::new(),
                input: ConfidenceCalculationInput::default(),
            },
        ),
    ]
}

fn request(document_id: &str, input: ConfidenceCalculationInput) -> DocumentRequest {
    DocumentRequest {
        document_id: document_id.to_string(),
        company_id: Some(CompanyId("DHL".to_string())),
        field_names: vec!["invoice_number".to_string(), "total_amount".to_string()],
        input,
    }
}

fn matched_invoice() -> ConfidenceCalculationInput {
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
            format_id: Some("dhl-express-invoice".to_string()),
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
