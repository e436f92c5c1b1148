//! Flat CSV export of processed documents for compliance review.

use std::io::Write;

use serde::Serialize;

use crate::service::ProcessedDocument;

#[derive(Debug, Serialize)]
struct AuditRow<'a> {
    document_id: &'a str,
    result_id: &'a str,
    overall_score: f64,
    level: &'static str,
    decision: &'static str,
    config_source: &'static str,
    dimension: &'static str,
    raw_score: f64,
    weight: f64,
    weighted_score: f64,
    source: &'a str,
    details: &'a str,
    warnings: String,
}

/// Write one row per document and dimension. Returns the number of data rows written.
pub fn write_audit_csv<W: Write>(
    writer: W,
    entries: &[ProcessedDocument],
) -> Result<usize, csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    let mut rows = 0;

    for entry in entries {
        let confidence = &entry.confidence;
        let warnings = confidence.warnings.join("; ");

        for score in &confidence.dimensions {
            csv_writer.serialize(AuditRow {
                document_id: &entry.document_id,
                result_id: &confidence.id.0,
                overall_score: confidence.overall_score,
                level: confidence.level.label(),
                decision: entry.routing.decision.label(),
                config_source: confidence.config_source.label(),
                dimension: score.dimension.label(),
                raw_score: score.raw_score,
                weight: score.weight,
                weighted_score: score.weighted_score,
                source: &score.source,
                details: score.details.as_deref().unwrap_or_default(),
                warnings: warnings.clone(),
            })?;
            rows += 1;
        }
    }

    csv_writer.flush()?;
    Ok(rows)
}
