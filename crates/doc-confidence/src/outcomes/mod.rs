//! Outcome feedback loop.
//!
//! Reviewers confirm or correct routed documents; the tracker appends those outcomes and folds
//! them into per-company, per-field historical accuracy for later calculations.

pub mod import;
mod store;

pub use store::{
    CompanyId, FinalOutcome, InMemoryOutcomeStore, OutcomeRecord, OutcomeStore, ResultContext,
    StoreError,
};

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::scoring::{ConfidenceResult, HistoricalAccuracy, ResultId};

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("no confidence result registered under {0}")]
    UnknownResult(ResultId),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Appends outcome records and aggregates them into historical accuracy.
pub struct OutcomeTracker<S> {
    store: Arc<S>,
}

impl<S> Clone for OutcomeTracker<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> OutcomeTracker<S>
where
    S: OutcomeStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Remember which company and fields a result scored so later outcomes can be keyed.
    pub fn register(
        &self,
        result: &ConfidenceResult,
        company_id: CompanyId,
        field_names: Vec<String>,
    ) -> Result<(), TrackerError> {
        self.store.register(ResultContext {
            result_id: result.id.clone(),
            company_id,
            field_names,
            calculated_at: result.calculated_at,
        })?;
        Ok(())
    }

    pub fn record(
        &self,
        result_id: &ResultId,
        final_outcome: FinalOutcome,
    ) -> Result<OutcomeRecord, TrackerError> {
        self.record_at(result_id, final_outcome, Utc::now())
    }

    pub fn record_at(
        &self,
        result_id: &ResultId,
        final_outcome: FinalOutcome,
        recorded_at: DateTime<Utc>,
    ) -> Result<OutcomeRecord, TrackerError> {
        let context = self
            .store
            .context(result_id)?
            .ok_or_else(|| TrackerError::UnknownResult(result_id.clone()))?;

        let record = OutcomeRecord {
            result_id: context.result_id,
            company_id: context.company_id,
            field_names: context.field_names,
            final_outcome,
            recorded_at,
        };
        self.store.append(record.clone())?;

        info!(
            result_id = %record.result_id,
            company_id = %record.company_id,
            outcome = final_outcome.label(),
            "outcome recorded"
        );
        Ok(record)
    }

    /// Append records imported from an external source as-is.
    pub fn backfill<I>(&self, records: I) -> Result<usize, TrackerError>
    where
        I: IntoIterator<Item = OutcomeRecord>,
    {
        let mut appended = 0;
        for record in records {
            self.store.append(record)?;
            appended += 1;
        }
        info!(appended, "outcome records backfilled");
        Ok(appended)
    }

    /// Aggregate outcomes for one company and field recorded at or after `since`.
    ///
    /// The most recent record per result wins; UNKNOWN outcomes are left out of the totals and
    /// PARTIAL outcomes count as processed with half credit toward `average_accuracy`.
    pub fn compute_historical_accuracy(
        &self,
        company_id: &CompanyId,
        field_name: &str,
        since: DateTime<Utc>,
    ) -> Result<HistoricalAccuracy, TrackerError> {
        let records = self.store.records_for_company(company_id, since)?;
        Ok(aggregate(
            records.iter().filter(|record| record.covers_field(field_name)),
        ))
    }

    /// Aggregate over every result that covered at least one of `field_names`.
    ///
    /// A result spanning several of the requested fields is counted once, so the sample size
    /// is the number of distinct reviewed documents.
    pub fn compute_for_fields(
        &self,
        company_id: &CompanyId,
        field_names: &[String],
        since: DateTime<Utc>,
    ) -> Result<HistoricalAccuracy, TrackerError> {
        let records = self.store.records_for_company(company_id, since)?;
        Ok(aggregate(records.iter().filter(|record| {
            field_names.iter().any(|field| record.covers_field(field))
        })))
    }
}

fn aggregate<'a, I>(records: I) -> HistoricalAccuracy
where
    I: Iterator<Item = &'a OutcomeRecord>,
{
    let mut latest: BTreeMap<&ResultId, &OutcomeRecord> = BTreeMap::new();
    for record in records {
        match latest.get(&record.result_id) {
            Some(existing) if existing.recorded_at > record.recorded_at => {}
            _ => {
                latest.insert(&record.result_id, record);
            }
        }
    }

    let mut total_processed = 0u64;
    let mut successfully_mapped = 0u64;
    let mut credit = 0.0;
    for record in latest.values() {
        match record.final_outcome {
            FinalOutcome::Correct => {
                total_processed += 1;
                successfully_mapped += 1;
                credit += 1.0;
            }
            FinalOutcome::Partial => {
                total_processed += 1;
                credit += 0.5;
            }
            FinalOutcome::Incorrect => total_processed += 1,
            FinalOutcome::Unknown => {}
        }
    }

    HistoricalAccuracy {
        total_processed,
        successfully_mapped,
        average_accuracy: (total_processed > 0)
            .then(|| credit / total_processed as f64 * 100.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{ConfidenceCalculationInput, ConfidenceEngine};
    use chrono::{Duration, TimeZone};

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, 9, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn record(id: &str, fields: &[&str], outcome: FinalOutcome, day: u32) -> OutcomeRecord {
        OutcomeRecord {
            result_id: ResultId(id.to_string()),
            company_id: CompanyId("DHL".to_string()),
            field_names: fields.iter().map(|field| field.to_string()).collect(),
            final_outcome: outcome,
            recorded_at: at(day),
        }
    }

    fn tracker() -> OutcomeTracker<InMemoryOutcomeStore> {
        OutcomeTracker::new(Arc::new(InMemoryOutcomeStore::default()))
    }

    #[test]
    fn record_requires_registered_result() {
        let tracker = tracker();
        match tracker.record(&ResultId("cr-missing".to_string()), FinalOutcome::Correct) {
            Err(TrackerError::UnknownResult(id)) => assert_eq!(id.0, "cr-missing"),
            other => panic!("expected unknown result, got {other:?}"),
        }
    }

    #[test]
    fn record_appends_with_registered_context() {
        let tracker = tracker();
        let result = ConfidenceEngine::default().calculate(&ConfidenceCalculationInput::default());
        tracker
            .register(
                &result,
                CompanyId("MAERSK".to_string()),
                vec!["invoice_number".to_string()],
            )
            .expect("register");

        tracker
            .record(&result.id, FinalOutcome::Incorrect)
            .expect("first outcome");
        tracker
            .record(&result.id, FinalOutcome::Correct)
            .expect("correction");

        let stored = tracker.store().records().expect("records");
        assert_eq!(stored.len(), 2, "records are appended, never overwritten");
        assert_eq!(stored[0].final_outcome, FinalOutcome::Incorrect);
        assert_eq!(stored[1].company_id.0, "MAERSK");
    }

    #[test]
    fn registering_twice_is_a_conflict() {
        let tracker = tracker();
        let result = ConfidenceEngine::default().calculate(&ConfidenceCalculationInput::default());
        let company = CompanyId("DHL".to_string());
        tracker
            .register(&result, company.clone(), Vec::new())
            .expect("first registration");
        assert!(matches!(
            tracker.register(&result, company, Vec::new()),
            Err(TrackerError::Store(StoreError::Conflict(_)))
        ));
    }

    #[test]
    fn aggregation_uses_latest_record_per_result() {
        let tracker = tracker();
        tracker
            .backfill(vec![
                record("r1", &["total"], FinalOutcome::Incorrect, 1),
                record("r1", &["total"], FinalOutcome::Correct, 2),
                record("r2", &["total"], FinalOutcome::Correct, 3),
                record("r3", &["total"], FinalOutcome::Partial, 3),
                record("r4", &["total"], FinalOutcome::Unknown, 4),
                record("r5", &["vendor"], FinalOutcome::Incorrect, 4),
            ])
            .expect("backfill");

        let history = tracker
            .compute_historical_accuracy(&CompanyId("DHL".to_string()), "total", at(1))
            .expect("aggregate");

        assert_eq!(history.total_processed, 3);
        assert_eq!(history.successfully_mapped, 2);
        let average = history.average_accuracy.expect("average present");
        assert!((average - 250.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn aggregation_respects_since_and_company() {
        let tracker = tracker();
        let mut other_company = record("r9", &["total"], FinalOutcome::Correct, 5);
        other_company.company_id = CompanyId("FEDEX".to_string());
        tracker
            .backfill(vec![
                record("r1", &["total"], FinalOutcome::Correct, 1),
                record("r2", &["total"], FinalOutcome::Correct, 5),
                other_company,
            ])
            .expect("backfill");

        let history = tracker
            .compute_historical_accuracy(
                &CompanyId("DHL".to_string()),
                "total",
                at(1) + Duration::days(2),
            )
            .expect("aggregate");

        assert_eq!(history.total_processed, 1);
        assert_eq!(history.successfully_mapped, 1);
    }

    #[test]
    fn empty_history_has_no_average() {
        let history = tracker()
            .compute_historical_accuracy(&CompanyId("DHL".to_string()), "total", at(1))
            .expect("aggregate");
        assert_eq!(history, HistoricalAccuracy::default());
    }

    #[test]
    fn multi_field_aggregate_counts_each_result_once() {
        let tracker = tracker();
        tracker
            .backfill(vec![
                record("r1", &["total", "vendor"], FinalOutcome::Correct, 1),
                record("r2", &["vendor"], FinalOutcome::Incorrect, 2),
                record("r3", &["currency"], FinalOutcome::Correct, 2),
            ])
            .expect("backfill");

        let history = tracker
            .compute_for_fields(
                &CompanyId("DHL".to_string()),
                &["total".to_string(), "vendor".to_string()],
                at(1),
            )
            .expect("aggregate");

        assert_eq!(history.total_processed, 2);
        assert_eq!(history.successfully_mapped, 1);
    }
}
