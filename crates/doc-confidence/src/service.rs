use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::outcomes::{
    CompanyId, FinalOutcome, OutcomeRecord, OutcomeStore, OutcomeTracker, TrackerError,
};
use crate::policy::{ConfidencePolicy, PolicyDocument, PolicyError, PolicyHandle};
use crate::routing::{RoutingDecider, RoutingResult};
use crate::scoring::{ConfidenceCalculationInput, ConfidenceEngine, ConfidenceResult, ResultId};

pub const DEFAULT_HISTORY_WINDOW_DAYS: i64 = 90;

/// One document handed over by the extraction pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRequest {
    pub document_id: String,
    #[serde(default)]
    pub company_id: Option<CompanyId>,
    #[serde(default)]
    pub field_names: Vec<String>,
    #[serde(default)]
    pub input: ConfidenceCalculationInput,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedDocument {
    pub document_id: String,
    pub confidence: ConfidenceResult,
    pub routing: RoutingResult,
}

/// Service composing the active policy, the scoring engine, routing, and outcome feedback.
pub struct DocumentRoutingService<S> {
    policy: PolicyHandle,
    tracker: OutcomeTracker<S>,
    history_window: Duration,
}

impl<S> DocumentRoutingService<S>
where
    S: OutcomeStore + 'static,
{
    pub fn new(store: Arc<S>, policy: ConfidencePolicy) -> Self {
        Self {
            policy: PolicyHandle::new(policy),
            tracker: OutcomeTracker::new(store),
            history_window: Duration::days(DEFAULT_HISTORY_WINDOW_DAYS),
        }
    }

    pub fn with_history_window(mut self, days: u32) -> Self {
        self.history_window = Duration::days(i64::from(days));
        self
    }

    pub fn policy(&self) -> Arc<ConfidencePolicy> {
        self.policy.snapshot()
    }

    pub fn tracker(&self) -> &OutcomeTracker<S> {
        &self.tracker
    }

    pub fn process(
        &self,
        request: DocumentRequest,
    ) -> Result<ProcessedDocument, RoutingServiceError> {
        self.process_at(request, Utc::now())
    }

    /// Score, route, and register one document as of `now`.
    ///
    /// The policy snapshot is taken once, so a concurrent swap never mixes tables within a
    /// single calculation.
    pub fn process_at(
        &self,
        request: DocumentRequest,
        now: DateTime<Utc>,
    ) -> Result<ProcessedDocument, RoutingServiceError> {
        let DocumentRequest {
            document_id,
            company_id,
            field_names,
            mut input,
        } = request;

        if input.historical.is_none() {
            if let Some(company) = company_id.as_ref().filter(|_| !field_names.is_empty()) {
                let since = now
                    .checked_sub_signed(self.history_window)
                    .unwrap_or(DateTime::<Utc>::MIN_UTC);
                let history = self
                    .tracker
                    .compute_for_fields(company, &field_names, since)?;
                debug!(
                    %document_id,
                    company_id = %company,
                    total_processed = history.total_processed,
                    "historical accuracy filled from outcomes"
                );
                input.historical = Some(history);
            }
        }

        let policy = self.policy.snapshot();
        let engine = ConfidenceEngine::new(Arc::clone(&policy));
        let confidence = engine.calculate_at(ResultId::generate(), &input, now);
        let routing = RoutingDecider::new(&policy).decide_at(&confidence, now);

        if let Some(company) = company_id {
            self.tracker.register(&confidence, company, field_names)?;
        }

        info!(
            %document_id,
            result_id = %confidence.id,
            score = confidence.overall_score,
            level = confidence.level.label(),
            decision = routing.decision.label(),
            "document processed"
        );

        Ok(ProcessedDocument {
            document_id,
            confidence,
            routing,
        })
    }

    /// Record the reviewer's verdict for a previously processed document.
    pub fn confirm(
        &self,
        result_id: &ResultId,
        outcome: FinalOutcome,
    ) -> Result<OutcomeRecord, RoutingServiceError> {
        Ok(self.tracker.record(result_id, outcome)?)
    }

    /// Validate and activate a new policy; in-flight calculations keep their snapshot.
    pub fn replace_policy(
        &self,
        document: PolicyDocument,
    ) -> Result<Arc<ConfidencePolicy>, RoutingServiceError> {
        Ok(self.policy.load(document)?)
    }
}

/// Error raised by the routing service.
#[derive(Debug, thiserror::Error)]
pub enum RoutingServiceError {
    #[error(transparent)]
    Policy(#[from] PolicyError),
    #[error(transparent)]
    Tracker(#[from] TrackerError),
}
