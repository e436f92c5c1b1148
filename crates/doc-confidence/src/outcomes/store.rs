use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scoring::ResultId;

/// Identifier wrapper for the issuing company (forwarder) a document belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CompanyId(pub String);

impl std::fmt::Display for CompanyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Human-confirmed correctness of a routed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinalOutcome {
    Correct,
    Incorrect,
    Partial,
    Unknown,
}

impl FinalOutcome {
    pub const fn label(self) -> &'static str {
        match self {
            FinalOutcome::Correct => "correct",
            FinalOutcome::Incorrect => "incorrect",
            FinalOutcome::Partial => "partial",
            FinalOutcome::Unknown => "unknown",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "correct" => Some(FinalOutcome::Correct),
            "incorrect" => Some(FinalOutcome::Incorrect),
            "partial" => Some(FinalOutcome::Partial),
            "unknown" => Some(FinalOutcome::Unknown),
            _ => None,
        }
    }
}

/// What a confidence result was computed for, captured when it is produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultContext {
    pub result_id: ResultId,
    pub company_id: CompanyId,
    pub field_names: Vec<String>,
    pub calculated_at: DateTime<Utc>,
}

/// Append-only feedback entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub result_id: ResultId,
    pub company_id: CompanyId,
    pub field_names: Vec<String>,
    pub final_outcome: FinalOutcome,
    pub recorded_at: DateTime<Utc>,
}

impl OutcomeRecord {
    pub fn covers_field(&self, field_name: &str) -> bool {
        self.field_names.iter().any(|field| field == field_name)
    }
}

/// Storage abstraction for outcome feedback so the tracker can be exercised in isolation.
///
/// Implementations must never rewrite or drop appended records.
pub trait OutcomeStore: Send + Sync {
    fn register(&self, context: ResultContext) -> Result<(), StoreError>;
    fn context(&self, id: &ResultId) -> Result<Option<ResultContext>, StoreError>;
    fn append(&self, record: OutcomeRecord) -> Result<(), StoreError>;
    fn records_for_company(
        &self,
        company_id: &CompanyId,
        since: DateTime<Utc>,
    ) -> Result<Vec<OutcomeRecord>, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("result {0} is already registered")]
    Conflict(ResultId),
    #[error("outcome store unavailable: {0}")]
    Unavailable(String),
}

/// Process-local store used by the command line and tests.
#[derive(Debug, Default, Clone)]
pub struct InMemoryOutcomeStore {
    contexts: Arc<Mutex<HashMap<ResultId, ResultContext>>>,
    records: Arc<Mutex<Vec<OutcomeRecord>>>,
}

impl InMemoryOutcomeStore {
    pub fn records(&self) -> Result<Vec<OutcomeRecord>, StoreError> {
        Ok(self.records.lock().map_err(poisoned)?.clone())
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> StoreError {
    StoreError::Unavailable("outcome store lock poisoned".to_string())
}

impl OutcomeStore for InMemoryOutcomeStore {
    fn register(&self, context: ResultContext) -> Result<(), StoreError> {
        let mut guard = self.contexts.lock().map_err(poisoned)?;
        if guard.contains_key(&context.result_id) {
            return Err(StoreError::Conflict(context.result_id));
        }
        guard.insert(context.result_id.clone(), context);
        Ok(())
    }

    fn context(&self, id: &ResultId) -> Result<Option<ResultContext>, StoreError> {
        let guard = self.contexts.lock().map_err(poisoned)?;
        Ok(guard.get(id).cloned())
    }

    fn append(&self, record: OutcomeRecord) -> Result<(), StoreError> {
        self.records.lock().map_err(poisoned)?.push(record);
        Ok(())
    }

    fn records_for_company(
        &self,
        company_id: &CompanyId,
        since: DateTime<Utc>,
    ) -> Result<Vec<OutcomeRecord>, StoreError> {
        let guard = self.records.lock().map_err(poisoned)?;
        Ok(guard
            .iter()
            .filter(|record| &record.company_id == company_id && record.recorded_at >= since)
            .cloned()
            .collect())
    }
}
