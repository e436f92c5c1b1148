//! CSV backfill of reviewer outcomes exported from the review queue.
//!
//! Expected columns: `result_id`, `company_id`, `fields` (pipe separated), `outcome`, and
//! `recorded_at` (RFC 3339 or `YYYY-MM-DD`).

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};

use super::{CompanyId, FinalOutcome, OutcomeRecord};
use crate::scoring::ResultId;

#[derive(Debug, thiserror::Error)]
pub enum OutcomeImportError {
    #[error("failed to read outcome export: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed outcome export: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: unrecognised outcome '{value}'")]
    Outcome { row: usize, value: String },
    #[error("row {row}: unparseable timestamp '{value}'")]
    Timestamp { row: usize, value: String },
    #[error("row {row}: missing {column}")]
    Missing { row: usize, column: &'static str },
}

pub fn parse_outcome_csv_path(
    path: impl AsRef<Path>,
) -> Result<Vec<OutcomeRecord>, OutcomeImportError> {
    let file = File::open(path)?;
    parse_outcome_csv(file)
}

pub fn parse_outcome_csv<R: Read>(reader: R) -> Result<Vec<OutcomeRecord>, OutcomeImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut records = Vec::new();

    for (index, row) in csv_reader.deserialize::<OutcomeRow>().enumerate() {
        let row = row?;
        // header is line 1
        records.push(row.into_record(index + 2)?);
    }

    Ok(records)
}

#[derive(Debug, Deserialize)]
struct OutcomeRow {
    result_id: String,
    company_id: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    fields: Option<String>,
    outcome: String,
    recorded_at: String,
}

impl OutcomeRow {
    fn into_record(self, row: usize) -> Result<OutcomeRecord, OutcomeImportError> {
        if self.result_id.is_empty() {
            return Err(OutcomeImportError::Missing {
                row,
                column: "result_id",
            });
        }
        if self.company_id.is_empty() {
            return Err(OutcomeImportError::Missing {
                row,
                column: "company_id",
            });
        }

        let final_outcome =
            FinalOutcome::parse(&self.outcome).ok_or_else(|| OutcomeImportError::Outcome {
                row,
                value: self.outcome.clone(),
            })?;
        let recorded_at =
            parse_timestamp(&self.recorded_at).ok_or_else(|| OutcomeImportError::Timestamp {
                row,
                value: self.recorded_at.clone(),
            })?;

        let field_names = self
            .fields
            .as_deref()
            .map(|raw| {
                raw.split('|')
                    .map(str::trim)
                    .filter(|field| !field.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(OutcomeRecord {
            result_id: ResultId(self.result_id),
            company_id: CompanyId(self.company_id),
            field_names,
            final_outcome,
            recorded_at,
        })
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
