use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use clap::Args;
use doc_confidence::audit::write_audit_csv;
use doc_confidence::config::AppConfig;
use doc_confidence::error::AppError;
use doc_confidence::outcomes::import::parse_outcome_csv_path;
use doc_confidence::scoring::HistoricalAccuracy;
use doc_confidence::{
    CompanyId, ConfidencePolicy, DocumentRequest, DocumentRoutingService, InMemoryOutcomeStore,
    OutcomeTracker, PolicyDocument,
};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// JSON document request, or an array of them
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Policy document overriding CONFIDENCE_POLICY_PATH
    #[arg(long)]
    pub(crate) policy: Option<PathBuf>,
    /// Also write a per-dimension audit CSV to this path
    #[arg(long)]
    pub(crate) audit_csv: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct PolicyValidateArgs {
    /// Policy document to validate
    #[arg(long)]
    pub(crate) policy: PathBuf,
}

#[derive(Args, Debug)]
pub(crate) struct HistoryArgs {
    /// Outcome export (result_id, company_id, fields, outcome, recorded_at)
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// Issuing company to aggregate
    #[arg(long)]
    pub(crate) company: String,
    /// Field name to aggregate; repeat to sum several fields
    #[arg(long, required = true)]
    pub(crate) field: Vec<String>,
    /// Earliest outcome date (YYYY-MM-DD). Defaults to the configured history window.
    #[arg(long, value_parser = parse_date)]
    pub(crate) since: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ScoreRequests {
    Batch(Vec<DocumentRequest>),
    Single(DocumentRequest),
}

#[derive(Debug, Serialize)]
struct HistoryReport<'a> {
    company_id: &'a str,
    fields: &'a [String],
    since: NaiveDate,
    history: HistoricalAccuracy,
    sufficient_sample: bool,
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn active_policy(
    config: &AppConfig,
    override_path: Option<PathBuf>,
) -> Result<ConfidencePolicy, AppError> {
    let policy = match override_path {
        Some(path) => ConfidencePolicy::from_document(PolicyDocument::from_path(path)?)?,
        None => config.policy.load_policy()?,
    };
    Ok(policy)
}

pub(crate) fn run_score(config: &AppConfig, args: ScoreArgs) -> Result<(), AppError> {
    let ScoreArgs {
        input,
        policy,
        audit_csv,
    } = args;

    let policy = active_policy(config, policy)?;
    let service = DocumentRoutingService::new(Arc::new(InMemoryOutcomeStore::default()), policy)
        .with_history_window(config.policy.history_window_days);

    let requests = match serde_json::from_reader(File::open(&input)?)? {
        ScoreRequests::Batch(requests) => requests,
        ScoreRequests::Single(request) => vec![request],
    };

    let mut processed = Vec::with_capacity(requests.len());
    for request in requests {
        processed.push(service.process(request)?);
    }

    if let Some(path) = audit_csv {
        let rows = write_audit_csv(File::create(&path)?, &processed)?;
        info!(rows, path = %path.display(), "audit export written");
    }

    let rendered = if processed.len() == 1 {
        serde_json::to_string_pretty(&processed[0])?
    } else {
        serde_json::to_string_pretty(&processed)?
    };
    println!("{rendered}");
    Ok(())
}

pub(crate) fn run_policy_show(config: &AppConfig) -> Result<(), AppError> {
    let policy = config.policy.load_policy()?;
    println!("{}", serde_json::to_string_pretty(&policy.to_document())?);
    Ok(())
}

pub(crate) fn run_policy_validate(args: PolicyValidateArgs) -> Result<(), AppError> {
    let document = PolicyDocument::from_path(&args.policy)?;
    let policy = ConfidencePolicy::from_document(document)?;
    let thresholds = policy.thresholds();
    println!(
        "{}: valid (auto-approve >= {:.1}, quick review >= {:.1})",
        args.policy.display(),
        thresholds.auto_approve,
        thresholds.quick_review
    );
    Ok(())
}

pub(crate) fn run_history(config: &AppConfig, args: HistoryArgs) -> Result<(), AppError> {
    let HistoryArgs {
        csv,
        company,
        field,
        since,
    } = args;

    let records = parse_outcome_csv_path(&csv)?;
    let tracker = OutcomeTracker::new(Arc::new(InMemoryOutcomeStore::default()));
    tracker.backfill(records)?;

    let since = since
        .unwrap_or_else(|| window_start(Utc::now(), config.policy.history_window_days));
    let since_start = since.and_time(NaiveTime::MIN).and_utc();

    let history =
        tracker.compute_for_fields(&CompanyId(company.clone()), &field, since_start)?;
    let minimum = config.policy.load_policy()?.min_historical_sample();

    let report = HistoryReport {
        company_id: &company,
        fields: &field,
        since,
        sufficient_sample: history.total_processed >= minimum && history.total_processed > 0,
        history,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// First day of a history window of `days` ending at `now`, saturating at the earliest date.
fn window_start(now: DateTime<Utc>, days: u32) -> NaiveDate {
    now.checked_sub_signed(Duration::days(i64::from(days)))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
        .date_naive()
}
