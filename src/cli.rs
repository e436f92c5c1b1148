use crate::commands::{run_history, run_policy_show, run_policy_validate, run_score};
use crate::commands::{HistoryArgs, PolicyValidateArgs, ScoreArgs};
use crate::demo::run_demo;
use clap::{Parser, Subcommand};
use doc_confidence::config::AppConfig;
use doc_confidence::error::AppError;
use doc_confidence::telemetry;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "doc-confidence",
    about = "Score extracted documents and route them to auto-approval or human review",
    version
)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Score and route one document request read from a JSON file
    Score(ScoreArgs),
    /// Inspect or validate confidence policies
    Policy {
        #[command(subcommand)]
        command: PolicyCommand,
    },
    /// Aggregate historical accuracy from an exported outcome CSV
    History(HistoryArgs),
    /// Run the reference scenarios against the active policy
    Demo,
}

#[derive(Subcommand, Debug)]
pub(crate) enum PolicyCommand {
    /// Print the active policy as JSON
    Show,
    /// Validate a policy document without activating it
    Validate(PolicyValidateArgs),
}

pub(crate) fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    info!(
        ?config.environment,
        policy_path = ?config.policy.path,
        history_window_days = config.policy.history_window_days,
        "doc-confidence starting"
    );

    match cli.command {
        Command::Score(args) => run_score(&config, args),
        Command::Policy {
            command: PolicyCommand::Show,
        } => run_policy_show(&config),
        Command::Policy {
            command: PolicyCommand::Validate(args),
        } => run_policy_validate(args),
        Command::History(args) => run_history(&config, args),
        Command::Demo => run_demo(&config),
    }
}
