use std::env;
use std::fmt;
use std::path::PathBuf;

use crate::policy::{ConfidencePolicy, PolicyDocument, PolicyError};
use crate::service::DEFAULT_HISTORY_WINDOW_DAYS;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub policy: PolicyConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let path = env::var("CONFIDENCE_POLICY_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        let history_window_days = match env::var("CONFIDENCE_HISTORY_WINDOW_DAYS") {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|days| *days > 0)
                .ok_or(ConfigError::InvalidHistoryWindow { value: raw })?,
            Err(_) => DEFAULT_HISTORY_WINDOW_DAYS as u32,
        };

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            policy: PolicyConfig {
                path,
                history_window_days,
            },
            telemetry: TelemetryConfig { log_level },
        })
    }
}

/// Where the active policy comes from and how far back outcome history reaches.
#[derive(Debug, Clone)]
pub struct PolicyConfig {
    pub path: Option<PathBuf>,
    pub history_window_days: u32,
}

impl PolicyConfig {
    /// Read and validate the configured policy document, or fall back to the defaults.
    pub fn load_policy(&self) -> Result<ConfidencePolicy, PolicyError> {
        match &self.path {
            Some(path) => ConfidencePolicy::from_document(PolicyDocument::from_path(path)?),
            None => Ok(ConfidencePolicy::default()),
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidHistoryWindow { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidHistoryWindow { value } => write!(
                f,
                "CONFIDENCE_HISTORY_WINDOW_DAYS must be a positive whole number of days (found '{value}')"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
