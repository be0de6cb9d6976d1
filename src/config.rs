//! Configuration System
//!
//! Layered configuration (defaults, global file, `--config` file, environment) for the
//! store, the generative backend, retry behavior and the run itself. Tests included.

use crate::context::ContextSources;
use crate::daily::RerunPolicy;
use crate::error::DraftError;
use crate::generation::diversity::DEFAULT_SIMILARITY_THRESHOLD;
use crate::generation::parse::DEFAULT_MIN_FILLED_FIELDS;
use crate::generation::prompt::{DEFAULT_BRIEF, DEFAULT_PROMPT_CHAR_LIMIT};
use crate::generation::RetryPolicy;
use crate::logging::LoggingConfig;
use crate::provider::catalog::{
    DEFAULT_ALLOW_PATTERN, DEFAULT_DENY_PATTERNS, DEFAULT_EXTRA_MODEL_CAP, DEFAULT_PREFERRED_MODELS,
};
use crate::provider::{GenerationOptions, ModelCatalog, OutputFormat};
use crate::run::RunSettings;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::Duration;

mod facade;
mod merge;
pub mod paths;
mod sources;

pub use facade::ConfigLoader;
pub use sources::env::{ENV_PREFIX, LEGACY_VARS};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DraftConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub run: RunConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Spreadsheet store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub spreadsheet_id: Option<String>,
    /// OAuth bearer token for the Sheets API
    pub access_token: Option<String>,
    pub calendar_sheet: String,
    pub swipe_sheet: String,
    pub performance_sheet: String,
    /// Trailing rows read from each sheet
    pub context_rows: usize,
    pub base_url: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: None,
            access_token: None,
            calendar_sheet: "calendar".to_string(),
            swipe_sheet: "swipe_file".to_string(),
            performance_sheet: "performance".to_string(),
            context_rows: 30,
            base_url: None,
            request_timeout_secs: 30,
        }
    }
}

/// Generative backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub preferred_models: Vec<String>,
    pub allow_pattern: String,
    pub deny_patterns: Vec<String>,
    /// Non-preferred models tried after the preference list
    pub extra_model_cap: usize,
    pub attempts_per_model: u32,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub output_format: OutputFormat,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            preferred_models: DEFAULT_PREFERRED_MODELS.iter().map(|s| s.to_string()).collect(),
            allow_pattern: DEFAULT_ALLOW_PATTERN.to_string(),
            deny_patterns: DEFAULT_DENY_PATTERNS.iter().map(|s| s.to_string()).collect(),
            extra_model_cap: DEFAULT_EXTRA_MODEL_CAP,
            attempts_per_model: 2,
            request_timeout_secs: 90,
            connect_timeout_secs: 10,
            temperature: 0.75,
            max_output_tokens: 1500,
            output_format: OutputFormat::Kv,
        }
    }
}

/// Backoff settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter_ratio: f64,
    pub max_retry_after_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 2_000,
            max_delay_ms: 30_000,
            jitter_ratio: 0.35,
            max_retry_after_secs: 60,
        }
    }
}

/// Per-run settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub objective: String,
    pub slots: usize,
    pub similarity_threshold: f64,
    pub min_filled_fields: usize,
    pub prompt_char_limit: usize,
    pub rerun_policy: RerunPolicy,
    pub brief: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            objective: "balanced".to_string(),
            slots: 3,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            min_filled_fields: DEFAULT_MIN_FILLED_FIELDS,
            prompt_char_limit: DEFAULT_PROMPT_CHAR_LIMIT,
            rerun_policy: RerunPolicy::Skip,
            brief: DEFAULT_BRIEF.to_string(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Store(String),
    Backend(String),
    Retry(String),
    Run(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Store(msg) => write!(f, "store: {}", msg),
            ValidationError::Backend(msg) => write!(f, "backend: {}", msg),
            ValidationError::Retry(msg) => write!(f, "retry: {}", msg),
            ValidationError::Run(msg) => write!(f, "run: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Fold validation errors into one config error.
pub fn into_config_error(errors: Vec<ValidationError>) -> DraftError {
    let joined = errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    DraftError::ConfigError(joined)
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

impl DraftConfig {
    /// Trim and lowercase free-form values.
    pub fn normalized(mut self) -> Self {
        self.run.objective = self.run.objective.trim().to_lowercase();
        if self.run.objective.is_empty() {
            self.run.objective = RunConfig::default().objective;
        }
        self
    }

    /// Store identifier and token present.
    pub fn validate_store(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if is_blank(&self.store.spreadsheet_id) {
            errors.push(ValidationError::Store(
                "spreadsheet_id is required (GSHEETS_SPREADSHEET_ID)".to_string(),
            ));
        }
        if is_blank(&self.store.access_token) {
            errors.push(ValidationError::Store(
                "access_token is required (GOOGLE_OAUTH_ACCESS_TOKEN)".to_string(),
            ));
        }
        if self.store.context_rows == 0 {
            errors.push(ValidationError::Store("context_rows must be at least 1".to_string()));
        }
        errors
    }

    /// API key present and model filters compile.
    pub fn validate_backend(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if is_blank(&self.backend.api_key) {
            errors.push(ValidationError::Backend(
                "api_key is required (GEMINI_API_KEY)".to_string(),
            ));
        }
        if self.backend.attempts_per_model == 0 {
            errors.push(ValidationError::Backend(
                "attempts_per_model must be at least 1".to_string(),
            ));
        }
        for pattern in std::iter::once(&self.backend.allow_pattern).chain(&self.backend.deny_patterns) {
            if let Err(e) = Regex::new(pattern) {
                errors.push(ValidationError::Backend(format!(
                    "invalid model pattern '{}': {}",
                    pattern, e
                )));
            }
        }
        errors
    }

    fn validate_tuning(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if !(0.0..=1.0).contains(&self.retry.jitter_ratio) {
            errors.push(ValidationError::Retry("jitter_ratio must be within [0, 1]".to_string()));
        }
        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            errors.push(ValidationError::Retry(
                "base_delay_ms must not exceed max_delay_ms".to_string(),
            ));
        }
        if self.run.slots == 0 {
            errors.push(ValidationError::Run("slots must be at least 1".to_string()));
        }
        let threshold = self.run.similarity_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            errors.push(ValidationError::Run(
                "similarity_threshold must be within (0, 1]".to_string(),
            ));
        }
        if self.run.min_filled_fields > 10 {
            errors.push(ValidationError::Run(
                "min_filled_fields cannot exceed the 10 record fields".to_string(),
            ));
        }
        errors
    }

    /// Everything a generation run needs.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = self.validate_store();
        errors.extend(self.validate_backend());
        errors.extend(self.validate_tuning());
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts_per_model: self.backend.attempts_per_model,
            base_delay: Duration::from_millis(self.retry.base_delay_ms),
            max_delay: Duration::from_millis(self.retry.max_delay_ms),
            jitter_ratio: self.retry.jitter_ratio,
            max_retry_after: Duration::from_secs(self.retry.max_retry_after_secs),
        }
    }

    pub fn generation_options(&self) -> GenerationOptions {
        GenerationOptions {
            temperature: self.backend.temperature,
            max_output_tokens: self.backend.max_output_tokens,
            output_format: self.backend.output_format,
        }
    }

    pub fn model_catalog(&self) -> Result<ModelCatalog, DraftError> {
        ModelCatalog::new(
            self.backend.preferred_models.clone(),
            &self.backend.allow_pattern,
            &self.backend.deny_patterns,
            self.backend.extra_model_cap,
        )
    }

    pub fn context_sources(&self) -> ContextSources {
        ContextSources {
            store_id: self.store.spreadsheet_id.clone().unwrap_or_default(),
            calendar_sheet: self.store.calendar_sheet.clone(),
            swipe_sheet: self.store.swipe_sheet.clone(),
            performance_sheet: self.store.performance_sheet.clone(),
            rows: self.store.context_rows,
        }
    }

    pub fn run_settings(&self) -> RunSettings {
        RunSettings {
            sources: self.context_sources(),
            objective: self.run.objective.clone(),
            brief: self.run.brief.clone(),
            slots: self.run.slots,
            similarity_threshold: self.run.similarity_threshold,
            min_filled_fields: self.run.min_filled_fields,
            prompt_char_limit: self.run.prompt_char_limit,
            rerun_policy: self.run.rerun_policy,
        }
    }
}
