//! CLI route: single route table and run context. Builds adapters from config and
//! dispatches to the orchestrator and presentation.

use crate::cli::parse::Commands;
use crate::cli::presentation::{
    format_models_json, format_models_text, format_run_report_json, format_run_report_text,
    format_status_json, format_status_text,
};
use crate::config::{into_config_error, ConfigLoader, DraftConfig};
use crate::daily::{DailyState, RerunPolicy};
use crate::error::DraftError;
use crate::generation::{RequestExecutor, TokioSleeper};
use crate::provider::GeminiClient;
use crate::run::Orchestrator;
use crate::store::{DryRunStore, SheetStore, SheetsStore};
use chrono::Local;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Runtime context for CLI execution: the loaded configuration.
pub struct RunContext {
    config: DraftConfig,
}

impl RunContext {
    /// Load configuration from the layer stack, with `config_path` as the explicit file.
    pub fn new(config_path: Option<PathBuf>) -> Result<Self, DraftError> {
        let config = ConfigLoader::load(config_path.as_deref())?;
        Ok(Self { config })
    }

    pub fn from_config(config: DraftConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DraftConfig {
        &self.config
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, DraftError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| DraftError::ConfigError(format!("Failed to start runtime: {}", e)))?;

        match command {
            Commands::Run {
                objective,
                dry_run,
                rerun,
                format,
            } => {
                let mut config = self.config.clone();
                if let Some(objective) = objective {
                    config.run.objective = objective.clone();
                }
                if *rerun {
                    config.run.rerun_policy = RerunPolicy::Allow;
                }
                let config = config.normalized();
                config.validate().map_err(into_config_error)?;
                runtime.block_on(self.handle_run(&config, *dry_run, format))
            }
            Commands::Models { format } => {
                let errors = self.config.validate_backend();
                if !errors.is_empty() {
                    return Err(into_config_error(errors));
                }
                runtime.block_on(self.handle_models(format))
            }
            Commands::Status { format } => {
                let errors = self.config.validate_store();
                if !errors.is_empty() {
                    return Err(into_config_error(errors));
                }
                runtime.block_on(self.handle_status(format))
            }
        }
    }

    async fn handle_run(
        &self,
        config: &DraftConfig,
        dry_run: bool,
        format: &str,
    ) -> Result<String, DraftError> {
        let sheets: Arc<dyn SheetStore> = Arc::new(build_store(config)?);
        let store: Arc<dyn SheetStore> = if dry_run {
            Arc::new(DryRunStore::new(sheets))
        } else {
            sheets
        };
        let backend = Arc::new(build_backend(config)?);
        let executor = RequestExecutor::new(
            backend.clone(),
            config.retry_policy(),
            config.generation_options(),
            Arc::new(TokioSleeper),
        );
        let orchestrator = Orchestrator::new(
            store,
            backend,
            config.model_catalog()?,
            executor,
            config.run_settings(),
        );

        let report = orchestrator.run().await?;
        info!(outcome = %report.outcome, drafts = report.draft_count(), "Run complete");
        if format == "json" {
            Ok(format_run_report_json(&report, dry_run))
        } else {
            Ok(format_run_report_text(&report, dry_run))
        }
    }

    async fn handle_models(&self, format: &str) -> Result<String, DraftError> {
        let backend = build_backend(&self.config)?;
        let catalog = self.config.model_catalog()?;
        let models = catalog.ranked_models(&backend).await?;
        if format == "json" {
            Ok(format_models_json(&models))
        } else {
            Ok(format_models_text(&models, catalog.preferred()))
        }
    }

    async fn handle_status(&self, format: &str) -> Result<String, DraftError> {
        let store = build_store(&self.config)?;
        let sources = self.config.context_sources();
        let snapshot = store
            .read_last_rows(&sources.store_id, &sources.calendar_sheet, sources.rows)
            .await?;
        let today = Local::now().date_naive();
        let state = DailyState::from_history(&snapshot.rows, today);
        let today = today.format("%Y-%m-%d").to_string();
        if format == "json" {
            Ok(format_status_json(&state, &today))
        } else {
            Ok(format_status_text(&state, &today))
        }
    }
}

fn build_store(config: &DraftConfig) -> Result<SheetsStore, DraftError> {
    SheetsStore::new(
        config.store.access_token.clone().unwrap_or_default(),
        config.store.base_url.clone(),
        Duration::from_secs(config.store.request_timeout_secs),
    )
}

fn build_backend(config: &DraftConfig) -> Result<GeminiClient, DraftError> {
    GeminiClient::new(
        config.backend.api_key.clone().unwrap_or_default(),
        config.backend.base_url.clone(),
        Duration::from_secs(config.backend.connect_timeout_secs),
        Duration::from_secs(config.backend.request_timeout_secs),
    )
}
