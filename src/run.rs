//! Run orchestrator: one daily run from gate check to appended batch.
//!
//! Every run ends in one of a few states: skipped because today already has drafts,
//! a batch of exactly `slots` rows (drafts and per-slot mocks, plus at most one blocked
//! audit row per day), or a whole-batch mock when the backend refuses service.

use crate::context::{read_context, ContextSources};
use crate::daily::{DailyState, RerunPolicy, RERUN_NOTE};
use crate::error::{DraftError, FailureKind, GenerationError};
use crate::fallback;
use crate::generation::diversity::max_similarity;
use crate::generation::parse::parse_and_accept;
use crate::generation::prompt::{PromptBuilder, Revision};
use crate::generation::RequestExecutor;
use crate::provider::{GenerativeBackend, ModelCatalog, RankedModelList};
use crate::record::{IdeaRecord, OutputRow, RowStatus};
use crate::store::SheetStore;
use chrono::{Local, NaiveDateTime};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Timestamp layout of every row written by a run.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Per-run knobs.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub sources: ContextSources,
    pub objective: String,
    pub brief: String,
    pub slots: usize,
    pub similarity_threshold: f64,
    pub min_filled_fields: usize,
    pub prompt_char_limit: usize,
    pub rerun_policy: RerunPolicy,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// A draft already exists today; nothing was generated or written.
    Skipped,
    /// One row per slot was written, plus possibly the blocked audit row.
    Generated,
    /// The backend refused service; a mock batch was written.
    QuotaMock,
    /// The backend refused service and today's mock batch already exists.
    QuotaMockAlreadyWritten,
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RunOutcome::Skipped => "skipped",
            RunOutcome::Generated => "generated",
            RunOutcome::QuotaMock => "quota_mock",
            RunOutcome::QuotaMockAlreadyWritten => "quota_mock_already_written",
        };
        f.write_str(label)
    }
}

/// What a run did.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub state: DailyState,
    pub timestamp: String,
    /// Slot rows appended, in slot order.
    pub rows: Vec<OutputRow>,
    /// Blocked audit row, when one was appended.
    pub audit: Option<OutputRow>,
    /// Sanitized errors behind every mock row.
    pub errors: Vec<String>,
}

impl RunReport {
    fn empty(outcome: RunOutcome, state: DailyState, timestamp: String) -> Self {
        Self {
            outcome,
            state,
            timestamp,
            rows: Vec::new(),
            audit: None,
            errors: Vec::new(),
        }
    }

    pub fn draft_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|row| row.status == RowStatus::Draft)
            .count()
    }

    /// Every row the run appended, audit last.
    pub fn appended(&self) -> impl Iterator<Item = &OutputRow> {
        self.rows.iter().chain(self.audit.iter())
    }
}

/// Result of one slot.
enum SlotResult {
    Accepted { record: IdeaRecord, notes: Vec<String> },
    Placeholder(GenerationError),
    QuotaExhausted(GenerationError),
}

/// Which instruction the next attempt for a slot carries.
enum NextRound {
    Fresh,
    Corrective(String),
    MoreDifferent,
}

fn low_diversity_note(score: f64) -> String {
    format!("{}:{:.2}", FailureKind::LowDiversity, score)
}

/// Composes the catalog, executor, parser, diversity guard and fallback factory.
pub struct Orchestrator {
    store: Arc<dyn SheetStore>,
    backend: Arc<dyn GenerativeBackend>,
    catalog: ModelCatalog,
    executor: RequestExecutor,
    prompts: PromptBuilder,
    settings: RunSettings,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn SheetStore>,
        backend: Arc<dyn GenerativeBackend>,
        catalog: ModelCatalog,
        executor: RequestExecutor,
        settings: RunSettings,
    ) -> Self {
        let prompts = PromptBuilder::new(
            &settings.objective,
            &settings.brief,
            settings.prompt_char_limit,
            executor.options().output_format,
        );
        Self {
            store,
            backend,
            catalog,
            executor,
            prompts,
            settings,
        }
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Run with the local wall clock.
    pub async fn run(&self) -> Result<RunReport, DraftError> {
        self.run_at(Local::now().naive_local()).await
    }

    /// Today's summary of the calendar, without generating anything.
    pub async fn daily_state(&self, now: NaiveDateTime) -> Result<DailyState, DraftError> {
        let snapshot = self
            .store
            .read_last_rows(
                &self.settings.sources.store_id,
                &self.settings.sources.calendar_sheet,
                self.settings.sources.rows,
            )
            .await?;
        Ok(DailyState::from_history(&snapshot.rows, now.date()))
    }

    /// Ranked candidate models, as the run would try them.
    pub async fn ranked_models(&self) -> Result<RankedModelList, GenerationError> {
        self.catalog.ranked_models(self.backend.as_ref()).await
    }

    /// Execute one run as of `now`.
    ///
    /// Generation failures never escape; store failures do.
    pub async fn run_at(&self, now: NaiveDateTime) -> Result<RunReport, DraftError> {
        let timestamp = now.format(TIMESTAMP_FORMAT).to_string();
        let context = read_context(self.store.as_ref(), &self.settings.sources).await?;
        let state = DailyState::from_history(&context.calendar, now.date());
        info!(
            objective = %self.settings.objective,
            slots = self.settings.slots,
            ?state,
            "Starting run"
        );

        if !state.should_generate(self.settings.rerun_policy) {
            info!("Drafts already generated today; skipping run");
            return Ok(RunReport::empty(RunOutcome::Skipped, state, timestamp));
        }

        let models = match self.ranked_models().await {
            Ok(models) => models,
            Err(err) => {
                warn!(kind = %err.kind, error = %err.message, "Model discovery failed");
                return self.run_level_failure(err, state, timestamp).await;
            }
        };

        let base = self.prompts.base_prompt(&context);
        let rerun = state.has_draft_today;
        let mut accepted: Vec<IdeaRecord> = Vec::new();
        let mut rows = Vec::with_capacity(self.settings.slots);
        let mut errors = Vec::new();

        for index in 0..self.settings.slots {
            match self.generate_slot(index, &base, &models, &accepted).await {
                SlotResult::Accepted { record, mut notes } => {
                    if rerun {
                        notes.push(RERUN_NOTE.to_string());
                    }
                    info!(slot = index + 1, title = %record.idea_title, "Slot accepted");
                    accepted.push(record.clone());
                    rows.push(OutputRow::new(
                        &timestamp,
                        &self.settings.objective,
                        record,
                        RowStatus::Draft,
                        notes.join("; "),
                    ));
                }
                SlotResult::Placeholder(err) => {
                    let note = err.to_string();
                    warn!(slot = index + 1, error = %note, "Slot failed; using placeholder");
                    rows.push(fallback::slot_placeholder(
                        &timestamp,
                        &self.settings.objective,
                        index,
                        &note,
                    ));
                    errors.push(note);
                }
                SlotResult::QuotaExhausted(err) => {
                    warn!(slot = index + 1, kind = %err.kind, "Backend refused service");
                    return self.write_quota_batch(err, state, timestamp).await;
                }
            }
        }

        self.finish(rows, errors, state, timestamp).await
    }

    /// Produce one slot: at most one corrective and one diversity regeneration.
    async fn generate_slot(
        &self,
        index: usize,
        base: &str,
        models: &RankedModelList,
        accepted: &[IdeaRecord],
    ) -> SlotResult {
        let avoid_titles: Vec<String> = accepted.iter().map(|r| r.idea_title.clone()).collect();
        let mut round = NextRound::Fresh;
        let mut corrected = false;
        // Structurally valid but too similar; used if the regeneration fails.
        let mut similar: Option<(IdeaRecord, f64)> = None;

        loop {
            let revision = match &round {
                NextRound::Fresh => Revision::Fresh,
                NextRound::Corrective(reason) => Revision::Corrective {
                    reason: reason.as_str(),
                },
                NextRound::MoreDifferent => Revision::MoreDifferent {
                    avoid_titles: &avoid_titles,
                },
            };
            let prompt = self
                .prompts
                .slot_prompt(base, index + 1, self.settings.slots, revision);

            let text = match self.executor.execute(&prompt, models).await {
                Ok(success) => success.text,
                Err(err) if err.kind.is_quota() => return SlotResult::QuotaExhausted(err),
                Err(err) => {
                    return match similar {
                        Some((record, score)) => accept_similar(record, score),
                        None => SlotResult::Placeholder(err),
                    }
                }
            };

            let record = match parse_and_accept(
                &text,
                self.executor.options().output_format,
                self.settings.min_filled_fields,
            ) {
                Ok(record) => record,
                Err(err) => {
                    debug!(slot = index + 1, kind = %err.kind, "Unusable output");
                    if corrected {
                        return match similar {
                            Some((record, score)) => accept_similar(record, score),
                            None => SlotResult::Placeholder(err),
                        };
                    }
                    corrected = true;
                    round = NextRound::Corrective(err.message);
                    continue;
                }
            };

            let score = max_similarity(&record, accepted);
            if score < self.settings.similarity_threshold {
                return SlotResult::Accepted {
                    record,
                    notes: Vec::new(),
                };
            }
            warn!(slot = index + 1, score, "Candidate too similar to an accepted idea");
            if similar.is_some() {
                return accept_similar(record, score);
            }
            similar = Some((record, score));
            round = NextRound::MoreDifferent;
        }
    }

    async fn run_level_failure(
        &self,
        err: GenerationError,
        state: DailyState,
        timestamp: String,
    ) -> Result<RunReport, DraftError> {
        if err.kind.is_quota() {
            return self.write_quota_batch(err, state, timestamp).await;
        }
        let note = err.to_string();
        let rows = (0..self.settings.slots)
            .map(|index| {
                fallback::slot_placeholder(&timestamp, &self.settings.objective, index, &note)
            })
            .collect();
        self.finish(rows, vec![note], state, timestamp).await
    }

    async fn write_quota_batch(
        &self,
        err: GenerationError,
        state: DailyState,
        timestamp: String,
    ) -> Result<RunReport, DraftError> {
        if state.has_mock_today {
            info!("Mock batch already written today; not writing another");
            let mut report = RunReport::empty(RunOutcome::QuotaMockAlreadyWritten, state, timestamp);
            report.errors.push(err.to_string());
            return Ok(report);
        }
        let rows = fallback::quota_batch(
            &timestamp,
            &self.settings.objective,
            self.settings.slots,
            &err.to_string(),
        );
        self.append(&rows).await?;
        info!(rows = rows.len(), "Wrote quota mock batch");
        Ok(RunReport {
            outcome: RunOutcome::QuotaMock,
            state,
            timestamp,
            rows,
            audit: None,
            errors: vec![err.to_string()],
        })
    }

    async fn finish(
        &self,
        rows: Vec<OutputRow>,
        errors: Vec<String>,
        state: DailyState,
        timestamp: String,
    ) -> Result<RunReport, DraftError> {
        self.append(&rows).await?;
        let drafts = rows.iter().filter(|r| r.status == RowStatus::Draft).count();

        let audit = if drafts == 0 && !state.has_blocked_today {
            let row = fallback::blocked_row(&timestamp, &self.settings.objective, &errors);
            self.append(std::slice::from_ref(&row)).await?;
            info!("Wrote blocked audit row");
            Some(row)
        } else {
            None
        };

        info!(drafts, mocks = rows.len() - drafts, "Run finished");
        Ok(RunReport {
            outcome: RunOutcome::Generated,
            state,
            timestamp,
            rows,
            audit,
            errors,
        })
    }

    async fn append(&self, rows: &[OutputRow]) -> Result<(), DraftError> {
        let cells: Vec<Vec<String>> = rows.iter().map(OutputRow::to_cells).collect();
        self.store
            .append_rows(
                &self.settings.sources.store_id,
                &self.settings.sources.calendar_sheet,
                &cells,
            )
            .await
    }
}

fn accept_similar(record: IdeaRecord, score: f64) -> SlotResult {
    SlotResult::Accepted {
        record,
        notes: vec![low_diversity_note(score)],
    }
}
