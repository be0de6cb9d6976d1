//! Shared test utilities for integration tests
//!
//! A scripted backend, a store seeded with the three sheets a run reads, and
//! serialized environment access for configuration tests.

use async_trait::async_trait;
use dailydraft::context::ContextSources;
use dailydraft::daily::RerunPolicy;
use dailydraft::error::GenerationError;
use dailydraft::generation::{RequestExecutor, RetryPolicy, Sleeper};
use dailydraft::provider::catalog::GENERATE_METHOD;
use dailydraft::provider::{
    BackendReply, GenerationOptions, GenerativeBackend, ListedModel, ModelCatalog,
};
use dailydraft::record::STATUS_COLUMN;
use dailydraft::run::{Orchestrator, RunSettings};
use dailydraft::store::MemoryStore;
use chrono::{NaiveDate, NaiveDateTime};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Global mutex to serialize environment variable access across all tests
static ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Variables the config loader reads
const WATCHED_VARS: [&str; 9] = [
    "XDG_CONFIG_HOME",
    "GSHEETS_SPREADSHEET_ID",
    "GOOGLE_OAUTH_ACCESS_TOKEN",
    "GEMINI_API_KEY",
    "DEFAULT_OBJECTIVE",
    "DAILYDRAFT_RUN__SLOTS",
    "DAILYDRAFT_RUN__OBJECTIVE",
    "DAILYDRAFT_BACKEND__PREFERRED_MODELS",
    "DAILYDRAFT_STORE__SPREADSHEET_ID",
];

/// Environment variable state to restore after test
struct EnvState(Vec<(&'static str, Option<String>)>);

impl EnvState {
    fn capture() -> Self {
        Self(
            WATCHED_VARS
                .iter()
                .map(|name| (*name, std::env::var(name).ok()))
                .collect(),
        )
    }

    fn restore(self) {
        for (name, value) in self.0 {
            match value {
                Some(orig) => std::env::set_var(name, orig),
                None => std::env::remove_var(name),
            }
        }
    }
}

/// Run `f` with every watched variable cleared, then `vars` applied.
///
/// `XDG_CONFIG_HOME` points at `config_home` so no real global config leaks in.
/// The original environment is restored afterwards, even if `f` panics.
pub fn with_env<F, R>(config_home: &std::path::Path, vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let env_state = EnvState::capture();

    for name in WATCHED_VARS {
        std::env::remove_var(name);
    }
    std::env::set_var("XDG_CONFIG_HOME", config_home);
    for (name, value) in vars {
        std::env::set_var(name, value);
    }

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));
    env_state.restore();
    match result {
        Ok(value) => value,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

/// Backend that lists fixed models and answers generation calls from a queue.
pub struct ScriptedBackend {
    models: Vec<ListedModel>,
    replies: Mutex<VecDeque<BackendReply>>,
    fallback: BackendReply,
    prompts: Mutex<Vec<(String, String)>>,
    list_calls: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new(model_ids: &[&str], replies: Vec<BackendReply>, fallback: BackendReply) -> Self {
        Self {
            models: model_ids
                .iter()
                .map(|id| ListedModel {
                    name: format!("models/{id}"),
                    supported_methods: vec![GENERATE_METHOD.to_string()],
                })
                .collect(),
            replies: Mutex::new(replies.into_iter().collect()),
            fallback,
            prompts: Mutex::new(Vec::new()),
            list_calls: AtomicUsize::new(0),
        }
    }

    /// Listing with arbitrary names and methods.
    pub fn with_listing(models: Vec<ListedModel>) -> Self {
        Self {
            models,
            replies: Mutex::new(VecDeque::new()),
            fallback: status_reply(500),
            prompts: Mutex::new(Vec::new()),
            list_calls: AtomicUsize::new(0),
        }
    }

    /// Models requested, in call order.
    pub fn generate_models(&self) -> Vec<String> {
        self.prompts.lock().iter().map(|(m, _)| m.clone()).collect()
    }

    /// Prompts sent, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().iter().map(|(_, p)| p.clone()).collect()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerativeBackend for ScriptedBackend {
    async fn list_models(&self) -> Result<Vec<ListedModel>, GenerationError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.models.clone())
    }

    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<BackendReply, GenerationError> {
        self.prompts
            .lock()
            .push((model.to_string(), prompt.to_string()));
        Ok(self
            .replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone()))
    }

    fn backend_name(&self) -> &str {
        "scripted"
    }
}

/// Sleeper that returns immediately and records requested waits.
#[derive(Default)]
pub struct RecordingSleeper {
    pub waits: Mutex<Vec<Duration>>,
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.waits.lock().push(duration);
    }
}

/// Successful generation reply wrapping `text` the way the service does.
pub fn text_reply(text: &str) -> BackendReply {
    BackendReply {
        status: 200,
        retry_after: None,
        body: serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": text }] } }]
        })
        .to_string(),
    }
}

pub fn status_reply(status: u16) -> BackendReply {
    BackendReply {
        status,
        retry_after: None,
        body: format!(r#"{{"error":{{"code":{status},"message":"status {status}"}}}}"#),
    }
}

/// A complete `key=value` idea.
pub fn kv_idea(title: &str, hook: &str, script: &str) -> String {
    format!(
        "pillar=education\nformat=reels\nidea_title={title}\nhook={hook}\nhook_alt=alternative opener\nscript={script}\non_screen_text=overlay\ncaption=caption text\ncta=save this\nassets_needed=phone"
    )
}

/// The same idea as one JSON object.
pub fn json_idea(title: &str, hook: &str, script: &str) -> String {
    serde_json::json!({
        "pillar": "education",
        "format": "carousel",
        "idea_title": title,
        "hook": hook,
        "hook_alt": "alternative opener",
        "script": script,
        "on_screen_text": "overlay",
        "caption": "caption text",
        "cta": "save this",
        "assets_needed": ["phone", "tripod"]
    })
    .to_string()
}

pub fn run_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 5, 4)
        .unwrap()
        .and_hms_opt(8, 15, 0)
        .unwrap()
}

/// Calendar row with only the timestamp and status cells filled.
pub fn calendar_row(timestamp: &str, status: &str) -> Vec<String> {
    let mut cells = vec![String::new(); 14];
    cells[0] = timestamp.to_string();
    cells[STATUS_COLUMN] = status.to_string();
    cells
}

pub fn seeded_store(history: Vec<Vec<String>>) -> Arc<MemoryStore> {
    Arc::new(
        MemoryStore::new()
            .with_sheet("calendar", &["timestamp", "objective", "pillar"], history)
            .with_sheet(
                "swipe_file",
                &["hook", "source"],
                vec![vec!["Stop scrolling if your knee clicks".to_string(), "ig".to_string()]],
            )
            .with_sheet(
                "performance",
                &["title", "views"],
                vec![vec!["Morning mobility".to_string(), "1200".to_string()]],
            ),
    )
}

pub fn settings() -> RunSettings {
    RunSettings {
        sources: ContextSources {
            store_id: "spreadsheet".to_string(),
            calendar_sheet: "calendar".to_string(),
            swipe_sheet: "swipe_file".to_string(),
            performance_sheet: "performance".to_string(),
            rows: 30,
        },
        objective: "balanced".to_string(),
        brief: "Physiotherapy clinic account.".to_string(),
        slots: 3,
        similarity_threshold: 0.82,
        min_filled_fields: 4,
        prompt_char_limit: 6500,
        rerun_policy: RerunPolicy::Skip,
    }
}

pub fn orchestrator(
    store: Arc<MemoryStore>,
    backend: Arc<ScriptedBackend>,
    options: GenerationOptions,
    settings: RunSettings,
) -> Orchestrator {
    let executor = RequestExecutor::new(
        backend.clone(),
        RetryPolicy::default(),
        options,
        Arc::new(RecordingSleeper::default()),
    );
    Orchestrator::new(store, backend, ModelCatalog::with_defaults(), executor, settings)
}

/// Status cell of every calendar data row.
pub fn statuses(store: &MemoryStore) -> Vec<String> {
    store
        .rows("calendar")
        .iter()
        .map(|row| row[STATUS_COLUMN].clone())
        .collect()
}
