//! Integration tests for complete runs against an in-memory calendar

use dailydraft::fallback::QUOTA_MOCK_NOTE_PREFIX;
use dailydraft::generation::{RequestExecutor, RetryPolicy};
use dailydraft::provider::{GenerationOptions, ModelCatalog, OutputFormat};
use dailydraft::record::STATUS_COLUMN;
use dailydraft::run::{Orchestrator, RunOutcome};
use dailydraft::store::{DryRunStore, SheetStore};
use std::sync::Arc;

use crate::integration::test_utils::{
    calendar_row, json_idea, kv_idea, orchestrator, run_time, seeded_store, settings, status_reply,
    statuses, text_reply, RecordingSleeper, ScriptedBackend,
};

const NOTES_COLUMN: usize = 13;

#[tokio::test]
async fn quota_outage_writes_one_mock_batch_per_day() {
    let store = seeded_store(Vec::new());
    let backend = Arc::new(ScriptedBackend::new(
        &["gemini-2.0-flash", "gemini-1.5-flash"],
        Vec::new(),
        status_reply(429),
    ));
    let runner = orchestrator(
        store.clone(),
        backend.clone(),
        GenerationOptions::default(),
        settings(),
    );

    let report = runner.run_at(run_time()).await.unwrap();
    assert_eq!(report.outcome, RunOutcome::QuotaMock);
    assert_eq!(statuses(&store), vec!["mock", "mock", "mock"]);

    let rows = store.rows("calendar");
    for row in &rows {
        assert_eq!(row[0], "2026-05-04 08:15:00");
        assert!(row[NOTES_COLUMN].starts_with(QUOTA_MOCK_NOTE_PREFIX));
    }
    // Archetypes cycle reels, carousel, stories.
    let formats: Vec<&str> = rows.iter().map(|row| row[3].as_str()).collect();
    assert_eq!(formats, vec!["reels", "carousel", "stories"]);

    let again = runner.run_at(run_time()).await.unwrap();
    assert_eq!(again.outcome, RunOutcome::QuotaMockAlreadyWritten);
    assert!(again.rows.is_empty());
    assert_eq!(store.rows("calendar").len(), 3);
    assert_eq!(store.append_calls(), 1);
}

#[tokio::test]
async fn existing_draft_today_skips_without_backend_calls() {
    let store = seeded_store(vec![calendar_row("2026-05-04 06:00:00", "draft")]);
    let backend = Arc::new(ScriptedBackend::new(
        &["gemini-2.0-flash"],
        Vec::new(),
        text_reply(&kv_idea("Unused", "unused", "unused")),
    ));
    let runner = orchestrator(
        store.clone(),
        backend.clone(),
        GenerationOptions::default(),
        settings(),
    );

    let report = runner.run_at(run_time()).await.unwrap();
    assert_eq!(report.outcome, RunOutcome::Skipped);
    assert!(report.state.has_draft_today);
    assert_eq!(backend.list_calls(), 0);
    assert!(backend.prompts().is_empty());
    assert_eq!(store.rows("calendar").len(), 1);
}

#[tokio::test]
async fn repeated_idea_is_regenerated_with_avoid_list() {
    let store = seeded_store(Vec::new());
    let first = kv_idea(
        "Three knee stretches for runners",
        "Your knees hurt after every run",
        "Show three stretches with counts",
    );
    let backend = Arc::new(ScriptedBackend::new(
        &["gemini-2.0-flash"],
        vec![
            text_reply(&first),
            text_reply(&first),
            text_reply(&kv_idea(
                "Desk posture myths",
                "Sitting straight is overrated",
                "Debunk two posture myths",
            )),
            text_reply(&kv_idea(
                "Book a free assessment",
                "Not sure where the pain starts",
                "Walk through the intake questions",
            )),
        ],
        status_reply(500),
    ));
    let runner = orchestrator(
        store.clone(),
        backend.clone(),
        GenerationOptions::default(),
        settings(),
    );

    let report = runner.run_at(run_time()).await.unwrap();
    assert_eq!(report.outcome, RunOutcome::Generated);
    assert_eq!(report.draft_count(), 3);
    assert!(report.rows.iter().all(|row| row.notes.is_empty()));

    let prompts = backend.prompts();
    assert_eq!(prompts.len(), 4);
    assert!(prompts[2].contains("too similar"));
    assert!(prompts[2].contains("- Three knee stretches for runners"));
    assert!(prompts[3].contains("Generate idea 3/3 now."));

    let titles: Vec<String> = store.rows("calendar").iter().map(|row| row[4].clone()).collect();
    assert_eq!(
        titles,
        vec![
            "Three knee stretches for runners",
            "Desk posture myths",
            "Book a free assessment"
        ]
    );
}

#[tokio::test]
async fn server_outage_writes_placeholders_and_one_audit_row() {
    let store = seeded_store(Vec::new());
    let backend = Arc::new(ScriptedBackend::new(
        &["gemini-2.0-flash"],
        Vec::new(),
        status_reply(503),
    ));
    let runner = orchestrator(
        store.clone(),
        backend.clone(),
        GenerationOptions::default(),
        settings(),
    );

    let report = runner.run_at(run_time()).await.unwrap();
    assert_eq!(report.outcome, RunOutcome::Generated);
    assert_eq!(report.draft_count(), 0);
    assert!(report.audit.is_some());
    assert_eq!(statuses(&store), vec!["mock", "mock", "mock", "blocked"]);

    let rows = store.rows("calendar");
    assert!(rows[0][NOTES_COLUMN].contains("server_error"));
    assert_eq!(rows[3][2], "system");

    // A second failing run the same day adds placeholders but no second audit row.
    runner.run_at(run_time()).await.unwrap();
    let statuses = statuses(&store);
    assert_eq!(statuses.len(), 7);
    assert_eq!(statuses.iter().filter(|s| *s == "blocked").count(), 1);
}

#[tokio::test]
async fn json_output_is_repaired_and_accepted() {
    let store = seeded_store(Vec::new());
    let wrapped = format!(
        "Here is your idea:\n```json\n{}\n```",
        json_idea("Foam rolling basics", "Stop rolling your IT band", "Demo two rolls")
    );
    let backend = Arc::new(ScriptedBackend::new(
        &["gemini-2.0-flash"],
        vec![
            text_reply(&wrapped),
            text_reply(&json_idea(
                "Patient story: back to hiking",
                "Six weeks ago she could not climb stairs",
                "Timeline of the rehab plan",
            )),
            text_reply(&json_idea(
                "Questions we ask on day one",
                "What happens at a first visit",
                "Answer the top three questions",
            )),
        ],
        status_reply(500),
    ));
    let options = GenerationOptions {
        output_format: OutputFormat::Json,
        ..GenerationOptions::default()
    };
    let runner = orchestrator(store.clone(), backend.clone(), options, settings());

    let report = runner.run_at(run_time()).await.unwrap();
    assert_eq!(report.draft_count(), 3);
    assert_eq!(report.rows[0].record.idea_title, "Foam rolling basics");
    assert_eq!(report.rows[0].record.assets_needed, "phone; tripod");
    assert!(backend.prompts()[0].contains("Return ONLY one valid JSON object"));
}

#[tokio::test]
async fn prompt_quotes_context_sheets() {
    let store = seeded_store(vec![calendar_row("2026-05-03 08:00:00", "draft")]);
    let backend = Arc::new(ScriptedBackend::new(
        &["gemini-2.0-flash"],
        Vec::new(),
        text_reply(&kv_idea("Any", "hook", "script")),
    ));
    let mut settings = settings();
    settings.slots = 1;
    let runner = orchestrator(store, backend.clone(), GenerationOptions::default(), settings);

    runner.run_at(run_time()).await.unwrap();
    let prompt = &backend.prompts()[0];
    assert!(prompt.contains("Physiotherapy clinic account."));
    assert!(prompt.contains("Stop scrolling if your knee clicks"));
    assert!(prompt.contains("Morning mobility"));
    assert!(prompt.contains("Generate idea 1/1 now."));
}

#[tokio::test]
async fn dry_run_reads_but_never_appends() {
    let memory = seeded_store(Vec::new());
    let dry_run = Arc::new(DryRunStore::new(memory.clone()));
    let backend = Arc::new(ScriptedBackend::new(
        &["gemini-2.0-flash"],
        Vec::new(),
        status_reply(429),
    ));
    let executor = RequestExecutor::new(
        backend.clone(),
        RetryPolicy::default(),
        GenerationOptions::default(),
        Arc::new(RecordingSleeper::default()),
    );
    let store: Arc<dyn SheetStore> = dry_run.clone();
    let runner = Orchestrator::new(
        store,
        backend,
        ModelCatalog::with_defaults(),
        executor,
        settings(),
    );

    let report = runner.run_at(run_time()).await.unwrap();
    assert_eq!(report.outcome, RunOutcome::QuotaMock);
    assert!(memory.rows("calendar").is_empty());

    let captured = dry_run.captured();
    assert_eq!(captured.len(), 3);
    assert!(captured.iter().all(|(sheet, row)| sheet == "calendar" && row[STATUS_COLUMN] == "mock"));
}
