//! Presentation: run reports, model lists and daily state as text tables or JSON.

use crate::daily::DailyState;
use crate::provider::RankedModelList;
use crate::record::OutputRow;
use crate::run::RunReport;
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use serde_json::json;

const TITLE_WIDTH: usize = 48;
const NOTE_WIDTH: usize = 60;

fn clip(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(width.saturating_sub(1)).collect();
    clipped.push('…');
    clipped
}

fn rows_table(rows: &[&OutputRow]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["#", "Status", "Format", "Title", "Notes"]);
    for (i, row) in rows.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            row.status.to_string(),
            row.record.format.clone(),
            clip(&row.record.idea_title, TITLE_WIDTH),
            clip(&row.notes, NOTE_WIDTH),
        ]);
    }
    table
}

pub fn format_run_report_text(report: &RunReport, dry_run: bool) -> String {
    let rows: Vec<&OutputRow> = report.appended().collect();
    let verb = if dry_run { "would append" } else { "appended" };
    let mut output = format!(
        "Run {} at {}: {} drafts, {} row(s) {}\n",
        report.outcome,
        report.timestamp,
        report.draft_count(),
        rows.len(),
        verb
    );
    if !rows.is_empty() {
        output.push_str(&rows_table(&rows).to_string());
        output.push('\n');
    }
    output
}

fn row_json(row: &OutputRow) -> serde_json::Value {
    json!({
        "timestamp": row.timestamp,
        "objective": row.objective,
        "status": row.status,
        "record": row.record,
        "notes": row.notes,
    })
}

pub fn format_run_report_json(report: &RunReport, dry_run: bool) -> String {
    let out = json!({
        "outcome": report.outcome.to_string(),
        "dry_run": dry_run,
        "timestamp": report.timestamp,
        "state": report.state,
        "rows": report.rows.iter().map(row_json).collect::<Vec<_>>(),
        "audit": report.audit.as_ref().map(row_json),
        "errors": report.errors,
    });
    serde_json::to_string_pretty(&out).unwrap_or_else(|_| "{}".to_string())
}

pub fn format_models_text(models: &RankedModelList, preferred: &[String]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Rank", "Model", "Source"]);
    for (i, model) in models.iter().enumerate() {
        let source = if preferred.iter().any(|p| p == &model.id) {
            "preferred"
        } else {
            "discovered"
        };
        table.add_row(vec![(i + 1).to_string(), model.id.clone(), source.to_string()]);
    }
    format!("{}\nTotal: {} model(s)\n", table, models.len())
}

pub fn format_models_json(models: &RankedModelList) -> String {
    let out = json!({ "models": models.ids(), "total": models.len() });
    serde_json::to_string_pretty(&out).unwrap_or_else(|_| "{}".to_string())
}

pub fn format_status_text(state: &DailyState, today: &str) -> String {
    let yes_no = |flag: bool| (if flag { "yes" } else { "no" }).to_string();
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Today", "Draft", "Mock", "Blocked"]);
    table.add_row(vec![
        today.to_string(),
        yes_no(state.has_draft_today),
        yes_no(state.has_mock_today),
        yes_no(state.has_blocked_today),
    ]);
    table.to_string()
}

pub fn format_status_json(state: &DailyState, today: &str) -> String {
    let out = json!({ "date": today, "state": state });
    serde_json::to_string_pretty(&out).unwrap_or_else(|_| "{}".to_string())
}
