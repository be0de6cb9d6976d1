//! Daily state gate: what has already been written to the calendar today.

use crate::record::{RowStatus, STATUS_COLUMN};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Whether a run proceeds when a draft already exists for today.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RerunPolicy {
    /// Skip the run entirely.
    #[default]
    Skip,
    /// Run again and tag the new drafts.
    Allow,
}

/// Note attached to drafts produced by an allowed same-day rerun.
pub const RERUN_NOTE: &str = "rerun_same_day";

fn date_prefix(row: &[String]) -> &str {
    row.first()
        .map(|cell| cell.get(..10).unwrap_or(cell.as_str()))
        .unwrap_or("")
}

fn row_status(row: &[String]) -> Option<RowStatus> {
    row.get(STATUS_COLUMN).and_then(|cell| RowStatus::parse(cell))
}

/// True when some row dated `today` carries `status`.
pub fn already_wrote(history: &[Vec<String>], today: NaiveDate, status: RowStatus) -> bool {
    let today = today.format("%Y-%m-%d").to_string();
    history
        .iter()
        .any(|row| date_prefix(row) == today && row_status(row) == Some(status))
}

/// True when a genuine draft already exists for `today`.
pub fn already_completed(history: &[Vec<String>], today: NaiveDate) -> bool {
    already_wrote(history, today, RowStatus::Draft)
}

/// Today's calendar summary, computed once per run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DailyState {
    pub has_draft_today: bool,
    pub has_mock_today: bool,
    pub has_blocked_today: bool,
}

impl DailyState {
    pub fn from_history(history: &[Vec<String>], today: NaiveDate) -> Self {
        Self {
            has_draft_today: already_completed(history, today),
            has_mock_today: already_wrote(history, today, RowStatus::Mock),
            has_blocked_today: already_wrote(history, today, RowStatus::Blocked),
        }
    }

    /// Whether generation should run under `policy`.
    pub fn should_generate(&self, policy: RerunPolicy) -> bool {
        !self.has_draft_today || policy == RerunPolicy::Allow
    }
}
