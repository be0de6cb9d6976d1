//! Context reader: recent rows of the calendar, swipe-file and performance sheets.

use crate::error::DraftError;
use crate::store::SheetStore;
use tracing::{debug, warn};

/// Sheet names and how many trailing rows to read from each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextSources {
    pub store_id: String,
    pub calendar_sheet: String,
    pub swipe_sheet: String,
    pub performance_sheet: String,
    pub rows: usize,
}

/// Recent rows of each context sheet, headers dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextRows {
    pub calendar: Vec<Vec<String>>,
    pub swipe: Vec<Vec<String>>,
    pub performance: Vec<Vec<String>>,
}

/// Read all three sheets.
///
/// The calendar is the run's history, so failing to read it is an error. Swipe-file and
/// performance sheets only enrich the prompt and degrade to empty.
pub async fn read_context(
    store: &dyn SheetStore,
    sources: &ContextSources,
) -> Result<ContextRows, DraftError> {
    let calendar = store
        .read_last_rows(&sources.store_id, &sources.calendar_sheet, sources.rows)
        .await?
        .rows;
    let swipe = read_optional(store, sources, &sources.swipe_sheet).await;
    let performance = read_optional(store, sources, &sources.performance_sheet).await;
    debug!(
        calendar = calendar.len(),
        swipe = swipe.len(),
        performance = performance.len(),
        "Read context rows"
    );
    Ok(ContextRows {
        calendar,
        swipe,
        performance,
    })
}

async fn read_optional(store: &dyn SheetStore, sources: &ContextSources, sheet: &str) -> Vec<Vec<String>> {
    match store
        .read_last_rows(&sources.store_id, sheet, sources.rows)
        .await
    {
        Ok(snapshot) => snapshot.rows,
        Err(err) => {
            warn!(sheet, error = %err, "Context sheet unavailable; continuing without it");
            Vec::new()
        }
    }
}
