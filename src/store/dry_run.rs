//! Dry-run wrapper: real reads, captured appends.

use crate::error::DraftError;
use crate::store::{SheetSnapshot, SheetStore};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

/// Delegates reads to `inner` and keeps appended rows in memory instead of writing.
pub struct DryRunStore {
    inner: Arc<dyn SheetStore>,
    captured: Mutex<Vec<(String, Vec<String>)>>,
}

impl DryRunStore {
    pub fn new(inner: Arc<dyn SheetStore>) -> Self {
        Self {
            inner,
            captured: Mutex::new(Vec::new()),
        }
    }

    /// Rows that would have been appended, with their sheet name, in order.
    pub fn captured(&self) -> Vec<(String, Vec<String>)> {
        self.captured.lock().clone()
    }
}

#[async_trait]
impl SheetStore for DryRunStore {
    async fn read_last_rows(
        &self,
        store_id: &str,
        sheet: &str,
        n: usize,
    ) -> Result<SheetSnapshot, DraftError> {
        self.inner.read_last_rows(store_id, sheet, n).await
    }

    async fn append_rows(
        &self,
        _store_id: &str,
        sheet: &str,
        rows: &[Vec<String>],
    ) -> Result<(), DraftError> {
        info!(sheet, rows = rows.len(), "Dry run: skipping append");
        self.captured
            .lock()
            .extend(rows.iter().map(|row| (sheet.to_string(), row.clone())));
        Ok(())
    }

    fn store_name(&self) -> &str {
        "dry-run"
    }
}
