//! Tabular Store
//!
//! The external spreadsheet the run reads its history and context from and appends its
//! rows to. The orchestrator only ever reads the tail of a sheet and appends whole
//! batches; it never updates or deletes.

pub mod dry_run;
pub mod memory;
pub mod sheets;

pub use dry_run::DryRunStore;
pub use memory::MemoryStore;
pub use sheets::SheetsStore;

use crate::error::DraftError;
use async_trait::async_trait;

/// Header row plus the last `n` data rows of a sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetSnapshot {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SheetSnapshot {
    /// Split raw sheet values into header and the last `n` data rows.
    pub fn from_values(mut values: Vec<Vec<String>>, n: usize) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let header = values.remove(0);
        let start = values.len().saturating_sub(n);
        Self {
            header,
            rows: values.split_off(start),
        }
    }
}

/// Store interface
#[async_trait]
pub trait SheetStore: Send + Sync {
    /// Read the header and up to the last `n` data rows of `sheet`.
    async fn read_last_rows(
        &self,
        store_id: &str,
        sheet: &str,
        n: usize,
    ) -> Result<SheetSnapshot, DraftError>;

    /// Append `rows` in order after the last row of `sheet`.
    async fn append_rows(
        &self,
        store_id: &str,
        sheet: &str,
        rows: &[Vec<String>],
    ) -> Result<(), DraftError>;

    fn store_name(&self) -> &str;
}
