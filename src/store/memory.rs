//! In-memory store. Backs tests and local experiments; ignores the store id.

use crate::error::DraftError;
use crate::store::{SheetSnapshot, SheetStore};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

#[derive(Default)]
struct Sheets {
    /// Raw values per sheet, header first.
    values: HashMap<String, Vec<Vec<String>>>,
    failing: HashSet<String>,
    append_calls: usize,
}

/// Sheet store held entirely in memory.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Sheets>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a sheet with a header and data rows.
    pub fn with_sheet(self, name: &str, header: &[&str], rows: Vec<Vec<String>>) -> Self {
        {
            let mut inner = self.inner.lock();
            let mut values = vec![header.iter().map(|h| h.to_string()).collect::<Vec<_>>()];
            values.extend(rows);
            inner.values.insert(name.to_string(), values);
        }
        self
    }

    /// Make every read and append on `name` fail.
    pub fn fail_sheet(&self, name: &str) {
        self.inner.lock().failing.insert(name.to_string());
    }

    /// Data rows of `name`, header excluded.
    pub fn rows(&self, name: &str) -> Vec<Vec<String>> {
        self.inner
            .lock()
            .values
            .get(name)
            .map(|values| values.iter().skip(1).cloned().collect())
            .unwrap_or_default()
    }

    /// Number of non-empty append calls served.
    pub fn append_calls(&self) -> usize {
        self.inner.lock().append_calls
    }
}

#[async_trait]
impl SheetStore for MemoryStore {
    async fn read_last_rows(
        &self,
        _store_id: &str,
        sheet: &str,
        n: usize,
    ) -> Result<SheetSnapshot, DraftError> {
        let inner = self.inner.lock();
        if inner.failing.contains(sheet) {
            return Err(DraftError::StoreError(format!("Failed to read sheet '{}'", sheet)));
        }
        let values = inner
            .values
            .get(sheet)
            .cloned()
            .ok_or_else(|| DraftError::StoreRequestFailed {
                status: 400,
                message: format!("Unable to parse range: {}", sheet),
            })?;
        Ok(SheetSnapshot::from_values(values, n))
    }

    async fn append_rows(
        &self,
        _store_id: &str,
        sheet: &str,
        rows: &[Vec<String>],
    ) -> Result<(), DraftError> {
        let mut inner = self.inner.lock();
        if inner.failing.contains(sheet) {
            return Err(DraftError::StoreError(format!("Failed to append to sheet '{}'", sheet)));
        }
        if rows.is_empty() {
            return Ok(());
        }
        inner.append_calls += 1;
        let values = inner
            .values
            .entry(sheet.to_string())
            .or_insert_with(|| vec![Vec::new()]);
        values.extend(rows.iter().cloned());
        Ok(())
    }

    fn store_name(&self) -> &str {
        "memory"
    }
}
