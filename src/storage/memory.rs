//! In-process store.
//!
//! Holds the last saved rows in memory. Clones share the same backing
//! rows, so a test can keep a handle while the ledger owns another.

use std::sync::{Arc, Mutex};

use super::{LedgerStore, LoadResult, RawRow, StoreError};

#[derive(Clone, Default)]
pub struct MemoryStore {
    rows: Arc<Mutex<Vec<RawRow>>>,
    /// If set, saves fail with this message.
    fail_saves: Arc<Mutex<Option<String>>>,
    saves: Arc<Mutex<u64>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with rows, as if saved by an earlier session.
    pub fn with_rows(rows: Vec<RawRow>) -> Self {
        let store = Self::new();
        if let Ok(mut slot) = store.rows.lock() {
            *slot = rows;
        }
        store
    }

    /// Make every subsequent save fail.
    pub fn fail_saves(&self, reason: &str) {
        if let Ok(mut slot) = self.fail_saves.lock() {
            *slot = Some(reason.to_string());
        }
    }

    /// Let saves succeed again.
    pub fn restore_saves(&self) {
        if let Ok(mut slot) = self.fail_saves.lock() {
            *slot = None;
        }
    }

    /// Snapshot of the persisted rows.
    pub fn rows(&self) -> Vec<RawRow> {
        self.rows.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> u64 {
        self.saves.lock().map(|n| *n).unwrap_or(0)
    }
}

impl LedgerStore for MemoryStore {
    fn load(&self) -> LoadResult {
        match self.rows.lock() {
            Ok(rows) => LoadResult::from_rows(rows.clone()),
            Err(_) => LoadResult::Malformed("memory store lock poisoned".into()),
        }
    }

    fn save(&self, rows: &[RawRow]) -> Result<(), StoreError> {
        if let Some(reason) = self.fail_saves.lock().ok().and_then(|r| r.clone()) {
            return Err(StoreError::Unavailable(reason));
        }
        let mut slot = self
            .rows
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))?;
        *slot = rows.to_vec();
        if let Ok(mut n) = self.saves.lock() {
            *n += 1;
        }
        Ok(())
    }
}
