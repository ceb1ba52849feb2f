//! JSON document store.
//!
//! Saves the rows as a pretty-printed array of string maps, one object
//! per event.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::{replace_file, LedgerStore, LoadResult, RawRow, StoreError};

pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the backing file (for testing or reset).
    pub fn delete(&self) -> Result<(), StoreError> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

impl LedgerStore for JsonFileStore {
    fn load(&self) -> LoadResult {
        let path = self.path.display().to_string();

        if !self.path.exists() {
            info!(path = %path, "No saved ledger found");
            return LoadResult::Empty;
        }

        let json = match std::fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) => {
                warn!(path = %path, error = %e, "Failed to read ledger, treating as empty");
                return LoadResult::Empty;
            }
        };

        if json.trim().is_empty() {
            return LoadResult::Empty;
        }

        match serde_json::from_str::<Vec<RawRow>>(&json) {
            Ok(rows) => {
                debug!(path = %path, rows = rows.len(), "Ledger loaded from disk");
                LoadResult::from_rows(rows)
            }
            Err(e) => LoadResult::Malformed(format!("Failed to parse {path}: {e}")),
        }
    }

    fn save(&self, rows: &[RawRow]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(rows)?;
        replace_file(&self.path, |staging| Ok(std::fs::write(staging, json)?))?;
        debug!(path = %self.path.display(), rows = rows.len(), "Ledger saved");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
