//! Persistence layer.
//!
//! The ledger core only sees the [`LedgerStore`] contract: read every
//! persisted row, or overwrite them all. Whether the rows live in a
//! delimited file, a JSON document or memory is decided here.

pub mod csv_file;
pub mod json_file;
pub mod memory;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::config::StorageConfig;
use crate::types::Event;

pub use csv_file::CsvFileStore;
pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

pub const COL_DATE: &str = "date";
pub const COL_KIND: &str = "kind";
pub const COL_STAKE: &str = "stake";
pub const COL_ODDS: &str = "odds";
pub const COL_OUTCOME: &str = "outcome";
pub const COL_NET_DELTA: &str = "net_delta";
pub const COL_RUNNING_BALANCE: &str = "running_balance";
pub const COL_LABEL: &str = "label";

/// Column order used when writing rows.
pub const COLUMNS: &[&str] = &[
    COL_DATE,
    COL_KIND,
    COL_STAKE,
    COL_ODDS,
    COL_OUTCOME,
    COL_NET_DELTA,
    COL_RUNNING_BALANCE,
    COL_LABEL,
];

/// Column names of files written by the first version of the tracker,
/// which labelled its columns in French and, earlier still, called the
/// label `Sport`.
const LEGACY_ALIASES: &[(&str, &str)] = &[
    ("type", COL_KIND),
    ("montant_pari", COL_STAKE),
    ("cote", COL_ODDS),
    ("résultat", COL_OUTCOME),
    ("resultat", COL_OUTCOME),
    ("gain_net", COL_NET_DELTA),
    ("bankroll_finale", COL_RUNNING_BALANCE),
    ("details_pari", COL_LABEL),
    ("sport", COL_LABEL),
];

// ---------------------------------------------------------------------------
// Raw rows
// ---------------------------------------------------------------------------

/// A column-tagged record exactly as stored. Cells are untyped text;
/// the ledger decides how to interpret them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRow(BTreeMap<String, String>);

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row from `(column, value)` pairs. Column names are
    /// normalised and legacy aliases are mapped to current names.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut row = Self::new();
        for (column, value) in pairs {
            row.set(column.as_ref(), value);
        }
        row
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.0.get(column).map(String::as_str)
    }

    pub fn has(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    pub fn set(&mut self, column: &str, value: impl Into<String>) {
        let written = column_as_written(column);
        let normalised = normalise_column(column);
        // An explicit current-name column beats its legacy alias.
        if normalised != written && self.has(&normalised) {
            return;
        }
        self.0.insert(normalised, value.into());
    }

    pub fn remove(&mut self, column: &str) -> Option<String> {
        self.0.remove(column)
    }
}

impl From<&Event> for RawRow {
    fn from(event: &Event) -> Self {
        Self::from_pairs([
            (COL_DATE, event.date.format("%Y-%m-%d").to_string()),
            (COL_KIND, event.kind.as_str().to_string()),
            (COL_STAKE, event.stake.to_string()),
            (COL_ODDS, event.odds.to_string()),
            (COL_OUTCOME, event.outcome.as_str().to_string()),
            (COL_NET_DELTA, event.net_delta.to_string()),
            (COL_RUNNING_BALANCE, event.running_balance.to_string()),
            (COL_LABEL, event.label.clone()),
        ])
    }
}

fn column_as_written(column: &str) -> String {
    column.trim_start_matches('\u{feff}').trim().to_lowercase()
}

fn normalise_column(column: &str) -> String {
    let column = column_as_written(column);
    LEGACY_ALIASES
        .iter()
        .find(|(legacy, _)| *legacy == column)
        .map(|(_, current)| current.to_string())
        .unwrap_or(column)
}

/// Sibling file a store writes before renaming it over `path`, so a failed
/// write leaves the previous content in place.
fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write through `write` into the staging file, then move it over `path`.
fn replace_file<F>(path: &Path, write: F) -> Result<(), StoreError>
where
    F: FnOnce(&Path) -> Result<(), StoreError>,
{
    let staging = staging_path(path);
    if let Err(e) = write(&staging) {
        let _ = std::fs::remove_file(&staging);
        return Err(e);
    }
    std::fs::rename(&staging, path)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Store contract
// ---------------------------------------------------------------------------

/// Outcome of reading the store.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadResult {
    /// At least one row was read.
    Valid(Vec<RawRow>),
    /// Nothing persisted yet (or nothing readable).
    Empty,
    /// Content exists but cannot be decoded as rows.
    Malformed(String),
}

impl LoadResult {
    pub fn from_rows(rows: Vec<RawRow>) -> Self {
        if rows.is_empty() {
            LoadResult::Empty
        } else {
            LoadResult::Valid(rows)
        }
    }
}

/// Transport-level failure while writing the store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Abstract ledger storage.
///
/// `load` never fails: absence of data is `Empty`, undecodable data is
/// `Malformed`. `save` replaces everything previously persisted.
#[cfg_attr(test, mockall::automock)]
pub trait LedgerStore: Send + Sync {
    fn load(&self) -> LoadResult;

    fn save(&self, rows: &[RawRow]) -> Result<(), StoreError>;
}

/// Build the store selected in configuration.
pub fn build_store(cfg: &StorageConfig) -> Result<Box<dyn LedgerStore>> {
    match cfg.backend.as_str() {
        "csv" => {
            let delimiter = cfg.delimiter_byte()?;
            Ok(Box::new(CsvFileStore::with_delimiter(&cfg.path, delimiter)))
        }
        "json" => Ok(Box::new(JsonFileStore::new(&cfg.path))),
        "memory" => Ok(Box::new(MemoryStore::new())),
        other => bail!("Unknown storage backend: {other} (expected csv, json or memory)"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
