//! Delimited text file store.
//!
//! One header row followed by one row per event. Semicolon is the
//! default separator so that decimal commas in hand-edited files do not
//! split cells.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::{replace_file, LedgerStore, LoadResult, RawRow, StoreError, COLUMNS};

pub struct CsvFileStore {
    path: PathBuf,
    delimiter: u8,
}

impl CsvFileStore {
    pub const DEFAULT_DELIMITER: u8 = b';';

    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::with_delimiter(path, Self::DEFAULT_DELIMITER)
    }

    pub fn with_delimiter(path: impl AsRef<Path>, delimiter: u8) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            delimiter,
        }
    }

    fn read_rows(&self, reader: impl Read) -> Result<Vec<RawRow>, csv::Error> {
        let mut csv = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv.headers()?.clone();
        let mut rows = Vec::new();
        for record in csv.records() {
            let record = record?;
            rows.push(RawRow::from_pairs(headers.iter().zip(record.iter())));
        }
        Ok(rows)
    }
}

impl LedgerStore for CsvFileStore {
    fn load(&self) -> LoadResult {
        let path = self.path.display().to_string();

        if !self.path.exists() {
            info!(path = %path, "No ledger file found");
            return LoadResult::Empty;
        }

        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) => {
                warn!(path = %path, error = %e, "Failed to open ledger file, treating as empty");
                return LoadResult::Empty;
            }
        };

        match self.read_rows(file) {
            Ok(rows) => {
                debug!(path = %path, rows = rows.len(), "Ledger file read");
                LoadResult::from_rows(rows)
            }
            Err(e) => LoadResult::Malformed(format!("{path}: {e}")),
        }
    }

    fn save(&self, rows: &[RawRow]) -> Result<(), StoreError> {
        replace_file(&self.path, |staging| {
            let mut csv = csv::WriterBuilder::new()
                .delimiter(self.delimiter)
                .terminator(csv::Terminator::Any(b'\n'))
                .from_path(staging)?;

            csv.write_record(COLUMNS)?;
            for row in rows {
                csv.write_record(COLUMNS.iter().map(|col| row.get(col).unwrap_or("")))?;
            }
            csv.flush()?;
            Ok(())
        })?;

        debug!(path = %self.path.display(), rows = rows.len(), "Ledger file written");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
