//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.

use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub ledger: LedgerConfig,
    pub storage: StorageConfig,
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LedgerConfig {
    /// Balance of the anchor event when a fresh ledger is created.
    pub starting_balance: Decimal,
    /// Display symbol only; no conversion is ever performed.
    #[serde(default = "default_currency")]
    pub currency: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// "csv" | "json" | "memory"
    pub backend: String,
    #[serde(default)]
    pub path: String,
    /// Single-character field separator for the csv backend.
    #[serde(default)]
    pub delimiter: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    pub enabled: bool,
    pub port: u16,
}

fn default_currency() -> String {
    "€".to_string()
}

impl StorageConfig {
    /// The csv delimiter as a byte, defaulting to `;`.
    pub fn delimiter_byte(&self) -> Result<u8> {
        match self.delimiter.as_deref() {
            None => Ok(b';'),
            Some(d) if d.len() == 1 => Ok(d.as_bytes()[0]),
            Some(d) => bail!("Delimiter must be a single ASCII character, got {d:?}"),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::parse(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Parse configuration from TOML text.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        if config.storage.backend != "memory" && config.storage.path.trim().is_empty() {
            bail!("storage.path is required for the {} backend", config.storage.backend);
        }
        if config.storage.backend == "csv" {
            config.storage.delimiter_byte()?;
        }
        Ok(config)
    }
}
