//! Configuration data structures.
//!
//! Defines the YAML config format: table name, search mode, result window
//! defaults and SQL dialect. Every field has a default, so an empty document
//! is a valid configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::db::schema::DEFAULT_TABLE;
use crate::error::{FulltextError, Result};
use crate::search::dialect::DialectKind;
use crate::search::mode::SearchMode;
use crate::search::options::{DEFAULT_LIMIT, DEFAULT_PER_PAGE};
use crate::types::is_word;

/// Environment variable that overrides [`FulltextConfig::table_name`].
pub const TABLE_ENV: &str = "FULLTEXT_ROW_TABLE";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration.
///
/// Loaded from YAML, then the environment; CLI flags layer on top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FulltextConfig {
    /// Name of the shared searchable table.
    #[serde(default = "default_table_name")]
    pub table_name: String,

    /// Mode flags bound into every query builder made from this config.
    #[serde(default)]
    pub mode: SearchMode,

    /// Row limit when a call gives no limit and no page.
    #[serde(default = "default_limit")]
    pub default_limit: u64,

    /// Page size when neither the call nor the registry supplies one.
    #[serde(default = "default_per_page")]
    pub default_per_page: u64,

    #[serde(default)]
    pub dialect: DialectKind,
}

impl Default for FulltextConfig {
    fn default() -> Self {
        Self {
            table_name: default_table_name(),
            mode: SearchMode::default(),
            default_limit: default_limit(),
            default_per_page: default_per_page(),
            dialect: DialectKind::default(),
        }
    }
}

impl FulltextConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a YAML file, then apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml_str(&text)?;
        config.apply_env()?;
        tracing::debug!(path = %path.display(), table = %config.table_name, "loaded config");
        Ok(config)
    }

    /// Apply `FULLTEXT_ROW_TABLE` from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable source.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(table) = lookup(TABLE_ENV) {
            let table = table.trim();
            if !table.is_empty() {
                self.table_name = table.to_string();
            }
        }
        self.validate()
    }

    /// Reject table names that are not plain identifiers and zero page sizes.
    pub fn validate(&self) -> Result<()> {
        if !is_word(&self.table_name) {
            return Err(FulltextError::InvalidTableName(self.table_name.clone()));
        }
        if self.default_per_page == 0 {
            return Err(FulltextError::Config(
                "default_per_page must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_table_name() -> String {
    DEFAULT_TABLE.to_string()
}

fn default_limit() -> u64 {
    DEFAULT_LIMIT
}

fn default_per_page() -> u64 {
    DEFAULT_PER_PAGE
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
