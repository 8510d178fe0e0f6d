//! Configuration for a pipeline run.
//!
//! A [`PipelineConfig`] is assembled once (TOML file, then CLI overrides) and
//! handed to each stage as the sub-options it needs. Nothing here is global.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Default distinct-value ratio below which numeric columns become categorical.
pub const DEFAULT_CATEGORICAL_THRESHOLD: f64 = 0.05;

/// Target-table replacement policy for a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WriteMode {
    /// Drop any existing rows and write the table fresh.
    #[default]
    Replace,
    /// Add rows to an existing table (created if absent).
    Append,
    /// Refuse to touch a table that already exists.
    FailIfExists,
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WriteMode::Replace => "replace",
            WriteMode::Append => "append",
            WriteMode::FailIfExists => "fail-if-exists",
        };
        f.write_str(name)
    }
}

/// Options for the type normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeOptions {
    /// Distinct/row ratio below which a numeric column is re-encoded as categorical.
    pub categorical_threshold: f64,
    /// Columns that are only width-narrowed, never made categorical.
    pub keep_numeric: BTreeSet<String>,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            categorical_threshold: DEFAULT_CATEGORICAL_THRESHOLD,
            keep_numeric: BTreeSet::new(),
        }
    }
}

impl NormalizeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_categorical_threshold(mut self, threshold: f64) -> Self {
        self.categorical_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_keep_numeric<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keep_numeric.extend(columns.into_iter().map(Into::into));
        self
    }
}

/// Destination warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarehouseConfig {
    /// Root directory of the Parquet warehouse.
    pub root: PathBuf,
    /// Dataset (namespace) receiving the tables.
    pub dataset: String,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("warehouse"),
            dataset: "taxi_star".to_string(),
        }
    }
}

/// Everything a pipeline run needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PipelineConfig {
    /// Trip extract to read.
    pub input: Option<PathBuf>,
    pub warehouse: WarehouseConfig,
    pub normalize: NormalizeOptions,
    /// Abort before loading if any dimension failed to build.
    pub fail_on_dimension_error: bool,
}

impl PipelineConfig {
    /// Read a TOML config file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        let threshold = self.normalize.categorical_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::InvalidThreshold { value: threshold });
        }
        if self.warehouse.dataset.trim().is_empty() {
            return Err(ConfigError::EmptyDataset);
        }
        Ok(())
    }
}
