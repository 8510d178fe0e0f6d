//! Parquet-file warehouse.
//!
//! Layout: `<root>/<dataset>/<table>.parquet`. Writes go to a temp file that
//! is renamed into place, so a failed load never leaves a half-written table.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use polars::prelude::*;
use taxi_model::WriteMode;

use crate::Warehouse;
use crate::error::{Result, WarehouseError};
use crate::hash::compute_file_hash;
use crate::table::{LoadOutcome, TableInfo, TableRef, append_frames};

/// A warehouse of Parquet files under one root directory.
#[derive(Debug, Clone)]
pub struct ParquetWarehouse {
    root: PathBuf,
}

impl ParquetWarehouse {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dataset_dir(&self, dataset: &str) -> PathBuf {
        self.root.join(dataset)
    }

    pub fn table_path(&self, target: &TableRef) -> PathBuf {
        self.dataset_dir(&target.dataset)
            .join(format!("{}.parquet", target.table))
    }

    /// Create the dataset directory if it does not exist.
    pub fn ensure_dataset(&self, dataset: &str) -> Result<PathBuf> {
        let dir = self.dataset_dir(dataset);
        if !dir.is_dir() {
            fs::create_dir_all(&dir).map_err(|e| WarehouseError::Io {
                operation: "create directory",
                path: dir.clone(),
                source: e,
            })?;
            tracing::info!(dataset = %dataset, path = %dir.display(), "Created dataset");
        }
        Ok(dir)
    }

    /// Table names stored in `dataset`, sorted.
    pub fn list_tables(&self, dataset: &str) -> Result<Vec<String>> {
        let dir = self.dataset_dir(dataset);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&dir).map_err(|e| WarehouseError::Io {
            operation: "list",
            path: dir.clone(),
            source: e,
        })?;

        let mut tables: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "parquet"))
            .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect();
        tables.sort();
        Ok(tables)
    }

    fn read_file(path: &Path) -> Result<DataFrame> {
        let file = File::open(path).map_err(|e| WarehouseError::Io {
            operation: "open",
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(ParquetReader::new(file).finish()?)
    }

    fn write_file(path: &Path, df: &DataFrame) -> Result<()> {
        let temp_path = path.with_extension("parquet.tmp");
        let mut file = File::create(&temp_path).map_err(|e| WarehouseError::Io {
            operation: "create",
            path: temp_path.clone(),
            source: e,
        })?;

        let mut data = df.clone();
        let written = ParquetWriter::new(&mut file).finish(&mut data);
        if let Err(err) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(err.into());
        }
        file.sync_all().map_err(|e| WarehouseError::Io {
            operation: "sync",
            path: temp_path.clone(),
            source: e,
        })?;
        drop(file);

        fs::rename(&temp_path, path).map_err(|e| WarehouseError::AtomicWriteFailed {
            temp_path: temp_path.clone(),
            target_path: path.to_path_buf(),
            source: e,
        })
    }
}

impl Warehouse for ParquetWarehouse {
    fn load(&mut self, df: &DataFrame, target: &TableRef, mode: WriteMode) -> Result<LoadOutcome> {
        target.validate()?;
        self.ensure_dataset(&target.dataset)?;
        let path = self.table_path(target);

        let stored = match (mode, path.is_file()) {
            (WriteMode::FailIfExists, true) => {
                return Err(WarehouseError::TableExists {
                    table: target.clone(),
                });
            }
            (WriteMode::Append, true) => {
                let existing = Self::read_file(&path)?;
                append_frames(target, &existing, df)?
            }
            _ => df.clone(),
        };

        Self::write_file(&path, &stored)?;

        let outcome = LoadOutcome {
            table: target.clone(),
            mode,
            rows: df.height(),
            columns: df.width(),
            total_rows: stored.height(),
        };
        tracing::info!(
            table = %target,
            mode = %mode,
            path = %path.display(),
            "Loaded {} rows and {} columns",
            outcome.rows,
            outcome.columns
        );
        Ok(outcome)
    }

    fn describe(&self, target: &TableRef) -> Result<TableInfo> {
        target.validate()?;
        let path = self.table_path(target);
        if !path.is_file() {
            return Err(WarehouseError::TableNotFound {
                table: target.clone(),
            });
        }

        let metadata = fs::metadata(&path).map_err(|e| WarehouseError::Io {
            operation: "stat",
            path: path.clone(),
            source: e,
        })?;
        let df = Self::read_file(&path)?;

        let mut info = TableInfo::from_frame(target, &df);
        info.bytes = metadata.len();
        info.modified = metadata.modified().ok().map(DateTime::<Utc>::from);
        info.sha256 = Some(compute_file_hash(&path)?);
        Ok(info)
    }

    fn read(&self, target: &TableRef) -> Result<DataFrame> {
        target.validate()?;
        let path = self.table_path(target);
        if !path.is_file() {
            return Err(WarehouseError::TableNotFound {
                table: target.clone(),
            });
        }
        Self::read_file(&path)
    }

    fn exists(&self, target: &TableRef) -> bool {
        target.validate().is_ok() && self.table_path(target).is_file()
    }
}
