//! In-memory warehouse.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use polars::prelude::DataFrame;
use taxi_model::WriteMode;

use crate::error::{Result, WarehouseError};
use crate::table::{LoadOutcome, TableInfo, TableRef, append_frames};
use crate::Warehouse;

/// Tables held in memory with the same write semantics as the Parquet
/// warehouse.
#[derive(Debug, Default)]
pub struct MemoryWarehouse {
    tables: BTreeMap<TableRef, (DataFrame, DateTime<Utc>)>,
}

impl MemoryWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored tables in name order.
    pub fn tables(&self) -> impl Iterator<Item = &TableRef> {
        self.tables.keys()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl Warehouse for MemoryWarehouse {
    fn load(&mut self, df: &DataFrame, target: &TableRef, mode: WriteMode) -> Result<LoadOutcome> {
        target.validate()?;

        let stored = match (mode, self.tables.get(target)) {
            (WriteMode::FailIfExists, Some(_)) => {
                return Err(WarehouseError::TableExists {
                    table: target.clone(),
                });
            }
            (WriteMode::Append, Some((existing, _))) => append_frames(target, existing, df)?,
            _ => df.clone(),
        };

        let outcome = LoadOutcome {
            table: target.clone(),
            mode,
            rows: df.height(),
            columns: df.width(),
            total_rows: stored.height(),
        };
        self.tables.insert(target.clone(), (stored, Utc::now()));
        tracing::info!(
            table = %target,
            rows = outcome.rows,
            columns = outcome.columns,
            "Loaded {} rows and {} columns into memory",
            outcome.rows,
            outcome.columns
        );
        Ok(outcome)
    }

    fn describe(&self, target: &TableRef) -> Result<TableInfo> {
        let (df, modified) = self.tables.get(target).ok_or_else(|| WarehouseError::TableNotFound {
            table: target.clone(),
        })?;
        let mut info = TableInfo::from_frame(target, df);
        info.modified = Some(*modified);
        Ok(info)
    }

    fn read(&self, target: &TableRef) -> Result<DataFrame> {
        self.tables
            .get(target)
            .map(|(df, _)| df.clone())
            .ok_or_else(|| WarehouseError::TableNotFound {
                table: target.clone(),
            })
    }

    fn exists(&self, target: &TableRef) -> bool {
        self.tables.contains_key(target)
    }
}
