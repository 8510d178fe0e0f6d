//! Warehouse loading for the taxi star schema.
//!
//! A [`Warehouse`] stores named tables grouped into datasets:
//!
//! - [`ParquetWarehouse`]: one Parquet file per table under
//!   `<root>/<dataset>/<table>.parquet`
//! - [`MemoryWarehouse`]: tables held in memory, for tests and dry runs

mod error;
mod hash;
mod memory;
mod parquet;
mod table;

use polars::prelude::DataFrame;
use taxi_model::WriteMode;

pub use error::{Result, WarehouseError};
pub use hash::compute_file_hash;
pub use memory::MemoryWarehouse;
pub use parquet::ParquetWarehouse;
pub use table::{LoadOutcome, TableInfo, TableRef};

/// A destination for finished tables.
pub trait Warehouse {
    /// Write `df` to `target` under `mode`, creating the dataset if absent.
    fn load(&mut self, df: &DataFrame, target: &TableRef, mode: WriteMode) -> Result<LoadOutcome>;

    /// Metadata of a stored table.
    fn describe(&self, target: &TableRef) -> Result<TableInfo>;

    /// Read a stored table back.
    fn read(&self, target: &TableRef) -> Result<DataFrame>;

    fn exists(&self, target: &TableRef) -> bool;

    /// Append `df` to an existing table in slices of `chunk_size` rows.
    ///
    /// Stops at the first failing slice; the error carries the number of rows
    /// already appended.
    fn append_in_chunks(
        &mut self,
        df: &DataFrame,
        target: &TableRef,
        chunk_size: usize,
    ) -> Result<usize> {
        if chunk_size == 0 {
            return Err(WarehouseError::InvalidChunkSize);
        }
        if !self.exists(target) {
            return Err(WarehouseError::TableNotFound {
                table: target.clone(),
            });
        }

        let mut loaded = 0usize;
        while loaded < df.height() {
            let chunk = df.slice(loaded as i64, chunk_size);
            match self.load(&chunk, target, WriteMode::Append) {
                Ok(outcome) => {
                    loaded += outcome.rows;
                    tracing::debug!(table = %target, loaded, "Appended chunk");
                }
                Err(err) => {
                    return Err(WarehouseError::PartialAppend {
                        table: target.clone(),
                        rows_loaded: loaded,
                        source: Box::new(err),
                    });
                }
            }
        }

        Ok(loaded)
    }
}
