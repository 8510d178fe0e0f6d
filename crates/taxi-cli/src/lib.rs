//! Library side of the taxi star-schema ETL binary.
//!
//! The binary parses flags and prints; everything it runs lives here so the
//! integration tests can drive a full pipeline against any [`Warehouse`].
//!
//! [`Warehouse`]: taxi_warehouse::Warehouse

pub mod config;
pub mod logging;
pub mod pipeline;
pub mod types;
