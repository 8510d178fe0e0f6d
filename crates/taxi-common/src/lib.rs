//! Shared utilities for the taxi star-schema crates.
//!
//! This crate provides common helpers used across the workspace, mostly
//! around reading Polars columns in a type-agnostic way.

pub mod polars;

// Re-export commonly used functions at crate root for convenience
pub use polars::{column_key_strings, datetime_millis, millis_to_naive, parse_i64};
