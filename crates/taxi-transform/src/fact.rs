//! Fact table construction.
//!
//! One fact row per raw row: a 1-based `trip_id`, one foreign key per
//! dimension (resolved by joining on natural keys, never by position), the
//! declared measures and the derived trip duration. A raw value with no
//! matching dimension row gets a null key and is counted.

use std::collections::{BTreeMap, HashMap};

use polars::prelude::*;
use taxi_common::datetime_millis;
use taxi_model::{DimensionSpec, StarSchema, TimeDimensionSpec};

use crate::error::FactError;
use crate::keys::{NaturalKey, first_missing, key_values, natural_key_rows, surrogate_keys};

/// A built fact table with its unresolved-reference counts.
#[derive(Debug, Clone)]
pub struct FactTable {
    pub data: DataFrame,
    /// Foreign-key column → number of rows whose reference did not resolve.
    pub unresolved: BTreeMap<String, usize>,
}

impl FactTable {
    /// Unresolved references across every foreign-key column.
    pub fn unresolved_total(&self) -> usize {
        self.unresolved.values().sum()
    }
}

/// Build the fact table from the raw table and the built dimensions.
///
/// Every dimension `schema` declares must be present in `dimensions`.
pub fn build_fact_table(
    raw: &DataFrame,
    dimensions: &BTreeMap<String, DataFrame>,
    schema: &StarSchema,
) -> Result<FactTable, FactError> {
    let time_dim = require_dimension(dimensions, &schema.time.name)?;
    let regular: Vec<(&DimensionSpec, &DataFrame)> = schema
        .dimensions
        .iter()
        .map(|spec| Ok((spec, require_dimension(dimensions, &spec.name)?)))
        .collect::<Result<_, FactError>>()?;

    if let Some(column) = first_missing(raw, &schema.fact.measures) {
        return Err(FactError::MissingColumn {
            column: column.clone(),
        });
    }

    let height = raw.height();
    let mut columns: Vec<Column> = Vec::with_capacity(
        2 + schema.time.sources.len() + regular.len() + schema.fact.measures.len(),
    );
    let mut unresolved = BTreeMap::new();

    columns.push(surrogate_keys(&schema.fact.id_column, height).into_column());

    let mut keys: Vec<(String, Series, usize)> = resolve_time_keys(raw, &schema.time, time_dim)?;
    for (spec, dim) in &regular {
        let (series, missed) = resolve_dimension_keys(raw, spec, dim)?;
        keys.push((spec.key_column.clone(), series, missed));
    }
    keys.sort_by_key(|(name, _, _)| {
        schema
            .fact
            .key_order
            .iter()
            .position(|ordered| ordered == name)
            .unwrap_or(usize::MAX)
    });
    for (name, series, missed) in keys {
        unresolved.insert(name, missed);
        columns.push(series.into_column());
    }

    for measure in &schema.fact.measures {
        columns.push(raw.column(measure)?.clone());
    }

    let duration = &schema.fact.duration;
    let start = instant_millis(raw, &duration.start)?;
    let end = instant_millis(raw, &duration.end)?;
    let minutes: Vec<Option<f64>> = start
        .iter()
        .zip(&end)
        .map(|(start, end)| duration_minutes((*start)?, (*end)?))
        .collect();
    columns.push(Series::new(duration.column.as_str().into(), minutes).into_column());

    let data = DataFrame::new(columns)?;
    for (column, missed) in unresolved.iter().filter(|(_, missed)| **missed > 0) {
        tracing::debug!(column = %column, unresolved = missed, "Unresolved foreign keys");
    }
    tracing::debug!(fact = %schema.fact.name, rows = data.height(), "Built fact table");

    Ok(FactTable { data, unresolved })
}

/// Minutes between two epoch-millisecond instants, rounded to 2 decimals.
///
/// Negative durations are kept as-is. `None` when the difference overflows.
pub fn duration_minutes(start_millis: i64, end_millis: i64) -> Option<f64> {
    let millis = end_millis.checked_sub(start_millis)?;
    let seconds = millis as f64 / 1000.0;
    Some((seconds / 60.0 * 100.0).round() / 100.0)
}

fn require_dimension<'a>(
    dimensions: &'a BTreeMap<String, DataFrame>,
    name: &str,
) -> Result<&'a DataFrame, FactError> {
    dimensions.get(name).ok_or_else(|| FactError::MissingDimension {
        name: name.to_string(),
    })
}

fn instant_millis(raw: &DataFrame, name: &str) -> Result<Vec<Option<i64>>, FactError> {
    let column = raw.column(name).map_err(|_| FactError::MissingColumn {
        column: name.to_string(),
    })?;
    datetime_millis(column).ok_or_else(|| FactError::NotTimestamp {
        column: name.to_string(),
        dtype: column.dtype().to_string(),
    })
}

fn dimension_column<'a>(
    dimension: &'a DataFrame,
    dimension_name: &str,
    column: &str,
) -> Result<&'a Column, FactError> {
    dimension
        .column(column)
        .map_err(|_| FactError::MissingDimensionColumn {
            dimension: dimension_name.to_string(),
            column: column.to_string(),
        })
}

/// Resolve every raw row's natural key to the dimension's surrogate key.
fn resolve_dimension_keys(
    raw: &DataFrame,
    spec: &DimensionSpec,
    dimension: &DataFrame,
) -> Result<(Series, usize), FactError> {
    if let Some(column) = first_missing(raw, &spec.natural_key) {
        return Err(FactError::MissingColumn {
            column: column.clone(),
        });
    }
    if let Some(column) = first_missing(dimension, &spec.natural_key) {
        return Err(FactError::MissingDimensionColumn {
            dimension: spec.name.clone(),
            column: column.clone(),
        });
    }

    let surrogate = key_values(dimension_column(dimension, &spec.name, &spec.key_column)?)?;
    let lookup: HashMap<NaturalKey, i64> = natural_key_rows(dimension, &spec.natural_key)?
        .into_iter()
        .zip(surrogate)
        .filter_map(|(key, surrogate)| Some((key, surrogate?)))
        .collect();

    let mut missed = 0usize;
    let keys: Vec<Option<i64>> = natural_key_rows(raw, &spec.natural_key)?
        .iter()
        .map(|key| {
            let found = lookup.get(key).copied();
            if found.is_none() {
                missed += 1;
            }
            found
        })
        .collect();

    Ok((Series::new(spec.key_column.as_str().into(), keys), missed))
}

/// Resolve each instant column to time-dimension keys.
///
/// A null instant is a missing value, not an unresolved reference.
fn resolve_time_keys(
    raw: &DataFrame,
    spec: &TimeDimensionSpec,
    dimension: &DataFrame,
) -> Result<Vec<(String, Series, usize)>, FactError> {
    let instant_column = dimension_column(dimension, &spec.name, &spec.instant_column)?;
    let instants = datetime_millis(instant_column).ok_or_else(|| FactError::NotTimestamp {
        column: spec.instant_column.clone(),
        dtype: instant_column.dtype().to_string(),
    })?;
    let surrogate = key_values(dimension_column(dimension, &spec.name, &spec.key_column)?)?;
    let lookup: HashMap<i64, i64> = instants
        .into_iter()
        .zip(surrogate)
        .filter_map(|(instant, key)| Some((instant?, key?)))
        .collect();

    spec.sources
        .iter()
        .map(|source| {
            let mut missed = 0usize;
            let keys: Vec<Option<i64>> = instant_millis(raw, &source.source)?
                .into_iter()
                .map(|instant| {
                    let instant = instant?;
                    let found = lookup.get(&instant).copied();
                    if found.is_none() {
                        missed += 1;
                    }
                    found
                })
                .collect();
            let series = Series::new(source.fact_key.as_str().into(), keys);
            Ok((source.fact_key.clone(), series, missed))
        })
        .collect()
}
