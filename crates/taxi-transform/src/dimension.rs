//! Dimension construction.
//!
//! A dimension is the raw table projected onto its natural-key columns,
//! deduplicated in first-occurrence order, with a 1-based surrogate key in
//! front and an optional label column resolved through a code lookup.

use std::collections::{BTreeMap, HashSet};

use polars::prelude::*;
use taxi_common::{column_key_strings, parse_i64};
use taxi_model::{DimensionSpec, LabelSpec, StarSchema};

use crate::calendar::build_time_dimension;
use crate::error::DimensionError;
use crate::keys::{NaturalKey, first_missing, natural_key_rows, surrogate_keys};

/// Build one regular dimension from the raw table.
pub fn build_dimension(raw: &DataFrame, spec: &DimensionSpec) -> Result<DataFrame, DimensionError> {
    if let Some(column) = first_missing(raw, &spec.natural_key) {
        return Err(DimensionError::MissingColumn {
            dimension: spec.name.clone(),
            column: column.clone(),
        });
    }

    let keys = natural_key_rows(raw, &spec.natural_key)?;
    let mut seen: HashSet<&NaturalKey> = HashSet::with_capacity(keys.len());
    let keep: Vec<bool> = keys.iter().map(|key| seen.insert(key)).collect();
    let mask = BooleanChunked::from_slice("first_occurrence".into(), &keep);

    let mut dimension = raw.select(spec.natural_key.iter().cloned())?.filter(&mask)?;
    let count = dimension.height();
    dimension.insert_column(0, surrogate_keys(&spec.key_column, count))?;

    if let Some(label) = &spec.lookup {
        let labels = label_column(&dimension, &spec.natural_key[0], label)?;
        dimension.with_column(labels)?;
    }

    tracing::debug!(dimension = %spec.name, rows = count, "Built dimension");
    Ok(dimension)
}

/// Resolve a code column through its lookup. Unknown codes yield null.
fn label_column(df: &DataFrame, code_column: &str, label: &LabelSpec) -> PolarsResult<Series> {
    let labels: Vec<Option<&str>> = column_key_strings(df.column(code_column)?)?
        .iter()
        .map(|code| {
            code.as_deref()
                .and_then(parse_i64)
                .and_then(|code| label.lookup.label(code))
        })
        .collect();
    Ok(Series::new(label.column.as_str().into(), labels))
}

/// Outcome of building every dimension of a schema.
///
/// Each dimension either built or failed on its own; a failure never hides
/// the others.
#[derive(Debug, Default)]
pub struct DimensionSet {
    results: BTreeMap<String, Result<DataFrame, DimensionError>>,
}

impl DimensionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, result: Result<DataFrame, DimensionError>) {
        self.results.insert(name.into(), result);
    }

    pub fn get(&self, name: &str) -> Option<&Result<DataFrame, DimensionError>> {
        self.results.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Result<DataFrame, DimensionError>)> {
        self.results.iter()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Successfully built dimensions, by name.
    pub fn built(&self) -> BTreeMap<String, DataFrame> {
        self.results
            .iter()
            .filter_map(|(name, result)| Some((name.clone(), result.as_ref().ok()?.clone())))
            .collect()
    }

    /// Failed dimensions with their errors.
    pub fn failures(&self) -> impl Iterator<Item = (&String, &DimensionError)> {
        self.results
            .iter()
            .filter_map(|(name, result)| result.as_ref().err().map(|err| (name, err)))
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    /// Apply `f` to every built dimension; a failing `f` turns that entry
    /// into a failure.
    pub fn map_built<F>(self, mut f: F) -> Self
    where
        F: FnMut(&str, DataFrame) -> Result<DataFrame, DimensionError>,
    {
        let results = self
            .results
            .into_iter()
            .map(|(name, result)| {
                let mapped = result.and_then(|df| f(&name, df));
                (name, mapped)
            })
            .collect();
        Self { results }
    }
}

/// Build the time dimension and every regular dimension of `schema`.
pub fn build_dimensions(raw: &DataFrame, schema: &StarSchema) -> DimensionSet {
    let mut set = DimensionSet::new();

    set.insert(schema.time.name.clone(), build_time_dimension(raw, &schema.time));
    for spec in &schema.dimensions {
        set.insert(spec.name.clone(), build_dimension(raw, spec));
    }

    for (name, err) in set.failures() {
        tracing::warn!(dimension = %name, error = %err, "Dimension build failed");
    }
    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use taxi_model::CodeLookup;

    fn strings(df: &DataFrame, name: &str) -> Vec<Option<String>> {
        column_key_strings(df.column(name).unwrap()).unwrap()
    }

    #[test]
    fn deduplicates_in_first_occurrence_order() {
        let raw = df!(
            "VendorID" => [2i64, 1, 2, 1, 2],
            "fare" => [1.0f64, 2.0, 3.0, 4.0, 5.0],
        )
        .unwrap();
        let spec = DimensionSpec::new("vendor_dim", "vendor_key", &["VendorID"])
            .with_lookup("vendor_name", CodeLookup::vendor());

        let dim = build_dimension(&raw, &spec).unwrap();
        assert_eq!(dim.get_column_names(), vec!["vendor_key", "VendorID", "vendor_name"]);
        assert_eq!(strings(&dim, "vendor_key"), vec![Some("1".into()), Some("2".into())]);
        assert_eq!(strings(&dim, "VendorID"), vec![Some("2".into()), Some("1".into())]);
        assert_eq!(
            strings(&dim, "vendor_name"),
            vec![
                Some("VeriFone Inc.".into()),
                Some("Creative Mobile Technologies, LLC".into())
            ]
        );
    }

    #[test]
    fn unknown_code_gets_null_label() {
        let raw = df!("VendorID" => [1i64, 99]).unwrap();
        let spec = DimensionSpec::new("vendor_dim", "vendor_key", &["VendorID"])
            .with_lookup("vendor_name", CodeLookup::vendor());

        let dim = build_dimension(&raw, &spec).unwrap();
        assert_eq!(
            strings(&dim, "vendor_name"),
            vec![Some("Creative Mobile Technologies, LLC".into()), None]
        );
    }

    #[test]
    fn composite_key_treats_null_as_a_value() {
        let raw = df!(
            "lon" => [Some(1.5f64), None, Some(1.5), None, Some(1.5)],
            "lat" => [Some(2.5f64), None, Some(2.5), None, Some(3.5)],
        )
        .unwrap();
        let spec = DimensionSpec::new("loc_dim", "loc_key", &["lon", "lat"]);

        let dim = build_dimension(&raw, &spec).unwrap();
        assert_eq!(dim.height(), 3);
        assert_eq!(strings(&dim, "lon")[1], None);
    }

    #[test]
    fn missing_column_is_named() {
        let raw = df!("VendorID" => [1i64]).unwrap();
        let spec = DimensionSpec::new("rate_code_dim", "rate_code_key", &["RatecodeID"]);

        match build_dimension(&raw, &spec) {
            Err(DimensionError::MissingColumn { dimension, column }) => {
                assert_eq!(dimension, "rate_code_dim");
                assert_eq!(column, "RatecodeID");
            }
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn one_failure_does_not_hide_the_others() {
        let raw = df!("VendorID" => [1i64, 2]).unwrap();
        let set = build_dimensions(&raw, &StarSchema::taxi_trips());

        assert_eq!(set.len(), 6);
        assert!(matches!(set.get("vendor_dim"), Some(Ok(_))));
        assert!(matches!(
            set.get("payment_type_dim"),
            Some(Err(DimensionError::MissingColumn { .. }))
        ));
        assert!(set.has_failures());
        assert_eq!(set.built().len(), 1);
    }
}
