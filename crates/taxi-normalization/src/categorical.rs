//! Dictionary encoding for low-cardinality columns.

use polars::prelude::*;

/// The categorical dtype used for every encoded column.
///
/// All columns share the global category registry, so equal values encode to
/// the same category across frames.
pub fn categorical_dtype() -> DataType {
    DataType::from_categories(Categories::global())
}

/// True for dictionary-encoded dtypes.
pub fn is_categorical(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Categorical(..) | DataType::Enum(..))
}

/// Re-encode a series as categorical through its text form.
pub(crate) fn encode_categorical(series: &Series) -> PolarsResult<Series> {
    series.cast(&DataType::String)?.cast(&categorical_dtype())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_numbers_by_text() {
        let series = Series::new("code".into(), &[1i8, 2, 1]);
        let encoded = encode_categorical(&series).unwrap();
        assert!(is_categorical(encoded.dtype()));

        let back = encoded.cast(&DataType::String).unwrap();
        let values: Vec<Option<&str>> = back.str().unwrap().iter().collect();
        assert_eq!(values, vec![Some("1"), Some("2"), Some("1")]);
    }
}
