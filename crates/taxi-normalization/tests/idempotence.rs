use polars::prelude::*;
use proptest::prelude::*;
use taxi_model::NormalizeOptions;
use taxi_normalization::{ColumnOutcome, normalize_types};

fn frame(ints: Vec<Option<i64>>, floats: Vec<Option<f64>>, texts: Vec<Option<String>>) -> DataFrame {
    let height = ints.len().min(floats.len()).min(texts.len());
    DataFrame::new(vec![
        Series::new("ints".into(), &ints[..height]).into_column(),
        Series::new("floats".into(), &floats[..height]).into_column(),
        Series::new("texts".into(), &texts[..height]).into_column(),
    ])
    .unwrap()
}

fn numeric_text() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        (-1000i64..1000).prop_map(|v| Some(v.to_string())),
        (-1000i64..1000).prop_map(|v| Some(format!("{}.25", v))),
    ]
}

proptest! {
    /// Normalizing already-normalized output converts nothing and changes no value.
    #[test]
    fn normalizer_output_is_a_fixed_point(
        ints in prop::collection::vec(prop::option::of(-100_000i64..100_000), 1..60),
        floats in prop::collection::vec(prop::option::of(-1.0e6f64..1.0e6), 1..60),
        texts in prop::collection::vec(numeric_text(), 1..60),
        threshold in 0.0f64..0.5,
    ) {
        let df = frame(ints, floats, texts);
        let options = NormalizeOptions::new().with_categorical_threshold(threshold);

        let (first, _) = normalize_types(&df, &options).unwrap();
        let (second, report) = normalize_types(&first, &options).unwrap();

        prop_assert!(report.columns.iter().all(|c| c.outcome == ColumnOutcome::Unchanged));
        prop_assert_eq!(first.dtypes(), second.dtypes());
        prop_assert!(first.equals_missing(&second));
    }

    /// Narrowing never changes a value.
    #[test]
    fn narrowing_preserves_integers(
        ints in prop::collection::vec(prop::option::of(any::<i64>()), 1..60),
    ) {
        let df = DataFrame::new(vec![Series::new("v".into(), &ints).into_column()]).unwrap();
        let options = NormalizeOptions::new().with_categorical_threshold(0.0);

        let (out, _) = normalize_types(&df, &options).unwrap();
        let widened = out.column("v").unwrap().cast(&DataType::Int64).unwrap();
        let values: Vec<Option<i64>> = widened.i64().unwrap().iter().collect();
        prop_assert_eq!(values, ints);
    }
}
