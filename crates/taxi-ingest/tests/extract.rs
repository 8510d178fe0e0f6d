use std::fs;
use std::path::PathBuf;

use polars::prelude::DataType;
use taxi_ingest::{IngestError, IngestOptions, check_required_columns, read_trip_extract};
use taxi_model::StarSchema;

const HEADER: &str = "VendorID,tpep_pickup_datetime,tpep_dropoff_datetime,passenger_count,trip_distance,pickup_longitude,pickup_latitude,RatecodeID,store_and_fwd_flag,dropoff_longitude,dropoff_latitude,payment_type,fare_amount,extra,mta_tax,tip_amount,tolls_amount,improvement_surcharge,total_amount";

fn temp_file(name: &str, contents: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("write file");
    (dir, path)
}

#[test]
fn reads_taxi_extract_with_all_source_columns() {
    let contents = format!(
        "{HEADER}\n\
         1,2016-03-01 00:00:00,2016-03-01 00:07:55,1,2.5,-73.97674560546875,40.765151977539062,1,N,-74.004264831542969,40.746128082275391,1,9,0.5,0.5,2.05,0,0.3,12.35\n\
         2,2016-03-01 00:00:00,2016-03-01 00:11:06,1,2.9,-73.983482360839844,40.767925262451172,1,N,-74.005943298339844,40.733165740966797,1,11,0.5,0.5,3.05,0,0.3,15.35\n"
    );
    let (_dir, path) = temp_file("yellow_tripdata.csv", &contents);

    let df = read_trip_extract(&path, &IngestOptions::default()).expect("read extract");
    assert_eq!(df.height(), 2);
    assert_eq!(df.width(), 19);

    let schema = StarSchema::taxi_trips();
    check_required_columns(&df, &schema.source_columns()).expect("all columns present");

    // Timestamps are left as text for the normalizer.
    let pickup = df.column("tpep_pickup_datetime").expect("pickup column");
    assert_eq!(pickup.dtype(), &DataType::String);
    assert_eq!(df.column("VendorID").expect("vendor").dtype(), &DataType::Int64);
}

#[test]
fn reports_missing_source_columns() {
    let (_dir, path) = temp_file(
        "partial.csv",
        "VendorID,tpep_pickup_datetime\n1,2016-03-01 00:00:00\n",
    );
    let df = read_trip_extract(&path, &IngestOptions::default()).expect("read extract");

    let err = check_required_columns(&df, &StarSchema::taxi_trips().source_columns())
        .expect_err("columns missing");
    match err {
        IngestError::MissingColumns { columns } => {
            assert_eq!(columns.len(), 17);
            assert!(columns.contains(&"payment_type".to_string()));
            assert!(!columns.contains(&"VendorID".to_string()));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn default_inference_sees_late_floats() {
    let mut contents = String::from("a\n");
    for _ in 0..20 {
        contents.push_str("1\n");
    }
    contents.push_str("1.5\n");
    let (_dir, path) = temp_file("late.csv", &contents);

    let df = read_trip_extract(&path, &IngestOptions::default()).expect("read extract");
    assert_eq!(df.column("a").expect("a").dtype(), &DataType::Float64);
}

#[test]
fn short_inference_window_is_still_available() {
    let mut contents = String::from("a\n");
    for _ in 0..20 {
        contents.push_str("1\n");
    }
    contents.push_str("1.5\n");
    let (_dir, path) = temp_file("late.csv", &contents);

    let options = IngestOptions::default().with_infer_schema_length(Some(5));
    assert!(matches!(
        read_trip_extract(&path, &options),
        Err(IngestError::CsvParse { .. })
    ));
}
