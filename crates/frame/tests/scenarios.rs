//! End-to-end scenarios through the frame API.

use std::sync::Arc;
use strata_frame::logging;
use strata_frame::prelude::*;
use strata_frame::{EngineConfig, ExecutionContext};

fn vehicles() -> DataFrame {
    DataFrame::new(vec![
        Column::new("Model", vec!["Leaf", "Model 3", "Bolt", "Prius Prime", "Ioniq"]).unwrap(),
        Column::new("Electric Range", vec![21i64, 259, 239, 84, 293]).unwrap(),
    ])
    .unwrap()
}

fn values(df: &DataFrame, name: &str) -> Vec<Value> {
    df.column(name).unwrap().iter().collect()
}

fn under_100() -> Expr {
    col("Electric Range").lt(lit(100i64)).alias("under_100_range")
}

#[test]
fn test_filter_short_range() {
    logging::init_for_tests();
    let df = vehicles();
    let short = df.filter(col("Electric Range").lt(lit(100i64))).unwrap();
    assert_eq!(values(&short, "Electric Range"), vec![Value::from(21i64), Value::from(84i64)]);
    assert_eq!(short.column_names(), vec!["Model", "Electric Range"]);
    // The original frame is untouched.
    assert_eq!(df.height(), 5);
}

#[test]
fn test_derived_flag_and_group_count() {
    logging::init_for_tests();
    let df = vehicles().with_columns([under_100()]).unwrap();
    assert_eq!(
        values(&df, "under_100_range"),
        [true, false, false, true, false].map(Value::from).to_vec()
    );

    let counts = df
        .group_by([col("under_100_range")])
        .agg([len()])
        .unwrap()
        .sort([(col("under_100_range"), SortOrder::Asc)])
        .unwrap();
    assert_eq!(counts.column_names(), vec!["under_100_range", "len"]);
    assert_eq!(
        values(&counts, "under_100_range"),
        vec![Value::from(false), Value::from(true)]
    );
    assert_eq!(values(&counts, "len"), vec![Value::from(3i64), Value::from(2i64)]);
}

#[test]
fn test_lazy_matches_eager() {
    logging::init_for_tests();
    let df = vehicles();
    let eager = df
        .with_columns([under_100()])
        .unwrap()
        .group_by([col("under_100_range")])
        .agg([len(), col("Electric Range").mean().alias("mean_range")])
        .unwrap();

    let lazy = df
        .lazy()
        .with_columns([under_100()])
        .group_by([col("under_100_range")])
        .agg([len(), col("Electric Range").mean().alias("mean_range")]);

    assert_eq!(lazy.clone().with_streaming(false).collect().unwrap(), eager);
    assert_eq!(
        lazy.with_streaming(true).with_batch_size(2).collect().unwrap(),
        eager
    );
}

fn large_frame() -> DataFrame {
    let n = 250_000i64;
    DataFrame::new(vec![
        Column::new("id", (0..n).collect::<Vec<_>>()).unwrap(),
        Column::new("range", (0..n).map(|i| (i * 37) % 400).collect::<Vec<_>>()).unwrap(),
    ])
    .unwrap()
}

#[test]
fn test_large_stream_full_pipeline() {
    logging::init_for_tests();
    let df = large_frame();
    let eager = df
        .with_columns([(col("range") * lit(2i64)).alias("double")])
        .unwrap()
        .filter(col("id").ge(lit(0i64)))
        .unwrap();

    let streamed = df
        .lazy()
        .with_columns([(col("range") * lit(2i64)).alias("double")])
        .filter(col("id").ge(lit(0i64)))
        .with_streaming(true)
        .with_batch_size(10)
        .collect()
        .unwrap();

    assert_eq!(streamed.height(), 250_000);
    assert_eq!(streamed, eager);
}

#[test]
fn test_large_stream_grouped() {
    logging::init_for_tests();
    let df = large_frame();
    let eager = df
        .group_by([col("range")])
        .agg([len(), col("id").sum().alias("id_sum")])
        .unwrap();

    let streamed = df
        .lazy()
        .group_by([col("range")])
        .agg([len(), col("id").sum().alias("id_sum")])
        .with_streaming(true)
        .with_batch_size(10)
        .collect()
        .unwrap();

    assert_eq!(streamed.height(), 400);
    let total: i64 = streamed
        .column("len")
        .unwrap()
        .iter()
        .filter_map(|v| v.as_i64())
        .sum();
    assert_eq!(total, 250_000);
    assert_eq!(streamed, eager);
}

#[test]
fn test_large_stream_with_limit() {
    logging::init_for_tests();
    let df = large_frame();

    let eager = df
        .filter(col("range").lt(lit(100i64)))
        .unwrap()
        .with_columns([(col("range") * lit(2i64)).alias("double")])
        .unwrap()
        .head(1_000);

    let streamed = df
        .lazy()
        .filter(col("range").lt(lit(100i64)))
        .with_columns([(col("range") * lit(2i64)).alias("double")])
        .head(1_000)
        .with_streaming(true)
        .with_batch_size(10)
        .collect()
        .unwrap();

    assert_eq!(streamed.height(), 1_000);
    assert_eq!(streamed, eager);
}

#[test]
fn test_collect_is_repeatable() {
    logging::init_for_tests();
    let lf = vehicles()
        .lazy()
        .filter(col("Electric Range").gt(lit(200i64)))
        .sort([(col("Electric Range"), SortOrder::Desc)]);
    let first = lf.collect().unwrap();
    let second = lf.collect().unwrap();
    assert_eq!(first, second);
    assert_eq!(
        values(&first, "Model"),
        vec![Value::from("Ioniq"), Value::from("Model 3"), Value::from("Bolt")]
    );
}

#[test]
fn test_empty_filter_keeps_schema() {
    logging::init_for_tests();
    let df = vehicles();
    let none = df.filter(col("Electric Range").gt(lit(10_000i64))).unwrap();
    assert_eq!(none.height(), 0);
    assert_eq!(none.schema(), df.schema());

    let lazy = df
        .lazy()
        .filter(col("Electric Range").gt(lit(10_000i64)))
        .with_streaming(true)
        .collect()
        .unwrap();
    assert_eq!(lazy.height(), 0);
    assert_eq!(lazy.schema(), df.schema());
}

#[test]
fn test_errors_name_the_step() {
    logging::init_for_tests();
    let err = vehicles().filter(col("Model")).unwrap_err();
    assert!(err.to_string().starts_with("FILTER"), "{err}");

    let err = vehicles()
        .lazy()
        .select([col("Battery")])
        .collect()
        .unwrap_err();
    assert!(err.to_string().contains("Battery"), "{err}");
}

#[test]
fn test_custom_context() {
    logging::init_for_tests();
    let ctx = Arc::new(ExecutionContext::new(
        EngineConfig::default()
            .with_parallelism(1)
            .with_streaming(true)
            .with_batch_size(1),
    ));
    let lf = vehicles().lazy().with_context(Arc::clone(&ctx));
    let out = lf
        .with_columns([under_100()])
        .filter(col("under_100_range"))
        .collect()
        .unwrap();
    assert_eq!(out.height(), 2);
}

#[test]
fn test_explain_shows_pushdown() {
    logging::init_for_tests();
    let lf = vehicles()
        .lazy()
        .filter(col("Electric Range").lt(lit(100i64)))
        .select([col("Model")]);
    let raw = lf.explain(false).unwrap();
    let optimized = lf.explain(true).unwrap();
    assert!(raw.contains("FILTER"), "{raw}");
    assert_ne!(raw, optimized);
}

#[test]
fn test_csv_round_trip() {
    logging::init_for_tests();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vehicles.csv");
    let df = vehicles();
    df.write_csv(&path, &CsvOptions::default()).unwrap();

    let read = read_csv(&path, &CsvOptions::default()).unwrap();
    assert_eq!(read, df);

    let out = dir.path().join("short.csv");
    let rows = scan_csv(&path, &CsvOptions::default())
        .unwrap()
        .filter(col("Electric Range").lt(lit(100i64)))
        .sink_csv(&out, &CsvOptions::default())
        .unwrap();
    assert_eq!(rows, 2);
    let short = read_csv(&out, &CsvOptions::default()).unwrap();
    assert_eq!(values(&short, "Model"), vec![Value::from("Leaf"), Value::from("Prius Prime")]);
}

#[test]
fn test_csv_options_follow_default_context() {
    logging::init_for_tests();
    let context = strata_frame::default_context();
    let config = context.config();
    let options = csv_options();
    assert_eq!(options.infer_schema_rows, config.infer_schema_rows);
    assert_eq!(options.batch_size, config.batch_size);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vehicles.csv");
    let df = vehicles();
    df.write_csv(&path, &options).unwrap();
    assert_eq!(read_csv(&path, &options).unwrap(), df);
}
