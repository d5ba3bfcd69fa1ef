//! Property-based tests for execution modes.
//!
//! These tests verify that eager execution, lazy in-memory execution and
//! streaming execution produce the same table for randomly generated inputs,
//! batch sizes and worker counts.

use proptest::prelude::*;
use std::sync::Arc;
use strata_core::{Column, Table};
use strata_query::ast::{col, len, lit, Expr, SortOrder};
use strata_query::context::{EngineConfig, ExecutionContext, ExecutionMode};
use strata_query::executor::{EagerExecutor, LazyExecutor, MemorySink};
use strata_query::planner::{LogicalPlan, MemorySource};

/// Strategy for generating one row: nullable int, group key, float, nullable string.
fn row_strategy() -> impl Strategy<Value = (Option<i64>, i64, i64, Option<&'static str>)> {
    (
        prop::option::weighted(0.8, -100i64..100),
        0i64..4,
        -400i64..400,
        prop::option::weighted(0.9, prop::sample::select(vec!["ev", "phev", "hybrid"])),
    )
}

/// Strategy for generating a table with up to `max_rows` rows.
fn table_strategy(max_rows: usize) -> impl Strategy<Value = Table> {
    prop::collection::vec(row_strategy(), 0..max_rows).prop_map(|rows| {
        let a: Vec<Option<i64>> = rows.iter().map(|r| r.0).collect();
        let g: Vec<i64> = rows.iter().map(|r| r.1).collect();
        let x: Vec<f64> = rows.iter().map(|r| r.2 as f64 / 4.0).collect();
        let s: Vec<Option<&str>> = rows.iter().map(|r| r.3).collect();
        Table::new(vec![
            Column::new("a", a).unwrap(),
            Column::new("g", g).unwrap(),
            Column::new("x", x).unwrap(),
            Column::new("s", s).unwrap(),
        ])
        .unwrap()
    })
}

fn context(parallelism: usize) -> Arc<ExecutionContext> {
    Arc::new(ExecutionContext::new(
        EngineConfig::default().with_parallelism(parallelism),
    ))
}

/// Runs `plan` lazily in memory and streaming, returning both results.
fn run_lazy(plan: &LogicalPlan, batch_size: usize, parallelism: usize) -> (Table, Table) {
    let lazy = LazyExecutor::new(context(parallelism));
    let in_memory = lazy.collect_with_mode(plan, ExecutionMode::InMemory).unwrap();
    let streamed = lazy
        .collect_with_mode(plan, ExecutionMode::Streaming { batch_size })
        .unwrap();
    (in_memory, streamed)
}

fn scan(table: &Table) -> LogicalPlan {
    LogicalPlan::scan(Arc::new(MemorySource::new(table.clone())))
}

proptest! {
    /// Property: Filter, with_columns and select agree across all modes.
    #[test]
    fn row_pipeline_is_mode_invariant(
        table in table_strategy(200),
        threshold in -100i64..100,
        batch_size in 1usize..32,
        parallelism in 1usize..4,
    ) {
        let predicate = col("a").gt(lit(threshold)).or(col("s").eq(lit("ev")));
        let derived = vec![
            (col("x") * lit(2i64) + col("a")).alias("y"),
            col("s").str_len().alias("n"),
        ];
        let projection = vec![col("y"), col("g"), col("n"), col("a").is_null().alias("missing")];

        let eager = EagerExecutor::new(context(parallelism));
        let expected = eager.filter(&table, &predicate).unwrap();
        let expected = eager.with_columns(&expected, &derived).unwrap();
        let expected = eager.select(&expected, &projection).unwrap();

        let plan = LogicalPlan::select(
            LogicalPlan::with_columns(LogicalPlan::filter(scan(&table), predicate), derived),
            projection,
        );
        let (in_memory, streamed) = run_lazy(&plan, batch_size, parallelism);
        prop_assert_eq!(&expected, &in_memory);
        prop_assert_eq!(&expected, &streamed);
    }

    /// Property: Grouped aggregation agrees across all modes, for both
    /// exactly mergeable and order-sensitive aggregations.
    #[test]
    fn group_by_is_mode_invariant(
        table in table_strategy(300),
        batch_size in 1usize..50,
        parallelism in 1usize..4,
    ) {
        let keys = vec![col("g"), col("s")];
        let aggs: Vec<Expr> = vec![
            len(),
            col("a").count().alias("count"),
            col("a").sum().alias("sum"),
            col("a").min().alias("min"),
            col("a").max().alias("max"),
            col("a").mean().alias("mean_a"),
            col("x").sum().alias("sum_x"),
            col("x").std().alias("std_x"),
            col("s").first().alias("first"),
            col("a").last().alias("last"),
            col("x").n_unique().alias("distinct"),
        ];

        let eager = EagerExecutor::new(context(parallelism));
        let expected = eager.group_by_agg(&table, &keys, &aggs).unwrap();

        let plan = LogicalPlan::aggregate(scan(&table), keys, aggs);
        let (in_memory, streamed) = run_lazy(&plan, batch_size, parallelism);
        prop_assert_eq!(&expected, &in_memory);
        prop_assert_eq!(&expected, &streamed);
    }

    /// Property: Sort followed by limit agrees across all modes.
    #[test]
    fn sort_limit_is_mode_invariant(
        table in table_strategy(200),
        n in 0usize..50,
        batch_size in 1usize..16,
    ) {
        let by = vec![(col("g"), SortOrder::Desc), (col("a"), SortOrder::Asc)];

        let eager = EagerExecutor::new(context(2));
        let expected = eager.sort(&table, &by).unwrap();
        let expected = eager.limit(&expected, n).unwrap();

        let plan = LogicalPlan::limit(LogicalPlan::sort(scan(&table), by), n);
        let (in_memory, streamed) = run_lazy(&plan, batch_size, 2);
        prop_assert_eq!(&expected, &in_memory);
        prop_assert_eq!(&expected, &streamed);
    }

    /// Property: A sink receives exactly the rows collect returns.
    #[test]
    fn sink_matches_collect(
        table in table_strategy(200),
        batch_size in 1usize..32,
    ) {
        let plan = LogicalPlan::filter(scan(&table), col("x").ge(lit(0i64)));
        let lazy = LazyExecutor::new(Arc::new(ExecutionContext::new(
            EngineConfig::default().with_batch_size(batch_size).with_parallelism(2),
        )));

        let mut sink = MemorySink::new();
        let rows = lazy.sink(&plan, &mut sink).unwrap();
        let collected = lazy.collect(&plan).unwrap();
        prop_assert_eq!(rows, collected.num_rows());
        prop_assert!(sink.batches().iter().all(|b| b.num_rows() <= batch_size));
        prop_assert_eq!(sink.into_table().unwrap(), collected);
    }

    /// Property: Optimization never changes the result.
    #[test]
    fn optimizer_preserves_results(
        table in table_strategy(150),
        threshold in -50i64..50,
    ) {
        let plan = LogicalPlan::filter(
            LogicalPlan::select(
                LogicalPlan::filter(scan(&table), col("g").ne(lit(1i64)).and(lit(true))),
                vec![col("a"), col("g"), (col("x") + lit(1i64) * lit(2i64)).alias("z")],
            ),
            col("a").lt(lit(threshold)),
        );
        let optimized = LazyExecutor::new(context(1)).collect(&plan).unwrap();
        let plain = LazyExecutor::new(Arc::new(ExecutionContext::new(
            EngineConfig::default().with_optimize(false).with_parallelism(1),
        )))
        .collect(&plan)
        .unwrap();
        prop_assert_eq!(optimized, plain);

        // A select of scalars is one row however many rows reach it.
        let plan = LogicalPlan::filter(
            LogicalPlan::select(
                scan(&table),
                vec![lit(1i64).alias("one"), (lit(2i64) * lit(3i64)).alias("six")],
            ),
            lit(threshold).gt(lit(0i64)),
        );
        let optimized = LazyExecutor::new(context(1)).collect(&plan).unwrap();
        let plain = LazyExecutor::new(Arc::new(ExecutionContext::new(
            EngineConfig::default().with_optimize(false).with_parallelism(1),
        )))
        .collect(&plan)
        .unwrap();
        prop_assert_eq!(optimized.num_rows(), usize::from(threshold > 0));
        prop_assert_eq!(optimized, plain);
    }
}
