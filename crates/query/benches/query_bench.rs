//! Benchmarks for query operations.
//!
//! These benchmarks measure execution time by:
//! 1. Using iter_batched to exclude setup from measurement
//! 2. Using shuffled data to avoid sorted-input shortcuts
//! 3. Comparing eager, lazy in-memory and streaming execution of the same query

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use std::sync::Arc;
use strata_core::{Column, Table};
use strata_query::ast::{col, lit, SortOrder};
use strata_query::context::{EngineConfig, ExecutionContext, ExecutionMode};
use strata_query::executor::{EagerExecutor, FilterExecutor, LazyExecutor, SortExecutor};
use strata_query::planner::{LogicalPlan, MemorySource};

// ============================================================================
// Data Generation Utilities
// ============================================================================

/// Simple LCG for reproducible pseudo-random shuffling
fn shuffle_indices(count: usize, seed: u64) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..count).collect();
    let mut s = seed;
    for i in (1..count).rev() {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        let j = (s as usize) % (i + 1);
        indices.swap(i, j);
    }
    indices
}

/// Creates a table with columns `a` (shuffled ids), `b` (a / 10) and `g` (a % 10).
fn create_table(count: usize) -> Table {
    let ids: Vec<i64> = shuffle_indices(count, 12345)
        .into_iter()
        .map(|i| i as i64)
        .collect();
    Table::new(vec![
        Column::new("a", ids.clone()).unwrap(),
        Column::new("b", ids.iter().map(|i| *i as f64 / 10.0).collect::<Vec<_>>()).unwrap(),
        Column::new("g", ids.iter().map(|i| i % 10).collect::<Vec<_>>()).unwrap(),
    ])
    .unwrap()
}

fn context() -> Arc<ExecutionContext> {
    Arc::new(ExecutionContext::new(EngineConfig::default()))
}

// ============================================================================
// Single-Operator Benchmarks
// ============================================================================

fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter");

    for size in [1_000, 10_000, 100_000].iter() {
        let table = create_table(*size);
        let predicate = col("a").gt(lit((*size / 2) as i64)); // 50% selectivity

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(FilterExecutor::new(&predicate).execute(&table)))
        });
    }

    group.finish();
}

fn bench_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort");
    let by = vec![(col("g"), SortOrder::Asc), (col("a"), SortOrder::Desc)];

    for size in [1_000, 10_000, 100_000].iter() {
        let table = create_table(*size);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(SortExecutor::new(&by).execute(&table)))
        });
    }

    group.finish();
}

fn bench_group_by(c: &mut Criterion) {
    let mut group = c.benchmark_group("group_by");
    let eager = EagerExecutor::new(context());

    for size in [1_000, 10_000, 100_000].iter() {
        let table = create_table(*size);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                black_box(eager.group_by_agg(
                    &table,
                    &[col("g")],
                    &[col("a").sum(), col("b").mean(), col("a").n_unique().alias("distinct")],
                ))
            })
        });
    }

    group.finish();
}

// ============================================================================
// Eager vs Lazy Benchmarks
// ============================================================================

/// Benchmark: filter a > N / 2, then select b + 1, eagerly and lazily.
fn bench_eager_vs_lazy(c: &mut Criterion) {
    let mut group = c.benchmark_group("eager_vs_lazy");
    let size = 100_000;
    let table = create_table(size);
    let predicate = col("a").gt(lit((size / 2) as i64));
    let exprs = vec![(col("b") + lit(1i64)).alias("b1")];

    let eager = EagerExecutor::new(context());
    group.bench_function("eager", |b| {
        b.iter(|| {
            let filtered = eager.filter(&table, &predicate).unwrap();
            black_box(eager.select(&filtered, &exprs))
        })
    });

    let lazy = LazyExecutor::new(context());
    let plan = LogicalPlan::select(
        LogicalPlan::filter(
            LogicalPlan::scan(Arc::new(MemorySource::new(table.clone()))),
            predicate.clone(),
        ),
        exprs.clone(),
    );
    group.bench_function("lazy", |b| {
        b.iter(|| black_box(lazy.collect_with_mode(&plan, ExecutionMode::InMemory)))
    });

    for batch_size in [1_000, 10_000].iter() {
        group.bench_with_input(
            BenchmarkId::new("streaming", batch_size),
            batch_size,
            |b, &batch_size| {
                b.iter(|| {
                    black_box(lazy.collect_with_mode(&plan, ExecutionMode::Streaming { batch_size }))
                })
            },
        );
    }

    group.finish();
}

/// Benchmark: planning overhead, which is paid on every collect.
fn bench_optimize(c: &mut Criterion) {
    let mut group = c.benchmark_group("optimize");
    let table = create_table(10);

    group.bench_function("filter_select_sort", |b| {
        b.iter_batched(
            || {
                LogicalPlan::sort(
                    LogicalPlan::select(
                        LogicalPlan::filter(
                            LogicalPlan::scan(Arc::new(MemorySource::new(table.clone()))),
                            col("a").gt(lit(250i64) * lit(2i64)).and(lit(true)),
                        ),
                        vec![col("a"), col("b")],
                    ),
                    vec![(col("b"), SortOrder::Desc)],
                )
            },
            |plan| black_box(strata_query::optimizer::Optimizer::new().optimize(plan)),
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_filter,
    bench_sort,
    bench_group_by,
    bench_eager_vs_lazy,
    bench_optimize,
);

criterion_main!(benches);
