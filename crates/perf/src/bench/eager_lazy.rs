//! Eager versus lazy execution of the same small query.

use crate::report::Report;
use crate::utils::{format_duration, measure, sequential_frame};
use clap::ValueEnum;
use strata_frame::prelude::*;
use tracing::debug;

/// Query shapes compared between eager and lazy execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Query {
    /// `filter(a > 500)`
    Filter,
    /// `filter(a > 500).with_columns(b as b_double)`
    WithColumns,
    /// `filter(a > 500).group_by(a).agg(mean(b))`
    GroupBy,
}

impl Query {
    pub const ALL: [Query; 3] = [Query::Filter, Query::WithColumns, Query::GroupBy];

    pub fn name(self) -> &'static str {
        match self {
            Query::Filter => "filter",
            Query::WithColumns => "with_columns",
            Query::GroupBy => "group_by",
        }
    }

    fn predicate() -> Expr {
        col("a").gt(lit(500i64))
    }

    pub fn eager(self, df: &DataFrame) -> Result<DataFrame> {
        let filtered = df.filter(Self::predicate())?;
        match self {
            Query::Filter => Ok(filtered),
            Query::WithColumns => filtered.with_columns([col("b").alias("b_double")]),
            Query::GroupBy => filtered
                .group_by([col("a")])
                .agg([col("b").mean()]),
        }
    }

    pub fn lazy(self, df: &DataFrame) -> LazyFrame {
        let lf = df.lazy().filter(Self::predicate());
        match self {
            Query::Filter => lf,
            Query::WithColumns => lf.with_columns([col("b").alias("b_double")]),
            Query::GroupBy => lf.group_by([col("a")]).agg([col("b").mean()]),
        }
    }
}

/// Times `query` both ways over a fresh `rows`-row frame.
///
/// Fails if the two ways disagree.
pub fn run(
    report: &mut Report,
    query: Query,
    rows: usize,
    warmup: usize,
    iterations: usize,
) -> Result<()> {
    println!("  {} ({} rows, {} iterations):", query.name(), rows, iterations);
    let df = sequential_frame(rows)?;

    let eager = query.eager(&df)?;
    let lazy = query.lazy(&df).collect()?;
    if eager != lazy {
        return Err(Error::invalid_operation(format!(
            "{}: eager and lazy results differ",
            query.name()
        )));
    }
    debug!(query = query.name(), rows = eager.height(), "results agree");

    let eager_result = measure(warmup, iterations, || query.eager(&df))?;
    println!("    eager: {:>12}", format_duration(eager_result.mean));
    report.add(query.name(), "eager", rows, eager_result);

    // Building the plan is part of what is measured, as it is for eager.
    let lazy_result = measure(warmup, iterations, || query.lazy(&df).collect())?;
    println!("    lazy:  {:>12}", format_duration(lazy_result.mean));
    report.add(query.name(), "lazy", rows, lazy_result);

    Ok(())
}
