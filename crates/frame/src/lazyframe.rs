//! Lazy query builder.

use crate::context::default_context;
use crate::dataframe::DataFrame;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use strata_core::{Result, Schema};
use strata_io::{CsvOptions, CsvSink};
use strata_query::ast::{Expr, SortOrder};
use strata_query::context::{ExecutionContext, ExecutionMode};
use strata_query::executor::{LazyExecutor, Sink};
use strata_query::planner::{LogicalPlan, TableSource};

/// A query that runs only when collected.
///
/// Building methods consume the frame and return a new one; nothing is read
/// from the source until [`collect`](Self::collect) or [`sink`](Self::sink).
/// Every collect runs the whole plan again.
#[derive(Clone)]
pub struct LazyFrame {
    plan: LogicalPlan,
    ctx: Arc<ExecutionContext>,
    streaming: Option<bool>,
    batch_size: Option<usize>,
}

impl LazyFrame {
    /// Starts a query reading from `source`.
    pub fn scan(source: Arc<dyn TableSource>) -> Self {
        Self::from_plan(LogicalPlan::scan(source))
    }

    /// Wraps an existing plan.
    pub fn from_plan(plan: LogicalPlan) -> Self {
        Self {
            plan,
            ctx: default_context(),
            streaming: None,
            batch_size: None,
        }
    }

    fn map_plan(mut self, f: impl FnOnce(LogicalPlan) -> LogicalPlan) -> Self {
        self.plan = f(self.plan);
        self
    }

    /// Keeps the rows where `predicate` is true.
    pub fn filter(self, predicate: Expr) -> Self {
        self.map_plan(|plan| LogicalPlan::filter(plan, predicate))
    }

    /// Computes exactly the given expressions.
    pub fn select(self, exprs: impl IntoIterator<Item = Expr>) -> Self {
        let exprs = exprs.into_iter().collect();
        self.map_plan(|plan| LogicalPlan::select(plan, exprs))
    }

    /// Adds columns, replacing existing columns of the same name.
    pub fn with_columns(self, exprs: impl IntoIterator<Item = Expr>) -> Self {
        let exprs = exprs.into_iter().collect();
        self.map_plan(|plan| LogicalPlan::with_columns(plan, exprs))
    }

    /// Starts a grouped aggregation.
    pub fn group_by(self, keys: impl IntoIterator<Item = Expr>) -> LazyGroupBy {
        LazyGroupBy {
            lf: self,
            keys: keys.into_iter().collect(),
        }
    }

    /// Sorts by the given keys; ties keep their input order.
    pub fn sort(self, by: impl IntoIterator<Item = (Expr, SortOrder)>) -> Self {
        let by = by.into_iter().collect();
        self.map_plan(|plan| LogicalPlan::sort(plan, by))
    }

    /// Keeps at most `n` rows.
    pub fn limit(self, n: usize) -> Self {
        self.map_plan(|plan| LogicalPlan::limit(plan, n))
    }

    /// Alias for [`limit`](Self::limit).
    pub fn head(self, n: usize) -> Self {
        self.limit(n)
    }

    /// Forces streaming (`true`) or in-memory (`false`) execution,
    /// overriding the context's configuration.
    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = Some(streaming);
        self
    }

    /// Overrides the streaming batch size. Zero is treated as one.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size.max(1));
        self
    }

    /// Runs on `ctx` instead of the default context.
    pub fn with_context(mut self, ctx: Arc<ExecutionContext>) -> Self {
        self.ctx = ctx;
        self
    }

    /// Returns the plan built so far.
    pub fn plan(&self) -> &LogicalPlan {
        &self.plan
    }

    /// Returns the output schema, validating the plan.
    pub fn schema(&self) -> Result<Schema> {
        self.plan.schema()
    }

    fn executor(&self) -> LazyExecutor {
        LazyExecutor::new(Arc::clone(&self.ctx))
    }

    fn batch_size(&self) -> usize {
        self.batch_size.unwrap_or(self.ctx.config().batch_size)
    }

    fn mode(&self) -> ExecutionMode {
        if self.streaming.unwrap_or(self.ctx.config().streaming) {
            ExecutionMode::Streaming {
                batch_size: self.batch_size(),
            }
        } else {
            ExecutionMode::InMemory
        }
    }

    /// Renders the plan as an indented tree, optimized when `optimized` is set.
    pub fn explain(&self, optimized: bool) -> Result<String> {
        self.executor().explain(&self.plan, optimized)
    }

    /// Runs the query and returns the result.
    pub fn collect(&self) -> Result<DataFrame> {
        let table = self.executor().collect_with_mode(&self.plan, self.mode())?;
        Ok(DataFrame::from(table).with_context(Arc::clone(&self.ctx)))
    }

    /// Streams the result into `sink` and returns the number of rows written.
    ///
    /// Always runs in streaming mode.
    pub fn sink(&self, sink: &mut dyn Sink) -> Result<usize> {
        self.executor()
            .sink_with_batch_size(&self.plan, sink, self.batch_size())
    }

    /// Streams the result into a CSV file.
    pub fn sink_csv(&self, path: impl AsRef<Path>, options: &CsvOptions) -> Result<usize> {
        let mut sink = CsvSink::create(path, options)?;
        self.sink(&mut sink)
    }
}

impl fmt::Debug for LazyFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyFrame")
            .field("plan", &self.plan.describe())
            .field("streaming", &self.streaming)
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

/// A grouped aggregation over a [`LazyFrame`], built by [`LazyFrame::group_by`].
pub struct LazyGroupBy {
    lf: LazyFrame,
    keys: Vec<Expr>,
}

impl LazyGroupBy {
    /// Computes the aggregations per group: keys first, then aggregates.
    pub fn agg(self, aggs: impl IntoIterator<Item = Expr>) -> LazyFrame {
        let keys = self.keys;
        let aggs = aggs.into_iter().collect();
        self.lf
            .map_plan(|plan| LogicalPlan::aggregate(plan, keys, aggs))
    }
}
