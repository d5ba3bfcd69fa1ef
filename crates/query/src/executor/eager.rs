//! Eager execution: one operation at a time, in the order written.

use super::runner::PlanRunner;
use crate::ast::{Expr, SortOrder};
use crate::context::ExecutionContext;
use crate::planner::{LogicalPlan, MemorySource};
use std::sync::Arc;
use strata_core::{Result, Table};

/// Runs each operation as soon as it is called.
///
/// There is no planning and no optimization. A failing operation reports
/// itself as the failing step.
#[derive(Clone, Debug, Default)]
pub struct EagerExecutor {
    ctx: Arc<ExecutionContext>,
}

impl EagerExecutor {
    /// Creates an eager executor.
    pub fn new(ctx: Arc<ExecutionContext>) -> Self {
        Self { ctx }
    }

    /// Returns the execution context.
    pub fn context(&self) -> &ExecutionContext {
        &self.ctx
    }

    fn run(&self, input: &Table, node: impl FnOnce(LogicalPlan) -> LogicalPlan) -> Result<Table> {
        let plan = node(LogicalPlan::scan(Arc::new(MemorySource::new(input.clone()))));
        PlanRunner::new(&self.ctx).apply(&plan, input)
    }

    /// Keeps the rows where `predicate` is true.
    pub fn filter(&self, input: &Table, predicate: &Expr) -> Result<Table> {
        self.run(input, |scan| LogicalPlan::filter(scan, predicate.clone()))
    }

    /// Computes exactly `exprs`.
    pub fn select(&self, input: &Table, exprs: &[Expr]) -> Result<Table> {
        self.run(input, |scan| LogicalPlan::select(scan, exprs.to_vec()))
    }

    /// Adds or replaces the columns computed by `exprs`.
    pub fn with_columns(&self, input: &Table, exprs: &[Expr]) -> Result<Table> {
        self.run(input, |scan| LogicalPlan::with_columns(scan, exprs.to_vec()))
    }

    /// Groups by `keys` and computes `aggs` per group.
    pub fn group_by_agg(&self, input: &Table, keys: &[Expr], aggs: &[Expr]) -> Result<Table> {
        self.run(input, |scan| {
            LogicalPlan::aggregate(scan, keys.to_vec(), aggs.to_vec())
        })
    }

    /// Stable multi-key sort.
    pub fn sort(&self, input: &Table, by: &[(Expr, SortOrder)]) -> Result<Table> {
        self.run(input, |scan| LogicalPlan::sort(scan, by.to_vec()))
    }

    /// Keeps the first `n` rows.
    pub fn limit(&self, input: &Table, n: usize) -> Result<Table> {
        self.run(input, |scan| LogicalPlan::limit(scan, n))
    }
}
