//! Plan runner - in-memory execution of logical plans.
//!
//! The runner evaluates a plan bottom-up in one recursive pass, each node
//! materializing its full output before its parent runs.

use super::aggregate::AggregateExecutor;
use super::filter::FilterExecutor;
use super::limit::LimitExecutor;
use super::project::{ProjectExecutor, WithColumnsExecutor};
use super::scan::ScanExecutor;
use super::sort::SortExecutor;
use crate::context::ExecutionContext;
use crate::planner::LogicalPlan;
use strata_core::{Error, Result, ResultExt, Table};
use tracing::trace;

/// Executes logical plans over fully materialized tables.
pub struct PlanRunner<'a> {
    ctx: &'a ExecutionContext,
}

impl<'a> PlanRunner<'a> {
    /// Creates a runner using the given context.
    pub fn new(ctx: &'a ExecutionContext) -> Self {
        Self { ctx }
    }

    /// Executes a plan. Errors name the step that raised them.
    pub fn execute(&self, plan: &LogicalPlan) -> Result<Table> {
        match plan {
            LogicalPlan::Scan {
                source,
                projection,
                predicate,
            } => ScanExecutor::new(source.as_ref(), projection.as_deref(), predicate.as_ref())
                .and_then(|scan| scan.execute())
                .with_step(|| plan.describe()),
            _ => {
                let input = match plan.input() {
                    Some(input) => self.execute(input)?,
                    None => return Err(Error::invalid_operation("plan node without input")),
                };
                self.apply(plan, &input)
            }
        }
    }

    /// Applies the operator of `plan` alone to `input`, ignoring the plan's
    /// own input. Scans have no operator to apply.
    pub fn apply(&self, plan: &LogicalPlan, input: &Table) -> Result<Table> {
        let output = match plan {
            LogicalPlan::Scan { .. } => Err(Error::invalid_operation("a scan reads its source")),
            LogicalPlan::Filter { predicate, .. } => FilterExecutor::new(predicate).execute(input),
            LogicalPlan::Select { exprs, .. } => ProjectExecutor::new(exprs).execute(input, self.ctx),
            LogicalPlan::WithColumns { exprs, .. } => {
                WithColumnsExecutor::new(exprs).execute(input, self.ctx)
            }
            LogicalPlan::Aggregate { keys, aggs, .. } => {
                AggregateExecutor::new(keys, aggs).execute(input)
            }
            LogicalPlan::Sort { by, .. } => SortExecutor::new(by).execute(input),
            LogicalPlan::Limit { n, .. } => Ok(LimitExecutor::new(*n).execute(input)),
        }
        .with_step(|| plan.describe())?;
        trace!(
            step = %plan.describe(),
            rows_in = input.num_rows(),
            rows_out = output.num_rows(),
            "step executed"
        );
        Ok(output)
    }
}
