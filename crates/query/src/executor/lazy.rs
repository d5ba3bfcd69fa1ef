//! Lazy execution: validate, optimize, then run a plan.

use super::runner::PlanRunner;
use super::sink::Sink;
use super::streaming::StreamingRunner;
use crate::context::{ExecutionContext, ExecutionMode};
use crate::optimizer::Optimizer;
use crate::planner::LogicalPlan;
use std::sync::Arc;
use std::time::Instant;
use strata_core::{Result, Schema, Table};
use tracing::{debug, info};

/// Runs logical plans built ahead of time.
///
/// Plans are never cached: each call validates, optimizes and executes the
/// plan again from its sources.
pub struct LazyExecutor {
    ctx: Arc<ExecutionContext>,
    optimizer: Optimizer,
}

impl LazyExecutor {
    /// Creates an executor with the default optimizer.
    pub fn new(ctx: Arc<ExecutionContext>) -> Self {
        Self {
            ctx,
            optimizer: Optimizer::new(),
        }
    }

    /// Replaces the optimizer.
    pub fn with_optimizer(mut self, optimizer: Optimizer) -> Self {
        self.optimizer = optimizer;
        self
    }

    /// Returns the execution context.
    pub fn context(&self) -> &ExecutionContext {
        &self.ctx
    }

    /// Validates `plan` and returns the plan to execute with its output schema.
    fn prepare(&self, plan: &LogicalPlan) -> Result<(LogicalPlan, Schema)> {
        let schema = plan.schema()?;
        let plan = if self.ctx.config().optimize {
            self.optimizer.optimize(plan.clone())
        } else {
            plan.clone()
        };
        Ok((plan, schema))
    }

    /// Renders `plan`, after optimization when `optimized` is set.
    pub fn explain(&self, plan: &LogicalPlan, optimized: bool) -> Result<String> {
        plan.schema()?;
        if optimized {
            Ok(self.optimizer.optimize(plan.clone()).explain())
        } else {
            Ok(plan.explain())
        }
    }

    /// Executes `plan` in the configured mode.
    pub fn collect(&self, plan: &LogicalPlan) -> Result<Table> {
        self.collect_with_mode(plan, self.ctx.config().mode())
    }

    /// Executes `plan` in the given mode.
    pub fn collect_with_mode(&self, plan: &LogicalPlan, mode: ExecutionMode) -> Result<Table> {
        let start = Instant::now();
        let (plan, schema) = self.prepare(plan)?;
        debug!(?mode, plan = %plan, "collecting plan");

        let table = match mode {
            ExecutionMode::InMemory => PlanRunner::new(&self.ctx).execute(&plan)?,
            ExecutionMode::Streaming { batch_size } => {
                let batches = StreamingRunner::new(Arc::clone(&self.ctx), batch_size)
                    .stream(&plan)?
                    .collect::<Result<Vec<_>>>()?;
                if batches.is_empty() {
                    Table::empty(&schema)
                } else {
                    Table::concat(&batches)?
                }
            }
        };

        info!(
            rows = table.num_rows(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "collect finished"
        );
        Ok(table)
    }

    /// Streams the result of `plan` into `sink`, one batch at a time, and
    /// returns the number of rows written.
    ///
    /// Batches written before an error stay written.
    pub fn sink(&self, plan: &LogicalPlan, sink: &mut dyn Sink) -> Result<usize> {
        self.sink_with_batch_size(plan, sink, self.ctx.config().batch_size)
    }

    /// Like [`sink`](Self::sink), with batches of at most `batch_size` rows.
    pub fn sink_with_batch_size(
        &self,
        plan: &LogicalPlan,
        sink: &mut dyn Sink,
        batch_size: usize,
    ) -> Result<usize> {
        let start = Instant::now();
        let (plan, schema) = self.prepare(plan)?;
        debug!(batch_size, plan = %plan, "sinking plan");

        let batches = StreamingRunner::new(Arc::clone(&self.ctx), batch_size).stream(&plan)?;
        sink.begin(&schema)?;
        let mut rows = 0;
        for batch in batches {
            let batch = batch?;
            sink.write_batch(&batch)?;
            rows += batch.num_rows();
        }
        sink.finish()?;

        info!(
            rows,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "sink finished"
        );
        Ok(rows)
    }
}
