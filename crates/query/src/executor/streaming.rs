//! Streaming execution of logical plans.
//!
//! A plan is split into pipelines: a batch source followed by row-wise
//! stages (scan predicate and projection, filter, select, with_columns) that
//! are fused and run on each batch independently. Pipelines run on the
//! worker pool, `parallelism` batches at a time, and emit batches in source
//! order.
//!
//! Nodes that need more than one batch at a time break the pipeline:
//!
//! - `Limit` stops pulling from its input once it has enough rows.
//! - `Aggregate` folds a partial state per batch when every aggregation
//!   merges exactly, and materializes its input otherwise.
//! - `Sort`, and row-wise nodes whose expressions aggregate, materialize
//!   their input, run once, and re-batch the result.

use super::aggregate::{AggregateExecutor, GroupedAggregation};
use super::evaluate::evaluate_predicate;
use super::project::{ProjectExecutor, WithColumnsExecutor};
use super::runner::PlanRunner;
use super::scan::{filter_and_project, ScanExecutor};
use crate::ast::Expr;
use crate::context::ExecutionContext;
use crate::planner::{BatchReader, LogicalPlan};
use std::collections::VecDeque;
use std::sync::Arc;
use strata_core::{Error, Result, ResultExt, Schema, Table};
use tracing::{debug, trace};

/// A row-wise operation applied to each batch on its own.
#[derive(Clone, Debug)]
enum RowOp {
    Scan {
        predicate: Option<Expr>,
        schema: Schema,
    },
    Filter(Expr),
    Select(Vec<Expr>),
    WithColumns(Vec<Expr>),
}

#[derive(Clone, Debug)]
struct Stage {
    step: String,
    op: RowOp,
}

impl Stage {
    fn apply(&self, batch: &Table, ctx: &ExecutionContext) -> Result<Table> {
        match &self.op {
            RowOp::Scan { predicate, schema } => {
                filter_and_project(batch, predicate.as_ref(), schema)
            }
            RowOp::Filter(predicate) => batch.filter(&evaluate_predicate(predicate, batch)?),
            RowOp::Select(exprs) => ProjectExecutor::new(exprs).execute(batch, ctx),
            RowOp::WithColumns(exprs) => WithColumnsExecutor::new(exprs).execute(batch, ctx),
        }
        .with_step(|| self.step.clone())
    }
}

fn apply_stages(stages: &[Stage], batch: &Table, ctx: &ExecutionContext) -> Result<Table> {
    let mut stages = stages.iter();
    let Some(first) = stages.next() else {
        return Ok(batch.clone());
    };
    let mut current = first.apply(batch, ctx)?;
    for stage in stages {
        current = stage.apply(&current, ctx)?;
    }
    Ok(current)
}

/// Returns the row-wise operation of `plan`, if it can run batch by batch.
fn row_op(plan: &LogicalPlan) -> Option<RowOp> {
    match plan {
        LogicalPlan::Filter { predicate, .. } if !predicate.has_aggregate() => {
            Some(RowOp::Filter(predicate.clone()))
        }
        LogicalPlan::Select { exprs, .. } => {
            let aggregates = exprs.iter().any(Expr::has_aggregate);
            // A select of scalars only yields one row, not one per batch.
            let scalars = !exprs.is_empty() && exprs.iter().all(Expr::is_scalar);
            (!aggregates && !scalars).then(|| RowOp::Select(exprs.clone()))
        }
        LogicalPlan::WithColumns { exprs, .. } if !exprs.iter().any(Expr::has_aggregate) => {
            Some(RowOp::WithColumns(exprs.clone()))
        }
        _ => None,
    }
}

/// Pulls up to `n` batches. An input error ends the chunk and is returned
/// alongside the batches read before it.
fn next_chunk(input: &mut BatchReader, n: usize) -> (Vec<Table>, Option<Error>, bool) {
    let mut chunk = Vec::with_capacity(n);
    while chunk.len() < n {
        match input.next() {
            Some(Ok(batch)) => chunk.push(batch),
            Some(Err(err)) => return (chunk, Some(err), true),
            None => return (chunk, None, true),
        }
    }
    (chunk, None, false)
}

/// Runs fused stages over the batches of a source.
struct FusedBatches {
    input: BatchReader,
    stages: Vec<Stage>,
    ctx: Arc<ExecutionContext>,
    ready: VecDeque<Table>,
    error: Option<Error>,
    exhausted: bool,
}

impl FusedBatches {
    fn new(input: BatchReader, stages: Vec<Stage>, ctx: Arc<ExecutionContext>) -> Self {
        Self {
            input,
            stages,
            ctx,
            ready: VecDeque::new(),
            error: None,
            exhausted: false,
        }
    }

    fn fill(&mut self) {
        let width = self.ctx.config().parallelism.max(1);
        let (chunk, error, exhausted) = next_chunk(&mut self.input, width);
        self.exhausted = exhausted;
        self.error = error;
        if chunk.is_empty() {
            return;
        }

        let stages = &self.stages;
        let ctx = self.ctx.as_ref();
        let results = match ctx.try_map(&chunk, |batch| Ok(apply_stages(stages, batch, ctx))) {
            Ok(results) => results,
            Err(err) => vec![Err(err)],
        };
        trace!(batches = chunk.len(), "pipeline chunk processed");

        for result in results {
            match result {
                Ok(batch) if batch.is_empty() => {}
                Ok(batch) => self.ready.push_back(batch),
                Err(err) => {
                    // Later batches of the chunk are discarded with the error.
                    self.error = Some(err);
                    self.exhausted = true;
                    break;
                }
            }
        }
    }
}

impl Iterator for FusedBatches {
    type Item = Result<Table>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(batch) = self.ready.pop_front() {
                return Some(Ok(batch));
            }
            if let Some(err) = self.error.take() {
                self.exhausted = true;
                return Some(Err(err));
            }
            if self.exhausted {
                return None;
            }
            self.fill();
        }
    }
}

/// Passes through the first `remaining` rows, then stops pulling.
struct LimitBatches {
    input: BatchReader,
    remaining: usize,
}

impl Iterator for LimitBatches {
    type Item = Result<Table>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        match self.input.next()? {
            Ok(batch) => {
                let batch = if batch.num_rows() > self.remaining {
                    batch.slice(0, self.remaining)
                } else {
                    batch
                };
                self.remaining -= batch.num_rows();
                Some(Ok(batch))
            }
            Err(err) => {
                self.remaining = 0;
                Some(Err(err))
            }
        }
    }
}

/// Executes logical plans as streams of bounded batches.
pub struct StreamingRunner {
    ctx: Arc<ExecutionContext>,
    batch_size: usize,
}

impl StreamingRunner {
    /// Creates a runner producing batches of at most `batch_size` rows.
    pub fn new(ctx: Arc<ExecutionContext>, batch_size: usize) -> Self {
        Self {
            ctx,
            batch_size: batch_size.max(1),
        }
    }

    /// Opens `plan` as a stream of batches.
    ///
    /// Steps that materialize their input run here. Fused pipelines only
    /// read their source as the stream is pulled.
    pub fn stream(&self, plan: &LogicalPlan) -> Result<BatchReader> {
        let (input, stages) = self.pipeline(plan)?;
        if stages.is_empty() {
            return Ok(input);
        }
        debug!(
            stages = ?stages.iter().map(|s| s.step.as_str()).collect::<Vec<_>>(),
            "fused pipeline"
        );
        Ok(Box::new(FusedBatches::new(input, stages, Arc::clone(&self.ctx))))
    }

    /// Runs `plan` and concatenates its batches.
    pub fn collect(&self, plan: &LogicalPlan) -> Result<Table> {
        let batches = self.stream(plan)?.collect::<Result<Vec<_>>>()?;
        if batches.is_empty() {
            Ok(Table::empty(&plan.schema()?))
        } else {
            Table::concat(&batches)
        }
    }

    /// Splits `plan` into the batch source feeding it and the row-wise
    /// stages fused on top of that source.
    fn pipeline(&self, plan: &LogicalPlan) -> Result<(BatchReader, Vec<Stage>)> {
        if let LogicalPlan::Scan {
            source,
            projection,
            predicate,
        } = plan
        {
            let step = plan.describe();
            let scan = ScanExecutor::new(source.as_ref(), projection.as_deref(), predicate.as_ref())
                .with_step(|| step.clone())?;
            let reader = scan.open(self.batch_size).with_step(|| step.clone())?;
            let stage = Stage {
                step: step.clone(),
                op: RowOp::Scan {
                    predicate: predicate.clone(),
                    schema: scan.schema().clone(),
                },
            };
            let reader: BatchReader =
                Box::new(reader.map(move |batch| batch.with_step(|| step.clone())));
            return Ok((reader, vec![stage]));
        }

        if let (Some(op), Some(input)) = (row_op(plan), plan.input()) {
            let (reader, mut stages) = self.pipeline(input)?;
            stages.push(Stage {
                step: plan.describe(),
                op,
            });
            return Ok((reader, stages));
        }

        Ok((self.breaker(plan)?, Vec::new()))
    }

    /// Executes a node that cannot run batch by batch.
    fn breaker(&self, plan: &LogicalPlan) -> Result<BatchReader> {
        let Some(input) = plan.input() else {
            return Err(Error::invalid_operation("plan node without input"));
        };
        match plan {
            LogicalPlan::Limit { n, .. } => Ok(Box::new(LimitBatches {
                input: self.stream(input)?,
                remaining: *n,
            })),
            LogicalPlan::Aggregate { keys, aggs, .. } => {
                let output = self.aggregate(input, keys, aggs)?;
                Ok(self.rebatch(output))
            }
            _ => {
                debug!(step = %plan.describe(), "step cannot stream, materializing its input");
                let table = self.collect(input)?;
                let output = PlanRunner::new(&self.ctx).apply(plan, &table)?;
                Ok(self.rebatch(output))
            }
        }
    }

    fn aggregate(&self, input: &LogicalPlan, keys: &[Expr], aggs: &[Expr]) -> Result<Table> {
        let step = || LogicalPlan::aggregate(input.clone(), keys.to_vec(), aggs.to_vec()).describe();
        let schema = input.schema()?;
        let mut total = GroupedAggregation::new(keys, aggs, &schema).with_step(step)?;

        if !total.is_mergeable() {
            debug!(step = %step(), "aggregation does not merge exactly, materializing its input");
            let table = self.collect(input)?;
            return AggregateExecutor::new(keys, aggs)
                .execute(&table)
                .with_step(step);
        }

        let mut batches = self.stream(input)?;
        let width = self.ctx.config().parallelism.max(1);
        let template = total.empty_like();
        loop {
            let (chunk, error, exhausted) = next_chunk(&mut batches, width);
            if let Some(err) = error {
                return Err(err);
            }
            let partials = self
                .ctx
                .try_map(&chunk, |batch| {
                    let mut partial = template.empty_like();
                    partial.update(batch)?;
                    Ok(partial)
                })
                .with_step(step)?;
            for partial in partials {
                total.merge(partial);
            }
            if exhausted {
                break;
            }
        }
        total.finish().with_step(step)
    }

    fn rebatch(&self, table: Table) -> BatchReader {
        Box::new(table.split(self.batch_size).into_iter().map(Ok))
    }
}
