//! Query optimizer module.

mod pass;
mod predicate_pushdown;
mod projection_pushdown;
mod simplify;

pub use pass::OptimizerPass;
pub use predicate_pushdown::PredicatePushdown;
pub use projection_pushdown::ProjectionPushdown;
pub use simplify::SimplifyExpressions;

use crate::planner::LogicalPlan;
use tracing::trace;

/// Query optimizer that applies optimization passes.
pub struct Optimizer {
    passes: Vec<Box<dyn OptimizerPass>>,
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Optimizer {
    /// Creates a new optimizer with default passes.
    ///
    /// The default passes are applied in this order:
    /// 1. SimplifyExpressions - Fold constants, drop neutral predicate terms
    /// 2. PredicatePushdown - Push filters down toward the scan
    /// 3. ProjectionPushdown - Read only the columns the plan needs
    pub fn new() -> Self {
        Self {
            passes: vec![
                Box::new(SimplifyExpressions),
                Box::new(PredicatePushdown),
                Box::new(ProjectionPushdown),
            ],
        }
    }

    /// Creates an optimizer with custom passes.
    pub fn with_passes(passes: Vec<Box<dyn OptimizerPass>>) -> Self {
        Self { passes }
    }

    /// Returns the names of the passes, in application order.
    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    /// Optimizes a logical plan.
    pub fn optimize(&self, mut plan: LogicalPlan) -> LogicalPlan {
        for pass in &self.passes {
            plan = pass.optimize(plan);
            trace!(pass = pass.name(), plan = %plan, "optimizer pass applied");
        }
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{col, lit};
    use crate::planner::MemorySource;
    use std::sync::Arc;
    use strata_core::{Column, Table};

    #[test]
    fn test_default_passes() {
        let optimizer = Optimizer::new();
        assert_eq!(
            optimizer.pass_names(),
            vec!["simplify_expressions", "predicate_pushdown", "projection_pushdown"]
        );
    }

    #[test]
    fn test_optimize_filter_select() {
        let table = Table::new(vec![
            Column::new("a", (0..500i64).collect::<Vec<_>>()).unwrap(),
            Column::new("b", (0..500i64).collect::<Vec<_>>()).unwrap(),
        ])
        .unwrap();
        let plan = LogicalPlan::scan(Arc::new(MemorySource::new(table)));
        let plan = LogicalPlan::filter(plan, col("a").gt(lit(250i64) * lit(2i64)));
        let plan = LogicalPlan::select(plan, vec![col("b")]);

        let optimized = Optimizer::new().optimize(plan);
        assert_eq!(
            optimized.explain(),
            "SELECT [col(\"b\")]\n  SCAN df [project: b] [predicate: (col(\"a\") > 500)]"
        );
    }

    #[test]
    fn test_empty_optimizer_is_identity() {
        let table = Table::new(vec![Column::new("a", vec![1i64]).unwrap()]).unwrap();
        let plan = LogicalPlan::filter(
            LogicalPlan::scan(Arc::new(MemorySource::new(table))),
            col("a").gt(lit(0i64)),
        );
        let before = plan.explain();
        let after = Optimizer::with_passes(vec![]).optimize(plan).explain();
        assert_eq!(before, after);
    }
}
