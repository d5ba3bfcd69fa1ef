//! Optimizer pass trait.

use crate::planner::LogicalPlan;

/// An optimization pass that rewrites a logical plan.
///
/// A pass must not change the result of the plan, only how it is computed.
pub trait OptimizerPass: Send + Sync {
    /// Optimizes the given logical plan.
    fn optimize(&self, plan: LogicalPlan) -> LogicalPlan;

    /// Returns the name of this pass.
    fn name(&self) -> &'static str {
        "unnamed"
    }
}
