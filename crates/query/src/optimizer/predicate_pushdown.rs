//! Predicate pushdown optimization pass.
//!
//! Pushes filter predicates down the plan chain as close to the source as
//! possible, so fewer rows flow through the operators above it.
//!
//! Key optimizations:
//! 1. Merge consecutive filters into AND predicates
//! 2. Push filters through Sort (doesn't change semantics)
//! 3. Push filters through WithColumns when the predicate reads none of the
//!    columns it defines, and through Select when every column the predicate
//!    reads is passed through unchanged
//! 4. Fold the remaining predicate into the Scan
//! 5. Cannot push through Aggregate or Limit (changes semantics)
//!
//! Predicates and nodes containing aggregates are never moved: an aggregate
//! depends on the full set of rows it sees.

use crate::ast::Expr;
use crate::optimizer::OptimizerPass;
use crate::planner::LogicalPlan;
use hashbrown::HashSet;

/// Predicate pushdown optimization.
pub struct PredicatePushdown;

impl OptimizerPass for PredicatePushdown {
    fn optimize(&self, plan: LogicalPlan) -> LogicalPlan {
        self.pushdown(plan)
    }

    fn name(&self) -> &'static str {
        "predicate_pushdown"
    }
}

impl PredicatePushdown {
    fn pushdown(&self, plan: LogicalPlan) -> LogicalPlan {
        match plan {
            LogicalPlan::Filter { input, predicate } => {
                let optimized_input = self.pushdown(*input);
                self.try_push_filter(optimized_input, predicate)
            }

            LogicalPlan::Select { input, exprs } => LogicalPlan::Select {
                input: Box::new(self.pushdown(*input)),
                exprs,
            },

            LogicalPlan::WithColumns { input, exprs } => LogicalPlan::WithColumns {
                input: Box::new(self.pushdown(*input)),
                exprs,
            },

            LogicalPlan::Aggregate { input, keys, aggs } => LogicalPlan::Aggregate {
                input: Box::new(self.pushdown(*input)),
                keys,
                aggs,
            },

            LogicalPlan::Sort { input, by } => LogicalPlan::Sort {
                input: Box::new(self.pushdown(*input)),
                by,
            },

            LogicalPlan::Limit { input, n } => LogicalPlan::Limit {
                input: Box::new(self.pushdown(*input)),
                n,
            },

            // Leaf node - no transformation
            LogicalPlan::Scan { .. } => plan,
        }
    }

    fn try_push_filter(&self, input: LogicalPlan, predicate: Expr) -> LogicalPlan {
        if predicate.has_aggregate() {
            return LogicalPlan::filter(input, predicate);
        }

        match input {
            // Merge consecutive filters: the inner one could not be pushed further
            LogicalPlan::Filter {
                input: inner_input,
                predicate: inner_predicate,
            } if !inner_predicate.has_aggregate() => {
                LogicalPlan::filter(*inner_input, inner_predicate.and(predicate))
            }

            LogicalPlan::Sort { input, by } if !by.iter().any(|(e, _)| e.has_aggregate()) => {
                LogicalPlan::Sort {
                    input: Box::new(self.try_push_filter(*input, predicate)),
                    by,
                }
            }

            LogicalPlan::WithColumns { input, exprs }
                if !any_aggregate(&exprs) && !reads_defined_column(&predicate, &exprs) =>
            {
                LogicalPlan::WithColumns {
                    input: Box::new(self.try_push_filter(*input, predicate)),
                    exprs,
                }
            }

            // A select of scalars yields one row whatever its input, so a
            // filter below it cannot remove that row.
            LogicalPlan::Select { input, exprs }
                if !any_aggregate(&exprs)
                    && !all_scalar(&exprs)
                    && reads_only_pass_through(&predicate, &exprs) =>
            {
                LogicalPlan::Select {
                    input: Box::new(self.try_push_filter(*input, predicate)),
                    exprs,
                }
            }

            LogicalPlan::Scan {
                source,
                projection,
                predicate: existing,
            } => LogicalPlan::Scan {
                source,
                projection,
                predicate: Some(match existing {
                    Some(existing) => existing.and(predicate),
                    None => predicate,
                }),
            },

            // Cannot push through Aggregate or Limit
            other => LogicalPlan::filter(other, predicate),
        }
    }
}

fn any_aggregate(exprs: &[Expr]) -> bool {
    exprs.iter().any(Expr::has_aggregate)
}

fn all_scalar(exprs: &[Expr]) -> bool {
    !exprs.is_empty() && exprs.iter().all(Expr::is_scalar)
}

fn reads_defined_column(predicate: &Expr, exprs: &[Expr]) -> bool {
    let defined: HashSet<String> = exprs.iter().map(Expr::output_name).collect();
    predicate
        .referenced_columns()
        .iter()
        .any(|c| defined.contains(c))
}

fn reads_only_pass_through(predicate: &Expr, exprs: &[Expr]) -> bool {
    let pass_through: HashSet<&str> = exprs
        .iter()
        .filter_map(|e| match e {
            Expr::Column(name) => Some(name.as_str()),
            _ => None,
        })
        .collect();
    predicate
        .referenced_columns()
        .iter()
        .all(|c| pass_through.contains(c.as_str()))
}
