//! Projection pushdown optimization pass.
//!
//! Walks the plan from the top, tracking which columns each node needs from
//! its input, and records the columns required at the bottom as the scan's
//! projection. Columns that only the scan predicate reads are not added: the
//! scan reads them for the predicate and drops them afterwards.

use crate::ast::Expr;
use crate::optimizer::OptimizerPass;
use crate::planner::LogicalPlan;
use hashbrown::HashSet;

/// Projection pushdown optimization.
pub struct ProjectionPushdown;

impl OptimizerPass for ProjectionPushdown {
    fn optimize(&self, plan: LogicalPlan) -> LogicalPlan {
        self.push(plan, None)
    }

    fn name(&self) -> &'static str {
        "projection_pushdown"
    }
}

/// Columns a node must produce. `None` means all of them.
type Required = Option<HashSet<String>>;

fn columns_of<'a>(exprs: impl IntoIterator<Item = &'a Expr>) -> HashSet<String> {
    exprs
        .into_iter()
        .flat_map(Expr::referenced_columns)
        .collect()
}

impl ProjectionPushdown {
    fn push(&self, plan: LogicalPlan, required: Required) -> LogicalPlan {
        match plan {
            LogicalPlan::Scan {
                source,
                projection,
                predicate,
            } => {
                let projection = match required {
                    None => projection,
                    Some(required) => match source.schema() {
                        Ok(schema) => Some(
                            schema
                                .names()
                                .filter(|name| required.contains(*name))
                                .filter(|name| {
                                    projection
                                        .as_ref()
                                        .map_or(true, |p| p.iter().any(|c| c.as_str() == *name))
                                })
                                .map(String::from)
                                .collect(),
                        ),
                        // Validation reports the failure.
                        Err(_) => projection,
                    },
                };
                LogicalPlan::Scan {
                    source,
                    projection,
                    predicate,
                }
            }

            LogicalPlan::Filter { input, predicate } => {
                let required = required.map(|mut r| {
                    r.extend(predicate.referenced_columns());
                    r
                });
                LogicalPlan::filter(self.push(*input, required), predicate)
            }

            LogicalPlan::Select { input, exprs } => {
                let required = Some(columns_of(&exprs));
                LogicalPlan::select(self.push(*input, required), exprs)
            }

            LogicalPlan::WithColumns { input, exprs } => {
                let required = required.map(|mut r| {
                    for e in &exprs {
                        r.remove(&e.output_name());
                    }
                    r.extend(columns_of(&exprs));
                    r
                });
                LogicalPlan::with_columns(self.push(*input, required), exprs)
            }

            LogicalPlan::Aggregate { input, keys, aggs } => {
                let required = Some(columns_of(keys.iter().chain(&aggs)));
                LogicalPlan::aggregate(self.push(*input, required), keys, aggs)
            }

            LogicalPlan::Sort { input, by } => {
                let required = required.map(|mut r| {
                    r.extend(columns_of(by.iter().map(|(e, _)| e)));
                    r
                });
                LogicalPlan::sort(self.push(*input, required), by)
            }

            LogicalPlan::Limit { input, n } => LogicalPlan::limit(self.push(*input, required), n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{col, len, lit};
    use crate::planner::MemorySource;
    use std::sync::Arc;
    use strata_core::{Column, Table};

    fn scan() -> LogicalPlan {
        let table = Table::new(vec![
            Column::new("a", vec![1i64]).unwrap(),
            Column::new("b", vec![2i64]).unwrap(),
            Column::new("c", vec![3i64]).unwrap(),
        ])
        .unwrap();
        LogicalPlan::scan(Arc::new(MemorySource::new(table)))
    }

    fn projection(plan: &LogicalPlan) -> Option<Vec<String>> {
        let mut node = plan;
        while let Some(input) = node.input() {
            node = input;
        }
        match node {
            LogicalPlan::Scan { projection, .. } => projection.clone(),
            _ => None,
        }
    }

    #[test]
    fn test_select_limits_scan() {
        let plan = LogicalPlan::select(
            LogicalPlan::filter(scan(), col("b").gt(lit(0i64))),
            vec![col("c"), col("a")],
        );
        let optimized = ProjectionPushdown.optimize(plan);
        assert_eq!(
            projection(&optimized),
            Some(vec!["a".to_string(), "b".to_string(), "c".to_string()])
        );

        let plan = LogicalPlan::select(scan(), vec![col("c")]);
        let optimized = ProjectionPushdown.optimize(plan);
        assert_eq!(projection(&optimized), Some(vec!["c".to_string()]));
    }

    #[test]
    fn test_with_columns_passes_through_needs() {
        let plan = LogicalPlan::select(
            LogicalPlan::with_columns(scan(), vec![(col("a") + lit(1i64)).alias("b")]),
            vec![col("b")],
        );
        let optimized = ProjectionPushdown.optimize(plan);
        assert_eq!(projection(&optimized), Some(vec!["a".to_string()]));
    }

    #[test]
    fn test_no_projection_without_consumer() {
        let plan = LogicalPlan::filter(scan(), col("a").gt(lit(0i64)));
        let optimized = ProjectionPushdown.optimize(plan);
        assert_eq!(projection(&optimized), None);
    }

    #[test]
    fn test_count_reads_no_columns() {
        let plan = LogicalPlan::select(scan(), vec![len()]);
        let optimized = ProjectionPushdown.optimize(plan);
        assert_eq!(projection(&optimized), Some(vec![]));
    }
}
