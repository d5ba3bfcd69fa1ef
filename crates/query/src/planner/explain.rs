//! Text rendering of logical plans.

use super::LogicalPlan;
use crate::ast::{Expr, SortOrder};
use core::fmt;

fn join_exprs(exprs: &[Expr]) -> String {
    exprs
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl LogicalPlan {
    /// One-line description of this node, without its input.
    pub fn describe(&self) -> String {
        match self {
            LogicalPlan::Scan {
                source,
                projection,
                predicate,
            } => {
                let mut out = format!("SCAN {}", source.name());
                match projection {
                    Some(cols) => out.push_str(&format!(" [project: {}]", cols.join(", "))),
                    None => out.push_str(" [project: *]"),
                }
                if let Some(p) = predicate {
                    out.push_str(&format!(" [predicate: {}]", p));
                }
                out
            }
            LogicalPlan::Filter { predicate, .. } => format!("FILTER {}", predicate),
            LogicalPlan::Select { exprs, .. } => format!("SELECT [{}]", join_exprs(exprs)),
            LogicalPlan::WithColumns { exprs, .. } => {
                format!("WITH_COLUMNS [{}]", join_exprs(exprs))
            }
            LogicalPlan::Aggregate { keys, aggs, .. } => format!(
                "AGGREGATE [{}] BY [{}]",
                join_exprs(aggs),
                join_exprs(keys)
            ),
            LogicalPlan::Sort { by, .. } => {
                let keys = by
                    .iter()
                    .map(|(e, order)| match order {
                        SortOrder::Asc => e.to_string(),
                        SortOrder::Desc => format!("{} DESC", e),
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("SORT BY [{}]", keys)
            }
            LogicalPlan::Limit { n, .. } => format!("LIMIT {}", n),
        }
    }

    /// Renders the plan one node per line, each input indented below its consumer.
    pub fn explain(&self) -> String {
        let mut out = String::new();
        let mut node = Some(self);
        let mut depth = 0;
        while let Some(plan) = node {
            if depth > 0 {
                out.push('\n');
            }
            out.push_str(&"  ".repeat(depth));
            out.push_str(&plan.describe());
            node = plan.input();
            depth += 1;
        }
        out
    }
}

impl fmt::Display for LogicalPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.explain())
    }
}
