//! Expression simplification optimization pass.
//!
//! This pass simplifies expressions by:
//! - Folding literal-only subtrees into a single literal
//! - Eliminating double negation in predicates: NOT(NOT(x)) → x
//! - Dropping neutral operands in predicates: x AND true → x, x OR false → x
//! - Removing filters whose predicate folds to `true`
//!
//! Boolean rewrites are only applied where an expression is used as a
//! predicate, since they may change the static type of a Null-typed operand.

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::executor::{evaluate, Datum};
use crate::optimizer::OptimizerPass;
use crate::planner::LogicalPlan;
use strata_core::{Schema, Table, Value};

/// Expression simplification pass.
pub struct SimplifyExpressions;

impl OptimizerPass for SimplifyExpressions {
    fn optimize(&self, plan: LogicalPlan) -> LogicalPlan {
        self.simplify_plan(plan)
    }

    fn name(&self) -> &'static str {
        "simplify_expressions"
    }
}

impl SimplifyExpressions {
    fn simplify_plan(&self, plan: LogicalPlan) -> LogicalPlan {
        match plan {
            LogicalPlan::Scan {
                source,
                projection,
                predicate,
            } => LogicalPlan::Scan {
                source,
                projection,
                predicate: predicate.map(|p| self.simplify_predicate(p)),
            },
            LogicalPlan::Filter { input, predicate } => {
                let input = self.simplify_plan(*input);
                match self.simplify_predicate(predicate) {
                    Expr::Literal(Value::Boolean(true)) => input,
                    predicate => LogicalPlan::filter(input, predicate),
                }
            }
            LogicalPlan::Select { input, exprs } => LogicalPlan::Select {
                input: Box::new(self.simplify_plan(*input)),
                exprs: self.fold_all(exprs),
            },
            LogicalPlan::WithColumns { input, exprs } => LogicalPlan::WithColumns {
                input: Box::new(self.simplify_plan(*input)),
                exprs: self.fold_all(exprs),
            },
            LogicalPlan::Aggregate { input, keys, aggs } => LogicalPlan::Aggregate {
                input: Box::new(self.simplify_plan(*input)),
                keys: self.fold_all(keys),
                aggs: self.fold_all(aggs),
            },
            LogicalPlan::Sort { input, by } => LogicalPlan::Sort {
                input: Box::new(self.simplify_plan(*input)),
                by: by.into_iter().map(|(e, o)| (self.fold(e), o)).collect(),
            },
            LogicalPlan::Limit { input, n } => LogicalPlan::Limit {
                input: Box::new(self.simplify_plan(*input)),
                n,
            },
        }
    }

    fn fold_all(&self, exprs: Vec<Expr>) -> Vec<Expr> {
        exprs.into_iter().map(|e| self.fold(e)).collect()
    }

    /// Simplifies an expression used as a filter predicate.
    pub(crate) fn simplify_predicate(&self, expr: Expr) -> Expr {
        match expr {
            Expr::UnaryOp {
                op: UnaryOp::Not,
                expr: inner,
            } => match *inner {
                Expr::UnaryOp {
                    op: UnaryOp::Not,
                    expr: x,
                } => self.simplify_predicate(*x),
                other => self.fold(self.simplify_predicate(other).not()),
            },
            Expr::BinaryOp {
                left,
                op: op @ (BinaryOp::And | BinaryOp::Or),
                right,
            } => {
                let left = self.simplify_predicate(*left);
                let right = self.simplify_predicate(*right);
                let neutral = Value::Boolean(op == BinaryOp::And);
                match (left, right) {
                    (Expr::Literal(v), other) | (other, Expr::Literal(v)) if v == neutral => other,
                    (left, right) => self.fold(Expr::BinaryOp {
                        left: Box::new(left),
                        op,
                        right: Box::new(right),
                    }),
                }
            }
            other => self.fold(other),
        }
    }

    /// Folds literal-only subtrees.
    ///
    /// A subtree is only replaced when its value has the subtree's static
    /// type and evaluating it succeeds; failing constants are left for the
    /// executor to report.
    pub(crate) fn fold(&self, expr: Expr) -> Expr {
        let expr = match expr {
            Expr::Alias { expr, name } => {
                return Expr::Alias {
                    expr: Box::new(self.fold(*expr)),
                    name,
                }
            }
            Expr::BinaryOp { left, op, right } => Expr::BinaryOp {
                left: Box::new(self.fold(*left)),
                op,
                right: Box::new(self.fold(*right)),
            },
            Expr::UnaryOp { op, expr } => Expr::UnaryOp {
                op,
                expr: Box::new(self.fold(*expr)),
            },
            Expr::Function { func, expr } => Expr::Function {
                func,
                expr: Box::new(self.fold(*expr)),
            },
            Expr::Cast { expr, data_type } => Expr::Cast {
                expr: Box::new(self.fold(*expr)),
                data_type,
            },
            Expr::Aggregate {
                func,
                expr: Some(expr),
            } => Expr::Aggregate {
                func,
                expr: Some(Box::new(self.fold(*expr))),
            },
            other => return other,
        };

        if !expr.is_constant() {
            return expr;
        }
        let Ok(data_type) = expr.data_type(&Schema::empty()) else {
            return expr;
        };
        let Ok(one_row) = Table::with_row_count(vec![], 1) else {
            return expr;
        };
        match evaluate(&expr, &one_row) {
            Ok(Datum::Scalar { value, .. }) if value.data_type() == data_type => {
                Expr::Literal(value)
            }
            _ => expr,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{col, lit};

    #[test]
    fn test_constant_folding() {
        let pass = SimplifyExpressions;

        let folded = pass.fold(col("a").lt(lit(50i64) * lit(2i64)));
        assert_eq!(folded, col("a").lt(lit(100i64)));

        // type would change from f64 to null
        let div = lit(1i64) / lit(0i64);
        assert_eq!(pass.fold(div.clone()), div);

        // left for the executor to report
        let bad = lit("x") + lit(1i64);
        assert_eq!(pass.fold(bad.clone()), bad);
    }

    #[test]
    fn test_double_negation() {
        let pass = SimplifyExpressions;
        let simplified = pass.simplify_predicate(col("flag").not().not());
        assert_eq!(simplified, col("flag"));
    }

    #[test]
    fn test_neutral_operands() {
        let pass = SimplifyExpressions;
        let p = col("a").gt(lit(1i64)).and(lit(true));
        assert_eq!(pass.simplify_predicate(p), col("a").gt(lit(1i64)));

        let p = lit(false).or(col("b").is_null());
        assert_eq!(pass.simplify_predicate(p), col("b").is_null());
    }

    #[test]
    fn test_true_filter_removed() {
        use crate::planner::MemorySource;
        use std::sync::Arc;
        use strata_core::Column;

        let table = Table::new(vec![Column::new("a", vec![1i64]).unwrap()]).unwrap();
        let scan = LogicalPlan::scan(Arc::new(MemorySource::new(table)));
        let plan = LogicalPlan::filter(scan, lit(1i64).lt(lit(2i64)));
        let optimized = SimplifyExpressions.optimize(plan);
        assert!(matches!(optimized, LogicalPlan::Scan { .. }));
    }
}
