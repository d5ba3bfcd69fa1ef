//! Logical query plan definitions.

use super::source::TableSource;
use crate::ast::{Expr, SortOrder};
use std::sync::Arc;
use strata_core::{DataType, Error, Field, Result, ResultExt, Schema};

/// Logical query plan node.
///
/// A plan is a chain of nodes that always ends in a `Scan`. Building a plan
/// performs no I/O and no computation.
#[derive(Clone, Debug)]
pub enum LogicalPlan {
    /// Reads a source. `projection` limits the columns produced and
    /// `predicate` drops rows while reading; both are normally set by the
    /// optimizer.
    Scan {
        source: Arc<dyn TableSource>,
        projection: Option<Vec<String>>,
        predicate: Option<Expr>,
    },

    /// Keeps the rows where `predicate` is true.
    Filter {
        input: Box<LogicalPlan>,
        predicate: Expr,
    },

    /// Computes exactly the given expressions.
    Select {
        input: Box<LogicalPlan>,
        exprs: Vec<Expr>,
    },

    /// Adds or replaces columns, keeping the others.
    WithColumns {
        input: Box<LogicalPlan>,
        exprs: Vec<Expr>,
    },

    /// Groups by `keys` and reduces each group with `aggs`.
    Aggregate {
        input: Box<LogicalPlan>,
        keys: Vec<Expr>,
        aggs: Vec<Expr>,
    },

    /// Stable multi-key sort.
    Sort {
        input: Box<LogicalPlan>,
        by: Vec<(Expr, SortOrder)>,
    },

    /// Keeps the first `n` rows.
    Limit { input: Box<LogicalPlan>, n: usize },
}

impl LogicalPlan {
    /// Creates a table scan plan.
    pub fn scan(source: Arc<dyn TableSource>) -> Self {
        LogicalPlan::Scan {
            source,
            projection: None,
            predicate: None,
        }
    }

    /// Creates a filter plan.
    pub fn filter(input: LogicalPlan, predicate: Expr) -> Self {
        LogicalPlan::Filter {
            input: Box::new(input),
            predicate,
        }
    }

    /// Creates a select plan.
    pub fn select(input: LogicalPlan, exprs: Vec<Expr>) -> Self {
        LogicalPlan::Select {
            input: Box::new(input),
            exprs,
        }
    }

    /// Creates a with_columns plan.
    pub fn with_columns(input: LogicalPlan, exprs: Vec<Expr>) -> Self {
        LogicalPlan::WithColumns {
            input: Box::new(input),
            exprs,
        }
    }

    /// Creates an aggregation plan.
    pub fn aggregate(input: LogicalPlan, keys: Vec<Expr>, aggs: Vec<Expr>) -> Self {
        LogicalPlan::Aggregate {
            input: Box::new(input),
            keys,
            aggs,
        }
    }

    /// Creates a sort plan.
    pub fn sort(input: LogicalPlan, by: Vec<(Expr, SortOrder)>) -> Self {
        LogicalPlan::Sort {
            input: Box::new(input),
            by,
        }
    }

    /// Creates a limit plan.
    pub fn limit(input: LogicalPlan, n: usize) -> Self {
        LogicalPlan::Limit {
            input: Box::new(input),
            n,
        }
    }

    /// Returns the input plan of this node, if any.
    pub fn input(&self) -> Option<&LogicalPlan> {
        match self {
            LogicalPlan::Scan { .. } => None,
            LogicalPlan::Filter { input, .. }
            | LogicalPlan::Select { input, .. }
            | LogicalPlan::WithColumns { input, .. }
            | LogicalPlan::Aggregate { input, .. }
            | LogicalPlan::Sort { input, .. }
            | LogicalPlan::Limit { input, .. } => Some(input),
        }
    }

    /// Number of nodes in the chain, scan included.
    pub fn depth(&self) -> usize {
        1 + self.input().map_or(0, LogicalPlan::depth)
    }

    /// Validates the plan and returns its output schema.
    ///
    /// Checks that every referenced column exists and that every expression
    /// is well typed. Errors name the node that failed.
    pub fn schema(&self) -> Result<Schema> {
        match self {
            LogicalPlan::Scan {
                source,
                projection,
                predicate,
            } => {
                let step = || self.describe();
                let full = source.schema().with_step(step)?;
                if let Some(p) = predicate {
                    check_predicate(p, &full).with_step(step)?;
                }
                match projection {
                    Some(names) => full.project(names).with_step(step),
                    None => Ok(full),
                }
            }

            LogicalPlan::Filter { input, predicate } => {
                let schema = input.schema()?;
                check_predicate(predicate, &schema).with_step(|| self.describe())?;
                Ok(schema)
            }

            LogicalPlan::Select { input, exprs } => {
                let schema = input.schema()?;
                output_fields(exprs, &schema)
                    .and_then(Schema::new)
                    .with_step(|| self.describe())
            }

            LogicalPlan::WithColumns { input, exprs } => {
                let mut schema = input.schema()?;
                let fields = output_fields(exprs, &schema)
                    .and_then(|fields| {
                        Schema::new(fields.clone())?;
                        Ok(fields)
                    })
                    .with_step(|| self.describe())?;
                for field in fields {
                    schema.upsert(field);
                }
                Ok(schema)
            }

            LogicalPlan::Aggregate { input, keys, aggs } => {
                let schema = input.schema()?;
                let step = || self.describe();
                if let Some(key) = keys.iter().find(|k| k.has_aggregate()) {
                    return Err(Error::invalid_schema(format!(
                        "group key '{}' contains an aggregation",
                        key
                    )))
                    .with_step(step);
                }
                for agg in aggs {
                    if agg.as_aggregate().is_none() {
                        return Err(Error::invalid_schema(format!(
                            "'{}' is not an aggregation",
                            agg
                        )))
                        .with_step(step);
                    }
                }
                let mut fields = output_fields(keys, &schema).with_step(step)?;
                fields.extend(output_fields(aggs, &schema).with_step(step)?);
                Schema::new(fields).with_step(step)
            }

            LogicalPlan::Sort { input, by } => {
                let schema = input.schema()?;
                for (expr, _) in by {
                    expr.data_type(&schema).with_step(|| self.describe())?;
                }
                Ok(schema)
            }

            LogicalPlan::Limit { input, .. } => input.schema(),
        }
    }
}

fn check_predicate(predicate: &Expr, schema: &Schema) -> Result<()> {
    match predicate.data_type(schema)? {
        DataType::Boolean | DataType::Null => Ok(()),
        other => Err(Error::type_mismatch(
            "filter predicate",
            DataType::Boolean,
            other,
        )),
    }
}

fn output_fields(exprs: &[Expr], schema: &Schema) -> Result<Vec<Field>> {
    exprs
        .iter()
        .map(|e| Ok(Field::new(e.output_name(), e.data_type(schema)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{col, len, lit};
    use crate::planner::MemorySource;
    use strata_core::{Column, ErrorKind, Table};

    fn scan() -> LogicalPlan {
        let table = Table::new(vec![
            Column::new("a", vec![1i64, 2, 3]).unwrap(),
            Column::new("b", vec![1.5, 2.5, 3.5]).unwrap(),
            Column::new("s", vec!["x", "y", "z"]).unwrap(),
        ])
        .unwrap();
        LogicalPlan::scan(Arc::new(MemorySource::new(table)))
    }

    #[test]
    fn test_logical_plan_builders() {
        let plan = LogicalPlan::limit(
            LogicalPlan::filter(scan(), col("a").gt(lit(1i64))),
            10,
        );
        assert!(matches!(plan, LogicalPlan::Limit { n: 10, .. }));
        assert_eq!(plan.depth(), 3);
        assert!(matches!(plan.input(), Some(LogicalPlan::Filter { .. })));
    }

    #[test]
    fn test_schema_select_and_with_columns() {
        let plan = LogicalPlan::with_columns(
            scan(),
            vec![(col("a") * lit(2i64)).alias("a2"), col("b").round().alias("b")],
        );
        let schema = plan.schema().unwrap();
        assert_eq!(schema.names().collect::<Vec<_>>(), vec!["a", "b", "s", "a2"]);
        assert_eq!(schema.field("a2").unwrap().data_type(), DataType::Int64);

        let plan = LogicalPlan::select(scan(), vec![col("s"), col("a").mean()]);
        let schema = plan.schema().unwrap();
        assert_eq!(schema.to_string(), "{s: str, a: f64}");
    }

    #[test]
    fn test_schema_aggregate() {
        let plan = LogicalPlan::aggregate(
            scan(),
            vec![col("s")],
            vec![col("a").sum().alias("total"), len()],
        );
        assert_eq!(
            plan.schema().unwrap().to_string(),
            "{s: str, total: i64, len: i64}"
        );

        let bad = LogicalPlan::aggregate(scan(), vec![col("s")], vec![col("a")]);
        assert_eq!(bad.schema().unwrap_err().kind(), ErrorKind::Schema);

        let bad = LogicalPlan::aggregate(scan(), vec![col("a").max()], vec![len()]);
        assert!(matches!(
            bad.schema().unwrap_err().root(),
            Error::InvalidSchema { .. }
        ));
    }

    #[test]
    fn test_schema_errors_name_the_step() {
        let plan = LogicalPlan::filter(scan(), col("missing").gt(lit(1i64)));
        let err = plan.schema().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
        assert!(matches!(err.root(), Error::ColumnNotFound { .. }));
        assert!(err.to_string().starts_with("FILTER"));

        let plan = LogicalPlan::filter(scan(), col("a") + lit(1i64));
        assert!(matches!(
            plan.schema().unwrap_err().root(),
            Error::TypeMismatch { .. }
        ));
    }

    #[test]
    fn test_schema_rejects_duplicate_names() {
        let plan = LogicalPlan::select(scan(), vec![col("a"), col("a")]);
        assert!(matches!(
            plan.schema().unwrap_err().root(),
            Error::DuplicateColumn { .. }
        ));
    }
}
