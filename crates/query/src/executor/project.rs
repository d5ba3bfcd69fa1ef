//! Project executors: `select` and `with_columns`.

use super::evaluate::{evaluate, Datum};
use crate::ast::Expr;
use crate::context::ExecutionContext;
use hashbrown::HashSet;
use strata_core::{Error, Result, Table};

fn evaluate_all(exprs: &[Expr], input: &Table, ctx: &ExecutionContext) -> Result<Vec<Datum>> {
    let mut names = HashSet::with_capacity(exprs.len());
    for expr in exprs {
        let name = expr.output_name();
        if !names.insert(name.clone()) {
            return Err(Error::duplicate_column(name));
        }
    }
    ctx.try_map(exprs, |expr| evaluate(expr, input))
}

/// Project executor - computes exactly the given expressions.
///
/// If every expression reduces to a single value the result has one row;
/// otherwise single values are broadcast to the input's row count.
pub struct ProjectExecutor<'a> {
    exprs: &'a [Expr],
}

impl<'a> ProjectExecutor<'a> {
    /// Creates a new project executor.
    pub fn new(exprs: &'a [Expr]) -> Self {
        Self { exprs }
    }

    /// Executes the projection on the input table.
    pub fn execute(&self, input: &Table, ctx: &ExecutionContext) -> Result<Table> {
        let datums = evaluate_all(self.exprs, input, ctx)?;
        let all_scalar = !datums.is_empty() && datums.iter().all(Datum::is_scalar);
        let len = if all_scalar { 1 } else { input.num_rows() };
        let columns = datums
            .into_iter()
            .zip(self.exprs)
            .map(|(datum, expr)| datum.into_column(&expr.output_name(), len))
            .collect::<Result<Vec<_>>>()?;
        Table::with_row_count(columns, len)
    }
}

/// Adds or replaces columns, keeping the others in place.
///
/// Every expression sees the input table, not the columns added beside it.
pub struct WithColumnsExecutor<'a> {
    exprs: &'a [Expr],
}

impl<'a> WithColumnsExecutor<'a> {
    /// Creates a new with_columns executor.
    pub fn new(exprs: &'a [Expr]) -> Self {
        Self { exprs }
    }

    /// Executes on the input table.
    pub fn execute(&self, input: &Table, ctx: &ExecutionContext) -> Result<Table> {
        let datums = evaluate_all(self.exprs, input, ctx)?;
        let mut output = input.clone();
        for (datum, expr) in datums.into_iter().zip(self.exprs) {
            output = output.with_column(datum.into_column(&expr.output_name(), input.num_rows())?)?;
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{col, len, lit};
    use crate::context::EngineConfig;
    use strata_core::{Column, DataType, Value};

    fn ctx() -> ExecutionContext {
        ExecutionContext::new(EngineConfig::default().with_parallelism(2))
    }

    fn table() -> Table {
        Table::new(vec![
            Column::new("a", (0..5i64).collect::<Vec<_>>()).unwrap(),
            Column::new("b", vec![1.0, 2.0, 3.0, 4.0, 5.0]).unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn test_select_columns_and_broadcast() {
        let exprs = [col("b"), lit(7i64).alias("seven"), (col("a") * lit(2i64)).alias("a2")];
        let out = ProjectExecutor::new(&exprs).execute(&table(), &ctx()).unwrap();
        assert_eq!(out.column_names(), vec!["b", "seven", "a2"]);
        assert_eq!(out.num_rows(), 5);
        assert_eq!(out.column("seven").unwrap().get(4), Some(Value::Int64(7)));
        assert_eq!(out.column("a2").unwrap().get(3), Some(Value::Int64(6)));
    }

    #[test]
    fn test_select_all_scalars_is_one_row() {
        let exprs = [col("a").sum(), col("b").mean().alias("mean"), len()];
        let out = ProjectExecutor::new(&exprs).execute(&table(), &ctx()).unwrap();
        assert_eq!(out.num_rows(), 1);
        assert_eq!(
            out.row(0).unwrap(),
            vec![Value::Int64(10), Value::Float64(3.0), Value::Int64(5)]
        );
    }

    #[test]
    fn test_select_duplicate_names() {
        let exprs = [col("a"), col("a") + lit(1i64)];
        let err = ProjectExecutor::new(&exprs).execute(&table(), &ctx()).unwrap_err();
        assert!(matches!(err, Error::DuplicateColumn { .. }));
    }

    #[test]
    fn test_with_columns_replace_and_append() {
        let exprs = [
            (col("a") + lit(100i64)).alias("a"),
            col("b").lt(lit(3i64)).alias("small"),
            (col("a") + lit(1i64)).alias("next"),
        ];
        let out = WithColumnsExecutor::new(&exprs).execute(&table(), &ctx()).unwrap();
        assert_eq!(out.column_names(), vec!["a", "b", "small", "next"]);
        assert_eq!(out.column("a").unwrap().get(0), Some(Value::Int64(100)));
        // sees the input column, not the replaced one
        assert_eq!(out.column("next").unwrap().get(0), Some(Value::Int64(1)));
        assert_eq!(out.column("small").unwrap().data_type(), DataType::Boolean);
    }

    #[test]
    fn test_with_columns_broadcasts_aggregate() {
        let exprs = [col("b").max().alias("top")];
        let out = WithColumnsExecutor::new(&exprs).execute(&table(), &ctx()).unwrap();
        assert_eq!(out.num_rows(), 5);
        assert!(out
            .column("top")
            .unwrap()
            .iter()
            .all(|v| v == Value::Float64(5.0)));
    }
}
