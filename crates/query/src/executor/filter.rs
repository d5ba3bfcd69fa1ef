//! Filter executor.

use super::evaluate::evaluate_predicate;
use crate::ast::Expr;
use strata_core::{Result, Table};

/// Filter executor - keeps the rows where a predicate is true.
///
/// Rows where the predicate is false or missing are dropped.
pub struct FilterExecutor<'a> {
    predicate: &'a Expr,
}

impl<'a> FilterExecutor<'a> {
    /// Creates a new filter executor.
    pub fn new(predicate: &'a Expr) -> Self {
        Self { predicate }
    }

    /// Executes the filter on the input table.
    pub fn execute(&self, input: &Table) -> Result<Table> {
        let mask = evaluate_predicate(self.predicate, input)?;
        input.filter(&mask)
    }
}
