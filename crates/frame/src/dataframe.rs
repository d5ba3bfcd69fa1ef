//! Eager DataFrame.

use crate::context::default_context;
use crate::lazyframe::LazyFrame;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use strata_core::{Column, Result, Schema, Table};
use strata_io::CsvOptions;
use strata_query::ast::{Expr, SortOrder};
use strata_query::context::ExecutionContext;
use strata_query::executor::EagerExecutor;
use strata_query::planner::MemorySource;

/// A table with eager operations.
///
/// Every operation runs immediately and returns a new frame; the frame it
/// was called on is left unchanged.
#[derive(Clone)]
pub struct DataFrame {
    table: Table,
    ctx: Arc<ExecutionContext>,
}

impl DataFrame {
    /// Creates a frame from columns of equal length.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        Ok(Self::from(Table::new(columns)?))
    }

    /// Runs this frame's operations on `ctx` instead of the default context.
    pub fn with_context(mut self, ctx: Arc<ExecutionContext>) -> Self {
        self.ctx = ctx;
        self
    }

    fn executor(&self) -> EagerExecutor {
        EagerExecutor::new(Arc::clone(&self.ctx))
    }

    fn derive(&self, table: Table) -> Self {
        Self {
            table,
            ctx: Arc::clone(&self.ctx),
        }
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.table.num_rows()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.table.num_columns()
    }

    /// Returns the schema.
    pub fn schema(&self) -> Schema {
        self.table.schema()
    }

    /// Returns the column names in order.
    pub fn column_names(&self) -> Vec<&str> {
        self.table.column_names()
    }

    /// Gets a column by name.
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.table.column(name)
    }

    /// Keeps the rows where `predicate` is true.
    pub fn filter(&self, predicate: Expr) -> Result<Self> {
        let table = self.executor().filter(&self.table, &predicate)?;
        Ok(self.derive(table))
    }

    /// Computes exactly the given expressions.
    pub fn select(&self, exprs: impl IntoIterator<Item = Expr>) -> Result<Self> {
        let exprs: Vec<Expr> = exprs.into_iter().collect();
        let table = self.executor().select(&self.table, &exprs)?;
        Ok(self.derive(table))
    }

    /// Adds columns, replacing existing columns of the same name.
    pub fn with_columns(&self, exprs: impl IntoIterator<Item = Expr>) -> Result<Self> {
        let exprs: Vec<Expr> = exprs.into_iter().collect();
        let table = self.executor().with_columns(&self.table, &exprs)?;
        Ok(self.derive(table))
    }

    /// Starts a grouped aggregation.
    pub fn group_by(&self, keys: impl IntoIterator<Item = Expr>) -> GroupBy<'_> {
        GroupBy {
            df: self,
            keys: keys.into_iter().collect(),
        }
    }

    /// Sorts by the given keys; ties keep their current order.
    pub fn sort(&self, by: impl IntoIterator<Item = (Expr, SortOrder)>) -> Result<Self> {
        let by: Vec<(Expr, SortOrder)> = by.into_iter().collect();
        let table = self.executor().sort(&self.table, &by)?;
        Ok(self.derive(table))
    }

    /// Returns the first `n` rows.
    pub fn head(&self, n: usize) -> Self {
        self.derive(self.table.slice(0, n))
    }

    /// Starts a lazy query over this frame's data.
    pub fn lazy(&self) -> LazyFrame {
        LazyFrame::scan(Arc::new(MemorySource::new(self.table.clone())))
            .with_context(Arc::clone(&self.ctx))
    }

    /// Returns the underlying table.
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Converts into the underlying table.
    pub fn into_table(self) -> Table {
        self.table
    }

    /// Writes the frame to a CSV file.
    pub fn write_csv(&self, path: impl AsRef<Path>, options: &CsvOptions) -> Result<()> {
        strata_io::write_csv(&self.table, path, options)
    }
}

impl From<Table> for DataFrame {
    fn from(table: Table) -> Self {
        Self {
            table,
            ctx: default_context(),
        }
    }
}

impl PartialEq for DataFrame {
    fn eq(&self, other: &Self) -> bool {
        self.table == other.table
    }
}

impl fmt::Debug for DataFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataFrame")
            .field("schema", &self.table.schema())
            .field("height", &self.height())
            .finish()
    }
}

/// A grouped aggregation over a [`DataFrame`], built by [`DataFrame::group_by`].
pub struct GroupBy<'a> {
    df: &'a DataFrame,
    keys: Vec<Expr>,
}

impl GroupBy<'_> {
    /// Computes the aggregations per group: keys first, then aggregates.
    pub fn agg(self, aggs: impl IntoIterator<Item = Expr>) -> Result<DataFrame> {
        let aggs: Vec<Expr> = aggs.into_iter().collect();
        let table = self
            .df
            .executor()
            .group_by_agg(&self.df.table, &self.keys, &aggs)?;
        Ok(self.df.derive(table))
    }
}
