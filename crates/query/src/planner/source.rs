//! Scan targets for logical plans.

use core::fmt;
use strata_core::{Result, Schema, Table};

/// A stream of table batches, in source order.
pub type BatchReader = Box<dyn Iterator<Item = Result<Table>> + Send>;

/// A data source a plan can scan.
///
/// Sources are opened at execution time only: building a plan over a source
/// never reads it.
pub trait TableSource: Send + Sync + fmt::Debug {
    /// Short name used by `explain`.
    fn name(&self) -> &str;

    /// Returns the schema of the full source.
    fn schema(&self) -> Result<Schema>;

    /// Opens the source, yielding batches of at most `batch_size` rows.
    ///
    /// When `projection` is given, batches contain only those columns, in
    /// source schema order.
    fn scan(&self, projection: Option<&[String]>, batch_size: usize) -> Result<BatchReader>;
}

/// A source over a table already held in memory.
#[derive(Clone, Debug)]
pub struct MemorySource {
    name: String,
    table: Table,
}

impl MemorySource {
    /// Wraps a table.
    pub fn new(table: Table) -> Self {
        Self::named("df", table)
    }

    /// Wraps a table under a custom name.
    pub fn named(name: impl Into<String>, table: Table) -> Self {
        Self {
            name: name.into(),
            table,
        }
    }

    /// Returns the wrapped table.
    pub fn table(&self) -> &Table {
        &self.table
    }
}

impl TableSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn schema(&self) -> Result<Schema> {
        Ok(self.table.schema())
    }

    fn scan(&self, projection: Option<&[String]>, batch_size: usize) -> Result<BatchReader> {
        let table = match projection {
            Some(names) => {
                let schema = self.table.schema().project(names)?;
                let ordered: Vec<&str> = schema.names().collect();
                self.table.select_columns(&ordered)?
            }
            None => self.table.clone(),
        };
        Ok(Box::new(table.split(batch_size).into_iter().map(Ok)))
    }
}
