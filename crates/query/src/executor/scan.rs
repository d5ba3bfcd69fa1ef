//! Scan executor.

use super::evaluate::evaluate_predicate;
use crate::ast::Expr;
use crate::planner::{BatchReader, TableSource};
use strata_core::{Result, Schema, Table};

/// Scan executor - reads a source, applying the scan's predicate and projection.
///
/// The source is asked for the projected columns plus whatever the predicate
/// reads; predicate-only columns are dropped once rows are filtered.
pub struct ScanExecutor<'a> {
    source: &'a dyn TableSource,
    predicate: Option<&'a Expr>,
    schema: Schema,
    read: Option<Vec<String>>,
}

impl<'a> ScanExecutor<'a> {
    /// Creates a new scan executor, resolving the projection against the source schema.
    pub fn new(
        source: &'a dyn TableSource,
        projection: Option<&[String]>,
        predicate: Option<&'a Expr>,
    ) -> Result<Self> {
        let full = source.schema()?;
        let (schema, read) = match projection {
            None => (full, None),
            Some(projection) => {
                let schema = full.project(projection)?;
                let mut wanted = projection.to_vec();
                if let Some(predicate) = predicate {
                    wanted.extend(predicate.referenced_columns());
                }
                let read = full.project(&wanted)?.names().map(String::from).collect();
                (schema, Some(read))
            }
        };
        Ok(Self {
            source,
            predicate,
            schema,
            read,
        })
    }

    /// Output schema of the scan.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Columns requested from the source, in source order. `None` reads all.
    pub fn read_columns(&self) -> Option<&[String]> {
        self.read.as_deref()
    }

    /// Opens the source.
    pub fn open(&self, batch_size: usize) -> Result<BatchReader> {
        self.source.scan(self.read_columns(), batch_size)
    }

    /// Applies the predicate and projection to one batch read by [`open`](Self::open).
    pub fn process(&self, batch: &Table) -> Result<Table> {
        filter_and_project(batch, self.predicate, &self.schema)
    }

    /// Reads the whole source into one table.
    pub fn execute(&self) -> Result<Table> {
        let batches = self
            .open(usize::MAX)?
            .map(|batch| self.process(&batch?))
            .collect::<Result<Vec<_>>>()?;
        if batches.is_empty() {
            Ok(Table::empty(&self.schema))
        } else {
            Table::concat(&batches)
        }
    }
}

/// Keeps the rows of `batch` matching `predicate`, then the columns of `schema`.
pub(crate) fn filter_and_project(
    batch: &Table,
    predicate: Option<&Expr>,
    schema: &Schema,
) -> Result<Table> {
    let filtered = match predicate {
        Some(predicate) => batch.filter(&evaluate_predicate(predicate, batch)?)?,
        None => batch.clone(),
    };
    if filtered.num_columns() == schema.len() {
        return Ok(filtered);
    }
    let names: Vec<&str> = schema.names().collect();
    filtered.select_columns(&names)
}
