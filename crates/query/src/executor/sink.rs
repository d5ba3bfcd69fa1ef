//! Output sinks for streamed query results.

use strata_core::{Result, Schema, Table};

/// A destination for result batches.
///
/// Batches arrive in output order. A sink is not transactional: batches
/// written before an error stay written.
pub trait Sink: Send {
    /// Called once, before the first batch, with the result schema.
    fn begin(&mut self, _schema: &Schema) -> Result<()> {
        Ok(())
    }

    /// Writes one batch.
    fn write_batch(&mut self, batch: &Table) -> Result<()>;

    /// Called once after the last batch.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A sink that keeps every batch in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    schema: Option<Schema>,
    batches: Vec<Table>,
    finished: bool,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the batches received so far.
    pub fn batches(&self) -> &[Table] {
        &self.batches
    }

    /// Returns true once [`Sink::finish`] was called.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Concatenates the received batches.
    pub fn into_table(self) -> Result<Table> {
        if self.batches.is_empty() {
            return Ok(Table::empty(&self.schema.unwrap_or_default()));
        }
        Table::concat(&self.batches)
    }
}

impl Sink for MemorySink {
    fn begin(&mut self, schema: &Schema) -> Result<()> {
        self.schema = Some(schema.clone());
        Ok(())
    }

    fn write_batch(&mut self, batch: &Table) -> Result<()> {
        self.batches.push(batch.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}
