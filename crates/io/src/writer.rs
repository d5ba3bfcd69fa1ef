//! CSV writing.

use crate::options::CsvOptions;
use crate::reader::map_csv_error;
use csv::StringRecord;
use std::fs::File;
use std::path::Path;
use strata_core::{Result, Schema, Table, Value};
use strata_query::executor::Sink;
use tracing::{debug, trace};

fn format_value(value: &Value, out: &mut String) {
    use std::fmt::Write as _;
    out.clear();
    // Writing to a String cannot fail.
    let _ = match value {
        Value::Null => Ok(()),
        Value::Boolean(b) => write!(out, "{}", b),
        Value::Int64(i) => write!(out, "{}", i),
        // Debug keeps a decimal point on whole numbers and round-trips exactly.
        Value::Float64(f) => write!(out, "{:?}", f),
        Value::String(s) => {
            out.push_str(s);
            Ok(())
        }
    };
}

/// A sink writing batches to a CSV file as they arrive.
///
/// The header is written once, before the first batch; the file is flushed
/// after every batch.
pub struct CsvSink {
    writer: csv::Writer<File>,
    has_header: bool,
    header_written: bool,
    record: StringRecord,
    field: String,
    rows: usize,
}

impl CsvSink {
    /// Creates (or truncates) the file at `path`.
    pub fn create(path: impl AsRef<Path>, options: &CsvOptions) -> Result<Self> {
        let file = File::create(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "csv sink created");
        Ok(Self {
            writer: csv::WriterBuilder::new()
                .delimiter(options.delimiter)
                .has_headers(false)
                .from_writer(file),
            has_header: options.has_header,
            header_written: false,
            record: StringRecord::new(),
            field: String::new(),
            rows: 0,
        })
    }

    /// Returns the number of rows written so far.
    pub fn rows_written(&self) -> usize {
        self.rows
    }
}

impl Sink for CsvSink {
    fn begin(&mut self, schema: &Schema) -> Result<()> {
        if self.has_header && !self.header_written {
            self.writer
                .write_record(schema.names())
                .map_err(map_csv_error)?;
            self.header_written = true;
        }
        Ok(())
    }

    fn write_batch(&mut self, batch: &Table) -> Result<()> {
        for row in 0..batch.num_rows() {
            self.record.clear();
            for column in batch.columns() {
                format_value(&column.get(row).unwrap_or(Value::Null), &mut self.field);
                self.record.push_field(&self.field);
            }
            self.writer
                .write_record(&self.record)
                .map_err(map_csv_error)?;
        }
        self.writer.flush()?;
        self.rows += batch.num_rows();
        trace!(rows = batch.num_rows(), "csv batch written");
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        debug!(rows = self.rows, "csv sink finished");
        Ok(())
    }
}

/// Writes a table to a CSV file.
pub fn write_csv(table: &Table, path: impl AsRef<Path>, options: &CsvOptions) -> Result<()> {
    let mut sink = CsvSink::create(path, options)?;
    sink.begin(&table.schema())?;
    sink.write_batch(table)?;
    sink.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_value() {
        let mut out = String::new();
        format_value(&Value::Float64(3.0), &mut out);
        assert_eq!(out, "3.0");
        format_value(&Value::Int64(-7), &mut out);
        assert_eq!(out, "-7");
        format_value(&Value::Null, &mut out);
        assert_eq!(out, "");
        format_value(&Value::Boolean(true), &mut out);
        assert_eq!(out, "true");
    }
}
