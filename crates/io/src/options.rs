//! CSV options.

use strata_core::Schema;
use strata_query::context::{EngineConfig, DEFAULT_BATCH_SIZE, DEFAULT_INFER_SCHEMA_ROWS};

/// Options for reading and writing CSV files.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CsvOptions {
    /// Field delimiter.
    pub delimiter: u8,
    /// Whether the first record holds column names.
    pub has_header: bool,
    /// Schema to use instead of inferring one.
    pub schema: Option<Schema>,
    /// Number of records used to infer the schema.
    pub infer_schema_rows: usize,
    /// Rows per batch when reading a whole file.
    pub batch_size: usize,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_header: true,
            schema: None,
            infer_schema_rows: DEFAULT_INFER_SCHEMA_ROWS,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl CsvOptions {
    /// Takes inference rows and batch size from an engine configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            infer_schema_rows: config.infer_schema_rows,
            batch_size: config.batch_size,
            ..Self::default()
        }
    }

    /// Sets the delimiter.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Sets whether the file has a header record.
    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Uses `schema` instead of inferring one.
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Sets the number of records used for inference.
    pub fn with_infer_schema_rows(mut self, rows: usize) -> Self {
        self.infer_schema_rows = rows.max(1);
        self
    }

    /// Sets the batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}
