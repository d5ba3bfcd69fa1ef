//! CSV reading: schema inference, batched scans and whole-file reads.

use crate::infer::{infer_type, parse_field};
use crate::options::CsvOptions;
use csv::StringRecord;
use std::fs::File;
use std::path::{Path, PathBuf};
use strata_core::{ColumnBuilder, Error, Field, Result, Schema, Table};
use strata_query::planner::{BatchReader, TableSource};
use tracing::{debug, trace};

/// Upper bound on the capacity reserved per batch, whatever the batch size.
const MAX_RESERVED_ROWS: usize = 8 * 1024;

/// Maps a csv error to an I/O error, or to a parse error at its record.
pub(crate) fn map_csv_error(err: csv::Error) -> Error {
    let reason = err.to_string();
    let row = err.position().map(|p| p.line()).unwrap_or(0);
    match err.into_kind() {
        csv::ErrorKind::Io(e) => Error::Io(e),
        _ => Error::Parse {
            row,
            column: "*".into(),
            reason,
        },
    }
}

fn open_reader(path: &Path, options: &CsvOptions) -> Result<csv::Reader<File>> {
    let file = File::open(path)?;
    Ok(csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(options.has_header)
        .from_reader(file))
}

/// Reads the header and the first `infer_schema_rows` records of a file.
fn infer_schema(path: &Path, options: &CsvOptions) -> Result<Schema> {
    let mut reader = open_reader(path, options)?;
    let mut names: Vec<String> = if options.has_header {
        reader
            .headers()
            .map_err(map_csv_error)?
            .iter()
            .map(String::from)
            .collect()
    } else {
        Vec::new()
    };

    let mut samples: Vec<StringRecord> = Vec::new();
    for record in reader.records().take(options.infer_schema_rows) {
        samples.push(record.map_err(map_csv_error)?);
    }
    if !options.has_header {
        let width = samples.first().map(StringRecord::len).unwrap_or(0);
        names = (1..=width).map(|i| format!("column_{}", i)).collect();
    }

    let fields = names
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            let data_type = infer_type(samples.iter().map(|r| r.get(i).unwrap_or("")));
            Field::new(name, data_type)
        })
        .collect();
    Schema::new(fields)
}

/// A CSV file scanned in batches.
///
/// The schema is inferred when the source is created, from the header and
/// the first records only. Rows are read when a scan is pulled.
#[derive(Clone, Debug)]
pub struct CsvSource {
    path: PathBuf,
    name: String,
    options: CsvOptions,
    schema: Schema,
}

impl CsvSource {
    /// Creates a source over the file at `path`.
    pub fn new(path: impl AsRef<Path>, options: CsvOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let schema = match &options.schema {
            Some(schema) => schema.clone(),
            None => infer_schema(&path, &options)?,
        };
        debug!(path = %path.display(), schema = %schema, "csv source opened");
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            path,
            name,
            options,
            schema,
        })
    }

    /// Returns the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TableSource for CsvSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn schema(&self) -> Result<Schema> {
        Ok(self.schema.clone())
    }

    fn scan(&self, projection: Option<&[String]>, batch_size: usize) -> Result<BatchReader> {
        let fields: Vec<(usize, Field)> = match projection {
            Some(names) => {
                let projected = self.schema.project(names)?;
                projected
                    .fields()
                    .iter()
                    .filter_map(|f| self.schema.index_of(f.name()).map(|i| (i, f.clone())))
                    .collect()
            }
            None => self.schema.fields().iter().cloned().enumerate().collect(),
        };
        let reader = open_reader(&self.path, &self.options)?;
        Ok(Box::new(CsvBatches {
            records: reader,
            record: StringRecord::new(),
            width: self.schema.len(),
            fields,
            batch_size: batch_size.max(1),
            done: false,
        }))
    }
}

/// Iterator over the batches of one scan.
struct CsvBatches {
    records: csv::Reader<File>,
    record: StringRecord,
    /// Number of fields in every record.
    width: usize,
    /// Parsed columns: position in the record, and field.
    fields: Vec<(usize, Field)>,
    batch_size: usize,
    done: bool,
}

impl CsvBatches {
    fn read_batch(&mut self) -> Result<Option<Table>> {
        let capacity = self.batch_size.min(MAX_RESERVED_ROWS);
        let mut builders: Vec<ColumnBuilder> = self
            .fields
            .iter()
            .map(|(_, f)| ColumnBuilder::new(f.data_type(), capacity))
            .collect();

        let mut rows = 0;
        while rows < self.batch_size {
            if !self.records.read_record(&mut self.record).map_err(map_csv_error)? {
                self.done = true;
                break;
            }
            let line = self.record.position().map(|p| p.line()).unwrap_or(0);
            if self.record.len() != self.width {
                return Err(Error::Parse {
                    row: line,
                    column: "*".into(),
                    reason: format!(
                        "expected {} fields, found {}",
                        self.width,
                        self.record.len()
                    ),
                });
            }
            for ((index, field), builder) in self.fields.iter().zip(builders.iter_mut()) {
                let raw = self.record.get(*index).unwrap_or("");
                let value = parse_field(raw, field.data_type()).ok_or_else(|| Error::Parse {
                    row: line,
                    column: field.name().to_string(),
                    reason: format!("'{}' is not a valid {}", raw, field.data_type()),
                })?;
                builder.push(value)?;
            }
            rows += 1;
        }

        if rows == 0 {
            return Ok(None);
        }
        let columns = builders
            .into_iter()
            .zip(&self.fields)
            .map(|(b, (_, f))| b.finish(f.name()))
            .collect();
        trace!(rows, "csv batch read");
        Table::with_row_count(columns, rows).map(Some)
    }
}

impl Iterator for CsvBatches {
    type Item = Result<Table>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_batch() {
            Ok(Some(batch)) => Some(Ok(batch)),
            Ok(None) => None,
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Reads a whole CSV file into a table.
pub fn read_csv(path: impl AsRef<Path>, options: &CsvOptions) -> Result<Table> {
    let source = CsvSource::new(path, options.clone())?;
    let batches = source
        .scan(None, options.batch_size)?
        .collect::<Result<Vec<_>>>()?;
    if batches.is_empty() {
        Ok(Table::empty(&source.schema))
    } else {
        Table::concat(&batches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use strata_core::{DataType, ErrorKind, Value};
    use tempfile::NamedTempFile;

    fn file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_read_infers_types() {
        let f = file("model,range,price,ev\nLeaf,84,31.5,true\ni3,,44,false\n");
        let table = read_csv(f.path(), &CsvOptions::default()).unwrap();
        assert_eq!(
            table.schema().to_string(),
            "{model: str, range: i64, price: f64, ev: bool}"
        );
        assert_eq!(table.column("range").unwrap().get(1), Some(Value::Null));
        assert_eq!(table.column("price").unwrap().get(1), Some(Value::Float64(44.0)));
    }

    #[test]
    fn test_scan_projects_and_batches() {
        let mut contents = String::from("a,b,c\n");
        for i in 0..25 {
            contents.push_str(&format!("{},x{},{}\n", i, i, i * 2));
        }
        let f = file(&contents);
        let source = CsvSource::new(f.path(), CsvOptions::default()).unwrap();
        let projection = vec!["c".to_string(), "a".to_string()];
        let batches: Vec<Table> = source
            .scan(Some(projection.as_slice()), 10)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(
            batches.iter().map(Table::num_rows).collect::<Vec<_>>(),
            vec![10, 10, 5]
        );
        assert_eq!(batches[0].column_names(), vec!["a", "c"]);

        let counted: usize = source
            .scan(Some(&[][..]), 7)
            .unwrap()
            .map(|b| b.unwrap().num_rows())
            .sum();
        assert_eq!(counted, 25);
    }

    #[test]
    fn test_malformed_value_names_row_and_column() {
        let f = file("a,b\n1,2\n3,oops\n");
        let options = CsvOptions::default().with_infer_schema_rows(1);
        let err = read_csv(f.path(), &options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        match err {
            Error::Parse { row, column, .. } => {
                assert_eq!(row, 3);
                assert_eq!(column, "b");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = read_csv("/nonexistent/cars.csv", &CsvOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_headerless_with_schema() {
        let f = file("1;a\n2;b\n");
        let schema = Schema::new(vec![
            Field::new("id", DataType::Float64),
            Field::new("tag", DataType::String),
        ])
        .unwrap();
        let options = CsvOptions::default()
            .with_header(false)
            .with_delimiter(b';')
            .with_schema(schema);
        let table = read_csv(f.path(), &options).unwrap();
        assert_eq!(table.column("id").unwrap().get(1), Some(Value::Float64(2.0)));
        assert_eq!(table.num_rows(), 2);
    }
}
