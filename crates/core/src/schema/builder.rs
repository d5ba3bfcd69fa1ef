//! Row-oriented builder for small tables.

use super::field::{Field, Schema};
use crate::column::ColumnBuilder;
use crate::error::{Error, Result};
use crate::table::Table;
use crate::types::DataType;
use crate::value::Value;

/// Builds a [`Table`] by declaring columns first, then appending rows.
pub struct TableBuilder {
    fields: Vec<Field>,
    builders: Vec<ColumnBuilder>,
    rows: usize,
}

impl TableBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self {
            fields: Vec::new(),
            builders: Vec::new(),
            rows: 0,
        }
    }

    /// Creates a builder for an existing schema.
    pub fn with_schema(schema: &Schema) -> Self {
        let mut builder = Self::new();
        for field in schema.fields() {
            builder.fields.push(field.clone());
            builder.builders.push(ColumnBuilder::new(field.data_type(), 0));
        }
        builder
    }

    /// Declares a column. Columns cannot be added once rows have been appended.
    pub fn add_column(mut self, name: impl Into<String>, data_type: DataType) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::invalid_schema("column name cannot be empty"));
        }
        if self.rows > 0 {
            return Err(Error::invalid_schema(format!(
                "cannot add column {} after rows were appended",
                name
            )));
        }
        if self.fields.iter().any(|f| f.name() == name) {
            return Err(Error::duplicate_column(name));
        }
        self.builders.push(ColumnBuilder::new(data_type, 0));
        self.fields.push(Field::new(name, data_type));
        Ok(self)
    }

    /// Appends one row. The row must have one value per declared column.
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.fields.len() {
            return Err(Error::invalid_operation(format!(
                "row has {} values, table has {} columns",
                row.len(),
                self.fields.len()
            )));
        }
        // Validate the whole row before touching any builder.
        for (field, value) in self.fields.iter().zip(&row) {
            if !field.data_type().accepts(value.data_type()) {
                return Err(Error::type_mismatch(
                    format!("column {}", field.name()),
                    field.data_type(),
                    value.data_type(),
                ));
            }
        }
        for (builder, value) in self.builders.iter_mut().zip(row) {
            builder.push(value)?;
        }
        self.rows += 1;
        Ok(())
    }

    /// Appends one row, builder style.
    pub fn row(mut self, row: Vec<Value>) -> Result<Self> {
        self.push_row(row)?;
        Ok(self)
    }

    /// Builds the table.
    pub fn build(self) -> Result<Table> {
        let columns = self
            .builders
            .into_iter()
            .zip(self.fields)
            .map(|(builder, field)| builder.finish(field.name()))
            .collect();
        Table::with_row_count(columns, self.rows)
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_builder() {
        let table = TableBuilder::new()
            .add_column("id", DataType::Int64)
            .unwrap()
            .add_column("score", DataType::Float64)
            .unwrap()
            .row(vec![Value::Int64(1), Value::Float64(0.5)])
            .unwrap()
            .row(vec![Value::Int64(2), Value::Int64(3)])
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.column("score").unwrap().get(1), Some(Value::Float64(3.0)));
    }

    #[test]
    fn test_table_builder_rejects_bad_rows() {
        let mut builder = TableBuilder::new()
            .add_column("id", DataType::Int64)
            .unwrap()
            .add_column("flag", DataType::Boolean)
            .unwrap();

        assert!(builder.push_row(vec![Value::Int64(1)]).is_err());
        assert!(builder
            .push_row(vec![Value::Int64(1), Value::String("x".into())])
            .is_err());
        builder.push_row(vec![Value::Null, Value::Boolean(true)]).unwrap();

        let table = builder.build().unwrap();
        assert_eq!(table.num_rows(), 1);
    }

    #[test]
    fn test_duplicate_column() {
        let err = TableBuilder::new()
            .add_column("a", DataType::Int64)
            .unwrap()
            .add_column("a", DataType::Int64)
            .err()
            .unwrap();
        assert!(matches!(err, Error::DuplicateColumn { .. }));
    }
}
