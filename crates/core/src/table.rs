//! In-memory tables.
//!
//! A [`Table`] is an ordered set of uniquely named [`Column`]s of equal
//! length. Tables are immutable: every operation returns a new table that
//! shares unchanged column data with its input.

use crate::column::Column;
use crate::error::{Error, Result};
use crate::schema::{Field, Schema};
use crate::value::Value;

/// An ordered set of equal-length, uniquely named columns.
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    /// Row count. Tracked separately so a table without columns still has rows.
    num_rows: usize,
}

impl Table {
    /// Creates a table from columns, taking the row count from the first column.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let num_rows = columns.first().map(Column::len).unwrap_or(0);
        Self::with_row_count(columns, num_rows)
    }

    /// Creates a table with an explicit row count.
    pub fn with_row_count(columns: Vec<Column>, num_rows: usize) -> Result<Self> {
        for (i, col) in columns.iter().enumerate() {
            if col.len() != num_rows {
                return Err(Error::LengthMismatch {
                    column: col.name().to_string(),
                    expected: num_rows,
                    got: col.len(),
                });
            }
            if columns[..i].iter().any(|c| c.name() == col.name()) {
                return Err(Error::duplicate_column(col.name()));
            }
        }
        Ok(Self { columns, num_rows })
    }

    /// Creates a table with the given schema and no rows.
    pub fn empty(schema: &Schema) -> Self {
        let columns = schema
            .fields()
            .iter()
            .map(|f| Column::nulls_of_type(f.name(), f.data_type(), 0))
            .collect();
        Self {
            columns,
            num_rows: 0,
        }
    }

    /// Returns the schema of this table.
    pub fn schema(&self) -> Schema {
        Schema::new_unchecked(
            self.columns
                .iter()
                .map(|c| Field::new(c.name(), c.data_type()))
                .collect(),
        )
    }

    /// Returns the columns in order.
    #[inline]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Consumes the table, returning its columns.
    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    /// Gets a column by name.
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| Error::column_not_found(name))
    }

    /// Gets a column by position.
    #[inline]
    pub fn column_at(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Returns the number of rows.
    #[inline]
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Returns the number of columns.
    #[inline]
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if the table has no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.num_rows == 0
    }

    /// Returns the column names in order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    /// Returns the values of row `index`.
    pub fn row(&self, index: usize) -> Option<Vec<Value>> {
        if index >= self.num_rows {
            return None;
        }
        Some(
            self.columns
                .iter()
                .map(|c| c.get(index).unwrap_or(Value::Null))
                .collect(),
        )
    }

    /// Iterates over rows as value vectors.
    pub fn rows(&self) -> impl Iterator<Item = Vec<Value>> + '_ {
        (0..self.num_rows).filter_map(move |i| self.row(i))
    }

    /// Returns a table with the named columns, in the given order.
    pub fn select_columns<S: AsRef<str>>(&self, names: &[S]) -> Result<Table> {
        let columns = names
            .iter()
            .map(|n| self.column(n.as_ref()).cloned())
            .collect::<Result<Vec<_>>>()?;
        Table::with_row_count(columns, self.num_rows)
    }

    /// Replaces the column of the same name in place, or appends it.
    pub fn with_column(&self, column: Column) -> Result<Table> {
        if column.len() != self.num_rows {
            return Err(Error::LengthMismatch {
                column: column.name().to_string(),
                expected: self.num_rows,
                got: column.len(),
            });
        }
        let mut columns = self.columns.clone();
        match columns.iter().position(|c| c.name() == column.name()) {
            Some(idx) => columns[idx] = column,
            None => columns.push(column),
        }
        Ok(Table {
            columns,
            num_rows: self.num_rows,
        })
    }

    /// Keeps the rows whose mask entry is true.
    pub fn filter(&self, mask: &[bool]) -> Result<Table> {
        if mask.len() != self.num_rows {
            return Err(Error::invalid_operation(format!(
                "filter mask has length {}, table has {} rows",
                mask.len(),
                self.num_rows
            )));
        }
        let columns = self
            .columns
            .iter()
            .map(|c| c.filter(mask))
            .collect::<Result<Vec<_>>>()?;
        let num_rows = mask.iter().filter(|m| **m).count();
        Ok(Table { columns, num_rows })
    }

    /// Gathers the rows at `indices`, in that order.
    pub fn take(&self, indices: &[usize]) -> Result<Table> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.num_rows) {
            return Err(Error::invalid_operation(format!(
                "row {} out of bounds for table of {} rows",
                bad, self.num_rows
            )));
        }
        let columns = self
            .columns
            .iter()
            .map(|c| c.take(indices))
            .collect::<Result<Vec<_>>>()?;
        Ok(Table {
            columns,
            num_rows: indices.len(),
        })
    }

    /// Returns up to `len` rows starting at `offset`.
    pub fn slice(&self, offset: usize, len: usize) -> Table {
        let start = offset.min(self.num_rows);
        let end = start.saturating_add(len).min(self.num_rows);
        Table {
            columns: self.columns.iter().map(|c| c.slice(start, len)).collect(),
            num_rows: end - start,
        }
    }

    /// Stacks tables vertically. All tables must have the same column names in the same order.
    pub fn concat(tables: &[Table]) -> Result<Table> {
        let first = tables
            .first()
            .ok_or_else(|| Error::invalid_operation("cannot concatenate zero tables"))?;
        if tables.len() == 1 {
            return Ok(first.clone());
        }

        let names = first.column_names();
        for table in &tables[1..] {
            if table.column_names() != names {
                return Err(Error::invalid_schema(format!(
                    "cannot concatenate tables with columns {:?} and {:?}",
                    names,
                    table.column_names()
                )));
            }
        }

        let columns = (0..first.num_columns())
            .map(|i| {
                let pieces: Vec<Column> = tables.iter().map(|t| t.columns[i].clone()).collect();
                Column::concat(&pieces)
            })
            .collect::<Result<Vec<_>>>()?;
        let num_rows = tables.iter().map(Table::num_rows).sum();
        Ok(Table { columns, num_rows })
    }

    /// Splits the table into consecutive batches of at most `batch_size` rows.
    ///
    /// An empty table yields no batches.
    pub fn split(&self, batch_size: usize) -> Vec<Table> {
        let batch_size = batch_size.max(1);
        (0..self.num_rows)
            .step_by(batch_size)
            .map(|offset| self.slice(offset, batch_size))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataType;

    fn sample() -> Table {
        Table::new(vec![
            Column::new("id", vec![1i64, 2, 3]).unwrap(),
            Column::new("name", vec!["a", "b", "c"]).unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn test_table_invariants() {
        let err = Table::new(vec![
            Column::new("a", vec![1i64, 2]).unwrap(),
            Column::new("b", vec![1i64]).unwrap(),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { .. }));

        let err = Table::new(vec![
            Column::new("a", vec![1i64]).unwrap(),
            Column::new("a", vec![2i64]).unwrap(),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::DuplicateColumn { .. }));
    }

    #[test]
    fn test_column_lookup() {
        let table = sample();
        assert_eq!(table.num_rows(), 3);
        assert_eq!(table.column("name").unwrap().data_type(), DataType::String);
        assert!(matches!(
            table.column("missing"),
            Err(Error::ColumnNotFound { .. })
        ));
        assert_eq!(
            table.row(1),
            Some(vec![Value::Int64(2), Value::String("b".into())])
        );
        assert_eq!(table.row(3), None);
    }

    #[test]
    fn test_filter_to_zero_rows_keeps_columns() {
        let table = sample();
        let out = table.filter(&[false, false, false]).unwrap();
        assert_eq!(out.num_rows(), 0);
        assert_eq!(out.column_names(), vec!["id", "name"]);
    }

    #[test]
    fn test_with_column_replaces_in_place() {
        let table = sample();
        let out = table
            .with_column(Column::new("id", vec![7i64, 8, 9]).unwrap())
            .unwrap();
        assert_eq!(out.column_names(), vec!["id", "name"]);
        assert_eq!(out.column("id").unwrap().get(0), Some(Value::Int64(7)));
        // input untouched
        assert_eq!(table.column("id").unwrap().get(0), Some(Value::Int64(1)));
    }

    #[test]
    fn test_split_and_concat() {
        let table = sample();
        let batches = table.split(2);
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[1].num_rows(), 1);
        assert_eq!(Table::concat(&batches).unwrap(), table);
        assert!(Table::empty(&table.schema()).split(2).is_empty());
    }

    #[test]
    fn test_zero_column_table_keeps_rows() {
        let table = Table::with_row_count(vec![], 5).unwrap();
        assert_eq!(table.num_rows(), 5);
        let sliced = table.slice(1, 2);
        assert_eq!(sliced.num_rows(), 2);
        let concat = Table::concat(&[table.clone(), table]).unwrap();
        assert_eq!(concat.num_rows(), 10);
    }
}
