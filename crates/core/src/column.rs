//! Column store.
//!
//! A [`Column`] is a named, homogeneously typed, immutable sequence of values.
//! Each type keeps its values in a dedicated vector with `None` marking a
//! missing entry. The data sits behind an `Arc`, so cloning, renaming and
//! re-selecting columns never copies values.

use crate::error::{Error, Result};
use crate::types::DataType;
use crate::value::Value;
use std::sync::Arc;

/// Typed storage behind a column.
#[derive(Clone, Debug)]
pub enum ColumnData {
    /// A column of `n` missing values.
    Null(usize),
    Boolean(Vec<Option<bool>>),
    Int64(Vec<Option<i64>>),
    Float64(Vec<Option<f64>>),
    String(Vec<Option<String>>),
}

impl ColumnData {
    /// Creates empty storage for the given type.
    pub fn with_capacity(data_type: DataType, capacity: usize) -> Self {
        match data_type {
            DataType::Null => ColumnData::Null(0),
            DataType::Boolean => ColumnData::Boolean(Vec::with_capacity(capacity)),
            DataType::Int64 => ColumnData::Int64(Vec::with_capacity(capacity)),
            DataType::Float64 => ColumnData::Float64(Vec::with_capacity(capacity)),
            DataType::String => ColumnData::String(Vec::with_capacity(capacity)),
        }
    }

    /// Returns the data type of the stored values.
    pub fn data_type(&self) -> DataType {
        match self {
            ColumnData::Null(_) => DataType::Null,
            ColumnData::Boolean(_) => DataType::Boolean,
            ColumnData::Int64(_) => DataType::Int64,
            ColumnData::Float64(_) => DataType::Float64,
            ColumnData::String(_) => DataType::String,
        }
    }

    /// Returns the number of values.
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Null(n) => *n,
            ColumnData::Boolean(v) => v.len(),
            ColumnData::Int64(v) => v.len(),
            ColumnData::Float64(v) => v.len(),
            ColumnData::String(v) => v.len(),
        }
    }

    /// Returns true if there are no values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the value at `index`, or `None` if out of bounds.
    pub fn get(&self, index: usize) -> Option<Value> {
        if index >= self.len() {
            return None;
        }
        Some(match self {
            ColumnData::Null(_) => Value::Null,
            ColumnData::Boolean(v) => v[index].map(Value::Boolean).unwrap_or(Value::Null),
            ColumnData::Int64(v) => v[index].map(Value::Int64).unwrap_or(Value::Null),
            ColumnData::Float64(v) => v[index].map(Value::Float64).unwrap_or(Value::Null),
            ColumnData::String(v) => v[index]
                .as_ref()
                .map(|s| Value::String(s.clone()))
                .unwrap_or(Value::Null),
        })
    }

    fn push(&mut self, value: Value) -> Result<()> {
        match (self, value) {
            (ColumnData::Null(n), Value::Null) => *n += 1,
            (ColumnData::Boolean(v), Value::Null) => v.push(None),
            (ColumnData::Int64(v), Value::Null) => v.push(None),
            (ColumnData::Float64(v), Value::Null) => v.push(None),
            (ColumnData::String(v), Value::Null) => v.push(None),
            (ColumnData::Boolean(v), Value::Boolean(b)) => v.push(Some(b)),
            (ColumnData::Int64(v), Value::Int64(i)) => v.push(Some(i)),
            (ColumnData::Float64(v), Value::Float64(f)) => v.push(Some(f)),
            (ColumnData::Float64(v), Value::Int64(i)) => v.push(Some(i as f64)),
            (ColumnData::String(v), Value::String(s)) => v.push(Some(s)),
            (data, value) => {
                return Err(Error::type_mismatch(
                    "column append",
                    data.data_type(),
                    value.data_type(),
                ))
            }
        }
        Ok(())
    }
}

fn filter_vec<T: Clone>(values: &[Option<T>], mask: &[bool]) -> Vec<Option<T>> {
    values
        .iter()
        .zip(mask)
        .filter(|(_, keep)| **keep)
        .map(|(v, _)| v.clone())
        .collect()
}

fn take_vec<T: Clone>(values: &[Option<T>], indices: &[usize]) -> Vec<Option<T>> {
    indices.iter().map(|&i| values[i].clone()).collect()
}

/// Incrementally builds a column of a fixed type.
#[derive(Debug)]
pub struct ColumnBuilder {
    data: ColumnData,
}

impl ColumnBuilder {
    /// Creates a builder for values of `data_type`.
    pub fn new(data_type: DataType, capacity: usize) -> Self {
        Self {
            data: ColumnData::with_capacity(data_type, capacity),
        }
    }

    /// Returns the type this builder accepts.
    pub fn data_type(&self) -> DataType {
        self.data.data_type()
    }

    /// Returns the number of values appended so far.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if nothing has been appended.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Appends a value, checking it against the builder's type.
    pub fn push(&mut self, value: Value) -> Result<()> {
        self.data.push(value)
    }

    /// Appends a missing value.
    pub fn push_null(&mut self) {
        // Null is accepted by every type
        let _ = self.data.push(Value::Null);
    }

    /// Finishes the builder into a named column.
    pub fn finish(self, name: impl Into<Arc<str>>) -> Column {
        Column::from_data(name, self.data)
    }
}

/// A named, typed, immutable sequence of values.
#[derive(Clone, Debug)]
pub struct Column {
    name: Arc<str>,
    data: Arc<ColumnData>,
}

impl Column {
    /// Creates a column from typed storage.
    pub fn from_data(name: impl Into<Arc<str>>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data: Arc::new(data),
        }
    }

    /// Creates a column of `data_type`, type-checking every value.
    pub fn from_values<I>(name: impl Into<Arc<str>>, data_type: DataType, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = Value>,
    {
        let values = values.into_iter();
        let mut builder = ColumnBuilder::new(data_type, values.size_hint().0);
        for value in values {
            builder.push(value)?;
        }
        Ok(builder.finish(name))
    }

    /// Creates a column, inferring its type from the values.
    ///
    /// Integers mixed with floats widen to `Float64`; a column with no
    /// non-missing value has type `Null`.
    pub fn new<V: Into<Value>>(name: impl Into<Arc<str>>, values: Vec<V>) -> Result<Self> {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        let mut data_type = DataType::Null;
        for value in &values {
            let dt = value.data_type();
            data_type = match (data_type, dt) {
                (DataType::Null, other) => other,
                (current, DataType::Null) => current,
                (current, other) if current == other => current,
                (current, other) => current.numeric_supertype(&other).ok_or_else(|| {
                    Error::type_mismatch("column construction", current, other)
                })?,
            };
        }
        Self::from_values(name, data_type, values)
    }

    /// Creates a column of `len` missing values.
    pub fn full_null(name: impl Into<Arc<str>>, len: usize) -> Self {
        Self::from_data(name, ColumnData::Null(len))
    }

    /// Creates a column repeating `value` `len` times.
    pub fn broadcast(name: impl Into<Arc<str>>, value: &Value, len: usize) -> Self {
        let data = match value {
            Value::Null => ColumnData::Null(len),
            Value::Boolean(b) => ColumnData::Boolean(vec![Some(*b); len]),
            Value::Int64(i) => ColumnData::Int64(vec![Some(*i); len]),
            Value::Float64(f) => ColumnData::Float64(vec![Some(*f); len]),
            Value::String(s) => ColumnData::String(vec![Some(s.clone()); len]),
        };
        Self::from_data(name, data)
    }

    /// Creates a column of `len` missing values typed as `data_type`.
    pub fn nulls_of_type(name: impl Into<Arc<str>>, data_type: DataType, len: usize) -> Self {
        let data = match data_type {
            DataType::Null => ColumnData::Null(len),
            DataType::Boolean => ColumnData::Boolean(vec![None; len]),
            DataType::Int64 => ColumnData::Int64(vec![None; len]),
            DataType::Float64 => ColumnData::Float64(vec![None; len]),
            DataType::String => ColumnData::String(vec![None; len]),
        };
        Self::from_data(name, data)
    }

    /// Returns the column name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the same data under a different name.
    pub fn rename(&self, name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            data: Arc::clone(&self.data),
        }
    }

    /// Returns the data type.
    #[inline]
    pub fn data_type(&self) -> DataType {
        self.data.data_type()
    }

    /// Returns the typed storage.
    #[inline]
    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    /// Returns the number of values.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the column holds no values.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the number of missing values.
    pub fn null_count(&self) -> usize {
        match self.data.as_ref() {
            ColumnData::Null(n) => *n,
            ColumnData::Boolean(v) => v.iter().filter(|x| x.is_none()).count(),
            ColumnData::Int64(v) => v.iter().filter(|x| x.is_none()).count(),
            ColumnData::Float64(v) => v.iter().filter(|x| x.is_none()).count(),
            ColumnData::String(v) => v.iter().filter(|x| x.is_none()).count(),
        }
    }

    /// Returns the value at `index`, or `None` if out of bounds.
    #[inline]
    pub fn get(&self, index: usize) -> Option<Value> {
        self.data.get(index)
    }

    /// Iterates over the values as [`Value`]s.
    pub fn iter(&self) -> impl Iterator<Item = Value> + '_ {
        (0..self.len()).map(move |i| self.data.get(i).unwrap_or(Value::Null))
    }

    /// Keeps the values whose mask entry is true.
    pub fn filter(&self, mask: &[bool]) -> Result<Column> {
        if mask.len() != self.len() {
            return Err(Error::LengthMismatch {
                column: self.name.to_string(),
                expected: self.len(),
                got: mask.len(),
            });
        }
        let data = match self.data.as_ref() {
            ColumnData::Null(_) => ColumnData::Null(mask.iter().filter(|m| **m).count()),
            ColumnData::Boolean(v) => ColumnData::Boolean(filter_vec(v, mask)),
            ColumnData::Int64(v) => ColumnData::Int64(filter_vec(v, mask)),
            ColumnData::Float64(v) => ColumnData::Float64(filter_vec(v, mask)),
            ColumnData::String(v) => ColumnData::String(filter_vec(v, mask)),
        };
        Ok(Column::from_data(Arc::clone(&self.name), data))
    }

    /// Gathers the values at `indices`, in that order.
    pub fn take(&self, indices: &[usize]) -> Result<Column> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.len()) {
            return Err(Error::invalid_operation(format!(
                "index {} out of bounds for column {} of length {}",
                bad,
                self.name,
                self.len()
            )));
        }
        let data = match self.data.as_ref() {
            ColumnData::Null(_) => ColumnData::Null(indices.len()),
            ColumnData::Boolean(v) => ColumnData::Boolean(take_vec(v, indices)),
            ColumnData::Int64(v) => ColumnData::Int64(take_vec(v, indices)),
            ColumnData::Float64(v) => ColumnData::Float64(take_vec(v, indices)),
            ColumnData::String(v) => ColumnData::String(take_vec(v, indices)),
        };
        Ok(Column::from_data(Arc::clone(&self.name), data))
    }

    /// Returns up to `len` values starting at `offset`. Out-of-range bounds are clamped.
    pub fn slice(&self, offset: usize, len: usize) -> Column {
        let start = offset.min(self.len());
        let end = start.saturating_add(len).min(self.len());
        let data = match self.data.as_ref() {
            ColumnData::Null(_) => ColumnData::Null(end - start),
            ColumnData::Boolean(v) => ColumnData::Boolean(v[start..end].to_vec()),
            ColumnData::Int64(v) => ColumnData::Int64(v[start..end].to_vec()),
            ColumnData::Float64(v) => ColumnData::Float64(v[start..end].to_vec()),
            ColumnData::String(v) => ColumnData::String(v[start..end].to_vec()),
        };
        Column::from_data(Arc::clone(&self.name), data)
    }

    /// Concatenates columns end to end under the first column's name.
    ///
    /// `Null`-typed pieces unify with the type of the others.
    pub fn concat(columns: &[Column]) -> Result<Column> {
        let first = columns
            .first()
            .ok_or_else(|| Error::invalid_operation("cannot concatenate zero columns"))?;
        if columns.len() == 1 {
            return Ok(first.clone());
        }

        let mut data_type = DataType::Null;
        for col in columns {
            let dt = col.data_type();
            if dt == DataType::Null {
                continue;
            }
            if data_type == DataType::Null {
                data_type = dt;
            } else if data_type != dt {
                return Err(Error::type_mismatch(
                    format!("concatenating column {}", first.name()),
                    data_type,
                    dt,
                ));
            }
        }

        let total = columns.iter().map(Column::len).sum();
        let data = match data_type {
            DataType::Null => ColumnData::Null(total),
            DataType::Boolean => {
                let mut out = Vec::with_capacity(total);
                for col in columns {
                    match col.data.as_ref() {
                        ColumnData::Boolean(v) => out.extend_from_slice(v),
                        other => out.extend(std::iter::repeat(None).take(other.len())),
                    }
                }
                ColumnData::Boolean(out)
            }
            DataType::Int64 => {
                let mut out = Vec::with_capacity(total);
                for col in columns {
                    match col.data.as_ref() {
                        ColumnData::Int64(v) => out.extend_from_slice(v),
                        other => out.extend(std::iter::repeat(None).take(other.len())),
                    }
                }
                ColumnData::Int64(out)
            }
            DataType::Float64 => {
                let mut out = Vec::with_capacity(total);
                for col in columns {
                    match col.data.as_ref() {
                        ColumnData::Float64(v) => out.extend_from_slice(v),
                        other => out.extend(std::iter::repeat(None).take(other.len())),
                    }
                }
                ColumnData::Float64(out)
            }
            DataType::String => {
                let mut out = Vec::with_capacity(total);
                for col in columns {
                    match col.data.as_ref() {
                        ColumnData::String(v) => out.extend_from_slice(v),
                        other => out.extend(std::iter::repeat(None).take(other.len())),
                    }
                }
                ColumnData::String(out)
            }
        };
        Ok(Column::from_data(Arc::clone(&first.name), data))
    }

    /// Converts the column to another type.
    ///
    /// Conversions that cannot represent a value (a non-numeric string to a
    /// number, a NaN float to an integer) fail with a value error.
    pub fn cast(&self, data_type: DataType) -> Result<Column> {
        if self.data_type() == data_type {
            return Ok(self.clone());
        }
        if self.data_type() == DataType::Null {
            return Ok(Column::nulls_of_type(Arc::clone(&self.name), data_type, self.len()));
        }

        let mut builder = ColumnBuilder::new(data_type, self.len());
        for value in self.iter() {
            builder.push(cast_value(value, data_type)?)?;
        }
        Ok(builder.finish(Arc::clone(&self.name)))
    }
}

fn cast_value(value: Value, to: DataType) -> Result<Value> {
    let from = value.data_type();
    let fail = || {
        Error::invalid_operation(format!("cannot cast {} value '{}' to {}", from, value, to))
    };
    let out = match (&value, to) {
        (Value::Null, _) => Value::Null,
        (_, DataType::Null) => Value::Null,
        (_, DataType::String) => Value::String(value.to_string()),
        (Value::Boolean(b), DataType::Int64) => Value::Int64(*b as i64),
        (Value::Boolean(b), DataType::Float64) => Value::Float64(if *b { 1.0 } else { 0.0 }),
        (Value::Int64(i), DataType::Float64) => Value::Float64(*i as f64),
        (Value::Int64(i), DataType::Boolean) => Value::Boolean(*i != 0),
        (Value::Float64(f), DataType::Int64) => {
            if !f.is_finite() {
                return Err(fail());
            }
            Value::Int64(f.trunc() as i64)
        }
        (Value::Float64(f), DataType::Boolean) => Value::Boolean(*f != 0.0),
        (Value::String(s), DataType::Int64) => Value::Int64(s.trim().parse().map_err(|_| fail())?),
        (Value::String(s), DataType::Float64) => {
            Value::Float64(s.trim().parse().map_err(|_| fail())?)
        }
        (Value::String(s), DataType::Boolean) => match s.trim() {
            "true" => Value::Boolean(true),
            "false" => Value::Boolean(false),
            _ => return Err(fail()),
        },
        _ => value.clone(),
    };
    Ok(out)
}

impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.data_type() == other.data_type()
            && self.len() == other.len()
            && self.iter().eq(other.iter())
    }
}
