//! Field and schema definitions.

use crate::error::{Error, Result};
use crate::types::DataType;
use core::fmt;

/// A named, typed column slot in a schema.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Field {
    /// Column name.
    name: String,
    /// Data type of the column.
    data_type: DataType,
}

impl Field {
    /// Creates a new field.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }

    /// Returns the field name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the data type.
    #[inline]
    pub fn data_type(&self) -> DataType {
        self.data_type
    }
}

/// Ordered list of uniquely named fields.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    /// Creates a schema, rejecting duplicate names.
    pub fn new(fields: Vec<Field>) -> Result<Self> {
        for (i, field) in fields.iter().enumerate() {
            if fields[..i].iter().any(|f| f.name == field.name) {
                return Err(Error::duplicate_column(field.name.clone()));
            }
        }
        Ok(Self { fields })
    }

    /// Creates a schema from fields already known to be unique.
    pub(crate) fn new_unchecked(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Creates an empty schema.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the fields in order.
    #[inline]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Returns the number of fields.
    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the schema has no fields.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Gets a field by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Gets a field by name, failing with a schema error if absent.
    pub fn try_field(&self, name: &str) -> Result<&Field> {
        self.field(name)
            .ok_or_else(|| Error::column_not_found(name))
    }

    /// Gets a field position by name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Returns whether a field with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// Returns the field names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Replaces the field of the same name in place, or appends it.
    pub fn upsert(&mut self, field: Field) {
        match self.index_of(&field.name) {
            Some(idx) => self.fields[idx] = field,
            None => self.fields.push(field),
        }
    }

    /// Keeps only the named fields, in schema order.
    pub fn project<S: AsRef<str>>(&self, names: &[S]) -> Result<Schema> {
        for name in names {
            self.try_field(name.as_ref())?;
        }
        let fields = self
            .fields
            .iter()
            .filter(|f| names.iter().any(|n| n.as_ref() == f.name))
            .cloned()
            .collect();
        Ok(Schema { fields })
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", field.name, field.data_type)?;
        }
        f.write_str("}")
    }
}
