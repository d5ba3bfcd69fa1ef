//! Data type definitions for Strata columns.

use core::fmt;

/// Logical type of a column.
///
/// `Null` is the type of a column that can only hold missing values, such as
/// the result of `lit(None)`. It unifies with every other type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Only missing values.
    Null,
    /// Boolean type (true/false)
    Boolean,
    /// 64-bit signed integer
    Int64,
    /// 64-bit floating point number
    Float64,
    /// UTF-8 string
    String,
}

impl DataType {
    /// Returns whether this type takes part in arithmetic.
    #[inline]
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Int64 | DataType::Float64)
    }

    /// Returns whether values of `self` and `other` can be compared with each other.
    pub fn is_comparable_with(&self, other: &DataType) -> bool {
        self == other
            || *self == DataType::Null
            || *other == DataType::Null
            || (self.is_numeric() && other.is_numeric())
    }

    /// Returns the type both operands are widened to for arithmetic, if any.
    pub fn numeric_supertype(&self, other: &DataType) -> Option<DataType> {
        match (self, other) {
            (DataType::Int64, DataType::Int64) => Some(DataType::Int64),
            (DataType::Int64 | DataType::Float64, DataType::Int64 | DataType::Float64) => {
                Some(DataType::Float64)
            }
            _ => None,
        }
    }

    /// Returns whether a value of type `other` may be stored in a column of this type.
    pub fn accepts(&self, other: DataType) -> bool {
        other == DataType::Null
            || *self == other
            || (*self == DataType::Float64 && other == DataType::Int64)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Null => "null",
            DataType::Boolean => "bool",
            DataType::Int64 => "i64",
            DataType::Float64 => "f64",
            DataType::String => "str",
        };
        f.write_str(name)
    }
}
