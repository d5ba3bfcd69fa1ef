//! Static type inference for expressions.
//!
//! The evaluator builds its output columns with the types computed here, so
//! the type of a result never depends on the data it was computed from.

use super::{AggregateFunc, BinaryOp, Expr, ScalarFunc, UnaryOp};
use strata_core::{DataType, Error, Result, Schema};

impl Expr {
    /// Infers the type this expression produces over a table with `schema`.
    ///
    /// Missing columns and incomparable operands are schema errors; arithmetic
    /// or functions applied to values they are undefined for are value errors.
    pub fn data_type(&self, schema: &Schema) -> Result<DataType> {
        match self {
            Expr::Column(name) => Ok(schema.try_field(name)?.data_type()),
            Expr::Literal(value) => Ok(value.data_type()),
            Expr::Alias { expr, .. } => expr.data_type(schema),
            Expr::BinaryOp { left, op, right } => {
                binary_output_type(*op, left.data_type(schema)?, right.data_type(schema)?)
            }
            Expr::UnaryOp { op, expr } => unary_output_type(*op, expr.data_type(schema)?),
            Expr::Function { func, expr } => function_output_type(*func, expr.data_type(schema)?),
            Expr::Cast { expr, data_type } => {
                expr.data_type(schema)?;
                Ok(*data_type)
            }
            Expr::Aggregate { func, expr } => {
                let input = match expr {
                    Some(e) => {
                        if e.has_aggregate() {
                            return Err(Error::invalid_operation(format!(
                                "nested aggregate in {}",
                                self
                            )));
                        }
                        e.data_type(schema)?
                    }
                    None => DataType::Null,
                };
                aggregate_output_type(*func, input)
            }
        }
    }

    /// Returns true if this expression evaluates to a single value rather than a column.
    pub fn is_scalar(&self) -> bool {
        match self {
            Expr::Literal(_) | Expr::Aggregate { .. } => true,
            Expr::Column(_) => false,
            Expr::BinaryOp { left, right, .. } => left.is_scalar() && right.is_scalar(),
            Expr::Alias { expr, .. }
            | Expr::UnaryOp { expr, .. }
            | Expr::Function { expr, .. }
            | Expr::Cast { expr, .. } => expr.is_scalar(),
        }
    }
}

/// Result type of a binary operator.
pub fn binary_output_type(op: BinaryOp, left: DataType, right: DataType) -> Result<DataType> {
    if op.is_comparison() {
        if !left.is_comparable_with(&right) {
            return Err(Error::type_mismatch(
                format!("comparison '{:?}'", op),
                left,
                right,
            ));
        }
        return Ok(DataType::Boolean);
    }

    if op.is_logical() {
        for side in [left, right] {
            if !matches!(side, DataType::Boolean | DataType::Null) {
                return Err(Error::type_mismatch(
                    format!("logical '{:?}'", op),
                    DataType::Boolean,
                    side,
                ));
            }
        }
        return Ok(DataType::Boolean);
    }

    let undefined = || {
        Error::invalid_operation(format!(
            "arithmetic '{:?}' is undefined for {} and {}",
            op, left, right
        ))
    };
    match (left, right) {
        (DataType::Null, DataType::Null) => Ok(DataType::Null),
        (DataType::Null, other) | (other, DataType::Null) => {
            if other.is_numeric() {
                Ok(DataType::Null)
            } else {
                Err(undefined())
            }
        }
        _ if op == BinaryOp::Div && left.is_numeric() && right.is_numeric() => {
            Ok(DataType::Float64)
        }
        _ => left.numeric_supertype(&right).ok_or_else(undefined),
    }
}

/// Result type of a unary operator.
pub fn unary_output_type(op: UnaryOp, input: DataType) -> Result<DataType> {
    match op {
        UnaryOp::IsNull | UnaryOp::IsNotNull => Ok(DataType::Boolean),
        UnaryOp::Not => match input {
            DataType::Boolean | DataType::Null => Ok(DataType::Boolean),
            other => Err(Error::type_mismatch("not", DataType::Boolean, other)),
        },
        UnaryOp::Neg => match input {
            DataType::Null | DataType::Int64 | DataType::Float64 => Ok(input),
            other => Err(Error::invalid_operation(format!(
                "negation is undefined for {}",
                other
            ))),
        },
    }
}

/// Result type of a scalar function.
pub fn function_output_type(func: ScalarFunc, input: DataType) -> Result<DataType> {
    let undefined = || {
        Error::invalid_operation(format!(
            "function '{}' is undefined for {}",
            func.name(),
            input
        ))
    };
    match func {
        ScalarFunc::Abs | ScalarFunc::Round => match input {
            DataType::Null | DataType::Int64 | DataType::Float64 => Ok(input),
            _ => Err(undefined()),
        },
        ScalarFunc::Sqrt | ScalarFunc::Log | ScalarFunc::Exp => match input {
            DataType::Null | DataType::Int64 | DataType::Float64 => Ok(DataType::Float64),
            _ => Err(undefined()),
        },
        ScalarFunc::Upper | ScalarFunc::Lower => match input {
            DataType::Null | DataType::String => Ok(DataType::String),
            _ => Err(undefined()),
        },
        ScalarFunc::StrLen => match input {
            DataType::Null | DataType::String => Ok(DataType::Int64),
            _ => Err(undefined()),
        },
    }
}

/// Result type of an aggregate function over an input of type `input`.
///
/// `len()` has no input; callers pass `DataType::Null`.
pub fn aggregate_output_type(func: AggregateFunc, input: DataType) -> Result<DataType> {
    let undefined = || {
        Error::invalid_operation(format!(
            "aggregate '{}' is undefined for {}",
            func.name(),
            input
        ))
    };
    match func {
        AggregateFunc::Count | AggregateFunc::Len | AggregateFunc::NUnique => Ok(DataType::Int64),
        AggregateFunc::Sum => match input {
            DataType::Boolean | DataType::Int64 => Ok(DataType::Int64),
            DataType::Float64 | DataType::Null => Ok(input),
            DataType::String => Err(undefined()),
        },
        AggregateFunc::Mean | AggregateFunc::Std => match input {
            DataType::String => Err(undefined()),
            _ => Ok(DataType::Float64),
        },
        AggregateFunc::Min | AggregateFunc::Max | AggregateFunc::First | AggregateFunc::Last => {
            Ok(input)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{col, len, lit};
    use strata_core::{ErrorKind, Field, Value};

    fn schema() -> Schema {
        Schema::new(vec![
            Field::new("i", DataType::Int64),
            Field::new("f", DataType::Float64),
            Field::new("s", DataType::String),
            Field::new("b", DataType::Boolean),
        ])
        .unwrap()
    }

    #[test]
    fn test_arithmetic_types() {
        let s = schema();
        assert_eq!((col("i") + col("i")).data_type(&s).unwrap(), DataType::Int64);
        assert_eq!((col("i") * col("f")).data_type(&s).unwrap(), DataType::Float64);
        assert_eq!((col("i") / col("i")).data_type(&s).unwrap(), DataType::Float64);
        assert_eq!(
            (col("i") + lit(Value::Null)).data_type(&s).unwrap(),
            DataType::Null
        );
    }

    #[test]
    fn test_comparison_types() {
        let s = schema();
        assert_eq!(
            col("i").lt(lit(1.5)).data_type(&s).unwrap(),
            DataType::Boolean
        );
        let err = col("s").lt(lit(1i64)).data_type(&s).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[test]
    fn test_value_errors() {
        let s = schema();
        assert_eq!(col("s").log().data_type(&s).unwrap_err().kind(), ErrorKind::Value);
        assert_eq!(
            (col("s") + lit(1i64)).data_type(&s).unwrap_err().kind(),
            ErrorKind::Value
        );
        assert_eq!(col("s").sum().data_type(&s).unwrap_err().kind(), ErrorKind::Value);
    }

    #[test]
    fn test_aggregate_types() {
        let s = schema();
        assert_eq!(col("b").sum().data_type(&s).unwrap(), DataType::Int64);
        assert_eq!(col("i").mean().data_type(&s).unwrap(), DataType::Float64);
        assert_eq!(col("s").max().data_type(&s).unwrap(), DataType::String);
        assert_eq!(len().data_type(&s).unwrap(), DataType::Int64);
        assert!(col("i").sum().sum().data_type(&s).is_err());
    }

    #[test]
    fn test_missing_column() {
        let err = col("nope").data_type(&schema()).unwrap_err();
        assert!(matches!(err, Error::ColumnNotFound { .. }));
    }

    #[test]
    fn test_is_scalar() {
        assert!(lit(1i64).is_scalar());
        assert!((col("a").sum() / col("a").count()).is_scalar());
        assert!(!(col("a") - col("a").mean()).is_scalar());
    }
}
