//! Expression evaluation against a table.
//!
//! Evaluation is column-at-a-time: every node produces either a single value
//! or a column as long as the input table. Output types always come from
//! static inference, so a result has the same type whatever rows it saw.

use super::aggregate::Accumulator;
use crate::ast::{
    aggregate_output_type, binary_output_type, function_output_type, unary_output_type, BinaryOp,
    Expr, ScalarFunc, UnaryOp,
};
use core::cmp::Ordering;
use strata_core::{Column, ColumnBuilder, ColumnData, DataType, Error, Result, Table, Value};

/// Result of evaluating an expression.
#[derive(Clone, Debug)]
pub enum Datum {
    /// A single value, broadcast on demand.
    Scalar { value: Value, data_type: DataType },
    /// One value per input row.
    Column(Column),
}

impl Datum {
    fn scalar(value: Value, data_type: DataType) -> Self {
        Datum::Scalar { value, data_type }
    }

    /// Returns the static type of this datum.
    pub fn data_type(&self) -> DataType {
        match self {
            Datum::Scalar { data_type, .. } => *data_type,
            Datum::Column(c) => c.data_type(),
        }
    }

    /// Returns true for a single value.
    pub fn is_scalar(&self) -> bool {
        matches!(self, Datum::Scalar { .. })
    }

    fn value_at(&self, index: usize) -> Value {
        match self {
            Datum::Scalar { value, .. } => value.clone(),
            Datum::Column(c) => c.get(index).unwrap_or(Value::Null),
        }
    }

    /// Converts to a column named `name`, broadcasting a scalar to `len` rows.
    pub fn into_column(self, name: &str, len: usize) -> Result<Column> {
        match self {
            Datum::Column(c) => Ok(c.rename(name)),
            Datum::Scalar {
                value: Value::Null,
                data_type,
            } => Ok(Column::nulls_of_type(name, data_type, len)),
            Datum::Scalar { value, data_type } if value.data_type() == data_type => {
                Ok(Column::broadcast(name, &value, len))
            }
            Datum::Scalar { value, data_type } => {
                Column::from_values(name, data_type, std::iter::repeat(value).take(len))
            }
        }
    }
}

/// Evaluates `expr` over `table`.
pub fn evaluate(expr: &Expr, table: &Table) -> Result<Datum> {
    let len = table.num_rows();
    match expr {
        Expr::Column(name) => Ok(Datum::Column(table.column(name)?.clone())),

        Expr::Literal(value) => Ok(Datum::scalar(value.clone(), value.data_type())),

        Expr::Alias { expr, .. } => evaluate(expr, table),

        Expr::BinaryOp { left, op, right } => {
            let left = evaluate(left, table)?;
            let right = evaluate(right, table)?;
            let out = binary_output_type(*op, left.data_type(), right.data_type())?;
            zip_map(&left, &right, out, len, |l, r| apply_binary(*op, l, r, out))
        }

        Expr::UnaryOp { op, expr } => {
            let input = evaluate(expr, table)?;
            let out = unary_output_type(*op, input.data_type())?;
            map(&input, out, len, |v| apply_unary(*op, v))
        }

        Expr::Function { func, expr } => {
            let input = evaluate(expr, table)?;
            let out = function_output_type(*func, input.data_type())?;
            map(&input, out, len, |v| apply_function(*func, v))
        }

        Expr::Cast { expr, data_type } => match evaluate(expr, table)? {
            Datum::Column(c) => Ok(Datum::Column(c.cast(*data_type)?)),
            Datum::Scalar { value, data_type: from } => {
                let single = Column::from_values("", from, [value])?.cast(*data_type)?;
                Ok(Datum::scalar(
                    single.get(0).unwrap_or(Value::Null),
                    *data_type,
                ))
            }
        },

        Expr::Aggregate { func, expr: input } => {
            let column = match input {
                Some(e) => {
                    if e.has_aggregate() {
                        return Err(Error::invalid_operation(format!(
                            "nested aggregate in {}",
                            expr
                        )));
                    }
                    Some(evaluate(e, table)?.into_column("", len)?)
                }
                None => None,
            };
            let input_type = column.as_ref().map_or(DataType::Null, Column::data_type);
            let out = aggregate_output_type(*func, input_type)?;
            let mut acc = Accumulator::new(*func, input_type);
            acc.update_column(column.as_ref(), len);
            Ok(Datum::scalar(acc.finish()?, out))
        }
    }
}

/// Evaluates `expr` to a column named after its output, broadcasting scalars.
pub fn evaluate_to_column(expr: &Expr, table: &Table) -> Result<Column> {
    evaluate(expr, table)?.into_column(&expr.output_name(), table.num_rows())
}

/// Evaluates a predicate to a row mask. Missing values count as false.
pub fn evaluate_predicate(predicate: &Expr, table: &Table) -> Result<Vec<bool>> {
    let len = table.num_rows();
    let datum = evaluate(predicate, table)?;
    match datum.data_type() {
        DataType::Boolean | DataType::Null => {}
        other => {
            return Err(Error::type_mismatch(
                "filter predicate",
                DataType::Boolean,
                other,
            ))
        }
    }
    Ok(match datum {
        Datum::Scalar { value, .. } => vec![value.as_bool() == Some(true); len],
        Datum::Column(c) => match c.data() {
            ColumnData::Boolean(values) => values.iter().map(|v| *v == Some(true)).collect(),
            _ => vec![false; len],
        },
    })
}

fn map<F>(input: &Datum, out: DataType, len: usize, f: F) -> Result<Datum>
where
    F: Fn(&Value) -> Result<Value>,
{
    match input {
        Datum::Scalar { value, .. } => Ok(Datum::scalar(f(value)?, out)),
        Datum::Column(c) => {
            let mut builder = ColumnBuilder::new(out, len);
            for value in c.iter() {
                builder.push(f(&value)?)?;
            }
            Ok(Datum::Column(builder.finish(c.name())))
        }
    }
}

fn zip_map<F>(left: &Datum, right: &Datum, out: DataType, len: usize, f: F) -> Result<Datum>
where
    F: Fn(&Value, &Value) -> Result<Value>,
{
    if let (Datum::Scalar { value: l, .. }, Datum::Scalar { value: r, .. }) = (left, right) {
        return Ok(Datum::scalar(f(l, r)?, out));
    }
    let name = match left {
        Datum::Column(c) => c.name().to_string(),
        Datum::Scalar { .. } => "literal".to_string(),
    };
    let mut builder = ColumnBuilder::new(out, len);
    for i in 0..len {
        builder.push(f(&left.value_at(i), &right.value_at(i))?)?;
    }
    Ok(Datum::Column(builder.finish(name)))
}

fn apply_binary(op: BinaryOp, left: &Value, right: &Value, out: DataType) -> Result<Value> {
    if op.is_logical() {
        return Ok(kleene(op, left.as_bool(), right.as_bool()));
    }

    // Handle NULL propagation
    if left.is_null() || right.is_null() {
        return Ok(Value::Null);
    }

    if op.is_comparison() {
        let ord = left.cmp(right);
        let result = match op {
            BinaryOp::Eq => ord == Ordering::Equal,
            BinaryOp::Ne => ord != Ordering::Equal,
            BinaryOp::Lt => ord == Ordering::Less,
            BinaryOp::Le => ord != Ordering::Greater,
            BinaryOp::Gt => ord == Ordering::Greater,
            _ => ord != Ordering::Less,
        };
        return Ok(Value::Boolean(result));
    }

    match (left, right, out) {
        (Value::Int64(a), Value::Int64(b), DataType::Int64) => int_arithmetic(op, *a, *b),
        _ => match (left.to_f64(), right.to_f64()) {
            (Some(a), Some(b)) => Ok(float_arithmetic(op, a, b)),
            _ => Err(Error::invalid_operation(format!(
                "arithmetic '{:?}' is undefined for '{}' and '{}'",
                op, left, right
            ))),
        },
    }
}

/// Three-valued AND/OR.
fn kleene(op: BinaryOp, left: Option<bool>, right: Option<bool>) -> Value {
    let result = match op {
        // NULL AND FALSE = FALSE, NULL AND TRUE = NULL
        BinaryOp::And => match (left, right) {
            (Some(false), _) | (_, Some(false)) => Some(false),
            (Some(true), Some(true)) => Some(true),
            _ => None,
        },
        // NULL OR TRUE = TRUE, NULL OR FALSE = NULL
        _ => match (left, right) {
            (Some(true), _) | (_, Some(true)) => Some(true),
            (Some(false), Some(false)) => Some(false),
            _ => None,
        },
    };
    result.map_or(Value::Null, Value::Boolean)
}

fn int_arithmetic(op: BinaryOp, a: i64, b: i64) -> Result<Value> {
    let result = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Mod => {
            if b == 0 {
                return Ok(Value::Null);
            }
            a.checked_rem(b)
        }
        _ => return Ok(float_arithmetic(op, a as f64, b as f64)),
    };
    result.map(Value::Int64).ok_or_else(|| {
        Error::invalid_operation(format!("integer overflow in {} {:?} {}", a, op, b))
    })
}

fn float_arithmetic(op: BinaryOp, a: f64, b: f64) -> Value {
    match op {
        BinaryOp::Add => Value::Float64(a + b),
        BinaryOp::Sub => Value::Float64(a - b),
        BinaryOp::Mul => Value::Float64(a * b),
        BinaryOp::Div if b == 0.0 => Value::Null,
        BinaryOp::Div => Value::Float64(a / b),
        BinaryOp::Mod if b == 0.0 => Value::Null,
        BinaryOp::Mod => Value::Float64(a % b),
        _ => Value::Null,
    }
}

fn apply_unary(op: UnaryOp, value: &Value) -> Result<Value> {
    Ok(match op {
        UnaryOp::IsNull => Value::Boolean(value.is_null()),
        UnaryOp::IsNotNull => Value::Boolean(!value.is_null()),
        UnaryOp::Not => value.as_bool().map_or(Value::Null, |b| Value::Boolean(!b)),
        UnaryOp::Neg => match value {
            Value::Int64(i) => Value::Int64(i.checked_neg().ok_or_else(|| {
                Error::invalid_operation(format!("integer overflow negating {}", i))
            })?),
            Value::Float64(f) => Value::Float64(-f),
            _ => Value::Null,
        },
    })
}

fn apply_function(func: ScalarFunc, value: &Value) -> Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    let undefined = || {
        Error::invalid_operation(format!(
            "function '{}' is undefined for '{}'",
            func.name(),
            value
        ))
    };
    Ok(match (func, value) {
        (ScalarFunc::Abs, Value::Int64(i)) => Value::Int64(
            i.checked_abs()
                .ok_or_else(|| Error::invalid_operation(format!("integer overflow in abs({})", i)))?,
        ),
        (ScalarFunc::Abs, Value::Float64(f)) => Value::Float64(f.abs()),
        (ScalarFunc::Round, Value::Int64(i)) => Value::Int64(*i),
        (ScalarFunc::Round, Value::Float64(f)) => Value::Float64(f.round()),
        (ScalarFunc::Sqrt | ScalarFunc::Log | ScalarFunc::Exp, v) => {
            let x = v.to_f64().ok_or_else(undefined)?;
            Value::Float64(match func {
                ScalarFunc::Sqrt => x.sqrt(),
                ScalarFunc::Log => x.ln(),
                _ => x.exp(),
            })
        }
        (ScalarFunc::Upper, Value::String(s)) => Value::String(s.to_uppercase()),
        (ScalarFunc::Lower, Value::String(s)) => Value::String(s.to_lowercase()),
        (ScalarFunc::StrLen, Value::String(s)) => Value::Int64(s.chars().count() as i64),
        _ => return Err(undefined()),
    })
}
