//! Field parsing and type inference.

use strata_core::{DataType, Value};

fn parse_bool(field: &str) -> Option<bool> {
    if field.eq_ignore_ascii_case("true") {
        Some(true)
    } else if field.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Floats must contain a digit, so words like `inf` or `nan` stay strings.
fn looks_numeric(field: &str) -> bool {
    field.bytes().any(|b| b.is_ascii_digit())
}

/// Returns the narrowest type of a single non-empty field.
fn field_type(field: &str) -> DataType {
    if parse_bool(field).is_some() {
        DataType::Boolean
    } else if field.parse::<i64>().is_ok() {
        DataType::Int64
    } else if looks_numeric(field) && field.parse::<f64>().is_ok() {
        DataType::Float64
    } else {
        DataType::String
    }
}

/// Infers a column type from sample fields.
///
/// Empty fields are ignored. Integers and floats widen to `Float64`; any
/// other mix falls back to `String`, as does a column with no values.
pub fn infer_type<'a>(fields: impl IntoIterator<Item = &'a str>) -> DataType {
    let mut inferred = DataType::Null;
    for field in fields {
        if field.is_empty() {
            continue;
        }
        let dt = field_type(field);
        inferred = match (inferred, dt) {
            (DataType::Null, dt) => dt,
            (current, dt) if current == dt => current,
            (current, dt) => current
                .numeric_supertype(&dt)
                .unwrap_or(DataType::String),
        };
        if inferred == DataType::String {
            break;
        }
    }
    match inferred {
        DataType::Null => DataType::String,
        dt => dt,
    }
}

/// Parses a field as `data_type`. Empty fields are missing.
///
/// Returns `None` when the field is not a valid value of that type.
pub fn parse_field(field: &str, data_type: DataType) -> Option<Value> {
    if field.is_empty() {
        return Some(Value::Null);
    }
    match data_type {
        DataType::Null => None,
        DataType::Boolean => parse_bool(field).map(Value::Boolean),
        DataType::Int64 => field.parse().ok().map(Value::Int64),
        DataType::Float64 => field.parse().ok().map(Value::Float64),
        DataType::String => Some(Value::String(field.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_type() {
        assert_eq!(infer_type(["1", "", "-3"]), DataType::Int64);
        assert_eq!(infer_type(["1", "2.5"]), DataType::Float64);
        assert_eq!(infer_type(["true", "FALSE", ""]), DataType::Boolean);
        assert_eq!(infer_type(["1", "true"]), DataType::String);
        assert_eq!(infer_type(["Tesla", "3"]), DataType::String);
        assert_eq!(infer_type(["inf"]), DataType::String);
        assert_eq!(infer_type(["", ""]), DataType::String);
    }

    #[test]
    fn test_parse_field() {
        assert_eq!(parse_field("", DataType::Int64), Some(Value::Null));
        assert_eq!(parse_field("42", DataType::Int64), Some(Value::Int64(42)));
        assert_eq!(parse_field("4.5", DataType::Int64), None);
        assert_eq!(parse_field("4", DataType::Float64), Some(Value::Float64(4.0)));
        assert_eq!(parse_field("true", DataType::Boolean), Some(Value::Boolean(true)));
        assert_eq!(parse_field("x", DataType::Null), None);
    }
}
