//! Error types for Strata.

use crate::types::DataType;
use thiserror::Error;

/// Result type alias for Strata operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Coarse classification of an [`Error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// A referenced column is absent or has the wrong type.
    Schema,
    /// The operation is undefined for the values it was given.
    Value,
    /// A source or destination is unreachable or malformed.
    Io,
}

/// Error types for Strata operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Column not found.
    #[error("column not found: {column}")]
    ColumnNotFound { column: String },

    /// Two columns share a name.
    #[error("duplicate column name: {column}")]
    DuplicateColumn { column: String },

    /// A column does not have the table's row count.
    #[error("column {column} has length {got}, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        got: usize,
    },

    /// Type mismatch error.
    #[error("type mismatch in {context}: expected {expected}, got {got}")]
    TypeMismatch {
        context: String,
        expected: DataType,
        got: DataType,
    },

    /// Structurally invalid schema or plan.
    #[error("invalid schema: {message}")]
    InvalidSchema { message: String },

    /// Invalid operation.
    #[error("invalid operation: {message}")]
    InvalidOperation { message: String },

    /// Malformed input.
    #[error("parse error at row {row}, column {column}: {reason}")]
    Parse {
        row: u64,
        column: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// An error raised while executing a named plan step.
    #[error("{step}: {source}")]
    Step {
        step: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Creates a column not found error.
    pub fn column_not_found(column: impl Into<String>) -> Self {
        Error::ColumnNotFound {
            column: column.into(),
        }
    }

    /// Creates a duplicate column error.
    pub fn duplicate_column(column: impl Into<String>) -> Self {
        Error::DuplicateColumn {
            column: column.into(),
        }
    }

    /// Creates a type mismatch error.
    pub fn type_mismatch(context: impl Into<String>, expected: DataType, got: DataType) -> Self {
        Error::TypeMismatch {
            context: context.into(),
            expected,
            got,
        }
    }

    /// Creates an invalid schema error.
    pub fn invalid_schema(message: impl Into<String>) -> Self {
        Error::InvalidSchema {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Error::InvalidOperation {
            message: message.into(),
        }
    }

    /// Wraps this error with the name of the step that raised it.
    pub fn in_step(self, step: impl Into<String>) -> Self {
        Error::Step {
            step: step.into(),
            source: Box::new(self),
        }
    }

    /// Returns the taxonomy bucket of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ColumnNotFound { .. }
            | Error::DuplicateColumn { .. }
            | Error::LengthMismatch { .. }
            | Error::TypeMismatch { .. }
            | Error::InvalidSchema { .. } => ErrorKind::Schema,
            Error::InvalidOperation { .. } => ErrorKind::Value,
            Error::Parse { .. } | Error::Io(_) => ErrorKind::Io,
            Error::Step { source, .. } => source.kind(),
        }
    }

    /// Returns the innermost error, skipping step wrappers.
    pub fn root(&self) -> &Error {
        match self {
            Error::Step { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Adds step context to fallible results.
pub trait ResultExt<T> {
    /// Wraps an error with the step name produced by `step`.
    fn with_step<S, F>(self, step: F) -> Result<T>
    where
        S: Into<String>,
        F: FnOnce() -> S;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_step<S, F>(self, step: F) -> Result<T>
    where
        S: Into<String>,
        F: FnOnce() -> S,
    {
        self.map_err(|e| e.in_step(step()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::type_mismatch("filter", DataType::Boolean, DataType::Int64);
        assert_eq!(
            err.to_string(),
            "type mismatch in filter: expected bool, got i64"
        );

        let err = Error::column_not_found("price");
        assert!(err.to_string().contains("price"));
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(Error::column_not_found("a").kind(), ErrorKind::Schema);
        assert_eq!(Error::invalid_operation("log").kind(), ErrorKind::Value);
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert_eq!(Error::from(io).kind(), ErrorKind::Io);
    }

    #[test]
    fn test_step_wrapping() {
        let result: Result<()> = Err(Error::column_not_found("x"));
        let err = result.with_step(|| "FILTER col(\"x\")").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
        assert!(matches!(err.root(), Error::ColumnNotFound { .. }));
        assert!(err.to_string().starts_with("FILTER"));
    }
}
