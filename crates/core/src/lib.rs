//! Strata Core - Core types for the Strata columnar query engine.
//!
//! This crate provides the foundational types shared by every other crate:
//!
//! - `DataType`: Supported column types (Null, Boolean, Int64, Float64, String)
//! - `Value`: A single cell value, including the missing marker
//! - `Column`: A named, typed, immutable sequence of values
//! - `Table`: An ordered set of equal-length columns
//! - `schema`: Field and schema definitions, plus a row-oriented table builder
//! - `Error`: Error types, classified as schema, value or I/O errors
//!
//! # Example
//!
//! ```rust
//! use strata_core::{Column, Table, Value};
//!
//! let table = Table::new(vec![
//!     Column::new("model", vec!["Leaf", "Model 3"]).unwrap(),
//!     Column::new("Electric Range", vec![84i64, 293]).unwrap(),
//! ])
//! .unwrap();
//!
//! assert_eq!(table.num_rows(), 2);
//! assert_eq!(
//!     table.column("Electric Range").unwrap().get(0),
//!     Some(Value::Int64(84))
//! );
//! ```

mod column;
mod error;
pub mod schema;
mod table;
mod types;
mod value;

pub use column::{Column, ColumnBuilder, ColumnData};
pub use error::{Error, ErrorKind, Result, ResultExt};
pub use schema::{Field, Schema};
pub use table::Table;
pub use types::DataType;
pub use value::Value;
