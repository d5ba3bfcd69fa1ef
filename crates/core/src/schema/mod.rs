//! Schema module.
//!
//! This module contains the field and schema definitions that describe the
//! shape of a table, plus a row-oriented builder for small tables.

mod builder;
mod field;

pub use builder::TableBuilder;
pub use field::{Field, Schema};
