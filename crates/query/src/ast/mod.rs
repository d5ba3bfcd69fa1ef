//! AST module for query expressions.

mod expr;
mod typing;

pub use expr::{col, len, lit, AggregateFunc, BinaryOp, Expr, ScalarFunc, SortOrder, UnaryOp};
pub use typing::{
    aggregate_output_type, binary_output_type, function_output_type, unary_output_type,
};
