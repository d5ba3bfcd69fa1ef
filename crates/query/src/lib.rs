//! Strata Query - Expressions, plans and execution for the Strata engine.
//!
//! This crate provides the query engine behind the frame API:
//!
//! - `ast`: Expression trees, their builders and static typing
//! - `planner`: Logical plans, table sources and `explain`
//! - `optimizer`: Plan rewrites (constant folding, predicate and projection pushdown)
//! - `executor`: Eager, in-memory and streaming execution, plus output sinks
//! - `context`: Engine configuration and the worker pool
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use strata_core::{Column, Table};
//! use strata_query::ast::{col, lit};
//! use strata_query::context::ExecutionContext;
//! use strata_query::executor::LazyExecutor;
//! use strata_query::planner::{LogicalPlan, MemorySource};
//!
//! let table = Table::new(vec![Column::new("a", (0..1000i64).collect::<Vec<_>>()).unwrap()]).unwrap();
//! let plan = LogicalPlan::filter(
//!     LogicalPlan::scan(Arc::new(MemorySource::new(table))),
//!     col("a").gt(lit(500i64)),
//! );
//!
//! let lazy = LazyExecutor::new(Arc::new(ExecutionContext::default()));
//! assert_eq!(lazy.collect(&plan).unwrap().num_rows(), 499);
//! ```

pub mod ast;
pub mod context;
pub mod executor;
pub mod optimizer;
pub mod planner;
