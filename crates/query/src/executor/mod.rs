//! Query executor module.
//!
//! Single-operator executors work on whole tables. [`EagerExecutor`] runs
//! them one call at a time; [`LazyExecutor`] runs whole plans, either in one
//! in-memory pass ([`PlanRunner`]) or as a stream of batches
//! ([`StreamingRunner`]).

mod aggregate;
mod eager;
mod evaluate;
mod filter;
mod lazy;
mod limit;
mod project;
mod runner;
mod scan;
mod sink;
mod sort;
mod streaming;

pub use aggregate::{Accumulator, AggregateExecutor, GroupedAggregation};
pub use eager::EagerExecutor;
pub use evaluate::{evaluate, evaluate_predicate, evaluate_to_column, Datum};
pub use filter::FilterExecutor;
pub use lazy::LazyExecutor;
pub use limit::LimitExecutor;
pub use project::{ProjectExecutor, WithColumnsExecutor};
pub use runner::PlanRunner;
pub use scan::ScanExecutor;
pub use sink::{MemorySink, Sink};
pub use sort::SortExecutor;
pub use streaming::StreamingRunner;
