//! Query planner module.

mod explain;
mod logical;
mod source;

pub use logical::LogicalPlan;
pub use source::{BatchReader, MemorySource, TableSource};
