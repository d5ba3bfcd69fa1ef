//! Strata Frame - the user-facing API of the Strata query engine.
//!
//! [`DataFrame`] runs every operation immediately. [`LazyFrame`] records
//! operations as a plan and runs it on [`collect`](LazyFrame::collect),
//! optionally optimized and streamed in batches. Both produce the same
//! results for the same operations.
//!
//! ```no_run
//! use strata_frame::prelude::*;
//!
//! let df = read_csv("vehicles.csv", &csv_options())?;
//! let short_range = df.filter(col("Electric Range").lt(lit(100i64)))?;
//!
//! let counts = scan_csv("vehicles.csv", &CsvOptions::default())?
//!     .with_columns([col("Electric Range").lt(lit(100i64)).alias("under_100_range")])
//!     .group_by([col("under_100_range")])
//!     .agg([len()])
//!     .with_streaming(true)
//!     .collect()?;
//! # let _ = (short_range, counts);
//! # Ok::<(), strata_frame::Error>(())
//! ```

mod context;
mod dataframe;
mod lazyframe;
pub mod logging;

use std::path::Path;
use std::sync::Arc;
use tracing::debug;

pub use context::default_context;
pub use dataframe::{DataFrame, GroupBy};
pub use lazyframe::{LazyFrame, LazyGroupBy};
pub use strata_core::{Column, DataType, Error, Result, Schema, Table, Value};
pub use strata_io::CsvOptions;
pub use strata_query::ast::{col, len, lit, Expr, SortOrder};
pub use strata_query::context::{EngineConfig, ExecutionContext};

/// CSV options taking the inference sample and batch size from the
/// default context's configuration.
pub fn csv_options() -> CsvOptions {
    CsvOptions::from_config(default_context().config())
}

/// Reads a whole CSV file into a [`DataFrame`].
pub fn read_csv(path: impl AsRef<Path>, options: &CsvOptions) -> Result<DataFrame> {
    strata_io::read_csv(path, options).map(DataFrame::from)
}

/// Starts a lazy query over a CSV file.
///
/// The schema is inferred (or taken from `options`) now; rows are read
/// when the query runs.
pub fn scan_csv(path: impl AsRef<Path>, options: &CsvOptions) -> Result<LazyFrame> {
    let source = strata_io::CsvSource::new(path, options.clone())?;
    debug!(path = %source.path().display(), "lazy csv scan");
    Ok(LazyFrame::scan(Arc::new(source)))
}

/// Commonly used items.
pub mod prelude {
    pub use crate::{
        col, csv_options, len, lit, read_csv, scan_csv, Column, CsvOptions, DataFrame, DataType, Error, Expr,
        LazyFrame, Result, SortOrder, Table, Value,
    };
}
