//! Strata IO - CSV input and output for the Strata engine.
//!
//! - [`read_csv`] loads a whole file into a [`Table`](strata_core::Table).
//! - [`CsvSource`] is a [`TableSource`](strata_query::planner::TableSource)
//!   that reads a file in batches, parsing only the projected columns.
//! - [`write_csv`] writes a table; [`CsvSink`] writes batches as a streaming
//!   plan produces them.
//!
//! Fields are typed by inference over the first records of a file unless an
//! explicit schema is given: empty fields are missing, `true`/`false` are
//! booleans, then integers, floats and finally strings.

mod infer;
mod options;
mod reader;
mod writer;

pub use infer::{infer_type, parse_field};
pub use options::CsvOptions;
pub use reader::{read_csv, CsvSource};
pub use writer::{write_csv, CsvSink};
