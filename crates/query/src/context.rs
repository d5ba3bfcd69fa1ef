//! Execution context for query execution.
//!
//! [`EngineConfig`] holds the tunables of an engine instance and
//! [`ExecutionContext`] pairs it with the worker pool used to run plans.

use rayon::prelude::*;
use rayon::ThreadPool;
use std::fmt;
use std::sync::OnceLock;
use strata_core::Result;
use tracing::{debug, warn};

/// Default number of rows per batch in streaming execution.
pub const DEFAULT_BATCH_SIZE: usize = 50_000;

/// Default number of records read to infer a CSV schema.
pub const DEFAULT_INFER_SCHEMA_ROWS: usize = 100;

/// How a lazy plan is executed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutionMode {
    /// One pass over fully materialized intermediate tables.
    InMemory,
    /// Bounded batches pulled from the source.
    Streaming { batch_size: usize },
}

/// Engine configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Rows per batch in streaming execution.
    pub batch_size: usize,
    /// Maximum number of worker threads.
    pub parallelism: usize,
    /// Whether lazy plans are optimized before execution.
    pub optimize: bool,
    /// Whether lazy plans run in streaming mode by default.
    pub streaming: bool,
    /// Records read to infer a CSV schema.
    pub infer_schema_rows: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            parallelism: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            optimize: true,
            streaming: false,
            infer_schema_rows: DEFAULT_INFER_SCHEMA_ROWS,
        }
    }
}

impl EngineConfig {
    /// Reads overrides from `STRATA_BATCH_SIZE`, `STRATA_NUM_THREADS`,
    /// `STRATA_OPTIMIZE`, `STRATA_STREAMING` and `STRATA_INFER_SCHEMA_ROWS`.
    ///
    /// Values that do not parse are ignored with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(n) = parse_var(&lookup, "STRATA_BATCH_SIZE", parse_positive) {
            config.batch_size = n;
        }
        if let Some(n) = parse_var(&lookup, "STRATA_NUM_THREADS", parse_positive) {
            config.parallelism = n;
        }
        if let Some(b) = parse_var(&lookup, "STRATA_OPTIMIZE", parse_flag) {
            config.optimize = b;
        }
        if let Some(b) = parse_var(&lookup, "STRATA_STREAMING", parse_flag) {
            config.streaming = b;
        }
        if let Some(n) = parse_var(&lookup, "STRATA_INFER_SCHEMA_ROWS", parse_positive) {
            config.infer_schema_rows = n;
        }
        config
    }

    /// Sets the streaming batch size. Zero is treated as one.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Sets the maximum number of worker threads. Zero is treated as one.
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    /// Enables or disables plan optimization.
    pub fn with_optimize(mut self, optimize: bool) -> Self {
        self.optimize = optimize;
        self
    }

    /// Enables or disables streaming execution.
    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    /// Sets the number of records used for CSV schema inference.
    pub fn with_infer_schema_rows(mut self, rows: usize) -> Self {
        self.infer_schema_rows = rows.max(1);
        self
    }

    /// Returns the execution mode these settings select.
    pub fn mode(&self) -> ExecutionMode {
        if self.streaming {
            ExecutionMode::Streaming {
                batch_size: self.batch_size,
            }
        } else {
            ExecutionMode::InMemory
        }
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    parse: fn(&str) -> Option<T>,
) -> Option<T> {
    let raw = lookup(key)?;
    let parsed = parse(raw.trim());
    if parsed.is_none() {
        warn!(key, value = %raw, "ignoring invalid configuration value");
    }
    parsed
}

fn parse_positive(s: &str) -> Option<usize> {
    s.parse::<usize>().ok().filter(|&n| n > 0)
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration plus the worker pool that executes plans.
///
/// The pool is built on first use. If it cannot be built, work runs on the
/// calling thread instead.
pub struct ExecutionContext {
    config: EngineConfig,
    pool: OnceLock<Option<ThreadPool>>,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("config", &self.config)
            .field("pool_started", &self.pool.get().is_some())
            .finish()
    }
}

impl ExecutionContext {
    /// Creates a new context.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            pool: OnceLock::new(),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn pool(&self) -> Option<&ThreadPool> {
        self.pool
            .get_or_init(|| {
                if self.config.parallelism <= 1 {
                    return None;
                }
                let built = rayon::ThreadPoolBuilder::new()
                    .num_threads(self.config.parallelism)
                    .build();
                match built {
                    Ok(pool) => {
                        debug!(threads = self.config.parallelism, "worker pool started");
                        Some(pool)
                    }
                    Err(err) => {
                        warn!(%err, "worker pool unavailable, running single-threaded");
                        None
                    }
                }
            })
            .as_ref()
    }

    /// Applies `f` to every item, on the worker pool when there is more than
    /// one item. Results keep the order of `items`; any error fails the whole map.
    pub fn try_map<T, U, F>(&self, items: &[T], f: F) -> Result<Vec<U>>
    where
        T: Sync,
        U: Send,
        F: Fn(&T) -> Result<U> + Sync + Send,
    {
        if items.len() > 1 {
            if let Some(pool) = self.pool() {
                return pool.install(|| items.par_iter().map(&f).collect());
            }
        }
        items.iter().map(f).collect()
    }
}
