//! The process-wide default execution context.

use std::sync::{Arc, OnceLock};
use strata_query::context::{EngineConfig, ExecutionContext};

static DEFAULT_CONTEXT: OnceLock<Arc<ExecutionContext>> = OnceLock::new();

/// Returns the context shared by frames that were not given one.
///
/// It is configured from the environment on first use
/// (see [`EngineConfig::from_env`]).
pub fn default_context() -> Arc<ExecutionContext> {
    Arc::clone(
        DEFAULT_CONTEXT.get_or_init(|| Arc::new(ExecutionContext::new(EngineConfig::from_env()))),
    )
}
