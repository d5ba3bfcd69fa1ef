//! Logging setup.
//!
//! Strata logs through `tracing`. Applications that already install a
//! subscriber need nothing from here; others can call [`init`].

use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Default filter when `RUST_LOG` is unset or invalid.
const DEFAULT_FILTER: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs a global `fmt` subscriber filtered by `RUST_LOG` (default `info`).
///
/// Fails if a global subscriber is already installed.
pub fn init() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    FmtSubscriber::builder()
        .with_env_filter(env_filter())
        .try_init()
}

/// Installs a subscriber writing through the test harness's captured output.
///
/// Safe to call from every test: only the first call installs anything.
pub fn init_for_tests() {
    let _ = FmtSubscriber::builder()
        .with_env_filter(env_filter())
        .with_test_writer()
        .try_init();
}
