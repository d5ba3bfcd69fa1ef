//! Benchmark modules

pub mod eager_lazy;
pub mod streaming;
