//! Timing helpers and data generators.

use std::time::{Duration, Instant};
use strata_frame::{Column, DataFrame, Result};

/// Runs `f` `warmup` times unmeasured, then `iterations` times measured.
///
/// The first error stops the measurement.
pub fn measure<F, R>(warmup: usize, iterations: usize, mut f: F) -> Result<BenchResult>
where
    F: FnMut() -> Result<R>,
{
    for _ in 0..warmup {
        std::hint::black_box(f()?);
    }

    let mut times = Vec::with_capacity(iterations);
    for _ in 0..iterations {
        let start = Instant::now();
        std::hint::black_box(f()?);
        times.push(start.elapsed());
    }

    Ok(BenchResult::from_times(&times))
}

#[derive(Clone, Debug, Default)]
#[allow(dead_code)]
pub struct BenchResult {
    pub min: Duration,
    pub max: Duration,
    pub mean: Duration,
    pub median: Duration,
    pub std_dev: Duration,
    pub iterations: usize,
}

impl BenchResult {
    /// Summarizes a set of timings. No timings gives all zeros.
    pub fn from_times(times: &[Duration]) -> Self {
        if times.is_empty() {
            return Self::default();
        }
        let mut sorted = times.to_vec();
        sorted.sort();

        let n = sorted.len();
        let sum: Duration = sorted.iter().sum();
        let mean = sum / n as u32;

        let mean_nanos = mean.as_nanos() as f64;
        let variance = sorted
            .iter()
            .map(|t| {
                let diff = t.as_nanos() as f64 - mean_nanos;
                diff * diff
            })
            .sum::<f64>()
            / n as f64;

        Self {
            min: sorted[0],
            max: sorted[n - 1],
            mean,
            median: sorted[n / 2],
            std_dev: Duration::from_nanos(variance.sqrt() as u64),
            iterations: n,
        }
    }

    /// Rows processed per second at the mean time.
    pub fn throughput(&self, rows: usize) -> f64 {
        let secs = self.mean.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            rows as f64 / secs
        }
    }
}

pub fn format_duration(d: Duration) -> String {
    let nanos = d.as_nanos();
    if nanos < 1_000 {
        format!("{} ns", nanos)
    } else if nanos < 1_000_000 {
        format!("{:.2} μs", nanos as f64 / 1_000.0)
    } else if nanos < 1_000_000_000 {
        format!("{:.2} ms", nanos as f64 / 1_000_000.0)
    } else {
        format!("{:.2} s", nanos as f64 / 1_000_000_000.0)
    }
}

pub fn format_throughput(rows_per_sec: f64) -> String {
    if rows_per_sec >= 1_000_000.0 {
        format!("{:.2}M rows/s", rows_per_sec / 1_000_000.0)
    } else if rows_per_sec >= 1_000.0 {
        format!("{:.2}K rows/s", rows_per_sec / 1_000.0)
    } else {
        format!("{:.2} rows/s", rows_per_sec)
    }
}

pub fn format_rows(rows: usize) -> String {
    if rows >= 1_000_000 {
        format!("{}M", rows / 1_000_000)
    } else if rows >= 1_000 {
        format!("{}K", rows / 1_000)
    } else {
        format!("{}", rows)
    }
}

/// Two integer columns `a` and `b`, both `0..rows`.
pub fn sequential_frame(rows: usize) -> Result<DataFrame> {
    let values: Vec<i64> = (0..rows as i64).collect();
    DataFrame::new(vec![
        Column::new("a", values.clone())?,
        Column::new("b", values)?,
    ])
}

/// A frame with a shuffled id, a range in `0..400` and a low-cardinality group.
pub fn vehicle_frame(rows: usize, seed: u64) -> Result<DataFrame> {
    let ids = shuffle_indices(rows, seed);
    DataFrame::new(vec![
        Column::new("id", ids.iter().map(|&i| i as i64).collect::<Vec<_>>())?,
        Column::new(
            "range",
            ids.iter().map(|&i| ((i * 37) % 400) as i64).collect::<Vec<_>>(),
        )?,
        Column::new(
            "make",
            ids.iter()
                .map(|&i| ["tesla", "nissan", "chevrolet", "kia"][i % 4])
                .collect::<Vec<_>>(),
        )?,
    ])
}

/// Simple LCG for reproducible pseudo-random shuffling
pub fn shuffle_indices(count: usize, seed: u64) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..count).collect();
    let mut s = seed;
    for i in (1..count).rev() {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        let j = (s as usize) % (i + 1);
        indices.swap(i, j);
    }
    indices
}
