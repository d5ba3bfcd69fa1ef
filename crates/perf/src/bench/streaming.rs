//! In-memory versus streaming execution over a larger frame.

use crate::report::Report;
use crate::utils::{format_duration, format_throughput, measure, vehicle_frame};
use strata_frame::prelude::*;

fn query(df: &DataFrame) -> LazyFrame {
    df.lazy()
        .filter(col("range").lt(lit(100i64)))
        .with_columns([(col("range") * lit(2i64)).alias("double_range")])
        .group_by([col("make")])
        .agg([
            len(),
            col("double_range").sum().alias("total"),
            col("range").max().alias("max_range"),
        ])
        .sort([(col("make"), SortOrder::Asc)])
}

/// Times the query in memory and then streamed at each batch size.
///
/// Fails if any streamed result differs from the in-memory one.
pub fn run(
    report: &mut Report,
    rows: usize,
    batch_sizes: &[usize],
    warmup: usize,
    iterations: usize,
) -> Result<()> {
    let section = format!("streaming {}", rows);
    println!("  Streaming ({} rows, {} iterations):", rows, iterations);
    let df = vehicle_frame(rows, 12345)?;
    let expected = query(&df).with_streaming(false).collect()?;

    let result = measure(warmup, iterations, || {
        query(&df).with_streaming(false).collect()
    })?;
    println!(
        "    in-memory:        {:>12} ({})",
        format_duration(result.mean),
        format_throughput(result.throughput(rows))
    );
    report.add(&section, "in-memory", rows, result);

    for &batch_size in batch_sizes {
        let lf = query(&df).with_streaming(true).with_batch_size(batch_size);
        if lf.collect()? != expected {
            return Err(Error::invalid_operation(format!(
                "streaming with batch size {} differs from in-memory",
                batch_size
            )));
        }
        let result = measure(warmup, iterations, || lf.collect())?;
        println!(
            "    batch {:>9}: {:>12} ({})",
            batch_size,
            format_duration(result.mean),
            format_throughput(result.throughput(rows))
        );
        report.add(&section, &format!("batch {}", batch_size), rows, result);
    }
    Ok(())
}
