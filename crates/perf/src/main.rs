//! `perf`: times eager against lazy execution, and in-memory against
//! streaming execution, and prints a summary.

mod bench;
mod report;
mod utils;

use bench::eager_lazy::Query;
use clap::Parser;
use report::Report;
use std::process::ExitCode;
use strata_frame::logging;
use tracing::error;

#[derive(Parser, Debug)]
#[clap(name = "perf", about = "Eager versus lazy performance comparison")]
struct Arguments {
    /// Measured repetitions per benchmark.
    #[clap(long, short, env = "STRATA_PERF_ITERATIONS", default_value = "1000")]
    iterations: usize,
    /// Unmeasured repetitions before each benchmark.
    #[clap(long, default_value = "10")]
    warmup: usize,
    /// Rows in the eager/lazy comparison frame.
    #[clap(long, default_value = "500")]
    rows: usize,
    /// Queries to compare. All of them when omitted.
    #[clap(long, short, value_enum)]
    query: Vec<Query>,
    /// Rows in the streaming benchmark frame.
    #[clap(long, default_value = "250000")]
    stream_rows: usize,
    /// Batch sizes for the streaming benchmark.
    #[clap(long, value_delimiter = ',', default_value = "10,1000,50000")]
    batch_sizes: Vec<usize>,
    /// Skip the streaming benchmark.
    #[clap(long)]
    no_streaming: bool,
}

fn run(args: &Arguments) -> strata_frame::Result<()> {
    let mut report = Report::new();

    println!("Eager vs lazy:");
    let queries = if args.query.is_empty() {
        Query::ALL.to_vec()
    } else {
        args.query.clone()
    };
    for query in queries {
        bench::eager_lazy::run(&mut report, query, args.rows, args.warmup, args.iterations)?;
    }

    if !args.no_streaming {
        println!("\nStreaming:");
        // The streaming frame is large; a few repetitions are enough.
        let iterations = args.iterations.clamp(1, 10);
        bench::streaming::run(
            &mut report,
            args.stream_rows,
            &args.batch_sizes,
            args.warmup.min(1),
            iterations,
        )?;
    }

    println!();
    report.print_summary();
    Ok(())
}

fn main() -> ExitCode {
    let args = Arguments::parse();
    if let Err(err) = logging::init() {
        eprintln!("logging disabled: {}", err);
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "benchmark failed");
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}
