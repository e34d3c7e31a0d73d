//! Command-line driver for the three reference workloads.
//!
//! ```bash
//! parallel_tasks sort --size 10000000
//! parallel_tasks strings --rows 5000 --cols 500 --string-len 4
//! parallel_tasks decrement --size 5000000 --max-value 50
//! RUST_LOG=parallel_tasks=debug parallel_tasks all --workers 4 --seed 42
//! ```

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use parallel_tasks::workloads::{
    all_equal_to, format_matrix_sample, format_sample, is_sorted, populate_random,
    populate_string_matrix, sort_rows,
};
use parallel_tasks::{Engine, EngineConfig, ProgressSink, RandomDecrement, StdoutSink};

#[derive(Parser, Debug)]
#[command(name = "parallel_tasks", about = "Chunked parallel sort, bulk apply and convergence demos")]
struct Cli {
    #[command(flatten)]
    engine: EngineArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct EngineArgs {
    /// Worker count (default: hardware threads - 1, at least 1)
    #[arg(long, global = true)]
    workers: Option<usize>,

    /// Simulated per-core utilization in percent; below 100 throttles sort units
    #[arg(long, global = true, default_value_t = 100)]
    utilization: u8,

    /// Base seed for reproducible random data
    #[arg(long, global = true)]
    seed: Option<u64>,
}

#[derive(Args, Debug, Clone, Copy)]
struct SortArgs {
    /// Number of integers to sort
    #[arg(long, default_value_t = 10_000_000)]
    size: usize,
}

#[derive(Args, Debug, Clone, Copy)]
struct StringArgs {
    #[arg(long, default_value_t = 5_000)]
    rows: usize,
    #[arg(long, default_value_t = 500)]
    cols: usize,
    #[arg(long, default_value_t = 4)]
    string_len: usize,
}

#[derive(Args, Debug, Clone, Copy)]
struct DecrementArgs {
    /// Number of integers to drive to zero
    #[arg(long, default_value_t = 5_000_000)]
    size: usize,
    /// Largest initial value
    #[arg(long, default_value_t = 50)]
    max_value: u32,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parallel merge sort of random integers, compared with a single-threaded sort
    Sort(SortArgs),
    /// Populate a string matrix, then sort every row
    Strings(StringArgs),
    /// Randomly decrement integers until all reach zero
    Decrement(DecrementArgs),
    /// Run all three workloads with default sizes
    All,
}

fn banner(sink: &dyn ProgressSink, title: &str) {
    sink.emit("");
    sink.emit(&"=".repeat(60));
    sink.emit(title);
    sink.emit(&"=".repeat(60));
}

fn run_sort(engine: &Engine, args: SortArgs) -> Result<()> {
    let sink = engine.sink();
    banner(sink, "PARALLEL NUMBER SORT");

    let max = u32::try_from(args.size).unwrap_or(u32::MAX);
    let mut data = vec![0i64; args.size];
    sink.emit(&format!("Generating {} random integers...", args.size));
    populate_random(engine, &mut data, max).context("populating sort input")?;

    sink.emit("Original vector (unsorted):");
    format_sample(&data, 10).iter().for_each(|line| sink.emit(line));

    let report = engine.sort(&mut data).context("parallel sort")?;
    sink.emit(&format!("Vector is sorted: {}", is_sorted(&data)));
    sink.emit("Sorted vector:");
    format_sample(&data, 10).iter().for_each(|line| sink.emit(line));
    sink.emit(&format!(
        "Parallel sort took: {} ms ({} chunks, {} merge levels)",
        report.elapsed.as_millis(),
        report.chunks,
        report.merge_levels
    ));

    sink.emit("Now testing single-threaded sort for comparison...");
    populate_random(engine, &mut data, max).context("regenerating sort input")?;
    let started = Instant::now();
    data.sort_unstable();
    let single = started.elapsed();
    sink.emit(&format!("Single-threaded sort took: {} ms", single.as_millis()));

    if report.elapsed.is_zero() {
        sink.emit("Speedup: N/A (parallel time was zero)");
    } else {
        sink.emit(&format!(
            "Speedup: {:.2}x",
            single.as_secs_f64() / report.elapsed.as_secs_f64()
        ));
    }
    Ok(())
}

fn run_strings(engine: &Engine, args: StringArgs) -> Result<()> {
    let sink = engine.sink();
    banner(sink, "STRING MATRIX POPULATION AND SORT");

    let mut matrix: Vec<Vec<String>> = vec![Vec::new(); args.rows];

    let populate = populate_string_matrix(engine, &mut matrix, args.cols, args.string_len)
        .context("populating string matrix")?;
    sink.emit(&format!(
        "String matrix population took: {} ms",
        populate.elapsed.as_millis()
    ));
    sink.emit("Sample of populated string matrix (before sort):");
    format_matrix_sample(&matrix, 3, 5).iter().for_each(|line| sink.emit(line));

    let sort = sort_rows(engine, &mut matrix).context("sorting string matrix rows")?;
    sink.emit(&format!("String matrix row sorting took: {} ms", sort.elapsed.as_millis()));
    sink.emit("Sample of sorted string matrix:");
    format_matrix_sample(&matrix, 3, 5).iter().for_each(|line| sink.emit(line));

    sink.emit(&format!(
        "Total time: {} ms",
        (populate.elapsed + sort.elapsed).as_millis()
    ));
    Ok(())
}

fn run_decrement(engine: &Engine, args: DecrementArgs) -> Result<()> {
    let sink = engine.sink();
    banner(sink, "DECREMENT VECTOR ELEMENTS TO ZERO");

    let mut data = vec![0i64; args.size];
    sink.emit(&format!(
        "Populating vector of size {} with random values up to {}...",
        args.size, args.max_value
    ));
    populate_random(engine, &mut data, args.max_value).context("populating decrement input")?;
    sink.emit("Initial vector:");
    format_sample(&data, 10).iter().for_each(|line| sink.emit(line));

    let report = engine
        .run_to_zero(&mut data, &RandomDecrement::coin_flip())
        .context("decrementing to zero")?;

    sink.emit(&format!(
        "Total time for decrement phase: {} ms over {} passes",
        report.elapsed.as_millis(),
        report.passes
    ));
    let all_zero = all_equal_to(&data, &0);
    sink.emit(&format!("Verification: all elements are zero = {}", all_zero));
    if !all_zero {
        format_sample(&data, 10).iter().for_each(|line| sink.emit(line));
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let mut builder = EngineConfig::builder().core_utilization_pct(cli.engine.utilization);
    if let Some(workers) = cli.engine.workers {
        builder = builder.num_workers(workers);
    }
    if let Some(seed) = cli.engine.seed {
        builder = builder.seed(seed);
    }

    let engine = Engine::new(builder.build(), Arc::new(StdoutSink)).context("building engine")?;

    match cli.command {
        Command::Sort(args) => run_sort(&engine, args)?,
        Command::Strings(args) => run_strings(&engine, args)?,
        Command::Decrement(args) => run_decrement(&engine, args)?,
        Command::All => {
            run_sort(&engine, SortArgs { size: 10_000_000 })?;
            run_strings(
                &engine,
                StringArgs {
                    rows: 5_000,
                    cols: 500,
                    string_len: 4,
                },
            )?;
            run_decrement(
                &engine,
                DecrementArgs {
                    size: 5_000_000,
                    max_value: 50,
                },
            )?;
        }
    }

    Ok(())
}
