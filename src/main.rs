use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::time::Instant;

use brc_solver::config::DEFAULT_CHUNK_SIZE;
use brc_solver::{Solver, SolverConfig};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

/// Min/mean/max per station over a measurements file
#[derive(Parser, Debug)]
#[command(name = "brc-solver")]
#[command(version)]
struct Args {
    /// Measurements file, one `station;value` record per line
    measurements_path: PathBuf,

    /// Number of worker threads (defaults to the number of logical CPUs)
    #[arg(short, long)]
    worker_count: Option<usize>,

    /// Bytes each worker reserves per read
    #[arg(short, long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_thread_names(true)
        .init();

    let args = Args::parse();

    let mut builder = SolverConfig::builder()
        .input_path(&args.measurements_path)
        .chunk_size(args.chunk_size);
    if let Some(count) = args.worker_count {
        builder = builder.worker_count(count);
    }
    let solver = Solver::new(builder.build());

    let start = Instant::now();
    let mut out = BufWriter::new(io::stdout().lock());
    if let Err(e) = solver.run(&mut out) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
    drop(out);

    eprintln!(
        "\n\nTook {:.4} seconds to process {}",
        start.elapsed().as_secs_f64(),
        args.measurements_path.display()
    );
}
