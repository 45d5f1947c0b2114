//! `area`: left Riemann sum of `f(x) = x²` across processes and threads.
//!
//! ```text
//! area [-n NUMBER_OF_RECTANGLES] [-l X_LEFT] [-r X_RIGHT]
//! AREA_NUM_THREADS=2 mpiexec -n 4 area -n 100000 -l 50.1 -r 75.5
//! ```
//!
//! Only rank 0 prints, and it prints exactly one number. Diagnostics go to
//! stderr; set `AREA_LOG=info` for the run report.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use ferroarea::{IntegrationDomain, Universe, area, square};

const LOG_ENV: &str = "AREA_LOG";

/// Approximate the area under x² with a left Riemann sum.
///
/// The process count is set by the MPI launcher and the thread count per
/// process by AREA_NUM_THREADS (or OMP_NUM_THREADS).
#[derive(Parser, Debug)]
#[command(name = "area", version, about)]
#[command(
    override_usage = "[AREA_NUM_THREADS=T] mpiexec -n NUMBER_OF_PROCESSES area [-n NUMBER_OF_RECTANGLES] [-l X_LEFT] [-r X_RIGHT]"
)]
struct Cli {
    /// Total number of rectangles, at least 1
    // zero or negative counts are usage errors, reported before MPI starts
    #[arg(
        short = 'n',
        value_name = "NUMBER_OF_RECTANGLES",
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    rectangles: u64,

    /// Left x-boundary of the domain
    #[arg(
        short = 'l',
        value_name = "X_LEFT",
        default_value_t = 0.0,
        allow_negative_numbers = true
    )]
    left: f64,

    /// Right x-boundary of the domain
    #[arg(
        short = 'r',
        value_name = "X_RIGHT",
        default_value_t = 10.0,
        allow_negative_numbers = true
    )]
    right: f64,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let mut universe = Universe::init().context("failed to start the process world")?;
    let threads = universe.num_threads();
    let domain = IntegrationDomain::new(cli.left, cli.right);

    let report = area::integrate(universe.world(), &domain, cli.rectangles, threads, &square)
        .with_context(|| format!("rank {} failed", universe.rank()))?;
    universe.finalize();

    if let Some(report) = report {
        println!("{:.6}", report.area);
    }
    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
