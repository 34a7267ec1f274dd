use std::process::ExitCode;

use clap::{Parser, Subcommand};
use monte_carlo_pi::strategy::isolated;
use monte_carlo_pi::{EstimateError, EstimationResult, Estimator, EstimatorConfig, Strategy};
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Monte Carlo π under four concurrency strategies
#[derive(Parser)]
#[command(name = "monte_carlo_pi", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate π with one strategy
    Run {
        /// isolated-process, unsync-shared, pooled or lock-guarded
        #[arg(short, long, value_parser = parse_strategy)]
        strategy: Strategy,

        /// Total number of sampled points
        #[arg(short, long, default_value = "1000000")]
        points: u64,

        /// Number of workers
        #[arg(short, long, default_value = "4")]
        workers: usize,

        /// Base seed (random when omitted)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Run all four strategies on the same budget and compare timings
    Compare {
        #[arg(short, long, default_value = "1000000")]
        points: u64,

        #[arg(short, long, default_value = "4")]
        workers: usize,

        #[arg(long)]
        seed: Option<u64>,
    },
}

fn parse_strategy(raw: &str) -> Result<Strategy, EstimateError> {
    raw.parse()
}

fn estimator(seed: Option<u64>) -> Result<Estimator, EstimateError> {
    let mut config = EstimatorConfig::from_env()?;
    if seed.is_some() {
        config.seed = seed;
    }
    Ok(Estimator::new(config))
}

fn print_result(result: &EstimationResult) {
    println!(
        "Pi ({}): {:.6}, Hits: {}/{}, Error: {:.6}, Time: {:?}",
        result.strategy,
        result.pi_estimate,
        result.hits,
        result.trials,
        result.abs_error(),
        result.elapsed
    );
}

fn run(cli: Cli) -> Result<(), EstimateError> {
    match cli.command {
        Commands::Run {
            strategy,
            points,
            workers,
            seed,
        } => {
            let result = estimator(seed)?.estimate(strategy, points, workers)?;
            print_result(&result);
        }
        Commands::Compare {
            points,
            workers,
            seed,
        } => {
            let estimator = estimator(seed)?;
            println!("Monte Carlo Pi Estimation");
            println!("Total samples: {points}, workers: {workers}");
            for strategy in Strategy::ALL {
                print_result(&estimator.estimate(strategy, points, workers)?);
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    // Serves and exits when launched as an isolated-process worker.
    isolated::init();

    // stdout carries worker replies, so logs go to stderr.
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "estimation failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
