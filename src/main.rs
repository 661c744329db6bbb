//! fraction-pipelines: run the fraction pipelines and print their reports.
//!
//! # Usage
//!
//! ```bash
//! # Every pipeline, ten fractions each
//! fraction-pipelines
//!
//! # Only the demand-driven one, reproducibly
//! FLUX_SEED=7 fraction-pipelines --pipeline create --count 20
//!
//! # With dispatch diagnostics on stderr
//! RUST_LOG=flux_concurrency=debug fraction-pipelines
//! ```

use std::num::NonZeroUsize;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use flux_concurrency::flux::DEFAULT_CONCURRENCY;
use flux_concurrency::pipelines::{self, PipelineConfig, DEFAULT_COUNT};
use flux_concurrency::{Scheduler, SingleResult};

#[derive(Parser, Debug)]
#[command(name = "fraction-pipelines")]
#[command(about = "Reduce and multiply random fractions through concurrent pipelines")]
#[command(version)]
struct Args {
    /// Which pipeline to run
    #[arg(short, long, value_enum, default_value_t = Pipeline::All)]
    pipeline: Pipeline,

    /// Number of fractions the generator-driven pipelines produce
    #[arg(short, long, env = "FLUX_COUNT", default_value_t = DEFAULT_COUNT)]
    count: usize,

    /// Seed for the fraction generator; random when absent
    #[arg(short, long, env = "FLUX_SEED")]
    seed: Option<u64>,

    /// Maximum number of elements processed at once by each pipeline
    #[arg(long, env = "FLUX_CONCURRENCY", default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: NonZeroUsize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Pipeline {
    /// All three, one after the other
    All,
    /// Fixed denominators with a recovered division by zero
    Exceptions,
    /// Demand-driven generator on the parallel pool
    Create,
    /// Plain iterator joined through a barrier on the work-stealing pool
    Bridge,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("flux_concurrency=info")),
        )
        .init();

    let args = Args::parse();
    let config = PipelineConfig {
        count: args.count,
        seed: args.seed,
        concurrency: args.concurrency,
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("stealer")
        .enable_all()
        .build()
        .context("Failed to start the work-stealing runtime")?;
    let stealer = Scheduler::from_tokio(runtime.handle().clone());

    tracing::info!(pipeline = ?args.pipeline, ?config, "Running pipelines");

    let run: SingleResult<()> = match args.pipeline {
        Pipeline::Exceptions => pipelines::fraction_exceptions(&config),
        Pipeline::Create => pipelines::fraction_multiplications_create(&config),
        Pipeline::Bridge => pipelines::fraction_multiplications_bridge(&config, &stealer),
        Pipeline::All => {
            let create = pipelines::fraction_multiplications_create(&config);
            let bridge = pipelines::fraction_multiplications_bridge(&config, &stealer);
            pipelines::fraction_exceptions(&config)
                .flat_map(move |()| create)
                .flat_map(move |()| bridge)
        }
    };
    run.wait().context("Pipeline failed")?;

    tracing::info!("All pipelines completed");
    Ok(())
}
