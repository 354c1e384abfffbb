// src/main.rs
//
// -----------------------------------------------------------------------------
// mp-bench - benchmark harness for Mountpoint-mounted S3 buckets: mount the
// bucket, drive a synthetic workload against it, tear everything down, and
// keep the evidence (timing metadata + mount tool logs).
// -----------------------------------------------------------------------------

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use mp_bench::artifacts::RunDir;
use mp_bench::config::ExperimentConfig;
use mp_bench::experiment;

// -----------------------------------------------------------------------------
// CLI definition
// -----------------------------------------------------------------------------
#[derive(Parser)]
#[command(
    name = "mp-bench",
    version,
    about = "Mount an S3 bucket via Mountpoint and benchmark it with fio or dd"
)]
struct Cli {
    /// YAML experiment configuration
    #[arg(short = 'c', long = "config")]
    config: PathBuf,

    /// Base directory for the timestamped run directory
    #[arg(long = "output-dir", default_value = ".")]
    output_dir: PathBuf,

    /// Verbose output (-v for info, -vv for debug, -vvv for trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

// -----------------------------------------------------------------------------
// main
// -----------------------------------------------------------------------------
fn main() -> Result<()> {
    let cli = Cli::parse();

    // Map -v count to a tracing level; RUST_LOG still wins when set.
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    use tracing_subscriber::{fmt, EnvFilter};
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("mp_bench={level}")));
    fmt().with_env_filter(filter).init();

    // Everything side-effecting waits until the config is known-good.
    let cfg = ExperimentConfig::load(&cli.config)?;
    info!(
        "Loaded {} ({} workload, {} workers)",
        cli.config.display(),
        cfg.workload.name(),
        cfg.application_workers
    );

    let run = RunDir::create(&cli.output_dir)?;
    let metadata = experiment::run(&cfg, &run)?;

    info!(
        "Run finished in {} (Mountpoint: {})",
        metadata.elapsed, metadata.mp_version
    );
    Ok(())
}
