//! Audience analyser command line
//!
//! Usage:
//!   audience-analyser job.json
//!   RUST_LOG=debug audience-analyser --dry-run job.json

use anyhow::{Context, Result};
use audience_analyser::{export, Analyser, JobConfig};
use clap::Parser;
use log::info;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "audience-analyser",
    version,
    about = "Track faces in sensor telemetry and export audience statistics"
)]
struct Args {
    /// JSON job file describing inputs and exports
    #[arg(value_name = "JOB")]
    job: PathBuf,
    /// Analyse and print statistics without writing exports
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    info!(
        "audience-analyser {} reading job '{}'",
        audience_analyser::version(),
        args.job.display()
    );

    let config = JobConfig::from_file(&args.job)
        .with_context(|| format!("loading job '{}'", args.job.display()))?;

    let analyser = Analyser::from_config(&config).context("analysing inputs")?;

    for stream in analyser.streams() {
        println!("[{}]", stream.id);
        print!("{}", stream.summary());
    }

    if args.dry_run {
        info!("Dry run, skipping {} exports", config.configurations.len());
        return Ok(());
    }

    for export_config in &config.configurations {
        export(&analyser, export_config)
            .with_context(|| format!("exporting '{}'", export_config.output.display()))?;
    }

    info!("Analysis complete");
    Ok(())
}
