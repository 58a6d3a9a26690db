//! Glory convergence plot - main entry point
//!
//! Reads results.csv from the current directory and writes
//! heaven_hell_plot.png. Running without arguments performs the full render.

use anyhow::Context;
use clap::Parser;
use glory_plot::config::ReportConfig;
use glory_plot::pipeline;
use glory_plot::report::properties::PropertyReader;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about = "Plot convergence to \"Glory\" against hub broadcast weight")]
struct Cli {
    /// Simulation results CSV (default: results.csv)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// PNG to write (default: heaven_hell_plot.png)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Override a report property, e.g. --set figure.dpi=150
    #[arg(long = "set", value_name = "NAME=VALUE")]
    overrides: Vec<String>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("✗ {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let props = PropertyReader::from_overrides(cli.overrides.as_slice())?;
    let mut config = ReportConfig::from_properties(&props)?;

    if let Some(input) = cli.input {
        config.input_path = input;
    }
    if let Some(output) = cli.output {
        config.output_path = output;
    }

    log::debug!("{:?}", config);

    if let Some(summary) = pipeline::run(&config).context("rendering failed")? {
        log::info!(
            "✓ {} rows, {}x{} px",
            summary.rows,
            summary.width,
            summary.height
        );
    }

    Ok(())
}
