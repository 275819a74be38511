//! Headless crab-castle match runner.
//!
//! # Usage
//!
//! ```bash
//! crab_headless run [--scenario FILE] [--config FILE] [--ticks N] [--output FILE]
//! crab_headless validate --config FILE [--scenario FILE]
//! ```
//!
//! Reports go to stdout (or `--output`) as JSON; logs go to stderr and
//! honour `RUST_LOG`.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crab_core::config::AiConfig;
use crab_headless::runner::prepare;
use crab_headless::{run_match, HeadlessError, Scenario};

#[derive(Parser)]
#[command(name = "crab_headless")]
#[command(about = "Headless crab-castle runner for AI testing and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one match and print its report
    Run {
        /// Scenario file (RON); the built-in skirmish if omitted
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// AI config file (RON); defaults if omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Ticks to run; the scenario's own length if omitted
        #[arg(short, long)]
        ticks: Option<u64>,

        /// Write the JSON report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Load and validate config and scenario files
    Validate {
        /// AI config file (RON)
        #[arg(short, long)]
        config: PathBuf,

        /// Scenario file (RON)
        #[arg(short, long)]
        scenario: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs to stderr; stdout is for reports
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let result = match cli.command {
        Commands::Run {
            scenario,
            config,
            ticks,
            output,
        } => cmd_run(scenario, config, ticks, output),
        Commands::Validate { config, scenario } => cmd_validate(config, scenario),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "Headless run failed");
            ExitCode::FAILURE
        }
    }
}

fn load_scenario(path: Option<PathBuf>) -> Result<Scenario, HeadlessError> {
    Ok(match path {
        Some(path) => Scenario::load(path)?,
        None => Scenario::skirmish(),
    })
}

fn load_config(path: Option<PathBuf>) -> Result<AiConfig, HeadlessError> {
    Ok(match path {
        Some(path) => AiConfig::load(path)?,
        None => AiConfig::default(),
    })
}

/// Run a single match
fn cmd_run(
    scenario: Option<PathBuf>,
    config: Option<PathBuf>,
    ticks: Option<u64>,
    output: Option<PathBuf>,
) -> Result<(), HeadlessError> {
    let scenario = load_scenario(scenario)?;
    let config = load_config(config)?;
    let ticks = ticks.unwrap_or(scenario.ticks);

    let report = run_match(&scenario, &config, ticks)?;
    let json = report.to_json()?;
    match output {
        Some(path) => {
            std::fs::write(&path, json)?;
            tracing::info!(path = %path.display(), "Report written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Validate config (and optionally scenario) files
fn cmd_validate(config: PathBuf, scenario: Option<PathBuf>) -> Result<(), HeadlessError> {
    let parsed = AiConfig::load(&config)?;
    tracing::info!(
        path = %config.display(),
        goals = parsed.build_order.len(),
        "Config is valid"
    );
    if let Some(path) = scenario {
        let scenario = Scenario::load(&path)?;
        prepare(&scenario, &parsed)?;
        tracing::info!(path = %path.display(), teams = scenario.teams.len(), "Scenario is valid");
    }
    Ok(())
}
