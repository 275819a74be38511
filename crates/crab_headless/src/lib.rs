//! Headless match runner for the crab AI.
//!
//! Loads a scenario and an AI config (both RON), seats an AI player on
//! every AI-controlled team, runs the fixed-rate simulation and reports the
//! outcome as JSON.
//!
//! # Example
//!
//! ```bash
//! # Built-in skirmish with default AI settings
//! cargo run -p crab_headless -- run
//!
//! # Custom scenario and config, 2 simulated minutes
//! cargo run -p crab_headless -- run --scenario skirmish.ron --config ai.ron --ticks 2400
//!
//! # Check a config file without running anything
//! cargo run -p crab_headless -- validate --config ai.ron
//! ```

use thiserror::Error;

pub mod runner;
pub mod scenario;

pub use runner::{run_match, MatchReport, TeamReport};
pub use scenario::{Scenario, ScenarioError};

/// Anything that can stop the headless runner.
#[derive(Error, Debug)]
pub enum HeadlessError {
    /// Scenario could not be loaded.
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
    /// AI config could not be loaded.
    #[error(transparent)]
    Config(#[from] crab_core::config::ConfigError),
    /// The core refused the setup.
    #[error(transparent)]
    Core(#[from] crab_core::error::CrabError),
    /// Report could not be written.
    #[error("Failed to encode report: {0}")]
    Json(#[from] serde_json::Error),
    /// Output file could not be written.
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
}
