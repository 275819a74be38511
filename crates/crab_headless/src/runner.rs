//! Runs a scenario to completion and summarises the result.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crab_core::components::{BuildingKind, Team};
use crab_core::config::AiConfig;
use crab_core::error::Result;
use crab_core::simulation::Simulation;

use crate::scenario::Scenario;

/// End-of-match state of one team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamReport {
    /// Team number.
    pub team: u8,
    /// Whether an AI player drove this team.
    pub ai: bool,
    /// Finished buildings by kind.
    pub buildings: BTreeMap<BuildingKind, usize>,
    /// Construction sites still standing.
    pub sites: usize,
    /// Crabs carrying a weapon.
    pub armed_crabs: usize,
    /// Crabs without a weapon.
    pub unarmed_crabs: usize,
    /// Wood across the team's castles.
    pub wood: i32,
    /// Stone across the team's castles.
    pub stone: i32,
    /// Commands the world accepted.
    pub commands_executed: u64,
    /// Commands the world refused.
    pub commands_failed: u64,
    /// Commands still queued.
    pub queue_depth: usize,
    /// Build-order entries completed.
    pub goals_completed: usize,
    /// Build-order length.
    pub goals_total: usize,
}

/// Summary of one headless match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    /// Scenario name.
    pub scenario: String,
    /// Ticks simulated.
    pub ticks: u64,
    /// Simulated seconds.
    pub seconds: f64,
    /// Per-team results in scenario order.
    pub teams: Vec<TeamReport>,
    /// Final simulation state hash.
    pub state_hash: u64,
}

impl MatchReport {
    /// Pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Report for `team`, if it took part.
    #[must_use]
    pub fn team(&self, team: u8) -> Option<&TeamReport> {
        self.teams.iter().find(|report| report.team == team)
    }
}

/// Build the world from `scenario` with an AI player on every AI team.
///
/// # Errors
///
/// Fails if `config` does not validate or does not fit the scenario's rules.
pub fn prepare(scenario: &Scenario, config: &AiConfig) -> Result<Simulation> {
    let mut sim = Simulation::new(scenario.build_world());
    for team in scenario.ai_teams() {
        sim.add_player(team, config)?;
    }
    Ok(sim)
}

/// Build the world from `scenario`, seat an AI player on every AI team and
/// run `ticks` ticks.
///
/// # Errors
///
/// Fails if `config` does not validate.
pub fn run_match(scenario: &Scenario, config: &AiConfig, ticks: u64) -> Result<MatchReport> {
    let mut sim = prepare(scenario, config)?;

    tracing::info!(scenario = %scenario.name, ticks, "Match starting");
    sim.run(ticks);

    let teams: Vec<TeamReport> = scenario
        .teams
        .iter()
        .map(|setup| TeamReport::capture(&sim, Team(setup.team), setup.ai))
        .collect();
    let report = MatchReport {
        scenario: scenario.name.clone(),
        ticks: sim.current_tick(),
        seconds: sim.world().elapsed().to_num::<f64>(),
        teams,
        state_hash: sim.state_hash(),
    };
    tracing::info!(ticks = report.ticks, hash = report.state_hash, "Match finished");
    Ok(report)
}

impl TeamReport {
    /// Snapshot `team` as it stands in `sim`.
    #[must_use]
    pub fn capture(sim: &Simulation, team: Team, ai: bool) -> Self {
        let world = sim.world();
        let mut buildings = BTreeMap::new();
        let mut sites = 0;
        let mut armed_crabs = 0;
        let mut unarmed_crabs = 0;
        for entity in world.scan().filter(|e| e.is_owned_by(team)) {
            if let Some(building) = entity.as_building() {
                *buildings.entry(building.kind).or_insert(0) += 1;
            } else if entity.as_ghost().is_some() {
                sites += 1;
            } else if let Some(crab) = entity.as_crab() {
                if crab.is_armed() {
                    armed_crabs += 1;
                } else {
                    unarmed_crabs += 1;
                }
            }
        }
        let (wood, stone) = world.stock(team);

        let mut report = Self {
            team: team.0,
            ai,
            buildings,
            sites,
            armed_crabs,
            unarmed_crabs,
            wood,
            stone,
            commands_executed: 0,
            commands_failed: 0,
            queue_depth: 0,
            goals_completed: 0,
            goals_total: 0,
        };
        if let Some(player) = sim.player(team) {
            let stats = player.stats();
            let strategy = player.strategy().strategy();
            report.commands_executed = stats.executed;
            report.commands_failed = stats.failed;
            report.queue_depth = player.queue_len();
            report.goals_completed = strategy.completed().len();
            report.goals_total = strategy.total();
        }
        report
    }
}
