//! Scenario loading and world construction.
//!
//! A scenario lists each team's starting base, crabs and buildings plus
//! the neutral resource nodes on the map.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crab_core::components::{Building, BuildingKind, Crab, ResourceKind, Team, WeaponKind};
use crab_core::config::WorldRules;
use crab_core::math::Vec2Fixed;
use crab_core::world::World;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// Parsed but unusable.
    #[error("Invalid scenario: {0}")]
    Invalid(String),
}

/// A building placed at start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingPlacement {
    /// Building type.
    pub kind: BuildingKind,
    /// Position in whole units.
    pub position: (i32, i32),
}

/// A neutral resource node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePlacement {
    /// Resource type.
    pub kind: ResourceKind,
    /// Position in whole units.
    pub position: (i32, i32),
    /// Units available.
    pub amount: i32,
}

/// One team's starting state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamSetup {
    /// Team number.
    pub team: u8,
    /// Whether an AI player controls this team.
    #[serde(default = "default_ai")]
    pub ai: bool,
    /// Castle position in whole units.
    pub castle: (i32, i32),
    /// Wood in the castle at start.
    pub wood: i32,
    /// Stone in the castle at start.
    pub stone: i32,
    /// Unarmed workers spawned at the castle.
    pub workers: u32,
    /// One armed crab per entry, spawned at the castle.
    #[serde(default)]
    pub soldiers: Vec<WeaponKind>,
    /// Extra finished buildings.
    #[serde(default)]
    pub buildings: Vec<BuildingPlacement>,
}

const fn default_ai() -> bool {
    true
}

/// A complete scenario configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Ticks to run when no override is given.
    pub ticks: u64,
    /// Teams in tick order.
    pub teams: Vec<TeamSetup>,
    /// Neutral resource nodes.
    pub nodes: Vec<NodePlacement>,
    /// Entity-layer tuning.
    #[serde(default)]
    pub rules: WorldRules,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::skirmish()
    }
}

fn at((x, y): (i32, i32)) -> Vec2Fixed {
    Vec2Fixed::from_units(x, y)
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Check team numbers are unique and there is something to play.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.teams.is_empty() {
            return Err(ScenarioError::Invalid("no teams".into()));
        }
        let mut seen = BTreeSet::new();
        for setup in &self.teams {
            if !seen.insert(setup.team) {
                return Err(ScenarioError::Invalid(format!(
                    "team {} listed twice",
                    setup.team
                )));
            }
        }
        Ok(())
    }

    /// Standard 1v1: two bases eighty units apart, each with its own
    /// wood and stone nearby.
    #[must_use]
    pub fn skirmish() -> Self {
        let side = |team: u8, x: i32| TeamSetup {
            team,
            ai: true,
            castle: (x, 0),
            wood: 60,
            stone: 40,
            workers: 6,
            soldiers: vec![WeaponKind::Spear, WeaponKind::Bow],
            buildings: Vec::new(),
        };
        let nodes = |x: i32| {
            [
                NodePlacement {
                    kind: ResourceKind::Wood,
                    position: (x, 12),
                    amount: 2_000,
                },
                NodePlacement {
                    kind: ResourceKind::Stone,
                    position: (x, -12),
                    amount: 2_000,
                },
            ]
        };
        Self {
            name: "Skirmish".to_string(),
            description: "Two mirrored bases with local resources".to_string(),
            ticks: 6_000,
            teams: vec![side(0, -40), side(1, 40)],
            nodes: nodes(-40).into_iter().chain(nodes(40)).collect(),
            rules: WorldRules::default(),
        }
    }

    /// Teams an AI player should control, in tick order.
    pub fn ai_teams(&self) -> impl Iterator<Item = Team> + '_ {
        self.teams.iter().filter(|s| s.ai).map(|s| Team(s.team))
    }

    /// Spawn everything into a fresh world.
    ///
    /// Per team: castle, extra buildings, workers, soldiers. Nodes last.
    #[must_use]
    pub fn build_world(&self) -> World {
        let mut world = World::new(self.rules.clone());
        for setup in &self.teams {
            let team = Team(setup.team);
            let base = at(setup.castle);
            world.spawn_building(team, base, Building::castle(setup.wood, setup.stone));
            for placement in &setup.buildings {
                world.spawn_building(team, at(placement.position), Building::new(placement.kind));
            }
            for _ in 0..setup.workers {
                world.spawn_crab(team, base, Crab::worker());
            }
            for &weapon in &setup.soldiers {
                world.spawn_crab(team, base, Crab::soldier(weapon));
            }
        }
        for node in &self.nodes {
            world.spawn_resource(at(node.position), node.kind, node.amount);
        }
        tracing::debug!(scenario = %self.name, entities = world.len(), "World built");
        world
    }
}
