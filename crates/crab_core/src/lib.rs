//! # Crab Core
//!
//! Simulation core and AI decision pipeline for Crab Castles.
//!
//! The crate holds two layers:
//! - a small deterministic entity layer ([`world`]) with crabs, buildings,
//!   construction sites and resource nodes
//! - the per-team AI that observes that world and drives it through a
//!   single command queue
//!
//! All math is fixed-point and every iteration follows entity spawn order,
//! so a match replays identically from the same scenario.
//!
//! ## Crate Structure
//!
//! - [`knowledge`] - per-tick categorized view of the world
//! - [`income`] - wood/stone worker allocation
//! - [`production`] - building placement, weapon and siege requests
//! - [`tactics`] - squads and attacks
//! - [`strategy`] - build order, command issuance, threat response
//! - [`command`] / [`executor`] - the queue and its one-per-tick drain
//! - [`ai`] / [`simulation`] - tick orchestration

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod ai;
pub mod command;
pub mod components;
pub mod config;
pub mod error;
pub mod events;
pub mod executor;
pub mod income;
pub mod knowledge;
pub mod math;
pub mod orders;
pub mod production;
pub mod simulation;
pub mod strategy;
pub mod tactics;
pub mod world;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::ai::AiPlayer;
    pub use crate::command::{Command, CommandQueue};
    pub use crate::components::*;
    pub use crate::config::{AiConfig, ConfigError, GameStage, Ratio, WorldRules, ZoneConfig};
    pub use crate::error::{CrabError, OrderError, Result};
    pub use crate::events::{AiEvent, EventBus};
    pub use crate::executor::{CommandExecutor, ExecutorStats};
    pub use crate::income::IncomeManager;
    pub use crate::knowledge::{TrackedSet, WorldKnowledge};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::orders::CrabOrders;
    pub use crate::production::ProductionManager;
    pub use crate::simulation::{Simulation, TICK_RATE};
    pub use crate::strategy::{BuildingGoal, Strategy, StrategyManager};
    pub use crate::tactics::{Squad, TacticsManager};
    pub use crate::world::World;
}
