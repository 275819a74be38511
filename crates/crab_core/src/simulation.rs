//! Fixed-rate match loop: AI players decide, then the world steps.
//!
//! Everything runs on one thread in a fixed order, so two simulations
//! built from the same scenario produce the same [`Simulation::state_hash`]
//! after the same number of ticks.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::ai::AiPlayer;
use crate::command::Command;
use crate::components::Team;
use crate::config::AiConfig;
use crate::error::{CrabError, Result};
use crate::math::Fixed;
use crate::world::World;

/// Ticks per simulated second.
pub const TICK_RATE: u32 = 20;

/// Seconds per tick.
#[must_use]
pub fn tick_delta() -> Fixed {
    Fixed::from_num(1) / Fixed::from_num(TICK_RATE)
}

/// A world plus the AI players acting on it.
#[derive(Debug, Clone)]
pub struct Simulation {
    world: World,
    players: Vec<AiPlayer>,
    tick: u64,
}

impl Simulation {
    /// Wrap an already-populated world.
    #[must_use]
    pub fn new(world: World) -> Self {
        Self {
            world,
            players: Vec::new(),
            tick: 0,
        }
    }

    /// Hand `team` to an AI player. Players tick in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`CrabError::InvalidConfig`] if `config` fails validation,
    /// asks for more weapons than an armoury holds, or the team already has
    /// a player.
    pub fn add_player(&mut self, team: Team, config: &AiConfig) -> Result<()> {
        config
            .validate()
            .map_err(|error| CrabError::InvalidConfig(error.to_string()))?;
        let armoury_capacity = self.world.rules().armoury_capacity;
        if config.weapon_capacity > armoury_capacity {
            return Err(CrabError::InvalidConfig(format!(
                "weapon_capacity {} exceeds armoury capacity {armoury_capacity}",
                config.weapon_capacity
            )));
        }
        if self.player(team).is_some() {
            return Err(CrabError::InvalidConfig(format!(
                "team {} already has a player",
                team.0
            )));
        }
        tracing::info!(team = team.0, "AI player joined");
        self.players.push(AiPlayer::new(team, config));
        Ok(())
    }

    /// Run a scripted command against the world immediately, bypassing
    /// every player's queue.
    ///
    /// # Errors
    ///
    /// Returns [`CrabError::Order`] if the entity layer refuses it.
    pub fn apply(&mut self, command: &Command) -> Result<()> {
        command.execute(&mut self.world)?;
        Ok(())
    }

    /// Advance one tick.
    pub fn tick(&mut self) {
        let dt = tick_delta();
        for player in &mut self.players {
            player.tick(&mut self.world, dt);
        }
        self.world.step(dt);
        self.tick += 1;
    }

    /// Advance `ticks` ticks.
    pub fn run(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.tick();
        }
    }

    /// Ticks completed.
    #[must_use]
    pub const fn current_tick(&self) -> u64 {
        self.tick
    }

    /// The world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable world, for scripted interventions between ticks.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// All players, in tick order.
    #[must_use]
    pub fn players(&self) -> &[AiPlayer] {
        &self.players
    }

    /// The player controlling `team`.
    #[must_use]
    pub fn player(&self, team: Team) -> Option<&AiPlayer> {
        self.players.iter().find(|player| player.team() == team)
    }

    /// Hash of every entity's id, owner, position and health.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.tick.hash(&mut hasher);
        for entity in self.world.scan() {
            entity.id.hash(&mut hasher);
            entity.team.hash(&mut hasher);
            entity.position.x.to_bits().hash(&mut hasher);
            entity.position.y.to_bits().hash(&mut hasher);
            entity.health.current.hash(&mut hasher);
        }
        hasher.finish()
    }
}
