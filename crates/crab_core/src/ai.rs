//! One computer-controlled team.

use crate::command::Command;
use crate::components::Team;
use crate::config::{AiConfig, GameStage};
use crate::error::OrderError;
use crate::events::AiEvent;
use crate::executor::{CommandExecutor, ExecutorStats};
use crate::income::IncomeManager;
use crate::knowledge::WorldKnowledge;
use crate::math::Fixed;
use crate::production::ProductionManager;
use crate::strategy::StrategyManager;
use crate::tactics::TacticsManager;
use crate::world::World;

/// The full decision pipeline for one team.
///
/// Each tick runs, in order: event delivery, knowledge refresh, income,
/// production, tactics, threat response, and finally one queued command.
#[derive(Debug, Clone)]
pub struct AiPlayer {
    team: Team,
    knowledge: WorldKnowledge,
    strategy: StrategyManager,
    income: IncomeManager,
    production: ProductionManager,
    tactics: TacticsManager,
    executor: CommandExecutor,
}

impl AiPlayer {
    /// Build a player for `team`.
    #[must_use]
    pub fn new(team: Team, config: &AiConfig) -> Self {
        Self {
            team,
            knowledge: WorldKnowledge::new(team, config.zones),
            strategy: StrategyManager::new(team, config),
            income: IncomeManager::new(),
            production: ProductionManager::new(team, config),
            tactics: TacticsManager::new(config.squad_size),
            executor: CommandExecutor::new(),
        }
    }

    /// Run one decision tick against `world`.
    ///
    /// Returns the command executed this tick, if any.
    pub fn tick(&mut self, world: &mut World, dt: Fixed) -> Option<(Command, Result<(), OrderError>)> {
        let events: Vec<AiEvent> = world.events().events_for(self.team).copied().collect();
        for event in &events {
            self.income.on_event(event);
        }

        self.knowledge.refresh(world);
        self.income.tick(&mut self.knowledge, &mut self.strategy);
        self.production
            .tick(dt, &mut self.knowledge, &mut self.strategy, &mut self.income);
        self.tactics.tick(&self.knowledge);
        self.strategy.respond_to_threats(&self.knowledge, &self.tactics);

        self.executor.execute_next(self.strategy.queue_mut(), world)
    }

    /// Team this player controls.
    #[must_use]
    pub const fn team(&self) -> Team {
        self.team
    }

    /// Knowledge as of the last tick.
    #[must_use]
    pub fn knowledge(&self) -> &WorldKnowledge {
        &self.knowledge
    }

    /// Strategy and command queue.
    #[must_use]
    pub fn strategy(&self) -> &StrategyManager {
        &self.strategy
    }

    /// Worker allocation.
    #[must_use]
    pub fn income(&self) -> &IncomeManager {
        &self.income
    }

    /// Construction and crafting.
    #[must_use]
    pub fn production(&self) -> &ProductionManager {
        &self.production
    }

    /// Squads.
    #[must_use]
    pub fn tactics(&self) -> &TacticsManager {
        &self.tactics
    }

    /// Commands waiting to run.
    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.strategy.queue().len()
    }

    /// Executed/failed command totals.
    #[must_use]
    pub const fn stats(&self) -> ExecutorStats {
        self.executor.stats()
    }

    /// Configured game stage.
    #[must_use]
    pub const fn stage(&self) -> GameStage {
        self.strategy.stage()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Building, Crab, ResourceKind};
    use crate::math::Vec2Fixed;

    #[test]
    fn test_tick_executes_at_most_one_command() {
        let mut world = World::default();
        world.spawn_building(Team(0), Vec2Fixed::ZERO, Building::castle(0, 0));
        world.spawn_resource(Vec2Fixed::from_units(5, 0), ResourceKind::Wood, 100);
        world.spawn_resource(Vec2Fixed::from_units(-5, 0), ResourceKind::Stone, 100);
        for _ in 0..3 {
            world.spawn_crab(Team(0), Vec2Fixed::ZERO, Crab::worker());
        }

        let mut player = AiPlayer::new(Team(0), &AiConfig::default());
        let dt = Fixed::from_num(1) / Fixed::from_num(20);
        let executed = player.tick(&mut world, dt);
        assert!(matches!(executed, Some((Command::Collect { .. }, Ok(())))));
        assert_eq!(player.queue_len(), 2);
        assert_eq!(player.stats().executed, 1);

        player.tick(&mut world, dt);
        player.tick(&mut world, dt);
        assert_eq!(player.queue_len(), 0);
        assert_eq!(player.knowledge().team(), Team(0));
    }
}
