//! Building placement and armoury/workshop production.

use crate::command::Command;
use crate::components::{BuildingKind, Entity, EntityId, Team, WeaponKind};
use crate::config::AiConfig;
use crate::income::IncomeManager;
use crate::knowledge::WorldKnowledge;
use crate::math::{squared, Fixed, Vec2Fixed};
use crate::strategy::StrategyManager;

/// Unit offsets of the eight build slots, tried in this order.
const SLOT_RING: [(i32, i32); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

/// Progress on the active building goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Construction {
    /// Nothing placed.
    Idle,
    /// A builder was sent to `slot`; `site` is known once the ghost appears.
    Underway {
        /// Building being raised.
        kind: BuildingKind,
        /// Crab doing the work.
        builder: EntityId,
        /// Where the ghost was requested.
        slot: Vec2Fixed,
        /// The ghost, once seen.
        site: Option<EntityId>,
    },
}

/// Consumes the build order and keeps the armoury and workshop busy.
#[derive(Debug, Clone)]
pub struct ProductionManager {
    team: Team,
    construction: Construction,
    slot_distance: Fixed,
    slot_clearance: Fixed,
    weapon_cycle: Vec<WeaponKind>,
    weapon_cursor: usize,
    weapon_capacity: u32,
    weapon_timer: Fixed,
    weapon_interval: Fixed,
    siege_timer: Fixed,
    siege_interval: Fixed,
    arm_workers: bool,
}

impl ProductionManager {
    /// Manager for `team` using the production settings in `config`.
    #[must_use]
    pub fn new(team: Team, config: &AiConfig) -> Self {
        Self {
            team,
            construction: Construction::Idle,
            slot_distance: Fixed::from_num(config.slot_distance),
            slot_clearance: Fixed::from_num(config.slot_clearance),
            weapon_cycle: config.weapon_cycle.clone(),
            weapon_cursor: 0,
            weapon_capacity: config.weapon_capacity,
            weapon_timer: Fixed::ZERO,
            weapon_interval: config.weapon_interval(),
            siege_timer: Fixed::ZERO,
            siege_interval: config.siege_interval(),
            arm_workers: config.arm_workers,
        }
    }

    /// Current construction state.
    #[must_use]
    pub const fn construction(&self) -> Construction {
        self.construction
    }

    /// Weapon type the cycle currently points at.
    #[must_use]
    pub fn current_weapon(&self) -> Option<WeaponKind> {
        self.weapon_cycle.get(self.weapon_cursor).copied()
    }

    /// Run one production tick.
    pub fn tick(
        &mut self,
        dt: Fixed,
        knowledge: &mut WorldKnowledge,
        strategy: &mut StrategyManager,
        income: &mut IncomeManager,
    ) {
        self.track_construction(knowledge, strategy, income);
        self.start_construction(knowledge, strategy, income);
        self.request_weapons(dt, knowledge, strategy);
        self.request_siege(dt, knowledge, strategy);
        self.arm_spare_worker(knowledge, strategy, income);
    }

    fn track_construction(
        &mut self,
        knowledge: &WorldKnowledge,
        strategy: &mut StrategyManager,
        income: &mut IncomeManager,
    ) {
        let Some(goal) = strategy.strategy_mut().current_goal_mut() else {
            self.construction = Construction::Idle;
            return;
        };
        goal.observe(knowledge);
        if goal.is_finished(knowledge) {
            let done = strategy.strategy_mut().advance();
            let next = strategy.strategy().current_goal().map(|goal| goal.kind());
            tracing::info!(team = ?self.team, ?done, ?next, "Building goal complete");
            self.construction = Construction::Idle;
            return;
        }

        let Construction::Underway {
            kind,
            builder,
            slot,
            site,
        } = self.construction
        else {
            return;
        };

        let site = site.or_else(|| self.find_site(knowledge, kind, slot));
        let builder_lost = !knowledge.allies().contains(builder)
            || (!knowledge.is_busy(builder) && !strategy.queue().has_pending_for(builder));

        match site {
            Some(ghost) if !knowledge.exists(ghost) => {
                tracing::warn!(team = ?self.team, ?kind, ghost, "Construction site lost");
                self.construction = Construction::Idle;
            }
            Some(ghost) if builder_lost => {
                let Some(crab) = income.get_spare_crab() else {
                    self.construction = Construction::Underway {
                        kind,
                        builder,
                        slot,
                        site,
                    };
                    return;
                };
                tracing::debug!(team = ?self.team, ?kind, ghost, crab, "Resuming abandoned site");
                strategy.start_build_from_ghost(crab, ghost);
                self.construction = Construction::Underway {
                    kind,
                    builder: crab,
                    slot,
                    site,
                };
            }
            None if builder_lost => {
                tracing::debug!(team = ?self.team, ?kind, "Build order fizzled");
                self.construction = Construction::Idle;
            }
            _ => {
                self.construction = Construction::Underway {
                    kind,
                    builder,
                    slot,
                    site,
                };
            }
        }
    }

    fn find_site(&self, knowledge: &WorldKnowledge, kind: BuildingKind, slot: Vec2Fixed) -> Option<EntityId> {
        let reach = squared(self.slot_clearance);
        knowledge.ghosts_of(kind).find(|&ghost| {
            knowledge
                .position(ghost)
                .is_some_and(|at| at.distance_squared(slot) <= reach)
        })
    }

    fn start_construction(
        &mut self,
        knowledge: &WorldKnowledge,
        strategy: &mut StrategyManager,
        income: &mut IncomeManager,
    ) {
        if self.construction != Construction::Idle {
            return;
        }
        let Some(kind) = strategy.strategy().current_goal().map(|goal| goal.kind()) else {
            return;
        };
        let cost = strategy.strategy().cost_of(kind);
        if !cost.is_covered_by(knowledge.total_wood(), knowledge.total_stone()) {
            return;
        }
        let Some(base) = knowledge.base().and_then(|id| knowledge.position(id)) else {
            return;
        };
        let Some(builder) = income.get_spare_crab() else {
            return;
        };
        let slot = self.next_slot(knowledge, base);
        tracing::debug!(team = ?self.team, ?kind, builder, "Placing building");
        strategy.start_build(builder, kind, slot, cost);
        self.construction = Construction::Underway {
            kind,
            builder,
            slot,
            site: None,
        };
    }

    /// First free slot around `base`, or the origin when all are taken.
    #[must_use]
    pub fn next_slot(&self, knowledge: &WorldKnowledge, base: Vec2Fixed) -> Vec2Fixed {
        let reach = squared(self.slot_clearance);
        let occupied = |slot: Vec2Fixed| {
            knowledge
                .buildings()
                .iter()
                .chain(knowledge.ghosts().iter())
                .filter_map(|id| knowledge.position(id))
                .any(|at| at.distance_squared(slot) <= reach)
        };
        SLOT_RING
            .iter()
            .map(|&(x, y)| base + Vec2Fixed::from_units(x, y).scale(self.slot_distance))
            .find(|&slot| !occupied(slot))
            .unwrap_or_else(|| {
                tracing::warn!(team = ?self.team, "All build slots occupied");
                Vec2Fixed::ZERO
            })
    }

    fn first_owned(knowledge: &WorldKnowledge, kind: BuildingKind) -> Option<(EntityId, &Entity)> {
        let id = knowledge.buildings_of(kind).next()?;
        knowledge.entity(id).map(|entity| (id, entity))
    }

    fn request_weapons(&mut self, dt: Fixed, knowledge: &WorldKnowledge, strategy: &mut StrategyManager) {
        let Some((armoury, entity)) = Self::first_owned(knowledge, BuildingKind::Armoury) else {
            self.weapon_timer = Fixed::ZERO;
            return;
        };
        self.weapon_timer += dt;
        if self.weapon_timer < self.weapon_interval {
            return;
        }
        self.weapon_timer = Fixed::ZERO;

        let Some(building) = entity.as_building() else {
            return;
        };
        if building.is_crafting() {
            return;
        }
        let len = self.weapon_cycle.len();
        let deficient = (0..len)
            .map(|step| (self.weapon_cursor + step) % len)
            .find(|&index| building.weapon_stock(self.weapon_cycle[index]) < self.weapon_capacity);
        let Some(index) = deficient else {
            return;
        };
        self.weapon_cursor = index;
        let weapon = self.weapon_cycle[index];
        tracing::debug!(team = ?self.team, armoury, ?weapon, "Requesting weapon");
        strategy.start_craft(armoury, weapon);
    }

    fn request_siege(&mut self, dt: Fixed, knowledge: &WorldKnowledge, strategy: &mut StrategyManager) {
        let Some((workshop, entity)) = Self::first_owned(knowledge, BuildingKind::Workshop) else {
            self.siege_timer = Fixed::ZERO;
            return;
        };
        self.siege_timer += dt;
        if self.siege_timer < self.siege_interval {
            return;
        }
        self.siege_timer = Fixed::ZERO;
        if entity.as_building().is_some_and(|b| b.is_crafting()) {
            return;
        }
        tracing::debug!(team = ?self.team, workshop, "Requesting siege weapon");
        strategy.start_building_siege_weapon(workshop);
    }

    fn arm_spare_worker(
        &mut self,
        knowledge: &WorldKnowledge,
        strategy: &mut StrategyManager,
        income: &mut IncomeManager,
    ) {
        if !self.arm_workers {
            return;
        }
        let Some((armoury, entity)) = Self::first_owned(knowledge, BuildingKind::Armoury) else {
            return;
        };
        let Some(building) = entity.as_building() else {
            return;
        };
        let Some(weapon) = self
            .weapon_cycle
            .iter()
            .copied()
            .find(|&weapon| building.weapon_stock(weapon) > 0)
        else {
            return;
        };
        let fetching = knowledge.crabs_targeting(armoury).next().is_some()
            || strategy
                .queue()
                .iter()
                .any(|command| matches!(command, Command::TakeWeapon { .. }));
        if fetching {
            return;
        }
        let Some(crab) = income.get_spare_crab() else {
            return;
        };
        tracing::debug!(team = ?self.team, crab, ?weapon, "Arming worker");
        strategy.start_take_weapon(crab, armoury, weapon);
    }
}
