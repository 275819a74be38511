//! Test fixtures and helpers.
//!
//! Pre-built worlds for consistent testing.

use crab_core::components::{Building, BuildingKind, Crab, EntityId, ResourceKind, Team, WeaponKind};
use crab_core::config::WorldRules;
use crab_core::math::Vec2Fixed;
use crab_core::world::World;
use fixed::types::I32F32;

/// Team used as "us" throughout the fixtures.
pub const RED: Team = Team(0);

/// Team used as the opponent.
pub const BLUE: Team = Team(1);

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Position from whole units.
#[must_use]
pub fn pos(x: i32, y: i32) -> Vec2Fixed {
    Vec2Fixed::from_units(x, y)
}

/// Fluent world setup.
///
/// ```ignore
/// let (world, ids) = WorldBuilder::new()
///     .castle(RED, pos(0, 0), 100, 100)
///     .workers(RED, pos(0, 0), 4)
///     .node(ResourceKind::Wood, pos(10, 0), 500)
///     .build();
/// ```
#[derive(Debug, Default)]
pub struct WorldBuilder {
    world: World,
    spawned: Vec<EntityId>,
}

impl WorldBuilder {
    /// Start from an empty world with default rules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an empty world with custom rules.
    #[must_use]
    pub fn with_rules(rules: WorldRules) -> Self {
        Self {
            world: World::new(rules),
            spawned: Vec::new(),
        }
    }

    /// Add a stocked castle.
    #[must_use]
    pub fn castle(mut self, team: Team, at: Vec2Fixed, wood: i32, stone: i32) -> Self {
        let id = self.world.spawn_building(team, at, Building::castle(wood, stone));
        self.spawned.push(id);
        self
    }

    /// Add a finished building of any kind.
    #[must_use]
    pub fn building(mut self, team: Team, kind: BuildingKind, at: Vec2Fixed) -> Self {
        let id = self.world.spawn_building(team, at, Building::new(kind));
        self.spawned.push(id);
        self
    }

    /// Add `count` unarmed workers.
    #[must_use]
    pub fn workers(mut self, team: Team, at: Vec2Fixed, count: usize) -> Self {
        for _ in 0..count {
            let id = self.world.spawn_crab(team, at, Crab::worker());
            self.spawned.push(id);
        }
        self
    }

    /// Add `count` armed crabs.
    #[must_use]
    pub fn soldiers(mut self, team: Team, at: Vec2Fixed, weapon: WeaponKind, count: usize) -> Self {
        for _ in 0..count {
            let id = self.world.spawn_crab(team, at, Crab::soldier(weapon));
            self.spawned.push(id);
        }
        self
    }

    /// Add a resource node.
    #[must_use]
    pub fn node(mut self, kind: ResourceKind, at: Vec2Fixed, amount: i32) -> Self {
        let id = self.world.spawn_resource(at, kind, amount);
        self.spawned.push(id);
        self
    }

    /// Finish, returning the world and every spawned id in spawn order.
    #[must_use]
    pub fn build(self) -> (World, Vec<EntityId>) {
        (self.world, self.spawned)
    }
}

/// A base at the origin with `workers` workers and one node of each
/// resource ten units away.
#[must_use]
pub fn base_with_workers(workers: usize, wood: i32, stone: i32) -> World {
    WorldBuilder::new()
        .castle(RED, pos(0, 0), wood, stone)
        .node(ResourceKind::Wood, pos(10, 0), 1_000)
        .node(ResourceKind::Stone, pos(-10, 0), 1_000)
        .workers(RED, pos(0, 0), workers)
        .build()
        .0
}

/// Two bases thirty units apart, each with workers and nodes.
#[must_use]
pub fn mirrored_skirmish(workers: usize) -> World {
    WorldBuilder::new()
        .castle(RED, pos(-30, 0), 60, 40)
        .node(ResourceKind::Wood, pos(-30, 10), 2_000)
        .node(ResourceKind::Stone, pos(-30, -10), 2_000)
        .workers(RED, pos(-30, 0), workers)
        .castle(BLUE, pos(30, 0), 60, 40)
        .node(ResourceKind::Wood, pos(30, 10), 2_000)
        .node(ResourceKind::Stone, pos(30, -10), 2_000)
        .workers(BLUE, pos(30, 0), workers)
        .build()
        .0
}
