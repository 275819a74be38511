//! Entity data for the crab world.
//!
//! Components are plain data. The closed enums here replace string tags:
//! every dispatch over entity kind is an exhaustive `match`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::math::{fixed_serde, Fixed, Vec2Fixed};

/// Unique identifier for entities.
///
/// Allocated monotonically, so ascending id order is spawn order.
pub type EntityId = u64;

/// A crab faction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Team(pub u8);

/// Gatherable resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Gathered from trees.
    Wood,
    /// Gathered from rocks.
    Stone,
}

/// Building types a team can own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BuildingKind {
    /// Main base. Stores wood and stone.
    Castle,
    /// Crafts and stocks hand weapons.
    Armoury,
    /// Crafts siege weapons.
    Workshop,
    /// Defensive tower crabs can enter.
    Tower,
    /// Plain wall segment.
    Wall,
    /// Housing.
    House,
}

impl BuildingKind {
    /// Whether crabs can go inside this building.
    #[must_use]
    pub const fn accepts_occupants(self) -> bool {
        matches!(self, Self::Castle | Self::Tower | Self::House)
    }
}

/// Hand weapons crafted by an armoury.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WeaponKind {
    /// Spear.
    Spear,
    /// Hammer.
    Hammer,
    /// Bow.
    Bow,
    /// Shield.
    Shield,
}

impl WeaponKind {
    /// Default production cycle order.
    pub const CYCLE: [Self; 4] = [Self::Spear, Self::Hammer, Self::Bow, Self::Shield];
}

/// Something a building can craft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CraftItem {
    /// A hand weapon (armoury).
    Weapon(WeaponKind),
    /// A siege weapon (workshop).
    SiegeWeapon,
}

/// Wood and stone price of a building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cost {
    /// Wood required.
    pub wood: i32,
    /// Stone required.
    pub stone: i32,
}

impl Cost {
    /// Create a new cost.
    #[must_use]
    pub const fn new(wood: i32, stone: i32) -> Self {
        Self { wood, stone }
    }

    /// Check whether the given stock covers this cost.
    #[must_use]
    pub const fn is_covered_by(&self, wood: i32, stone: i32) -> bool {
        wood >= self.wood && stone >= self.stone
    }
}

/// Health for damageable entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    /// Current hit points.
    pub current: i32,
    /// Maximum hit points.
    pub max: i32,
}

impl Health {
    /// Full health.
    #[must_use]
    pub const fn new(max: i32) -> Self {
        Self { current: max, max }
    }

    /// Apply damage, clamping at zero.
    pub fn damage(&mut self, amount: i32) {
        self.current = (self.current - amount).max(0);
    }

    /// Whether the entity has no hit points left.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.current <= 0
    }
}

/// What a crab is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CrabTask {
    /// Waiting for orders.
    #[default]
    Idle,
    /// Gathering from a resource node.
    Collecting {
        /// Node being gathered.
        node: EntityId,
    },
    /// Working on a construction site.
    Building {
        /// Ghost being built.
        site: EntityId,
    },
    /// Chasing and hitting a target.
    Attacking {
        /// Entity under attack.
        target: EntityId,
    },
    /// Walking to an armoury to pick up a weapon.
    FetchingWeapon {
        /// Armoury to take from.
        armoury: EntityId,
        /// Weapon to take.
        weapon: WeaponKind,
    },
    /// Walking to a building to go inside.
    Entering {
        /// Building to enter.
        building: EntityId,
    },
    /// Sheltering inside a building.
    Inside {
        /// Building entered.
        building: EntityId,
    },
}

impl CrabTask {
    /// The entity this task depends on, if any.
    #[must_use]
    pub const fn target(&self) -> Option<EntityId> {
        match *self {
            Self::Idle => None,
            Self::Collecting { node } => Some(node),
            Self::Building { site } => Some(site),
            Self::Attacking { target } => Some(target),
            Self::FetchingWeapon { armoury, .. } => Some(armoury),
            Self::Entering { building } | Self::Inside { building } => Some(building),
        }
    }
}

/// A crab unit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Crab {
    /// Weapon carried. Unarmed crabs are workers.
    pub weapon: Option<WeaponKind>,
    /// Current task.
    pub task: CrabTask,
    /// Work accumulator (gathered units, damage) carried between steps.
    #[serde(with = "fixed_serde")]
    pub work: Fixed,
}

impl Crab {
    /// An idle unarmed crab.
    #[must_use]
    pub fn worker() -> Self {
        Self::default()
    }

    /// An idle crab carrying `weapon`.
    #[must_use]
    pub fn soldier(weapon: WeaponKind) -> Self {
        Self {
            weapon: Some(weapon),
            ..Self::default()
        }
    }

    /// Whether the crab carries a weapon.
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.weapon.is_some()
    }

    /// Whether the crab is doing anything.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.task != CrabTask::Idle
    }

    /// Drop the current task.
    pub fn clear_task(&mut self) {
        self.task = CrabTask::Idle;
        self.work = Fixed::ZERO;
    }
}

/// In-progress crafting at a building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crafting {
    /// Item being crafted.
    pub item: CraftItem,
    /// Seconds of work done.
    #[serde(with = "fixed_serde")]
    pub progress: Fixed,
}

/// A finished building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    /// Building type.
    pub kind: BuildingKind,
    /// Wood stored (castles only).
    pub wood: i32,
    /// Stone stored (castles only).
    pub stone: i32,
    /// Weapons in stock (armouries only).
    pub weapons: BTreeMap<WeaponKind, u32>,
    /// Finished siege weapons (workshops only).
    pub siege_weapons: u32,
    /// Current crafting job.
    pub crafting: Option<Crafting>,
    /// Crabs sheltering inside.
    pub occupants: Vec<EntityId>,
}

impl Building {
    /// A new, empty building.
    #[must_use]
    pub fn new(kind: BuildingKind) -> Self {
        Self {
            kind,
            wood: 0,
            stone: 0,
            weapons: BTreeMap::new(),
            siege_weapons: 0,
            crafting: None,
            occupants: Vec::new(),
        }
    }

    /// A castle holding the given stock.
    #[must_use]
    pub fn castle(wood: i32, stone: i32) -> Self {
        Self {
            wood,
            stone,
            ..Self::new(BuildingKind::Castle)
        }
    }

    /// Number of `weapon` in stock.
    #[must_use]
    pub fn weapon_stock(&self, weapon: WeaponKind) -> u32 {
        self.weapons.get(&weapon).copied().unwrap_or(0)
    }

    /// Whether a crafting job is running.
    #[must_use]
    pub const fn is_crafting(&self) -> bool {
        self.crafting.is_some()
    }
}

/// A construction site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ghost {
    /// Building that will stand here once finished.
    pub kind: BuildingKind,
    /// Seconds of construction done.
    #[serde(with = "fixed_serde")]
    pub progress: Fixed,
}

impl Ghost {
    /// A fresh site.
    #[must_use]
    pub const fn new(kind: BuildingKind) -> Self {
        Self {
            kind,
            progress: Fixed::ZERO,
        }
    }
}

/// A gatherable node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceNode {
    /// Resource provided.
    pub kind: ResourceKind,
    /// Units left before the node disappears.
    pub remaining: i32,
}

impl ResourceNode {
    /// Create a new node.
    #[must_use]
    pub const fn new(kind: ResourceKind, remaining: i32) -> Self {
        Self { kind, remaining }
    }

    /// Take up to `requested` units. Returns what was actually taken.
    pub fn extract(&mut self, requested: i32) -> i32 {
        let taken = requested.min(self.remaining).max(0);
        self.remaining -= taken;
        taken
    }

    /// Check if this node is used up.
    #[must_use]
    pub const fn is_depleted(&self) -> bool {
        self.remaining <= 0
    }
}

/// What an entity is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    /// A crab.
    Crab(Crab),
    /// A finished building.
    Building(Building),
    /// A construction site.
    Ghost(Ghost),
    /// A resource node.
    Resource(ResourceNode),
}

/// An entity in the world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Unique identifier.
    pub id: EntityId,
    /// Owning team. `None` for neutral entities such as resource nodes.
    pub team: Option<Team>,
    /// World position.
    pub position: Vec2Fixed,
    /// Hit points.
    pub health: Health,
    /// Kind-specific data.
    pub kind: EntityKind,
    /// Last entity that damaged this one.
    pub last_attacker: Option<EntityId>,
}

impl Entity {
    /// Borrow the crab data, if this is a crab.
    #[must_use]
    pub const fn as_crab(&self) -> Option<&Crab> {
        match &self.kind {
            EntityKind::Crab(crab) => Some(crab),
            _ => None,
        }
    }

    /// Mutably borrow the crab data, if this is a crab.
    pub fn as_crab_mut(&mut self) -> Option<&mut Crab> {
        match &mut self.kind {
            EntityKind::Crab(crab) => Some(crab),
            _ => None,
        }
    }

    /// Borrow the building data, if this is a finished building.
    #[must_use]
    pub const fn as_building(&self) -> Option<&Building> {
        match &self.kind {
            EntityKind::Building(building) => Some(building),
            _ => None,
        }
    }

    /// Mutably borrow the building data, if this is a finished building.
    pub fn as_building_mut(&mut self) -> Option<&mut Building> {
        match &mut self.kind {
            EntityKind::Building(building) => Some(building),
            _ => None,
        }
    }

    /// Borrow the ghost data, if this is a construction site.
    #[must_use]
    pub const fn as_ghost(&self) -> Option<&Ghost> {
        match &self.kind {
            EntityKind::Ghost(ghost) => Some(ghost),
            _ => None,
        }
    }

    /// Borrow the node data, if this is a resource node.
    #[must_use]
    pub const fn as_resource(&self) -> Option<&ResourceNode> {
        match &self.kind {
            EntityKind::Resource(node) => Some(node),
            _ => None,
        }
    }

    /// Whether this entity belongs to `team`.
    #[must_use]
    pub fn is_owned_by(&self, team: Team) -> bool {
        self.team == Some(team)
    }

    /// Whether this entity belongs to some team other than `team`.
    #[must_use]
    pub fn is_enemy_of(&self, team: Team) -> bool {
        matches!(self.team, Some(other) if other != team)
    }
}

/// Notifications an entity reacts to.
///
/// Statically dispatched replacement for calling handlers by method name.
pub trait Reactions {
    /// The entity this one was attacking has died.
    fn on_enemy_died(&mut self, enemy: EntityId);

    /// Some entity has been removed from the world.
    fn on_destroyed(&mut self, destroyed: EntityId);

    /// This entity was hit by `attacker`.
    fn set_attacker(&mut self, attacker: EntityId);
}

impl Reactions for Entity {
    fn on_enemy_died(&mut self, enemy: EntityId) {
        if let EntityKind::Crab(crab) = &mut self.kind {
            if crab.task == (CrabTask::Attacking { target: enemy }) {
                crab.clear_task();
            }
        }
    }

    fn on_destroyed(&mut self, destroyed: EntityId) {
        if self.last_attacker == Some(destroyed) {
            self.last_attacker = None;
        }
        match &mut self.kind {
            EntityKind::Crab(crab) => {
                if crab.task.target() == Some(destroyed) {
                    crab.clear_task();
                }
            }
            EntityKind::Building(building) => {
                building.occupants.retain(|&occupant| occupant != destroyed);
            }
            EntityKind::Ghost(_) | EntityKind::Resource(_) => {}
        }
    }

    fn set_attacker(&mut self, attacker: EntityId) {
        self.last_attacker = Some(attacker);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crab_entity(task: CrabTask) -> Entity {
        Entity {
            id: 1,
            team: Some(Team(0)),
            position: Vec2Fixed::ZERO,
            health: Health::new(10),
            kind: EntityKind::Crab(Crab {
                task,
                ..Crab::worker()
            }),
            last_attacker: Some(9),
        }
    }

    #[test]
    fn test_on_destroyed_clears_dependent_task() {
        let mut entity = crab_entity(CrabTask::Collecting { node: 7 });
        entity.on_destroyed(7);
        assert_eq!(entity.as_crab().map(|c| c.task), Some(CrabTask::Idle));
    }

    #[test]
    fn test_on_destroyed_ignores_unrelated() {
        let mut entity = crab_entity(CrabTask::Building { site: 3 });
        entity.on_destroyed(7);
        assert_eq!(
            entity.as_crab().map(|c| c.task),
            Some(CrabTask::Building { site: 3 })
        );
    }

    #[test]
    fn test_on_destroyed_forgets_attacker() {
        let mut entity = crab_entity(CrabTask::Idle);
        entity.on_destroyed(9);
        assert_eq!(entity.last_attacker, None);
    }

    #[test]
    fn test_on_enemy_died_only_clears_matching_attack() {
        let mut entity = crab_entity(CrabTask::Attacking { target: 4 });
        entity.on_enemy_died(5);
        assert!(entity.as_crab().is_some_and(Crab::is_busy));
        entity.on_enemy_died(4);
        assert!(!entity.as_crab().is_some_and(Crab::is_busy));
    }

    #[test]
    fn test_health_clamps() {
        let mut health = Health::new(5);
        health.damage(8);
        assert_eq!(health.current, 0);
        assert!(health.is_dead());
    }

    #[test]
    fn test_resource_extract() {
        let mut node = ResourceNode::new(ResourceKind::Wood, 3);
        assert_eq!(node.extract(2), 2);
        assert_eq!(node.extract(2), 1);
        assert!(node.is_depleted());
    }

    #[test]
    fn test_cost_coverage() {
        let cost = Cost::new(10, 5);
        assert!(cost.is_covered_by(10, 5));
        assert!(!cost.is_covered_by(9, 50));
    }
}
