//! Per-team world knowledge, rebuilt from a full scan every tick.
//!
//! Every category is a [`TrackedSet`]: a hash set for membership tests and
//! an insertion-ordered list for deterministic iteration, mutated only
//! together. The danger/warning zone sets and the busy map survive between
//! refreshes and are updated in place.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::components::{BuildingKind, Entity, EntityId, EntityKind, ResourceKind, Team};
use crate::config::ZoneConfig;
use crate::math::{squared, Fixed, Vec2Fixed};
use crate::world::World;

/// A set of entities with a stable iteration order.
#[derive(Debug, Clone, Default)]
pub struct TrackedSet {
    members: HashSet<EntityId>,
    order: Vec<EntityId>,
}

impl TrackedSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `id` at the end. Returns `false` if it was already present.
    pub fn insert(&mut self, id: EntityId) -> bool {
        if !self.members.insert(id) {
            return false;
        }
        self.order.push(id);
        true
    }

    /// Remove `id`. Returns `false` if it was absent.
    pub fn remove(&mut self, id: EntityId) -> bool {
        if !self.members.remove(&id) {
            return false;
        }
        self.order.retain(|&member| member != id);
        true
    }

    /// Keep only the members for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(EntityId) -> bool) {
        let members = &mut self.members;
        self.order.retain(|&id| {
            let kept = keep(id);
            if !kept {
                members.remove(&id);
            }
            kept
        });
    }

    /// Drop every member.
    pub fn clear(&mut self) {
        self.members.clear();
        self.order.clear();
    }

    /// Membership test.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.members.contains(&id)
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Members in insertion order.
    #[must_use]
    pub fn as_slice(&self) -> &[EntityId] {
        &self.order
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.order.iter().copied()
    }

    /// First member in insertion order.
    #[must_use]
    pub fn first(&self) -> Option<EntityId> {
        self.order.first().copied()
    }

    /// Whether the set and the list hold exactly the same entities once each.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.order.len() == self.members.len()
            && self.order.iter().all(|id| self.members.contains(id))
    }
}

/// How a distance check moves an enemy between the zone sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneUpdate {
    /// Closer than the danger threshold.
    EnterDanger,
    /// Between the thresholds (only with the warning band enabled).
    EnterWarning,
    /// Beyond the danger threshold.
    LeaveDanger,
    /// Beyond the warning threshold.
    LeaveBoth,
    /// Exactly on a threshold: neither set is touched.
    Unchanged,
}

/// Classify a squared distance to the nearest owned base.
///
/// All comparisons are strict. With the warning band off, everything past
/// the danger ring only leaves danger, so the warning set is never entered.
#[must_use]
pub fn classify(zones: &ZoneConfig, distance_sq: Fixed) -> ZoneUpdate {
    let danger = squared(zones.danger());
    let warning = squared(zones.warning());

    if distance_sq < danger {
        return ZoneUpdate::EnterDanger;
    }
    if !zones.classify_warning_band {
        return if distance_sq > danger {
            ZoneUpdate::LeaveDanger
        } else {
            ZoneUpdate::Unchanged
        };
    }
    if distance_sq > danger && distance_sq < warning {
        ZoneUpdate::EnterWarning
    } else if distance_sq > warning {
        ZoneUpdate::LeaveBoth
    } else {
        ZoneUpdate::Unchanged
    }
}

/// Everything one team knows about the world this tick.
#[derive(Debug, Clone)]
pub struct WorldKnowledge {
    team: Team,
    zones: ZoneConfig,

    allies: TrackedSet,
    armed_allies: TrackedSet,
    unarmed_allies: TrackedSet,
    buildings: TrackedSet,
    castles: TrackedSet,
    ghosts: TrackedSet,

    enemies: TrackedSet,
    armed_enemies: TrackedSet,
    unarmed_enemies: TrackedSet,
    enemy_buildings: TrackedSet,

    wood_nodes: TrackedSet,
    stone_nodes: TrackedSet,

    danger: TrackedSet,
    warning: TrackedSet,

    busy: HashMap<EntityId, bool>,
    total_wood: i32,
    total_stone: i32,
    snapshot: BTreeMap<EntityId, Entity>,
}

impl WorldKnowledge {
    /// Empty knowledge for `team`.
    #[must_use]
    pub fn new(team: Team, zones: ZoneConfig) -> Self {
        Self {
            team,
            zones,
            allies: TrackedSet::new(),
            armed_allies: TrackedSet::new(),
            unarmed_allies: TrackedSet::new(),
            buildings: TrackedSet::new(),
            castles: TrackedSet::new(),
            ghosts: TrackedSet::new(),
            enemies: TrackedSet::new(),
            armed_enemies: TrackedSet::new(),
            unarmed_enemies: TrackedSet::new(),
            enemy_buildings: TrackedSet::new(),
            wood_nodes: TrackedSet::new(),
            stone_nodes: TrackedSet::new(),
            danger: TrackedSet::new(),
            warning: TrackedSet::new(),
            busy: HashMap::new(),
            total_wood: 0,
            total_stone: 0,
            snapshot: BTreeMap::new(),
        }
    }

    /// Rescan the whole world.
    ///
    /// O(entity count), no early exit. Zone sets and the busy map are
    /// updated in place; everything else is rebuilt.
    pub fn refresh(&mut self, world: &World) {
        self.clear_transient();

        for entity in world.scan() {
            self.snapshot.insert(entity.id, entity.clone());
            self.dispatch(entity);
        }

        let allies = &self.allies;
        self.busy.retain(|id, _| allies.contains(*id));
        let armed = &self.armed_enemies;
        self.danger.retain(|id| armed.contains(id));
        self.warning.retain(|id| armed.contains(id));

        self.classify_zones();

        debug_assert!(self.is_consistent(), "tracked set diverged from its list");
        #[cfg(feature = "debug-validation")]
        if !self.is_consistent() {
            tracing::error!(team = ?self.team, "Tracked set diverged from its list");
        }
        tracing::trace!(
            team = ?self.team,
            allies = self.allies.len(),
            enemies = self.enemies.len(),
            danger = self.danger.len(),
            "Knowledge refreshed"
        );
    }

    fn clear_transient(&mut self) {
        for set in [
            &mut self.allies,
            &mut self.armed_allies,
            &mut self.unarmed_allies,
            &mut self.buildings,
            &mut self.castles,
            &mut self.ghosts,
            &mut self.enemies,
            &mut self.armed_enemies,
            &mut self.unarmed_enemies,
            &mut self.enemy_buildings,
            &mut self.wood_nodes,
            &mut self.stone_nodes,
        ] {
            set.clear();
        }
        self.total_wood = 0;
        self.total_stone = 0;
        self.snapshot.clear();
    }

    fn dispatch(&mut self, entity: &Entity) {
        let id = entity.id;
        let ours = entity.is_owned_by(self.team);
        let theirs = entity.is_enemy_of(self.team);

        match &entity.kind {
            EntityKind::Crab(crab) if ours => {
                self.allies.insert(id);
                if crab.is_armed() {
                    self.armed_allies.insert(id);
                } else {
                    self.unarmed_allies.insert(id);
                }
                self.busy.insert(id, crab.is_busy());
            }
            EntityKind::Crab(crab) if theirs => {
                self.enemies.insert(id);
                if crab.is_armed() {
                    self.armed_enemies.insert(id);
                } else {
                    self.unarmed_enemies.insert(id);
                }
            }
            EntityKind::Building(building) if ours => {
                self.buildings.insert(id);
                if building.kind == BuildingKind::Castle {
                    self.castles.insert(id);
                    self.total_wood += building.wood;
                    self.total_stone += building.stone;
                }
            }
            EntityKind::Building(_) if theirs => {
                self.enemy_buildings.insert(id);
            }
            EntityKind::Ghost(_) if ours => {
                self.ghosts.insert(id);
            }
            EntityKind::Resource(node) => {
                match node.kind {
                    ResourceKind::Wood => self.wood_nodes.insert(id),
                    ResourceKind::Stone => self.stone_nodes.insert(id),
                };
            }
            EntityKind::Crab(_) | EntityKind::Building(_) | EntityKind::Ghost(_) => {}
        }
    }

    fn classify_zones(&mut self) {
        if self.castles.is_empty() {
            return;
        }
        let enemies: Vec<EntityId> = self.armed_enemies.iter().collect();
        for enemy in enemies {
            let Some(position) = self.position(enemy) else {
                continue;
            };
            let Some((_, distance_sq)) = self.nearest_in(&self.castles, position) else {
                continue;
            };
            match classify(&self.zones, distance_sq) {
                ZoneUpdate::EnterDanger => {
                    self.danger.insert(enemy);
                    self.warning.remove(enemy);
                }
                ZoneUpdate::EnterWarning => {
                    self.warning.insert(enemy);
                    self.danger.remove(enemy);
                }
                ZoneUpdate::LeaveDanger => {
                    self.danger.remove(enemy);
                }
                ZoneUpdate::LeaveBoth => {
                    self.danger.remove(enemy);
                    self.warning.remove(enemy);
                }
                ZoneUpdate::Unchanged => {}
            }
        }
    }

    /// Nearest member of `set` to `from`, with its squared distance.
    ///
    /// Ties go to the member met first.
    #[must_use]
    pub fn nearest_in(&self, set: &TrackedSet, from: Vec2Fixed) -> Option<(EntityId, Fixed)> {
        let mut best: Option<(EntityId, Fixed)> = None;
        for id in set.iter() {
            let Some(position) = self.position(id) else {
                continue;
            };
            let distance = position.distance_squared(from);
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((id, distance));
            }
        }
        best
    }

    /// Whether every tracked set agrees with its list.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        [
            &self.allies,
            &self.armed_allies,
            &self.unarmed_allies,
            &self.buildings,
            &self.castles,
            &self.ghosts,
            &self.enemies,
            &self.armed_enemies,
            &self.unarmed_enemies,
            &self.enemy_buildings,
            &self.wood_nodes,
            &self.stone_nodes,
            &self.danger,
            &self.warning,
        ]
        .iter()
        .all(|set| set.is_consistent())
    }

    /// The team this knowledge belongs to.
    #[must_use]
    pub const fn team(&self) -> Team {
        self.team
    }

    /// Zone thresholds in use.
    #[must_use]
    pub const fn zones(&self) -> &ZoneConfig {
        &self.zones
    }

    /// All owned crabs.
    #[must_use]
    pub fn allies(&self) -> &TrackedSet {
        &self.allies
    }

    /// Owned combat crabs.
    #[must_use]
    pub fn armed_allies(&self) -> &TrackedSet {
        &self.armed_allies
    }

    /// Owned workers.
    #[must_use]
    pub fn unarmed_allies(&self) -> &TrackedSet {
        &self.unarmed_allies
    }

    /// Owned finished buildings.
    #[must_use]
    pub fn buildings(&self) -> &TrackedSet {
        &self.buildings
    }

    /// Owned castles (bases).
    #[must_use]
    pub fn castles(&self) -> &TrackedSet {
        &self.castles
    }

    /// Owned construction sites.
    #[must_use]
    pub fn ghosts(&self) -> &TrackedSet {
        &self.ghosts
    }

    /// Enemy crabs.
    #[must_use]
    pub fn enemies(&self) -> &TrackedSet {
        &self.enemies
    }

    /// Enemy combat crabs.
    #[must_use]
    pub fn armed_enemies(&self) -> &TrackedSet {
        &self.armed_enemies
    }

    /// Enemy workers.
    #[must_use]
    pub fn unarmed_enemies(&self) -> &TrackedSet {
        &self.unarmed_enemies
    }

    /// Enemy finished buildings.
    #[must_use]
    pub fn enemy_buildings(&self) -> &TrackedSet {
        &self.enemy_buildings
    }

    /// Resource nodes of one kind.
    #[must_use]
    pub fn nodes(&self, kind: ResourceKind) -> &TrackedSet {
        match kind {
            ResourceKind::Wood => &self.wood_nodes,
            ResourceKind::Stone => &self.stone_nodes,
        }
    }

    /// Enemy combat crabs inside the danger zone.
    #[must_use]
    pub fn danger_enemies(&self) -> &TrackedSet {
        &self.danger
    }

    /// Enemy combat crabs inside the warning zone.
    #[must_use]
    pub fn warning_enemies(&self) -> &TrackedSet {
        &self.warning
    }

    /// Last known busy flag. Unknown crabs are not busy.
    #[must_use]
    pub fn is_busy(&self, crab: EntityId) -> bool {
        self.busy.get(&crab).copied().unwrap_or(false)
    }

    /// Record a busy flag ahead of the next refresh.
    pub fn mark_busy(&mut self, crab: EntityId, busy: bool) {
        if self.allies.contains(crab) {
            self.busy.insert(crab, busy);
        }
    }

    /// Wood stored across owned castles.
    #[must_use]
    pub const fn total_wood(&self) -> i32 {
        self.total_wood
    }

    /// Stone stored across owned castles.
    #[must_use]
    pub const fn total_stone(&self) -> i32 {
        self.total_stone
    }

    /// The base: first owned castle in scan order.
    #[must_use]
    pub fn base(&self) -> Option<EntityId> {
        self.castles.first()
    }

    /// Snapshot of an entity as of the last refresh.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.snapshot.get(&id)
    }

    /// Position as of the last refresh.
    #[must_use]
    pub fn position(&self, id: EntityId) -> Option<Vec2Fixed> {
        self.snapshot.get(&id).map(|e| e.position)
    }

    /// Whether the entity was seen in the last refresh.
    #[must_use]
    pub fn exists(&self, id: EntityId) -> bool {
        self.snapshot.contains_key(&id)
    }

    /// Owned finished buildings of one kind, in scan order.
    pub fn buildings_of(&self, kind: BuildingKind) -> impl Iterator<Item = EntityId> + '_ {
        self.buildings.iter().filter(move |&id| {
            self.entity(id)
                .and_then(Entity::as_building)
                .is_some_and(|b| b.kind == kind)
        })
    }

    /// Owned construction sites of one kind, in scan order.
    pub fn ghosts_of(&self, kind: BuildingKind) -> impl Iterator<Item = EntityId> + '_ {
        self.ghosts.iter().filter(move |&id| {
            self.entity(id)
                .and_then(Entity::as_ghost)
                .is_some_and(|g| g.kind == kind)
        })
    }

    /// Owned crabs whose current task targets `target`.
    pub fn crabs_targeting(&self, target: EntityId) -> impl Iterator<Item = EntityId> + '_ {
        self.allies.iter().filter(move |&id| {
            self.entity(id)
                .and_then(Entity::as_crab)
                .is_some_and(|c| c.task.target() == Some(target))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Building, Crab, WeaponKind};

    const RED: Team = Team(0);
    const BLUE: Team = Team(1);

    fn zones(band: bool) -> ZoneConfig {
        ZoneConfig {
            danger_distance: 10,
            warning_distance: 25,
            classify_warning_band: band,
        }
    }

    fn enemy_at(world: &mut World, x: i32) -> EntityId {
        world.spawn_crab(BLUE, Vec2Fixed::from_units(x, 0), Crab::soldier(WeaponKind::Spear))
    }

    #[test]
    fn test_tracked_set_keeps_order_and_rejects_duplicates() {
        let mut set = TrackedSet::new();
        assert!(set.insert(3));
        assert!(set.insert(1));
        assert!(!set.insert(3));
        assert_eq!(set.as_slice(), &[3, 1]);
        assert!(set.remove(3));
        assert!(!set.remove(3));
        assert_eq!(set.first(), Some(1));
        set.retain(|id| id != 1);
        assert!(set.is_empty());
        assert!(set.is_consistent());
    }

    #[test]
    fn test_refresh_partitions_by_team_and_kind() {
        let mut world = World::default();
        let castle = world.spawn_building(RED, Vec2Fixed::ZERO, Building::castle(12, 7));
        let worker = world.spawn_crab(RED, Vec2Fixed::ZERO, Crab::worker());
        let soldier = world.spawn_crab(RED, Vec2Fixed::ZERO, Crab::soldier(WeaponKind::Bow));
        let enemy = enemy_at(&mut world, 100);
        let wood = world.spawn_resource(Vec2Fixed::ZERO, ResourceKind::Wood, 5);
        let site = world.spawn_ghost(RED, Vec2Fixed::ZERO, BuildingKind::Wall);

        let mut knowledge = WorldKnowledge::new(RED, zones(false));
        knowledge.refresh(&world);

        assert_eq!(knowledge.castles().as_slice(), &[castle]);
        assert_eq!(knowledge.allies().as_slice(), &[worker, soldier]);
        assert_eq!(knowledge.unarmed_allies().as_slice(), &[worker]);
        assert_eq!(knowledge.armed_allies().as_slice(), &[soldier]);
        assert_eq!(knowledge.armed_enemies().as_slice(), &[enemy]);
        assert_eq!(knowledge.nodes(ResourceKind::Wood).as_slice(), &[wood]);
        assert_eq!(knowledge.ghosts_of(BuildingKind::Wall).collect::<Vec<_>>(), vec![site]);
        assert_eq!((knowledge.total_wood(), knowledge.total_stone()), (12, 7));
        assert!(knowledge.is_consistent());
    }

    #[test]
    fn test_totals_do_not_accumulate_across_refreshes() {
        let mut world = World::default();
        world.spawn_building(RED, Vec2Fixed::ZERO, Building::castle(10, 10));
        let mut knowledge = WorldKnowledge::new(RED, zones(false));
        knowledge.refresh(&world);
        knowledge.refresh(&world);
        assert_eq!(knowledge.total_wood(), 10);
    }

    #[test]
    fn test_enemy_inside_danger_ring() {
        let mut world = World::default();
        world.spawn_building(RED, Vec2Fixed::ZERO, Building::castle(0, 0));
        let enemy = enemy_at(&mut world, 5);
        let mut knowledge = WorldKnowledge::new(RED, zones(false));
        knowledge.refresh(&world);
        assert!(knowledge.danger_enemies().contains(enemy));
        assert!(!knowledge.warning_enemies().contains(enemy));
    }

    #[test]
    fn test_warning_band_gap_leaves_enemy_unclassified() {
        // danger 10, warning 25, enemy at 15: the check chain never reaches
        // the warning branch, so the enemy lands in neither set.
        let mut world = World::default();
        world.spawn_building(RED, Vec2Fixed::ZERO, Building::castle(0, 0));
        let enemy = enemy_at(&mut world, 15);
        let mut knowledge = WorldKnowledge::new(RED, zones(false));
        knowledge.refresh(&world);
        assert!(!knowledge.danger_enemies().contains(enemy));
        assert!(!knowledge.warning_enemies().contains(enemy));
    }

    #[test]
    fn test_warning_band_when_enabled() {
        let mut world = World::default();
        world.spawn_building(RED, Vec2Fixed::ZERO, Building::castle(0, 0));
        let enemy = enemy_at(&mut world, 15);
        let far = enemy_at(&mut world, 40);
        let mut knowledge = WorldKnowledge::new(RED, zones(true));
        knowledge.refresh(&world);
        assert!(knowledge.warning_enemies().contains(enemy));
        assert!(!knowledge.danger_enemies().contains(enemy));
        assert!(!knowledge.warning_enemies().contains(far));
    }

    #[test]
    fn test_boundary_keeps_stale_classification() {
        let zones = zones(false);
        assert_eq!(
            classify(&zones, squared(Fixed::from_num(10))),
            ZoneUpdate::Unchanged
        );
        let band = ZoneConfig {
            classify_warning_band: true,
            ..zones
        };
        assert_eq!(
            classify(&band, squared(Fixed::from_num(25))),
            ZoneUpdate::Unchanged
        );
    }

    #[test]
    fn test_no_base_defers_classification() {
        let mut world = World::default();
        let enemy = enemy_at(&mut world, 1);
        let mut knowledge = WorldKnowledge::new(RED, zones(false));
        knowledge.refresh(&world);
        assert!(knowledge.armed_enemies().contains(enemy));
        assert!(knowledge.danger_enemies().is_empty());
    }

    #[test]
    fn test_dead_enemy_leaves_danger_set() {
        let mut world = World::default();
        world.spawn_building(RED, Vec2Fixed::ZERO, Building::castle(0, 0));
        let enemy = enemy_at(&mut world, 3);
        let mut knowledge = WorldKnowledge::new(RED, zones(false));
        knowledge.refresh(&world);
        assert!(knowledge.danger_enemies().contains(enemy));

        world.destroy(enemy);
        knowledge.refresh(&world);
        assert!(knowledge.danger_enemies().is_empty());
    }

    #[test]
    fn test_nearest_base_ties_go_to_first() {
        let mut world = World::default();
        let first = world.spawn_building(RED, Vec2Fixed::from_units(-5, 0), Building::castle(0, 0));
        world.spawn_building(RED, Vec2Fixed::from_units(5, 0), Building::castle(0, 0));
        let mut knowledge = WorldKnowledge::new(RED, zones(false));
        knowledge.refresh(&world);
        let nearest = knowledge.nearest_in(knowledge.castles(), Vec2Fixed::ZERO);
        assert_eq!(nearest.map(|(id, _)| id), Some(first));
    }
}
