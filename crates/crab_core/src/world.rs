//! The entity registry and the minimal entity layer around it.
//!
//! `World` is the explicit replacement for global scene lookups: it owns
//! every entity, is passed by reference to whoever needs it, and exposes an
//! ordered full scan as the only perception primitive.
//!
//! Movement is a straight line at constant speed. Gathering, building,
//! fighting and crafting are per-second rates accumulated with the step's
//! delta time.

use std::collections::BTreeMap;

use crate::components::{
    Building, BuildingKind, Cost, CraftItem, Crab, CrabTask, Crafting, Entity, EntityId,
    EntityKind, Ghost, Health, Reactions, ResourceKind, ResourceNode, Team, WeaponKind,
};
use crate::config::WorldRules;
use crate::error::OrderError;
use crate::events::{AiEvent, EventBus};
use crate::math::{squared, Fixed, Vec2Fixed};
use crate::orders::CrabOrders;

/// Storage for all entities.
///
/// Ordered by id, and ids grow monotonically, so iteration is always in
/// spawn order.
#[derive(Debug, Clone, Default)]
pub struct EntityStorage {
    entities: BTreeMap<EntityId, Entity>,
    next_id: EntityId,
}

impl EntityStorage {
    /// Create empty entity storage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entities: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Insert a new entity and return its ID.
    pub fn insert(
        &mut self,
        team: Option<Team>,
        position: Vec2Fixed,
        health: Health,
        kind: EntityKind,
    ) -> EntityId {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        self.entities.insert(
            id,
            Entity {
                id,
                team,
                position,
                health,
                kind,
                last_attacker: None,
            },
        );
        id
    }

    /// Remove an entity by ID.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    /// Get an entity by ID.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Get a mutable reference to an entity by ID.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Check if an entity exists.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if storage is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Entity IDs in spawn order.
    #[must_use]
    pub fn ids(&self) -> Vec<EntityId> {
        self.entities.keys().copied().collect()
    }

    /// Iterate over all entities in spawn order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Iterate mutably over all entities in spawn order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.values_mut()
    }
}

/// Coarse entity categories for [`World::find_all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Any crab.
    Crab,
    /// Finished buildings.
    Building,
    /// Construction sites.
    Ghost,
    /// Resource nodes.
    Resource,
}

impl Category {
    /// Whether `entity` falls in this category.
    #[must_use]
    pub const fn matches(self, entity: &Entity) -> bool {
        matches!(
            (self, &entity.kind),
            (Self::Crab, EntityKind::Crab(_))
                | (Self::Building, EntityKind::Building(_))
                | (Self::Ghost, EntityKind::Ghost(_))
                | (Self::Resource, EntityKind::Resource(_))
        )
    }
}

/// All entities plus the rules that move them.
#[derive(Debug, Clone, Default)]
pub struct World {
    entities: EntityStorage,
    rules: WorldRules,
    events: EventBus,
    elapsed: Fixed,
}

impl World {
    /// Create an empty world.
    #[must_use]
    pub fn new(rules: WorldRules) -> Self {
        Self {
            entities: EntityStorage::new(),
            rules,
            events: EventBus::new(),
            elapsed: Fixed::ZERO,
        }
    }

    /// Entity-layer tuning.
    #[must_use]
    pub fn rules(&self) -> &WorldRules {
        &self.rules
    }

    /// Seconds simulated so far.
    #[must_use]
    pub const fn elapsed(&self) -> Fixed {
        self.elapsed
    }

    /// Events published by the most recent [`step`](Self::step).
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Look up an entity.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Mutable access to an entity, for scenario setup.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    /// Whether the entity still exists.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains(id)
    }

    /// Number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the world holds no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Every entity, in spawn order.
    pub fn scan(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    /// Every entity of one category, in spawn order.
    pub fn find_all(&self, category: Category) -> impl Iterator<Item = &Entity> {
        self.entities
            .iter()
            .filter(move |entity| category.matches(entity))
    }

    /// Spawn a crab.
    pub fn spawn_crab(&mut self, team: Team, position: Vec2Fixed, crab: Crab) -> EntityId {
        let health = Health::new(self.rules.crab_health);
        self.entities
            .insert(Some(team), position, health, EntityKind::Crab(crab))
    }

    /// Spawn a finished building.
    pub fn spawn_building(
        &mut self,
        team: Team,
        position: Vec2Fixed,
        building: Building,
    ) -> EntityId {
        let health = Health::new(self.rules.building_health);
        self.entities
            .insert(Some(team), position, health, EntityKind::Building(building))
    }

    /// Spawn a construction site without paying for it.
    pub fn spawn_ghost(&mut self, team: Team, position: Vec2Fixed, kind: BuildingKind) -> EntityId {
        let health = Health::new(self.rules.ghost_health);
        self.entities
            .insert(Some(team), position, health, EntityKind::Ghost(Ghost::new(kind)))
    }

    /// Spawn a neutral resource node.
    pub fn spawn_resource(&mut self, position: Vec2Fixed, kind: ResourceKind, amount: i32) -> EntityId {
        self.entities.insert(
            None,
            position,
            Health::new(1),
            EntityKind::Resource(ResourceNode::new(kind, amount)),
        )
    }

    /// Wood and stone stored across a team's castles.
    #[must_use]
    pub fn stock(&self, team: Team) -> (i32, i32) {
        self.castles(team)
            .filter_map(Entity::as_building)
            .fold((0, 0), |(wood, stone), castle| {
                (wood + castle.wood, stone + castle.stone)
            })
    }

    fn castles(&self, team: Team) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(move |entity| {
            entity.is_owned_by(team)
                && entity
                    .as_building()
                    .is_some_and(|b| b.kind == BuildingKind::Castle)
        })
    }

    /// Remove an entity outright, notifying every other entity.
    ///
    /// Publishes [`AiEvent::EntityDestroyed`].
    pub fn destroy(&mut self, id: EntityId) -> Option<Entity> {
        let removed = self.detach(id)?;
        self.events.publish(AiEvent::EntityDestroyed {
            id,
            team: removed.team,
        });
        Some(removed)
    }

    fn detach(&mut self, id: EntityId) -> Option<Entity> {
        let removed = self.entities.remove(id)?;
        for entity in self.entities.iter_mut() {
            entity.on_destroyed(id);
        }
        Some(removed)
    }

    /// Advance every crab task and crafting job by `dt` seconds.
    pub fn step(&mut self, dt: Fixed) {
        self.events.clear();
        let ids = self.entities.ids();

        for &id in &ids {
            self.step_crab(id, dt);
        }
        for &id in &ids {
            self.step_crafting(id, dt);
        }

        self.elapsed += dt;
    }

    fn step_crab(&mut self, id: EntityId, dt: Fixed) {
        let Some(entity) = self.entities.get(id) else {
            return;
        };
        let Some(crab) = entity.as_crab() else {
            return;
        };
        let task = crab.task;
        let Some(target_id) = task.target() else {
            return;
        };
        if matches!(task, CrabTask::Inside { .. }) {
            return;
        }
        let position = entity.position;
        let Some(target_position) = self.entities.get(target_id).map(|t| t.position) else {
            if let Some(crab) = self.entities.get_mut(id).and_then(Entity::as_crab_mut) {
                crab.clear_task();
            }
            return;
        };

        let range = match task {
            CrabTask::Attacking { .. } => self.rules.attack_range,
            _ => self.rules.interaction_range,
        };
        if position.distance_squared(target_position) > squared(Fixed::from_num(range)) {
            let step = Fixed::from_num(self.rules.crab_speed) * dt;
            if let Some(entity) = self.entities.get_mut(id) {
                entity.position = position.move_towards(target_position, step);
            }
            return;
        }

        match task {
            CrabTask::Collecting { node } => self.gather(id, node, dt),
            CrabTask::Building { site } => self.construct(site, dt),
            CrabTask::Attacking { target } => self.strike(id, target, dt),
            CrabTask::FetchingWeapon { armoury, weapon } => self.pick_up(id, armoury, weapon),
            CrabTask::Entering { building } => self.shelter(id, building),
            CrabTask::Idle | CrabTask::Inside { .. } => {}
        }
    }

    /// Accumulate work on a crab and return the whole units completed.
    fn accumulate(&mut self, crab: EntityId, rate: i32, dt: Fixed) -> i32 {
        let Some(crab) = self.entities.get_mut(crab).and_then(Entity::as_crab_mut) else {
            return 0;
        };
        crab.work += Fixed::from_num(rate) * dt;
        let whole = crab.work.to_num::<i32>();
        crab.work -= Fixed::from_num(whole);
        whole
    }

    fn gather(&mut self, crab: EntityId, node: EntityId, dt: Fixed) {
        let Some(team) = self.entities.get(crab).and_then(|e| e.team) else {
            return;
        };
        let Some(castle) = self.nearest_castle(team, node) else {
            tracing::trace!(crab, "No castle to deposit into");
            return;
        };
        let amount = self.accumulate(crab, self.rules.gather_per_second, dt);
        if amount == 0 {
            return;
        }

        let Some(EntityKind::Resource(resource)) =
            self.entities.get_mut(node).map(|e| &mut e.kind)
        else {
            return;
        };
        let taken = resource.extract(amount);
        let kind = resource.kind;
        let depleted = resource.is_depleted();

        if let Some(castle) = self.entities.get_mut(castle).and_then(Entity::as_building_mut) {
            match kind {
                ResourceKind::Wood => castle.wood += taken,
                ResourceKind::Stone => castle.stone += taken,
            }
        }

        if depleted {
            tracing::debug!(node, ?kind, "Resource node depleted");
            self.destroy(node);
        }
    }

    fn nearest_castle(&self, team: Team, from: EntityId) -> Option<EntityId> {
        let origin = self.entities.get(from)?.position;
        let mut best: Option<(EntityId, Fixed)> = None;
        for castle in self.castles(team) {
            let distance = castle.position.distance_squared(origin);
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((castle.id, distance));
            }
        }
        best.map(|(id, _)| id)
    }

    fn construct(&mut self, site: EntityId, dt: Fixed) {
        let Some(entity) = self.entities.get_mut(site) else {
            return;
        };
        let (Some(team), EntityKind::Ghost(ghost)) = (entity.team, &mut entity.kind) else {
            return;
        };
        ghost.progress += dt;
        let kind = ghost.kind;
        if ghost.progress < self.rules.build_time(kind) {
            return;
        }

        let position = entity.position;
        self.detach(site);
        let building = self.spawn_building(team, position, Building::new(kind));
        tracing::info!(?team, ?kind, building, "Construction finished");
        self.events.publish(AiEvent::ConstructionFinished {
            team,
            kind,
            building,
        });
    }

    fn strike(&mut self, crab: EntityId, target: EntityId, dt: Fixed) {
        let armed = self
            .entities
            .get(crab)
            .and_then(Entity::as_crab)
            .is_some_and(Crab::is_armed);
        let rate = if armed {
            self.rules.armed_damage_per_second
        } else {
            self.rules.unarmed_damage_per_second
        };
        let damage = self.accumulate(crab, rate, dt);
        if damage == 0 {
            return;
        }

        let Some(victim) = self.entities.get_mut(target) else {
            return;
        };
        victim.health.damage(damage);
        victim.set_attacker(crab);
        if !victim.health.is_dead() {
            return;
        }

        if let Some(killer) = self.entities.get_mut(crab) {
            killer.on_enemy_died(target);
        }
        tracing::debug!(crab, target, "Target destroyed");
        self.destroy(target);
    }

    fn pick_up(&mut self, crab: EntityId, armoury: EntityId, weapon: WeaponKind) {
        let taken = match self.entities.get_mut(armoury).and_then(Entity::as_building_mut) {
            Some(building) if building.weapon_stock(weapon) > 0 => {
                *building.weapons.entry(weapon).or_insert(0) -= 1;
                true
            }
            _ => false,
        };
        if let Some(crab) = self.entities.get_mut(crab).and_then(Entity::as_crab_mut) {
            if taken {
                crab.weapon = Some(weapon);
            }
            crab.clear_task();
        }
    }

    fn shelter(&mut self, crab: EntityId, building: EntityId) {
        if let Some(target) = self.entities.get_mut(building).and_then(Entity::as_building_mut) {
            target.occupants.push(crab);
        }
        if let Some(crab) = self.entities.get_mut(crab).and_then(Entity::as_crab_mut) {
            crab.task = CrabTask::Inside { building };
        }
    }

    fn step_crafting(&mut self, id: EntityId, dt: Fixed) {
        let capacity = self.rules.armoury_capacity;
        let Some(building) = self.entities.get_mut(id).and_then(Entity::as_building_mut) else {
            return;
        };
        let Some(crafting) = building.crafting.as_mut() else {
            return;
        };
        crafting.progress += dt;
        let item = crafting.item;
        if crafting.progress < self.rules.craft_time(item) {
            return;
        }

        building.crafting = None;
        match item {
            CraftItem::Weapon(weapon) => {
                let stock = building.weapons.entry(weapon).or_insert(0);
                *stock = (*stock + 1).min(capacity);
            }
            CraftItem::SiegeWeapon => building.siege_weapons += 1,
        }
        tracing::debug!(building = id, ?item, "Crafting finished");
    }

    fn crab_team(&self, crab: EntityId) -> Result<Team, OrderError> {
        let entity = self
            .entities
            .get(crab)
            .ok_or(OrderError::UnknownEntity(crab))?;
        if entity.as_crab().is_none() {
            return Err(OrderError::WrongKind {
                id: crab,
                expected: "crab",
            });
        }
        entity.team.ok_or(OrderError::WrongTeam { id: crab })
    }

    fn set_task(&mut self, crab: EntityId, task: CrabTask) {
        let previous = self
            .entities
            .get(crab)
            .and_then(Entity::as_crab)
            .map(|c| c.task);
        if let Some(CrabTask::Inside { building }) = previous {
            if let Some(shelter) = self.entities.get_mut(building).and_then(Entity::as_building_mut) {
                shelter.occupants.retain(|&occupant| occupant != crab);
            }
        }
        if let Some(state) = self.entities.get_mut(crab).and_then(Entity::as_crab_mut) {
            state.clear_task();
            state.task = task;
        }
    }

    /// Resolve and apply a crab order; a refused order leaves the crab idle.
    fn assign(
        &mut self,
        crab: EntityId,
        resolve: impl FnOnce(&Self, Team) -> Result<CrabTask, OrderError>,
    ) -> Result<(), OrderError> {
        let team = self.crab_team(crab)?;
        match resolve(self, team) {
            Ok(task) => {
                self.set_task(crab, task);
                Ok(())
            }
            Err(err) => {
                self.set_task(crab, CrabTask::Idle);
                Err(err)
            }
        }
    }

    fn expect_entity(&self, id: EntityId) -> Result<&Entity, OrderError> {
        self.entities.get(id).ok_or(OrderError::UnknownEntity(id))
    }

    fn expect_own_building(
        &self,
        id: EntityId,
        team: Team,
        expected: &'static str,
        accept: impl Fn(&Building) -> bool,
    ) -> Result<&Building, OrderError> {
        let entity = self.expect_entity(id)?;
        let building = entity
            .as_building()
            .filter(|b| accept(*b))
            .ok_or(OrderError::WrongKind { id, expected })?;
        if !entity.is_owned_by(team) {
            return Err(OrderError::WrongTeam { id });
        }
        Ok(building)
    }

    fn pay(&mut self, team: Team, cost: Cost) {
        let mut wood = cost.wood;
        let mut stone = cost.stone;
        let castles: Vec<EntityId> = self.castles(team).map(|e| e.id).collect();
        for id in castles {
            if let Some(castle) = self.entities.get_mut(id).and_then(Entity::as_building_mut) {
                let wood_taken = wood.min(castle.wood);
                let stone_taken = stone.min(castle.stone);
                castle.wood -= wood_taken;
                castle.stone -= stone_taken;
                wood -= wood_taken;
                stone -= stone_taken;
            }
        }
    }
}

impl CrabOrders for World {
    fn is_busy(&self, crab: EntityId) -> bool {
        self.entities
            .get(crab)
            .and_then(Entity::as_crab)
            .is_some_and(Crab::is_busy)
    }

    fn place_ghost(
        &mut self,
        team: Team,
        kind: BuildingKind,
        position: Vec2Fixed,
        cost: Cost,
    ) -> Result<EntityId, OrderError> {
        let (wood, stone) = self.stock(team);
        if !cost.is_covered_by(wood, stone) {
            return Err(OrderError::InsufficientResources {
                team,
                kind,
                wood: cost.wood,
                stone: cost.stone,
            });
        }
        self.pay(team, cost);
        Ok(self.spawn_ghost(team, position, kind))
    }

    fn order_build(&mut self, crab: EntityId, site: EntityId) -> Result<(), OrderError> {
        self.assign(crab, |world, team| {
            let entity = world.expect_entity(site)?;
            if entity.as_ghost().is_none() {
                return Err(OrderError::WrongKind {
                    id: site,
                    expected: "construction site",
                });
            }
            if !entity.is_owned_by(team) {
                return Err(OrderError::WrongTeam { id: site });
            }
            Ok(CrabTask::Building { site })
        })
    }

    fn order_collect(&mut self, crab: EntityId, node: EntityId) -> Result<(), OrderError> {
        self.assign(crab, |world, _| {
            world
                .expect_entity(node)?
                .as_resource()
                .ok_or(OrderError::WrongKind {
                    id: node,
                    expected: "resource node",
                })?;
            Ok(CrabTask::Collecting { node })
        })
    }

    fn order_enter(&mut self, crab: EntityId, building: EntityId) -> Result<(), OrderError> {
        self.assign(crab, |world, team| {
            world.expect_own_building(building, team, "shelter", |b| {
                b.kind.accepts_occupants()
            })?;
            Ok(CrabTask::Entering { building })
        })
    }

    fn order_attack(&mut self, crab: EntityId, target: EntityId) -> Result<(), OrderError> {
        self.assign(crab, |world, team| {
            if !world.expect_entity(target)?.is_enemy_of(team) {
                return Err(OrderError::WrongTeam { id: target });
            }
            Ok(CrabTask::Attacking { target })
        })
    }

    fn order_take_weapon(
        &mut self,
        crab: EntityId,
        armoury: EntityId,
        weapon: WeaponKind,
    ) -> Result<(), OrderError> {
        self.assign(crab, |world, team| {
            let building = world.expect_own_building(armoury, team, "armoury", |b| {
                b.kind == BuildingKind::Armoury
            })?;
            if building.weapon_stock(weapon) == 0 {
                return Err(OrderError::OutOfStock { armoury, weapon });
            }
            Ok(CrabTask::FetchingWeapon { armoury, weapon })
        })
    }

    fn order_stop(&mut self, crab: EntityId) -> Result<(), OrderError> {
        self.crab_team(crab)?;
        self.set_task(crab, CrabTask::Idle);
        Ok(())
    }

    fn order_craft(&mut self, building: EntityId, item: CraftItem) -> Result<(), OrderError> {
        let capacity = self.rules.armoury_capacity;
        let target = self
            .entities
            .get_mut(building)
            .ok_or(OrderError::UnknownEntity(building))?
            .as_building_mut()
            .ok_or(OrderError::WrongKind {
                id: building,
                expected: "building",
            })?;
        let fits = match item {
            CraftItem::Weapon(weapon) => {
                target.kind == BuildingKind::Armoury && target.weapon_stock(weapon) < capacity
            }
            CraftItem::SiegeWeapon => target.kind == BuildingKind::Workshop,
        };
        if !fits {
            return Err(OrderError::CannotCraft(building));
        }
        if target.is_crafting() {
            return Err(OrderError::Busy(building));
        }
        target.crafting = Some(Crafting {
            item,
            progress: Fixed::ZERO,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Team = Team(0);
    const BLUE: Team = Team(1);

    fn dt() -> Fixed {
        Fixed::from_num(1) / Fixed::from_num(20)
    }

    /// Runs one extra step so accumulators land past whole-second marks.
    fn run(world: &mut World, seconds: i32) {
        for _ in 0..=seconds * 20 {
            world.step(dt());
        }
    }

    #[test]
    fn test_scan_is_spawn_order() {
        let mut world = World::default();
        let a = world.spawn_resource(Vec2Fixed::ZERO, ResourceKind::Wood, 10);
        let b = world.spawn_crab(RED, Vec2Fixed::ZERO, Crab::worker());
        let c = world.spawn_building(RED, Vec2Fixed::ZERO, Building::castle(0, 0));
        let ids: Vec<_> = world.scan().map(|e| e.id).collect();
        assert_eq!(ids, vec![a, b, c]);
        assert_eq!(world.find_all(Category::Crab).count(), 1);
    }

    #[test]
    fn test_gathering_deposits_into_castle() {
        let mut world = World::new(WorldRules::default());
        world.spawn_building(RED, Vec2Fixed::ZERO, Building::castle(0, 0));
        let node = world.spawn_resource(Vec2Fixed::from_units(1, 0), ResourceKind::Stone, 100);
        let crab = world.spawn_crab(RED, Vec2Fixed::ZERO, Crab::worker());

        world.order_collect(crab, node).expect("collect accepted");
        run(&mut world, 2);

        let (wood, stone) = world.stock(RED);
        assert_eq!(wood, 0);
        assert_eq!(stone, 4);
        assert!(world.is_busy(crab));
    }

    #[test]
    fn test_crab_walks_towards_distant_node() {
        let mut world = World::default();
        world.spawn_building(RED, Vec2Fixed::ZERO, Building::castle(0, 0));
        let node = world.spawn_resource(Vec2Fixed::from_units(50_000, 0), ResourceKind::Wood, 10);
        let crab = world.spawn_crab(RED, Vec2Fixed::ZERO, Crab::worker());

        world.order_collect(crab, node).expect("collect accepted");
        world.step(dt());

        let at = world.get(crab).expect("crab alive").position;
        let expected = Fixed::from_num(world.rules().crab_speed) * dt();
        let epsilon = Fixed::ONE / Fixed::from_num(1000);
        assert!((at.x - expected).abs() < epsilon);
        assert_eq!(at.y, Fixed::ZERO);
    }

    #[test]
    fn test_depleted_node_is_destroyed_and_gatherer_idles() {
        let mut world = World::default();
        world.spawn_building(RED, Vec2Fixed::ZERO, Building::castle(0, 0));
        let node = world.spawn_resource(Vec2Fixed::from_units(1, 0), ResourceKind::Wood, 1);
        let crab = world.spawn_crab(RED, Vec2Fixed::ZERO, Crab::worker());

        world.order_collect(crab, node).expect("collect accepted");
        run(&mut world, 1);

        assert!(!world.contains(node));
        assert!(!world.is_busy(crab));
        assert_eq!(world.stock(RED), (1, 0));
    }

    #[test]
    fn test_construction_publishes_event() {
        let mut world = World::default();
        world.spawn_building(RED, Vec2Fixed::ZERO, Building::castle(50, 50));
        let crab = world.spawn_crab(RED, Vec2Fixed::ZERO, Crab::worker());
        let site = world
            .place_ghost(RED, BuildingKind::Wall, Vec2Fixed::from_units(1, 1), Cost::new(0, 20))
            .expect("affordable");
        assert_eq!(world.stock(RED), (50, 30));

        world.order_build(crab, site).expect("build accepted");
        let mut finished = None;
        for _ in 0..200 {
            world.step(dt());
            if let Some(event) = world.events().events().first() {
                finished = Some(*event);
                break;
            }
        }

        assert!(matches!(
            finished,
            Some(AiEvent::ConstructionFinished { team: RED, kind: BuildingKind::Wall, .. })
        ));
        assert!(!world.contains(site));
        assert!(!world.is_busy(crab));
    }

    #[test]
    fn test_place_ghost_requires_funds() {
        let mut world = World::default();
        world.spawn_building(RED, Vec2Fixed::ZERO, Building::castle(5, 5));
        let result = world.place_ghost(RED, BuildingKind::Tower, Vec2Fixed::ZERO, Cost::new(20, 40));
        assert!(matches!(result, Err(OrderError::InsufficientResources { .. })));
        assert_eq!(world.stock(RED), (5, 5));
    }

    #[test]
    fn test_attack_kills_and_frees_attacker() {
        let mut world = World::default();
        let soldier = world.spawn_crab(RED, Vec2Fixed::ZERO, Crab::soldier(WeaponKind::Spear));
        let victim = world.spawn_crab(BLUE, Vec2Fixed::from_units(1, 0), Crab::worker());

        world.order_attack(soldier, victim).expect("attack accepted");
        run(&mut world, 5);

        assert!(!world.contains(victim));
        assert!(!world.is_busy(soldier));
    }

    #[test]
    fn test_attack_on_ally_is_refused_and_clears_task() {
        let mut world = World::default();
        let node = world.spawn_resource(Vec2Fixed::ZERO, ResourceKind::Wood, 10);
        let crab = world.spawn_crab(RED, Vec2Fixed::ZERO, Crab::worker());
        let friend = world.spawn_crab(RED, Vec2Fixed::ZERO, Crab::worker());
        world.order_collect(crab, node).expect("collect accepted");

        let result = world.order_attack(crab, friend);
        assert_eq!(result, Err(OrderError::WrongTeam { id: friend }));
        assert!(!world.is_busy(crab));
    }

    #[test]
    fn test_craft_and_take_weapon() {
        let mut world = World::default();
        let armoury = world.spawn_building(RED, Vec2Fixed::ZERO, Building::new(BuildingKind::Armoury));
        let crab = world.spawn_crab(RED, Vec2Fixed::ZERO, Crab::worker());

        assert_eq!(
            world.order_take_weapon(crab, armoury, WeaponKind::Bow),
            Err(OrderError::OutOfStock { armoury, weapon: WeaponKind::Bow })
        );

        world
            .order_craft(armoury, CraftItem::Weapon(WeaponKind::Bow))
            .expect("craft accepted");
        assert_eq!(
            world.order_craft(armoury, CraftItem::Weapon(WeaponKind::Spear)),
            Err(OrderError::Busy(armoury))
        );
        run(&mut world, 5);

        world.order_take_weapon(crab, armoury, WeaponKind::Bow).expect("in stock");
        world.step(dt());
        let weapon = world.get(crab).and_then(Entity::as_crab).and_then(|c| c.weapon);
        assert_eq!(weapon, Some(WeaponKind::Bow));
    }

    #[test]
    fn test_enter_and_leave_shelter() {
        let mut world = World::default();
        let tower = world.spawn_building(RED, Vec2Fixed::ZERO, Building::new(BuildingKind::Tower));
        let crab = world.spawn_crab(RED, Vec2Fixed::ZERO, Crab::worker());

        world.order_enter(crab, tower).expect("enter accepted");
        world.step(dt());
        let occupants = |world: &World| {
            world
                .get(tower)
                .and_then(Entity::as_building)
                .map(|b| b.occupants.clone())
                .unwrap_or_default()
        };
        assert_eq!(occupants(&world), vec![crab]);

        world.order_stop(crab).expect("stop accepted");
        assert!(occupants(&world).is_empty());
        assert!(!world.is_busy(crab));
    }
}
