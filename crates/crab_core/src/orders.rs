//! The capability interface commands are executed against.
//!
//! [`World`](crate::world::World) implements it for real play. Tests can
//! implement it with a recorder to observe exactly what a command asked for.

use crate::components::{BuildingKind, CraftItem, Cost, EntityId, Team, WeaponKind};
use crate::error::OrderError;
use crate::math::Vec2Fixed;

/// Entry points the entity layer exposes to the AI.
///
/// Each order either starts the requested activity or returns why it could
/// not. A refused crab order leaves that crab idle.
pub trait CrabOrders {
    /// Whether the crab is doing anything. Unknown entities are not busy.
    fn is_busy(&self, crab: EntityId) -> bool;

    /// Pay for and place a construction site.
    fn place_ghost(
        &mut self,
        team: Team,
        kind: BuildingKind,
        position: Vec2Fixed,
        cost: Cost,
    ) -> Result<EntityId, OrderError>;

    /// Send a crab to work on a construction site.
    fn order_build(&mut self, crab: EntityId, site: EntityId) -> Result<(), OrderError>;

    /// Send a crab to gather from a resource node.
    fn order_collect(&mut self, crab: EntityId, node: EntityId) -> Result<(), OrderError>;

    /// Send a crab inside a building.
    fn order_enter(&mut self, crab: EntityId, building: EntityId) -> Result<(), OrderError>;

    /// Send a crab to attack an enemy entity.
    fn order_attack(&mut self, crab: EntityId, target: EntityId) -> Result<(), OrderError>;

    /// Send a crab to pick up a weapon from an armoury.
    fn order_take_weapon(
        &mut self,
        crab: EntityId,
        armoury: EntityId,
        weapon: WeaponKind,
    ) -> Result<(), OrderError>;

    /// Make a crab drop whatever it is doing.
    fn order_stop(&mut self, crab: EntityId) -> Result<(), OrderError>;

    /// Start a crafting job at a building.
    fn order_craft(&mut self, building: EntityId, item: CraftItem) -> Result<(), OrderError>;
}
