//! Discrete AI orders and the FIFO queue they travel through.
//!
//! Managers build commands and push them onto the [`CommandQueue`]; the
//! executor pops and runs them. A command runs exactly once, in enqueue
//! order, even if the world changed since it was issued.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::components::{BuildingKind, Cost, CraftItem, EntityId, Team, WeaponKind};
use crate::error::OrderError;
use crate::math::Vec2Fixed;
use crate::orders::CrabOrders;

/// A unit of work for the entity layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Place a paid construction site and send a worker to it.
    Build {
        /// Team paying for the site.
        team: Team,
        /// Worker that will build.
        crab: EntityId,
        /// Building to construct.
        kind: BuildingKind,
        /// Site position.
        position: Vec2Fixed,
        /// Price taken from the team's castles.
        cost: Cost,
    },
    /// Send a worker to an existing construction site.
    BuildFromGhost {
        /// Worker that will build.
        crab: EntityId,
        /// Site to work on.
        ghost: EntityId,
    },
    /// Send a worker to a resource node.
    Collect {
        /// Worker.
        crab: EntityId,
        /// Node to gather from.
        node: EntityId,
    },
    /// Send a crab inside a building.
    Enter {
        /// Crab.
        crab: EntityId,
        /// Shelter.
        building: EntityId,
    },
    /// Send a crab against an enemy.
    Attack {
        /// Attacker.
        crab: EntityId,
        /// Target.
        target: EntityId,
    },
    /// Send a worker to pick up a weapon.
    TakeWeapon {
        /// Worker to arm.
        crab: EntityId,
        /// Armoury holding the weapon.
        armoury: EntityId,
        /// Weapon to take.
        weapon: WeaponKind,
    },
    /// Make a crab drop its task.
    Stop {
        /// Crab.
        crab: EntityId,
    },
    /// Start a siege weapon at a workshop.
    Siege {
        /// Workshop.
        workshop: EntityId,
    },
    /// Start crafting a hand weapon at an armoury.
    Craft {
        /// Armoury.
        armoury: EntityId,
        /// Weapon to craft.
        weapon: WeaponKind,
    },
}

impl Command {
    /// Carry out this command against the entity layer.
    pub fn execute<O: CrabOrders + ?Sized>(&self, orders: &mut O) -> Result<(), OrderError> {
        match *self {
            Self::Build {
                team,
                crab,
                kind,
                position,
                cost,
            } => {
                let site = orders.place_ghost(team, kind, position, cost)?;
                orders.order_build(crab, site)
            }
            Self::BuildFromGhost { crab, ghost } => orders.order_build(crab, ghost),
            Self::Collect { crab, node } => orders.order_collect(crab, node),
            Self::Enter { crab, building } => orders.order_enter(crab, building),
            Self::Attack { crab, target } => orders.order_attack(crab, target),
            Self::TakeWeapon {
                crab,
                armoury,
                weapon,
            } => orders.order_take_weapon(crab, armoury, weapon),
            Self::Stop { crab } => orders.order_stop(crab),
            Self::Siege { workshop } => orders.order_craft(workshop, CraftItem::SiegeWeapon),
            Self::Craft { armoury, weapon } => {
                orders.order_craft(armoury, CraftItem::Weapon(weapon))
            }
        }
    }

    /// The crab this command puts to work, if any.
    #[must_use]
    pub const fn crab(&self) -> Option<EntityId> {
        match *self {
            Self::Build { crab, .. }
            | Self::BuildFromGhost { crab, .. }
            | Self::Collect { crab, .. }
            | Self::Enter { crab, .. }
            | Self::Attack { crab, .. }
            | Self::TakeWeapon { crab, .. }
            | Self::Stop { crab } => Some(crab),
            Self::Siege { .. } | Self::Craft { .. } => None,
        }
    }

    /// Short name for logs and reports.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Build { .. } => "build",
            Self::BuildFromGhost { .. } => "build_from_ghost",
            Self::Collect { .. } => "collect",
            Self::Enter { .. } => "enter",
            Self::Attack { .. } => "attack",
            Self::TakeWeapon { .. } => "take_weapon",
            Self::Stop { .. } => "stop",
            Self::Siege { .. } => "siege",
            Self::Craft { .. } => "craft",
        }
    }
}

/// FIFO of pending commands. Unbounded; nothing pushes back on producers.
#[derive(Debug, Clone, Default)]
pub struct CommandQueue {
    commands: VecDeque<Command>,
}

impl CommandQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a command.
    pub fn push(&mut self, command: Command) {
        self.commands.push_back(command);
    }

    /// Take the oldest command.
    pub fn pop(&mut self) -> Option<Command> {
        self.commands.pop_front()
    }

    /// Oldest command without removing it.
    #[must_use]
    pub fn peek(&self) -> Option<&Command> {
        self.commands.front()
    }

    /// Pending command count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Whether some pending command puts `crab` to work.
    #[must_use]
    pub fn has_pending_for(&self, crab: EntityId) -> bool {
        self.commands.iter().any(|command| command.crab() == Some(crab))
    }

    /// Pending commands, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }
}
