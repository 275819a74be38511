//! Error types for the crab simulation.

use thiserror::Error;

use crate::components::{BuildingKind, EntityId, Team, WeaponKind};

/// Result type alias using [`CrabError`].
pub type Result<T> = std::result::Result<T, CrabError>;

/// Top-level error type for the simulation core.
#[derive(Debug, Error)]
pub enum CrabError {
    /// Configuration rejected by validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An order was rejected by the entity layer.
    #[error(transparent)]
    Order(#[from] OrderError),
}

/// Why the entity layer refused to carry out an order.
///
/// Commands that hit one of these are dropped; the issuing manager is not told.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// The referenced entity does not exist (any more).
    #[error("Entity not found: {0}")]
    UnknownEntity(EntityId),

    /// The entity exists but is not the kind the order needs.
    #[error("Entity {id} is not a {expected}")]
    WrongKind {
        /// Entity that was referenced.
        id: EntityId,
        /// Category the order required.
        expected: &'static str,
    },

    /// Team rules forbid the order (own target for attack, foreign site for build, ...).
    #[error("Entity {id} belongs to the wrong team for this order")]
    WrongTeam {
        /// Entity that was referenced.
        id: EntityId,
    },

    /// The team cannot pay for the building.
    #[error("Team {team:?} cannot afford {kind:?}: need {wood} wood / {stone} stone")]
    InsufficientResources {
        /// Paying team.
        team: Team,
        /// Building that was requested.
        kind: BuildingKind,
        /// Wood required.
        wood: i32,
        /// Stone required.
        stone: i32,
    },

    /// The armoury has none of the requested weapon.
    #[error("Armoury {armoury} has no {weapon:?} in stock")]
    OutOfStock {
        /// Armoury entity.
        armoury: EntityId,
        /// Weapon requested.
        weapon: WeaponKind,
    },

    /// The building is already crafting something.
    #[error("Building {0} is already crafting")]
    Busy(EntityId),

    /// The building cannot craft the requested item.
    #[error("Building {0} cannot craft that item")]
    CannotCraft(EntityId),
}
