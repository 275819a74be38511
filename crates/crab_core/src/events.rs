//! Typed publish/subscribe between the world and the AI players.
//!
//! The world publishes into its bus while stepping. Subscribers read the
//! events of the most recent step; the buffer is cleared when the next
//! step begins.

use serde::{Deserialize, Serialize};

use crate::components::{BuildingKind, EntityId, Team};

/// Events the AI layer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AiEvent {
    /// A construction site turned into a finished building.
    ConstructionFinished {
        /// Owner of the new building.
        team: Team,
        /// Building type.
        kind: BuildingKind,
        /// The new building entity.
        building: EntityId,
    },
    /// An entity was removed from the world.
    EntityDestroyed {
        /// Removed entity.
        id: EntityId,
        /// Its team, if it had one.
        team: Option<Team>,
    },
}

impl AiEvent {
    /// Whether this event concerns `team`.
    #[must_use]
    pub fn concerns(&self, team: Team) -> bool {
        match self {
            Self::ConstructionFinished { team: owner, .. } => *owner == team,
            Self::EntityDestroyed { team: owner, .. } => *owner == Some(team),
        }
    }
}

/// Per-step event buffer.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    published: Vec<AiEvent>,
}

impl EventBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish an event for this step.
    pub fn publish(&mut self, event: AiEvent) {
        tracing::trace!(?event, "Event published");
        self.published.push(event);
    }

    /// Events published during the last step, in publish order.
    #[must_use]
    pub fn events(&self) -> &[AiEvent] {
        &self.published
    }

    /// Events of the last step that concern `team`.
    pub fn events_for(&self, team: Team) -> impl Iterator<Item = &AiEvent> + '_ {
        self.published.iter().filter(move |event| event.concerns(team))
    }

    /// Start a new step.
    pub fn clear(&mut self) {
        self.published.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_for_filters_by_team() {
        let mut bus = EventBus::new();
        bus.publish(AiEvent::ConstructionFinished {
            team: Team(0),
            kind: BuildingKind::Tower,
            building: 4,
        });
        bus.publish(AiEvent::EntityDestroyed {
            id: 9,
            team: Some(Team(1)),
        });
        bus.publish(AiEvent::EntityDestroyed { id: 10, team: None });

        assert_eq!(bus.events().len(), 3);
        assert_eq!(bus.events_for(Team(0)).count(), 1);
        assert_eq!(bus.events_for(Team(1)).count(), 1);

        bus.clear();
        assert!(bus.events().is_empty());
    }
}
