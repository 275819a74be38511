//! Squad formation and attack launching.

use crate::components::EntityId;
use crate::knowledge::WorldKnowledge;
use crate::strategy::StrategyManager;

/// A fixed-capacity group of armed crabs.
///
/// Dead members are first blanked out, then compacted by
/// [`Squad::clean_unit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Squad {
    members: Vec<Option<EntityId>>,
    target_size: usize,
}

impl Squad {
    /// A squad holding `members`, which must not exceed `target_size`.
    #[must_use]
    pub fn new(members: &[EntityId], target_size: usize) -> Self {
        debug_assert!(members.len() <= target_size, "squad over capacity");
        Self {
            members: members.iter().copied().map(Some).collect(),
            target_size,
        }
    }

    /// Live members in slot order.
    pub fn members(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.members.iter().flatten().copied()
    }

    /// Number of live members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.iter().flatten().count()
    }

    /// Whether every slot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Configured capacity.
    #[must_use]
    pub const fn target_size(&self) -> usize {
        self.target_size
    }

    /// Whether `id` is a live member.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.members.contains(&Some(id))
    }

    /// Blank out `id`'s slot. Returns whether it was a member.
    pub fn mark_destroyed(&mut self, id: EntityId) -> bool {
        match self.members.iter_mut().find(|slot| **slot == Some(id)) {
            Some(slot) => {
                *slot = None;
                true
            }
            None => false,
        }
    }

    /// Drop blanked slots.
    pub fn clean_unit(&mut self) {
        self.members.retain(Option::is_some);
    }
}

/// Partitions owned combat crabs into squads and sends them to fight.
#[derive(Debug, Clone)]
pub struct TacticsManager {
    squad_size: usize,
    squads: Vec<Squad>,
    known_count: usize,
}

impl TacticsManager {
    /// Manager forming squads of `squad_size`.
    #[must_use]
    pub fn new(squad_size: usize) -> Self {
        Self {
            squad_size: squad_size.max(1),
            squads: Vec::new(),
            known_count: 0,
        }
    }

    /// Current squads.
    #[must_use]
    pub fn squads(&self) -> &[Squad] {
        &self.squads
    }

    /// Reconcile squads with the owned combat crabs.
    ///
    /// Growth rebuilds every squad from scratch in scan order and leaves
    /// any remainder unassigned. Shrinkage only removes the dead.
    pub fn tick(&mut self, knowledge: &WorldKnowledge) {
        let armed = knowledge.armed_allies();
        let count = armed.len();
        if count > self.known_count {
            self.squads = armed
                .as_slice()
                .chunks_exact(self.squad_size)
                .map(|chunk| Squad::new(chunk, self.squad_size))
                .collect();
            tracing::debug!(
                units = count,
                squads = self.squads.len(),
                unassigned = count % self.squad_size,
                "Squads re-formed"
            );
        } else if count < self.known_count {
            for squad in &mut self.squads {
                let lost: Vec<EntityId> = squad.members().filter(|&id| !armed.contains(id)).collect();
                for id in lost {
                    squad.mark_destroyed(id);
                }
                squad.clean_unit();
            }
            self.squads.retain(|squad| !squad.is_empty());
        }
        self.known_count = count;
    }

    /// Queue an attack on `target` for every member of the first `squads`
    /// squads. Returns the number of orders issued.
    pub fn launch_attack(&self, squads: usize, target: EntityId, strategy: &mut StrategyManager) -> usize {
        let mut issued = 0;
        for squad in self.squads.iter().take(squads) {
            for crab in squad.members() {
                strategy.start_attack(crab, target);
                issued += 1;
            }
        }
        issued
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Crab, Team, WeaponKind};
    use crate::config::AiConfig;
    use crate::math::Vec2Fixed;
    use crate::world::World;

    const RED: Team = Team(0);

    fn armed(world: &mut World, n: usize) -> Vec<EntityId> {
        (0..n)
            .map(|_| world.spawn_crab(RED, Vec2Fixed::ZERO, Crab::soldier(WeaponKind::Hammer)))
            .collect()
    }

    fn knowledge_of(world: &World) -> WorldKnowledge {
        let mut knowledge = WorldKnowledge::new(RED, AiConfig::default().zones);
        knowledge.refresh(world);
        knowledge
    }

    #[test]
    fn test_squad_mark_and_clean() {
        let mut squad = Squad::new(&[1, 2, 3], 4);
        assert!(squad.mark_destroyed(2));
        assert!(!squad.mark_destroyed(9));
        assert_eq!(squad.len(), 2);
        squad.clean_unit();
        assert_eq!(squad.members().collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn test_remainder_is_left_unassigned() {
        let mut world = World::default();
        let crabs = armed(&mut world, 10);
        let mut tactics = TacticsManager::new(4);
        tactics.tick(&knowledge_of(&world));

        assert_eq!(tactics.squads().len(), 2);
        assert!(tactics.squads().iter().all(|s| s.len() == 4));
        assert!(!tactics.squads().iter().any(|s| s.contains(crabs[8]) || s.contains(crabs[9])));
    }

    #[test]
    fn test_growth_repartitions_in_scan_order() {
        let mut world = World::default();
        let crabs = armed(&mut world, 3);
        let mut tactics = TacticsManager::new(4);
        tactics.tick(&knowledge_of(&world));
        assert!(tactics.squads().is_empty());

        let more = armed(&mut world, 1);
        tactics.tick(&knowledge_of(&world));
        let members: Vec<_> = tactics.squads()[0].members().collect();
        assert_eq!(members, vec![crabs[0], crabs[1], crabs[2], more[0]]);
    }

    #[test]
    fn test_shrink_prunes_without_repartition() {
        let mut world = World::default();
        let crabs = armed(&mut world, 8);
        let mut tactics = TacticsManager::new(4);
        tactics.tick(&knowledge_of(&world));

        world.destroy(crabs[1]);
        tactics.tick(&knowledge_of(&world));
        assert_eq!(tactics.squads().len(), 2);
        assert_eq!(tactics.squads()[0].len(), 3);
        assert_eq!(tactics.squads()[1].len(), 4);
    }

    #[test]
    fn test_launch_attack_limits_squads() {
        let mut world = World::default();
        armed(&mut world, 8);
        let mut tactics = TacticsManager::new(4);
        tactics.tick(&knowledge_of(&world));

        let mut strategy = StrategyManager::new(RED, &AiConfig::default());
        assert_eq!(tactics.launch_attack(1, 99, &mut strategy), 4);
        assert_eq!(tactics.launch_attack(5, 99, &mut strategy), 8);
        assert_eq!(strategy.queue().len(), 12);
    }
}
