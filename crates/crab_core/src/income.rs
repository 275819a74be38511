//! Worker allocation between wood and stone.

use std::collections::{BTreeMap, BTreeSet};

use crate::components::{EntityId, ResourceKind};
use crate::events::AiEvent;
use crate::knowledge::WorldKnowledge;
use crate::math::Fixed;
use crate::strategy::StrategyManager;

/// Result of trying to put one crab to work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    /// Sent to a node of this resource.
    Assigned(ResourceKind),
    /// The crab already has something to do.
    NotIdle,
    /// No base or no reachable node; try again later.
    Deferred,
}

/// A worker's standing job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Duty {
    resource: ResourceKind,
    node: EntityId,
}

/// Keeps unarmed crabs gathering at the strategy's target ratio.
///
/// Crabs handed out through [`IncomeManager::get_spare_crab`] are reserved
/// until a construction finishes or they fall idle with nothing queued.
#[derive(Debug, Clone)]
pub struct IncomeManager {
    wood_workers: Vec<EntityId>,
    stone_workers: Vec<EntityId>,
    duties: BTreeMap<EntityId, Duty>,
    reserved: BTreeSet<EntityId>,
    recheck: bool,
    known_workers: usize,
}

impl Default for IncomeManager {
    fn default() -> Self {
        Self::new()
    }
}

impl IncomeManager {
    /// Empty manager that will look for idle workers on its first tick.
    #[must_use]
    pub fn new() -> Self {
        Self {
            wood_workers: Vec::new(),
            stone_workers: Vec::new(),
            duties: BTreeMap::new(),
            reserved: BTreeSet::new(),
            recheck: true,
            known_workers: 0,
        }
    }

    /// Crabs gathering wood, in assignment order.
    #[must_use]
    pub fn wood_workers(&self) -> &[EntityId] {
        &self.wood_workers
    }

    /// Crabs gathering stone, in assignment order.
    #[must_use]
    pub fn stone_workers(&self) -> &[EntityId] {
        &self.stone_workers
    }

    /// Resource `crab` is assigned to, if any.
    #[must_use]
    pub fn duty_of(&self, crab: EntityId) -> Option<ResourceKind> {
        self.duties.get(&crab).map(|duty| duty.resource)
    }

    /// Whether `crab` was handed out as a spare.
    #[must_use]
    pub fn is_reserved(&self, crab: EntityId) -> bool {
        self.reserved.contains(&crab)
    }

    /// React to a world notification.
    pub fn on_event(&mut self, event: &AiEvent) {
        if let AiEvent::ConstructionFinished { .. } = event {
            self.reserved.clear();
            self.recheck = true;
        }
    }

    /// Resource the next worker should gather.
    ///
    /// Fills an empty category first, then compares wood:stone against
    /// `ratio`. An exact match goes to stone.
    #[must_use]
    pub fn pick_resource(&self, ratio: Fixed) -> ResourceKind {
        let wood = self.wood_workers.len();
        let stone = self.stone_workers.len();
        if wood == 0 {
            ResourceKind::Wood
        } else if stone == 0 {
            ResourceKind::Stone
        } else if Fixed::from_num(wood) / Fixed::from_num(stone) < ratio {
            ResourceKind::Wood
        } else {
            ResourceKind::Stone
        }
    }

    /// Put `crab` to work if it is idle.
    pub fn assign(
        &mut self,
        crab: EntityId,
        knowledge: &mut WorldKnowledge,
        strategy: &mut StrategyManager,
    ) -> Assignment {
        if knowledge.is_busy(crab) {
            return Assignment::NotIdle;
        }
        let preferred = self.pick_resource(strategy.strategy().target_ratio());
        self.place(crab, preferred, knowledge, strategy)
    }

    fn place(
        &mut self,
        crab: EntityId,
        preferred: ResourceKind,
        knowledge: &mut WorldKnowledge,
        strategy: &mut StrategyManager,
    ) -> Assignment {
        if knowledge.base().is_none() {
            return Assignment::Deferred;
        }
        let Some(from) = knowledge.position(crab) else {
            return Assignment::Deferred;
        };
        let other = match preferred {
            ResourceKind::Wood => ResourceKind::Stone,
            ResourceKind::Stone => ResourceKind::Wood,
        };
        let Some((resource, node)) = [preferred, other].into_iter().find_map(|resource| {
            knowledge
                .nearest_in(knowledge.nodes(resource), from)
                .map(|(node, _)| (resource, node))
        }) else {
            return Assignment::Deferred;
        };

        self.release(crab);
        match resource {
            ResourceKind::Wood => self.wood_workers.push(crab),
            ResourceKind::Stone => self.stone_workers.push(crab),
        }
        self.duties.insert(crab, Duty { resource, node });
        strategy.start_collect(crab, node);
        knowledge.mark_busy(crab, true);
        tracing::trace!(crab, node, ?resource, "Worker assigned");
        Assignment::Assigned(resource)
    }

    fn release(&mut self, crab: EntityId) -> Option<Duty> {
        let duty = self.duties.remove(&crab)?;
        match duty.resource {
            ResourceKind::Wood => self.wood_workers.retain(|&id| id != crab),
            ResourceKind::Stone => self.stone_workers.retain(|&id| id != crab),
        }
        Some(duty)
    }

    /// Take a worker off the larger category for other work.
    ///
    /// Never empties a category: the larger one must hold more than one
    /// crab. Wood gives up a crab when the two are level.
    pub fn get_spare_crab(&mut self) -> Option<EntityId> {
        let pool = if self.wood_workers.len() >= self.stone_workers.len() {
            &mut self.wood_workers
        } else {
            &mut self.stone_workers
        };
        if pool.len() <= 1 {
            return None;
        }
        let crab = pool.pop()?;
        self.duties.remove(&crab);
        self.reserved.insert(crab);
        tracing::debug!(crab, "Spare worker released");
        Some(crab)
    }

    /// Per-tick upkeep: drop the dead, re-home workers whose node vanished
    /// and put idle crabs to work.
    pub fn tick(&mut self, knowledge: &mut WorldKnowledge, strategy: &mut StrategyManager) {
        let gone: Vec<EntityId> = self
            .duties
            .keys()
            .copied()
            .filter(|&crab| !knowledge.unarmed_allies().contains(crab))
            .collect();
        for crab in gone {
            self.release(crab);
        }
        self.reserved
            .retain(|&crab| knowledge.unarmed_allies().contains(crab));

        let stranded: Vec<(EntityId, Duty)> = self
            .duties
            .iter()
            .map(|(&crab, &duty)| (crab, duty))
            .filter(|&(crab, duty)| {
                !knowledge.exists(duty.node)
                    || (!knowledge.is_busy(crab) && !strategy.queue().has_pending_for(crab))
            })
            .collect();
        for (crab, duty) in stranded {
            self.release(crab);
            if self.place(crab, duty.resource, knowledge, strategy) == Assignment::Deferred {
                self.recheck = true;
            }
        }

        let idle_reserved: Vec<EntityId> = self
            .reserved
            .iter()
            .copied()
            .filter(|&crab| !knowledge.is_busy(crab) && !strategy.queue().has_pending_for(crab))
            .collect();
        if !idle_reserved.is_empty() {
            for crab in idle_reserved {
                self.reserved.remove(&crab);
            }
            self.recheck = true;
        }

        let workers = knowledge.unarmed_allies().len();
        if workers > self.known_workers {
            self.recheck = true;
        }
        self.known_workers = workers;

        if self.recheck {
            self.recheck = false;
            let idle: Vec<EntityId> = knowledge
                .unarmed_allies()
                .iter()
                .filter(|crab| !self.duties.contains_key(crab) && !self.reserved.contains(crab))
                .collect();
            for crab in idle {
                if self.assign(crab, knowledge, strategy) == Assignment::Deferred {
                    self.recheck = true;
                }
            }
        }
    }
}
