//! Build order, resource goals and the top-level orchestrator.
//!
//! [`StrategyManager`] owns the single command queue. Every other manager
//! issues its commands through the `start_*` methods here, so FIFO order
//! across all managers is the only ordering guarantee.

use std::collections::{BTreeMap, VecDeque};

use crate::command::{Command, CommandQueue};
use crate::components::{BuildingKind, Cost, EntityId, Team, WeaponKind};
use crate::config::{AiConfig, GameStage};
use crate::knowledge::WorldKnowledge;
use crate::math::{Fixed, Vec2Fixed};
use crate::tactics::TacticsManager;

/// One building the strategy wants.
///
/// Finished once the owned count of its kind rises above the count seen
/// when the goal was first observed, so repeated entries each need their
/// own building.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildingGoal {
    kind: BuildingKind,
    baseline: Option<usize>,
}

impl BuildingGoal {
    /// A goal for `kind`, baseline not yet observed.
    #[must_use]
    pub const fn new(kind: BuildingKind) -> Self {
        Self {
            kind,
            baseline: None,
        }
    }

    /// Building wanted.
    #[must_use]
    pub const fn kind(&self) -> BuildingKind {
        self.kind
    }

    /// Record the current owned count if this is the first look.
    pub fn observe(&mut self, knowledge: &WorldKnowledge) {
        if self.baseline.is_none() {
            self.baseline = Some(knowledge.buildings_of(self.kind).count());
        }
    }

    /// Whether a new building of this kind has appeared. O(owned buildings).
    #[must_use]
    pub fn is_finished(&self, knowledge: &WorldKnowledge) -> bool {
        self.baseline
            .is_some_and(|baseline| knowledge.buildings_of(self.kind).count() > baseline)
    }
}

/// The build order plus the resource goals derived from it.
#[derive(Debug, Clone)]
pub struct Strategy {
    pending: VecDeque<BuildingKind>,
    current: Option<BuildingGoal>,
    completed: Vec<BuildingKind>,
    total: usize,
    costs: BTreeMap<BuildingKind, Cost>,
    default_ratio: Fixed,
}

impl Strategy {
    /// Build the strategy from config and activate the first goal.
    #[must_use]
    pub fn new(config: &AiConfig) -> Self {
        let mut pending: VecDeque<BuildingKind> = config.build_order.iter().copied().collect();
        let current = pending.pop_front().map(BuildingGoal::new);
        Self {
            pending,
            current,
            completed: Vec::new(),
            total: config.build_order.len(),
            costs: config.costs.clone(),
            default_ratio: config.default_ratio.as_fixed(),
        }
    }

    /// The active goal. `None` once the build order is exhausted.
    #[must_use]
    pub const fn current_goal(&self) -> Option<&BuildingGoal> {
        self.current.as_ref()
    }

    /// Mutable access to the active goal.
    pub fn current_goal_mut(&mut self) -> Option<&mut BuildingGoal> {
        self.current.as_mut()
    }

    /// Mark the active goal done and activate the next entry.
    ///
    /// Returns the kind that was completed.
    pub fn advance(&mut self) -> Option<BuildingKind> {
        let done = self.current.take()?.kind();
        self.completed.push(done);
        self.current = self.pending.pop_front().map(BuildingGoal::new);
        Some(done)
    }

    /// Whether every entry has been built.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.current.is_none()
    }

    /// Entries not yet activated.
    #[must_use]
    pub fn pending(&self) -> &VecDeque<BuildingKind> {
        &self.pending
    }

    /// Goals completed so far, in order.
    #[must_use]
    pub fn completed(&self) -> &[BuildingKind] {
        &self.completed
    }

    /// Length of the original build order.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.total
    }

    /// Price of `kind`.
    #[must_use]
    pub fn cost_of(&self, kind: BuildingKind) -> Cost {
        self.costs.get(&kind).copied().unwrap_or_default()
    }

    /// Cost of the active goal; zero for the exhausted sentinel.
    #[must_use]
    pub fn current_cost(&self) -> Cost {
        self.current
            .map(|goal| self.cost_of(goal.kind()))
            .unwrap_or_default()
    }

    /// Wood wanted for the active goal.
    #[must_use]
    pub fn wood_goal(&self) -> i32 {
        self.current_cost().wood
    }

    /// Stone wanted for the active goal.
    #[must_use]
    pub fn stone_goal(&self) -> i32 {
        self.current_cost().stone
    }

    /// Wood:stone worker ratio the income manager should aim for.
    #[must_use]
    pub fn target_ratio(&self) -> Fixed {
        let cost = self.current_cost();
        if cost.wood > 0 && cost.stone > 0 {
            Fixed::from_num(cost.wood) / Fixed::from_num(cost.stone)
        } else {
            self.default_ratio
        }
    }
}

/// Top-level AI state: command queue, strategy, stage.
#[derive(Debug, Clone)]
pub struct StrategyManager {
    team: Team,
    queue: CommandQueue,
    strategy: Strategy,
    stage: GameStage,
    defense_squads: usize,
}

impl StrategyManager {
    /// Create the manager for `team`.
    #[must_use]
    pub fn new(team: Team, config: &AiConfig) -> Self {
        Self {
            team,
            queue: CommandQueue::new(),
            strategy: Strategy::new(config),
            stage: config.stage,
            defense_squads: config.defense_squads,
        }
    }

    /// Team this manager plays for.
    #[must_use]
    pub const fn team(&self) -> Team {
        self.team
    }

    /// Pending commands.
    #[must_use]
    pub fn queue(&self) -> &CommandQueue {
        &self.queue
    }

    /// Mutable access for the executor.
    pub fn queue_mut(&mut self) -> &mut CommandQueue {
        &mut self.queue
    }

    /// Build order state.
    #[must_use]
    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    /// Mutable build order state.
    pub fn strategy_mut(&mut self) -> &mut Strategy {
        &mut self.strategy
    }

    /// Configured stage.
    #[must_use]
    pub const fn stage(&self) -> GameStage {
        self.stage
    }

    /// Whether some enemy combat crab is in the danger zone.
    #[must_use]
    pub fn is_under_attack(&self, knowledge: &WorldKnowledge) -> bool {
        !knowledge.danger_enemies().is_empty()
    }

    /// Send squads against the first danger-zone enemy.
    ///
    /// Runs every tick the danger zone is occupied; earlier orders are not
    /// checked, so the same response can be queued repeatedly.
    pub fn respond_to_threats(
        &mut self,
        knowledge: &WorldKnowledge,
        tactics: &TacticsManager,
    ) -> usize {
        let Some(target) = knowledge.danger_enemies().first() else {
            return 0;
        };
        let issued = tactics.launch_attack(self.defense_squads, target, self);
        tracing::debug!(team = ?self.team, target, issued, "Base under attack");
        issued
    }

    fn enqueue(&mut self, command: Command) {
        tracing::trace!(team = ?self.team, command = command.name(), "Command queued");
        self.queue.push(command);
    }

    /// Place a site for `kind` and send `crab` to build it.
    pub fn start_build(&mut self, crab: EntityId, kind: BuildingKind, position: Vec2Fixed, cost: Cost) {
        let team = self.team;
        self.enqueue(Command::Build {
            team,
            crab,
            kind,
            position,
            cost,
        });
    }

    /// Send `crab` to an existing site.
    pub fn start_build_from_ghost(&mut self, crab: EntityId, ghost: EntityId) {
        self.enqueue(Command::BuildFromGhost { crab, ghost });
    }

    /// Send `crab` to gather from `node`.
    pub fn start_collect(&mut self, crab: EntityId, node: EntityId) {
        self.enqueue(Command::Collect { crab, node });
    }

    /// Make `crab` drop its task.
    pub fn stop_crab(&mut self, crab: EntityId) {
        self.enqueue(Command::Stop { crab });
    }

    /// Send `crab` inside `building`.
    pub fn enter_building(&mut self, crab: EntityId, building: EntityId) {
        self.enqueue(Command::Enter { crab, building });
    }

    /// Send `crab` against `target`.
    pub fn start_attack(&mut self, crab: EntityId, target: EntityId) {
        self.enqueue(Command::Attack { crab, target });
    }

    /// Start a siege weapon at `workshop`.
    pub fn start_building_siege_weapon(&mut self, workshop: EntityId) {
        self.enqueue(Command::Siege { workshop });
    }

    /// Send `crab` to pick up `weapon` at `armoury`.
    pub fn start_take_weapon(&mut self, crab: EntityId, armoury: EntityId, weapon: WeaponKind) {
        self.enqueue(Command::TakeWeapon {
            crab,
            armoury,
            weapon,
        });
    }

    /// Start crafting `weapon` at `armoury`.
    pub fn start_craft(&mut self, armoury: EntityId, weapon: WeaponKind) {
        self.enqueue(Command::Craft { armoury, weapon });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Building, Crab};
    use crate::world::World;

    const RED: Team = Team(0);

    fn config(order: Vec<BuildingKind>) -> AiConfig {
        AiConfig {
            build_order: order,
            ..AiConfig::default()
        }
    }

    #[test]
    fn test_strategy_consumes_in_order_then_sentinel() {
        let mut strategy = Strategy::new(&config(vec![BuildingKind::Armoury, BuildingKind::Wall]));
        assert_eq!(strategy.current_goal().map(BuildingGoal::kind), Some(BuildingKind::Armoury));
        assert_eq!(strategy.advance(), Some(BuildingKind::Armoury));
        assert_eq!(strategy.current_goal().map(BuildingGoal::kind), Some(BuildingKind::Wall));
        assert_eq!(strategy.advance(), Some(BuildingKind::Wall));
        assert!(strategy.is_exhausted());
        assert_eq!(strategy.advance(), None);
        assert_eq!(strategy.current_cost(), Cost::default());
        assert_eq!(strategy.completed(), &[BuildingKind::Armoury, BuildingKind::Wall]);
    }

    #[test]
    fn test_target_ratio_follows_goal_cost() {
        let mut strategy = Strategy::new(&config(vec![BuildingKind::Tower, BuildingKind::Wall]));
        // Tower costs 20 wood / 40 stone.
        assert_eq!(strategy.target_ratio(), Fixed::from_num(0.5));
        strategy.advance();
        // Wall needs no wood, so the default 2:1 applies.
        assert_eq!(strategy.target_ratio(), Fixed::from_num(2));
        assert_eq!((strategy.wood_goal(), strategy.stone_goal()), (0, 20));
    }

    #[test]
    fn test_goal_needs_a_new_building_of_its_kind() {
        let mut world = World::default();
        world.spawn_building(RED, Vec2Fixed::ZERO, Building::new(BuildingKind::Tower));
        let mut knowledge = WorldKnowledge::new(RED, AiConfig::default().zones);
        knowledge.refresh(&world);

        let mut goal = BuildingGoal::new(BuildingKind::Tower);
        assert!(!goal.is_finished(&knowledge));
        goal.observe(&knowledge);
        assert!(!goal.is_finished(&knowledge));

        world.spawn_building(RED, Vec2Fixed::from_units(5, 0), Building::new(BuildingKind::Tower));
        knowledge.refresh(&world);
        goal.observe(&knowledge);
        assert!(goal.is_finished(&knowledge));
    }

    #[test]
    fn test_issue_methods_enqueue_in_call_order() {
        let mut manager = StrategyManager::new(RED, &AiConfig::default());
        manager.start_collect(1, 2);
        manager.stop_crab(1);
        manager.enter_building(3, 4);
        manager.start_building_siege_weapon(5);
        let names: Vec<_> = manager.queue().iter().map(Command::name).collect();
        assert_eq!(names, vec!["collect", "stop", "enter", "siege"]);
        assert_eq!(manager.stage(), GameStage::Start);
    }

    #[test]
    fn test_threat_response_targets_first_danger_enemy() {
        let mut world = World::default();
        world.spawn_building(RED, Vec2Fixed::ZERO, Building::castle(0, 0));
        let defenders: Vec<_> = (0..4)
            .map(|_| world.spawn_crab(RED, Vec2Fixed::ZERO, Crab::soldier(WeaponKind::Spear)))
            .collect();
        let first = world.spawn_crab(Team(1), Vec2Fixed::from_units(3, 0), Crab::soldier(WeaponKind::Bow));
        world.spawn_crab(Team(1), Vec2Fixed::from_units(1, 0), Crab::soldier(WeaponKind::Bow));

        let config = AiConfig::default();
        let mut knowledge = WorldKnowledge::new(RED, config.zones);
        knowledge.refresh(&world);
        let mut tactics = TacticsManager::new(config.squad_size);
        tactics.tick(&knowledge);
        let mut manager = StrategyManager::new(RED, &config);

        assert!(manager.is_under_attack(&knowledge));
        assert_eq!(manager.respond_to_threats(&knowledge, &tactics), 4);
        let attacks: Vec<_> = manager.queue().iter().cloned().collect();
        let expected: Vec<_> = defenders
            .iter()
            .map(|&crab| Command::Attack { crab, target: first })
            .collect();
        assert_eq!(attacks, expected);

        // No de-duplication: the same response is queued again next tick.
        manager.respond_to_threats(&knowledge, &tactics);
        assert_eq!(manager.queue().len(), 8);
    }
}
