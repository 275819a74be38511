//! End-to-end behaviour of the AI pipeline against the entity layer.

use crab_core::ai::AiPlayer;
use crab_core::command::{Command, CommandQueue};
use crab_core::components::{BuildingKind, Entity, EntityId, ResourceKind, WeaponKind};
use crab_core::config::{AiConfig, WorldRules};
use crab_core::executor::CommandExecutor;
use crab_core::knowledge::WorldKnowledge;
use crab_core::math::Fixed;
use crab_core::production::Construction;
use crab_core::simulation::{tick_delta, Simulation, TICK_RATE};
use crab_core::tactics::TacticsManager;
use crab_core::world::World;
use crab_test_utils::determinism::verify_simulation_determinism;
use crab_test_utils::fixtures::{base_with_workers, fixed, mirrored_skirmish, pos, WorldBuilder, BLUE, RED};
use crab_test_utils::proptest::prelude::*;

fn seconds(s: u64) -> u64 {
    s * u64::from(TICK_RATE)
}

fn owned(sim: &Simulation, team: crab_core::components::Team, kind: BuildingKind) -> usize {
    sim.world()
        .scan()
        .filter(|e| e.is_owned_by(team))
        .filter_map(Entity::as_building)
        .filter(|b| b.kind == kind)
        .count()
}

#[test]
fn test_commands_run_in_fifo_order() {
    let (mut world, ids) = WorldBuilder::new()
        .node(ResourceKind::Wood, pos(5, 0), 100)
        .workers(RED, pos(0, 0), 3)
        .build();
    let node = ids[0];
    let order = [
        Command::Collect { crab: ids[1], node },
        Command::Stop { crab: ids[2] },
        Command::Collect { crab: ids[3], node },
        Command::Stop { crab: ids[1] },
    ];
    let mut queue = CommandQueue::new();
    for command in &order {
        queue.push(command.clone());
    }

    let mut executor = CommandExecutor::new();
    let mut ran = Vec::new();
    while let Some((command, result)) = executor.execute_next(&mut queue, &mut world) {
        assert!(result.is_ok());
        ran.push(command);
    }
    assert_eq!(ran, order);
    assert_eq!(executor.stats().executed, 4);
}

#[test]
fn test_build_order_is_followed_to_the_end() {
    let config = AiConfig {
        build_order: vec![BuildingKind::Wall, BuildingKind::House],
        ..AiConfig::default()
    };
    let mut sim = Simulation::new(base_with_workers(6, 200, 200));
    sim.add_player(RED, &config).expect("valid config");
    sim.run(seconds(60));

    let player = sim.player(RED).expect("player");
    assert_eq!(
        player.strategy().strategy().completed(),
        &[BuildingKind::Wall, BuildingKind::House]
    );
    assert!(player.strategy().strategy().is_exhausted());
    assert_eq!(owned(&sim, RED, BuildingKind::Wall), 1);
    assert_eq!(owned(&sim, RED, BuildingKind::House), 1);
}

#[test]
fn test_unaffordable_goal_stalls_until_gathered() {
    let config = AiConfig {
        build_order: vec![BuildingKind::Tower],
        ..AiConfig::default()
    };
    let mut sim = Simulation::new(base_with_workers(4, 0, 0));
    sim.add_player(RED, &config).expect("valid config");
    sim.run(seconds(2));
    assert_eq!(owned(&sim, RED, BuildingKind::Tower), 0);
    assert!(!sim.world().scan().any(|e| e.as_ghost().is_some()));

    sim.run(seconds(120));
    assert_eq!(owned(&sim, RED, BuildingKind::Tower), 1);
}

/// Tick one AI player against `world`, keeping every accepted command.
fn drive(
    world: &mut World,
    player: &mut AiPlayer,
    accepted: &mut Vec<Command>,
    until: impl Fn(&World, &AiPlayer) -> bool,
) {
    for _ in 0..seconds(120) {
        if until(world, player) {
            return;
        }
        if let Some((command, Ok(()))) = player.tick(world, tick_delta()) {
            accepted.push(command);
        }
        world.step(tick_delta());
    }
    panic!("condition not reached in time");
}

fn ghost_progress(world: &World, ghost: EntityId) -> Option<Fixed> {
    world.get(ghost).and_then(Entity::as_ghost).map(|g| g.progress)
}

#[test]
fn test_abandoned_site_is_finished_by_another_worker() {
    let mut rules = WorldRules::default();
    rules.build_seconds.insert(BuildingKind::Tower, 12);
    let (mut world, _) = WorldBuilder::with_rules(rules)
        .castle(RED, pos(0, 0), 100, 100)
        .building(RED, BuildingKind::Tower, pos(-20, -20))
        .node(ResourceKind::Wood, pos(10, 0), 1_000)
        .node(ResourceKind::Stone, pos(0, 10), 1_000)
        .workers(RED, pos(0, 0), 6)
        .build();
    let config = AiConfig {
        build_order: vec![BuildingKind::Tower],
        arm_workers: false,
        ..AiConfig::default()
    };
    let mut player = AiPlayer::new(RED, &config);
    let mut accepted = Vec::new();

    drive(&mut world, &mut player, &mut accepted, |world, player| {
        matches!(
            player.production().construction(),
            Construction::Underway { site: Some(ghost), .. }
                if ghost_progress(world, ghost).is_some_and(|p| p >= fixed(1))
        )
    });
    let Construction::Underway { builder, site: Some(ghost), .. } = player.production().construction() else {
        unreachable!()
    };
    world.destroy(builder);

    drive(&mut world, &mut player, &mut accepted, |_, player| {
        player.strategy().strategy().is_exhausted()
    });

    assert!(accepted.iter().any(
        |c| matches!(c, Command::BuildFromGhost { crab, ghost: site } if *site == ghost && *crab != builder)
    ));
    assert_eq!(player.strategy().strategy().completed(), &[BuildingKind::Tower]);
    assert!(!world.contains(ghost));
    let towers = world
        .scan()
        .filter_map(Entity::as_building)
        .filter(|b| b.kind == BuildingKind::Tower)
        .count();
    assert_eq!(towers, 2);
}

#[test]
fn test_defenders_answer_a_raid() {
    let (world, ids) = WorldBuilder::new()
        .castle(RED, pos(0, 0), 0, 0)
        .soldiers(RED, pos(2, 0), WeaponKind::Hammer, 4)
        .soldiers(BLUE, pos(4, 0), WeaponKind::Spear, 1)
        .build();
    let raider = ids[5];
    let config = AiConfig {
        build_order: vec![],
        ..AiConfig::default()
    };
    let mut sim = Simulation::new(world);
    sim.add_player(RED, &config).expect("valid config");
    sim.run(seconds(10));
    assert!(!sim.world().contains(raider));
}

#[test]
fn test_mirrored_match_is_deterministic() {
    let setup = || {
        let mut sim = Simulation::new(mirrored_skirmish(5));
        sim.add_player(RED, &AiConfig::default()).expect("valid config");
        sim.add_player(BLUE, &AiConfig::default()).expect("valid config");
        sim
    };
    verify_simulation_determinism(setup, 2, seconds(30)).assert_deterministic();
}

#[test]
fn test_full_match_smoke() {
    let mut sim = Simulation::new(mirrored_skirmish(6));
    sim.add_player(RED, &AiConfig::default()).expect("valid config");
    sim.add_player(BLUE, &AiConfig::default()).expect("valid config");
    sim.run(seconds(150));

    for team in [RED, BLUE] {
        let player = sim.player(team).expect("player");
        assert!(player.stats().executed > 0);
        assert_eq!(
            player.strategy().strategy().completed().first(),
            Some(&BuildingKind::Armoury)
        );
        assert!(player.knowledge().is_consistent());
    }
}

proptest! {
    /// Squads are always exactly full and the remainder is left out.
    #[test]
    fn prop_squads_never_exceed_capacity(units in 0..40_usize, size in 1..8_usize) {
        let (world, _) = WorldBuilder::new()
            .soldiers(RED, pos(0, 0), WeaponKind::Bow, units)
            .build();
        let mut knowledge = WorldKnowledge::new(RED, AiConfig::default().zones);
        knowledge.refresh(&world);
        let mut tactics = TacticsManager::new(size);
        tactics.tick(&knowledge);

        prop_assert_eq!(tactics.squads().len(), units / size);
        for squad in tactics.squads() {
            prop_assert_eq!(squad.len(), size);
            prop_assert!(squad.len() <= squad.target_size());
        }
    }
}
