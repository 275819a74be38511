//! Knowledge refresh and full-tick benchmarks for crab_core.
//!
//! Run with: `cargo bench -p crab_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use crab_core::components::{Building, Crab, ResourceKind, Team, WeaponKind};
use crab_core::config::AiConfig;
use crab_core::knowledge::WorldKnowledge;
use crab_core::math::Vec2Fixed;
use crab_core::simulation::Simulation;
use crab_core::world::World;

fn crowded_world(crabs: i32) -> World {
    let mut world = World::default();
    world.spawn_building(Team(0), Vec2Fixed::ZERO, Building::castle(100, 100));
    world.spawn_building(Team(1), Vec2Fixed::from_units(80, 0), Building::castle(100, 100));
    for i in 0..crabs {
        world.spawn_resource(Vec2Fixed::from_units(i % 40, 30), ResourceKind::Wood, 500);
        world.spawn_crab(Team(0), Vec2Fixed::from_units(i % 20, i / 20), Crab::worker());
        world.spawn_crab(Team(1), Vec2Fixed::from_units(80 - i % 20, i / 20), Crab::soldier(WeaponKind::Spear));
    }
    world
}

/// Full-scan refresh cost as the world grows.
pub fn refresh_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("knowledge_refresh");
    for size in [50, 200, 800] {
        let world = crowded_world(size);
        let mut knowledge = WorldKnowledge::new(Team(0), AiConfig::default().zones);
        group.bench_with_input(BenchmarkId::from_parameter(size), &world, |b, world| {
            b.iter(|| knowledge.refresh(black_box(world)));
        });
    }
    group.finish();
}

/// One simulation tick with two AI players.
pub fn tick_benchmark(c: &mut Criterion) {
    let mut sim = Simulation::new(crowded_world(200));
    let _ = sim.add_player(Team(0), &AiConfig::default());
    let _ = sim.add_player(Team(1), &AiConfig::default());
    c.bench_function("simulation_tick_200", |b| b.iter(|| sim.tick()));
}

criterion_group!(benches, refresh_benchmark, tick_benchmark);
criterion_main!(benches);
