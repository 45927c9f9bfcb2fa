//! Tick throughput benchmark on a developed mid-game world

use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};

use eraforge::catalog::standard::standard_catalog;
use eraforge::core::config::EngineConfig;
use eraforge::sim::tick::run_tick;
use eraforge::sim::world::GameWorld;

fn developed_world() -> GameWorld {
    let catalog = Arc::new(standard_catalog().expect("standard catalog"));
    let mut world = GameWorld::new(catalog, EngineConfig::default());

    world.resources.add("food", 150.0);
    world.resources.add("wood", 150.0);
    for _ in 0..4 {
        world.build_building("hut").expect("hut");
    }
    world.build_building("farm").expect("farm");
    world.build_building("lumber_camp").expect("lumber_camp");
    world.recruit_villager("villager", 8).expect("recruit");
    world.assign_villager("villager", "food", 4).expect("assign");
    world.assign_villager("villager", "wood", 4).expect("assign");
    run_tick(&mut world);
    world
}

fn bench_tick(c: &mut Criterion) {
    let mut world = developed_world();
    c.bench_function("tick_developed_world", |b| {
        b.iter(|| {
            run_tick(&mut world);
            world.drain_events()
        })
    });

    c.bench_function("rate_recomposition", |b| {
        let world = developed_world();
        b.iter(|| {
            eraforge::sim::rates::compose(
                &world.catalog,
                &world.buildings,
                &world.population,
                &world.events,
                &world.combined_bonuses(),
            )
        })
    });
}

criterion_group!(benches, bench_tick);
criterion_main!(benches);
