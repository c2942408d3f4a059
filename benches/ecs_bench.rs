#![allow(dead_code)]
//! Core operation benchmarks: spawn, flush, despawn, query iteration.
//!
//! Run with: cargo bench

use archetype_ecs::{QueryState, World};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};

#[derive(Debug, Copy, Clone)]
struct Position {
    x: f32,
    y: f32,
    z: f32,
}

#[derive(Debug, Copy, Clone)]
struct Velocity {
    x: f32,
    y: f32,
    z: f32,
}

#[derive(Debug, Copy, Clone)]
struct Health(u32);

fn bench_spawn(c: &mut Criterion) {
    let mut group = c.benchmark_group("spawn");

    group.bench_function("spawn_1k_single_component", |b| {
        b.iter(|| {
            let mut world = World::new();
            for i in 0..1_000 {
                world.spawn((Position { x: i as f32, y: 0.0, z: 0.0 },));
            }
            world.flush();
        });
    });

    group.bench_function("spawn_1k_three_components", |b| {
        b.iter(|| {
            let mut world = World::new();
            for i in 0..1_000 {
                world.spawn((
                    Position { x: i as f32, y: 0.0, z: 0.0 },
                    Velocity { x: 1.0, y: 0.0, z: 0.0 },
                    Health(100),
                ));
            }
            world.flush();
        });
    });

    group.finish();
}

fn bench_spawn_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("spawn_batch");

    for count in [1_000, 10_000, 100_000] {
        group.bench_with_input(BenchmarkId::new("spawn_batch_3_components", count), &count, |b, &count| {
            b.iter(|| {
                let mut world = World::new();
                let bundles = (0..count).map(|i| {
                    (Position { x: i as f32, y: 0.0, z: 0.0 }, Velocity { x: 1.0, y: 0.0, z: 0.0 }, Health(100))
                });
                let _ = world.spawn_batch(bundles);
                world.flush();
            });
        });
    }

    group.finish();
}

fn bench_despawn(c: &mut Criterion) {
    c.bench_function("despawn_1k_entities", |b| {
        b.iter_batched(
            || {
                let mut world = World::new();
                let entities: Vec<_> = (0..1_000)
                    .map(|i| world.spawn((Position { x: i as f32, y: 0.0, z: 0.0 }, Health(100))))
                    .collect();
                world.flush();
                (world, entities)
            },
            |(mut world, entities)| {
                for entity in entities {
                    world.despawn(entity);
                }
                world.flush();
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_archetype_segregation(c: &mut Criterion) {
    c.bench_function("archetype_segregation_1k", |b| {
        b.iter(|| {
            let mut world = World::new();
            for i in 0..250 {
                world.spawn((Position { x: i as f32, y: 0.0, z: 0.0 }, Velocity { x: 1.0, y: 0.0, z: 0.0 }));
            }
            for i in 0..250 {
                world.spawn((Position { x: i as f32, y: 0.0, z: 0.0 }, Health(100)));
            }
            for i in 0..250 {
                world.spawn((
                    Position { x: i as f32, y: 0.0, z: 0.0 },
                    Velocity { x: 1.0, y: 0.0, z: 0.0 },
                    Health(100),
                ));
            }
            for i in 0..250 {
                world.spawn((Position { x: i as f32, y: 0.0, z: 0.0 },));
            }
            world.flush();
        });
    });
}

fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("query");

    group.bench_function("query_state_creation_10k", |b| {
        let mut world = World::new();
        for i in 0..10_000 {
            world.spawn((
                Position { x: i as f32, y: 0.0, z: 0.0 },
                Velocity { x: 1.0, y: 0.0, z: 0.0 },
                Health(100),
            ));
        }
        world.flush();

        b.iter(|| {
            let _state = QueryState::<(&Position, &Velocity)>::new(&mut world);
        });
    });

    group.bench_function("query_iteration_cached_100k", |b| {
        let mut world = World::new();
        for i in 0..100_000 {
            world.spawn((Position { x: i as f32, y: 0.0, z: 0.0 }, Velocity { x: 1.0, y: 0.0, z: 0.0 }));
        }
        world.flush();

        let mut state = QueryState::<(&mut Position, &Velocity)>::new(&mut world);
        state.query(&mut world).iter().count();

        b.iter(|| {
            for (pos, vel) in state.query(&mut world).iter() {
                pos.x += vel.x;
            }
        });
    });

    group.finish();
}

fn bench_introspection(c: &mut Criterion) {
    c.bench_function("entity_count_10k", |b| {
        let mut world = World::new();
        for i in 0..10_000 {
            world.spawn((Position { x: i as f32, y: 0.0, z: 0.0 },));
        }
        world.flush();

        b.iter(|| {
            black_box(world.entity_count());
        });
    });

    c.bench_function("table_count_mixed", |b| {
        let mut world = World::new();
        for i in 0..100 {
            world.spawn((Position { x: i as f32, y: 0.0, z: 0.0 }, Velocity { x: 1.0, y: 0.0, z: 0.0 }));
        }
        for i in 0..100 {
            world.spawn((Position { x: i as f32, y: 0.0, z: 0.0 }, Health(100)));
        }
        world.flush();

        b.iter(|| {
            black_box(world.table_count());
        });
    });
}

criterion_group!(
    benches,
    bench_spawn,
    bench_spawn_batch,
    bench_despawn,
    bench_archetype_segregation,
    bench_query,
    bench_introspection,
);

criterion_main!(benches);
