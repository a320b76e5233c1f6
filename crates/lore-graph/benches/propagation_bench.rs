//! Criterion benchmarks for staleness propagation.
//!
//! Targets:
//! - mark_stale over a 500-node chain < 5ms
//! - mark_stale over 100 interlocked cycles < 10ms

use criterion::{criterion_group, criterion_main, Criterion};

use lore_core::types::EntityId;
use lore_graph::{mark_stale, DependencyGraph, DependencyKind};

fn id(n: usize) -> EntityId {
    EntityId::new(format!("entity-{n}"))
}

fn chain_graph(len: usize) -> DependencyGraph {
    let mut graph = DependencyGraph::new();
    for n in 1..len {
        graph.add_edge(&id(n), &id(n - 1), DependencyKind::DependsOn);
    }
    graph
}

fn cyclic_graph(cycles: usize) -> DependencyGraph {
    let mut graph = DependencyGraph::new();
    for c in 0..cycles {
        let a = c * 3;
        // Three-node cycle chained to the previous one.
        graph.add_edge(&id(a + 1), &id(a), DependencyKind::DependsOn);
        graph.add_edge(&id(a + 2), &id(a + 1), DependencyKind::DependsOn);
        graph.add_edge(&id(a), &id(a + 2), DependencyKind::DependsOn);
        if c > 0 {
            graph.add_edge(&id(a), &id(a - 1), DependencyKind::DependsOn);
        }
    }
    graph
}

fn bench_chain_propagation(c: &mut Criterion) {
    c.bench_function("mark_stale_chain_500", |bench| {
        bench.iter_batched(
            || chain_graph(500),
            |mut graph| mark_stale(&mut graph, &id(0)).unwrap(),
            criterion::BatchSize::SmallInput,
        )
    });
}

fn bench_cyclic_propagation(c: &mut Criterion) {
    c.bench_function("mark_stale_100_cycles", |bench| {
        bench.iter_batched(
            || cyclic_graph(100),
            |mut graph| mark_stale(&mut graph, &id(0)).unwrap(),
            criterion::BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_chain_propagation, bench_cyclic_propagation);
criterion_main!(benches);
