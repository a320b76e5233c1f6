//! Property tests: propagation terminates and is idempotent on
//! arbitrary graphs, cycles included.

use proptest::prelude::*;

use lore_core::types::EntityId;
use lore_graph::{mark_stale, DependencyGraph, DependencyKind};

fn build_graph(edges: &[(u8, u8)]) -> DependencyGraph {
    let mut graph = DependencyGraph::new();
    for (from, to) in edges {
        if from == to {
            continue;
        }
        graph.add_edge(
            &EntityId::new(format!("e{from}")),
            &EntityId::new(format!("e{to}")),
            DependencyKind::DependsOn,
        );
    }
    graph
}

proptest! {
    /// Whatever the topology, propagation finishes and never reports
    /// more entities than the graph holds.
    #[test]
    fn prop_propagation_terminates(
        edges in prop::collection::vec((0u8..20, 0u8..20), 1..80)
    ) {
        let mut graph = build_graph(&edges);
        let seed = EntityId::new(format!("e{}", edges[0].0));
        if seed == EntityId::new(format!("e{}", edges[0].1)) {
            return Ok(());
        }

        let newly = mark_stale(&mut graph, &seed).unwrap();
        prop_assert!(newly.len() <= graph.node_count());
        prop_assert!(graph.is_stale(&seed), "seed is always included");
    }

    /// Marking the same seed twice adds nothing the second time.
    #[test]
    fn prop_propagation_is_idempotent(
        edges in prop::collection::vec((0u8..15, 0u8..15), 1..60)
    ) {
        let mut graph = build_graph(&edges);
        let seed = EntityId::new(format!("e{}", edges[0].0));
        if !graph.contains(&seed) {
            return Ok(());
        }

        let first = mark_stale(&mut graph, &seed).unwrap();
        let second = mark_stale(&mut graph, &seed).unwrap();
        prop_assert!(second.is_empty());
        prop_assert_eq!(graph.stale_set().len(), first.len());
    }
}
