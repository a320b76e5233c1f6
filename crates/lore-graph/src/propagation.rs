//! Staleness propagation with SCC collapse and durability boundaries.
//!
//! Propagation walks incoming edges (dependents) from the changed
//! entity. Strongly-connected components are collapsed first and each
//! component is invalidated atomically, so mutual imports cannot loop
//! the walk. An all-`Immutable` component stops the wave unless it
//! contains the seed: the seed's own content changed, so the seed is
//! always included.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::algo::tarjan_scc;
use petgraph::stable_graph::NodeIndex;
use petgraph::Direction;

use lore_core::constants::MAX_GRAPH_TRAVERSAL_DEPTH;
use lore_core::errors::LoreResult;
use lore_core::models::Durability;
use lore_core::types::EntityId;

use crate::graph::DependencyGraph;

/// Mark `seed` and its transitive dependents stale. Returns the
/// entities that were not already stale, in deterministic order.
pub fn mark_stale(graph: &mut DependencyGraph, seed: &EntityId) -> LoreResult<Vec<EntityId>> {
    let seed_idx = graph.require(seed)?;

    let components = tarjan_scc(&graph.graph);
    let mut component_of: HashMap<NodeIndex, usize> = HashMap::new();
    for (comp, members) in components.iter().enumerate() {
        if members.len() > 1 {
            tracing::debug!(
                size = members.len(),
                "dependency cycle collapsed into one invalidation unit"
            );
        }
        for &idx in members {
            component_of.insert(idx, comp);
        }
    }

    let seed_comp = component_of[&seed_idx];
    let mut visited: HashSet<usize> = HashSet::new();
    let mut queue: VecDeque<(usize, usize)> = VecDeque::new();
    visited.insert(seed_comp);
    queue.push_back((seed_comp, 0));

    let mut reached: Vec<NodeIndex> = Vec::new();
    while let Some((comp, depth)) = queue.pop_front() {
        reached.extend(components[comp].iter().copied());
        if depth >= MAX_GRAPH_TRAVERSAL_DEPTH {
            tracing::debug!(depth, "propagation depth cap reached, stopping expansion");
            continue;
        }
        for &member in &components[comp] {
            for dependent in graph.graph.neighbors_directed(member, Direction::Incoming) {
                let next = component_of[&dependent];
                if visited.contains(&next) {
                    continue;
                }
                if is_boundary(graph, &components[next]) {
                    visited.insert(next);
                    tracing::debug!("immutable boundary stopped propagation");
                    continue;
                }
                visited.insert(next);
                queue.push_back((next, depth + 1));
            }
        }
    }

    let ids: Vec<EntityId> = reached
        .into_iter()
        .filter_map(|idx| graph.graph.node_weight(idx))
        .map(|node| node.entity_id.clone())
        .collect();

    let mut newly: Vec<EntityId> = ids.into_iter().filter(|id| graph.mark(id.clone())).collect();
    newly.sort();
    Ok(newly)
}

/// A component is a boundary when every member is immutable. A single
/// volatile member anywhere in a cycle drags the whole unit along.
fn is_boundary(graph: &DependencyGraph, members: &[NodeIndex]) -> bool {
    members
        .iter()
        .filter_map(|&idx| graph.graph.node_weight(idx))
        .all(|node| node.durability == Durability::Immutable)
}

/// Multi-node SCCs currently in the graph. Diagnostic only; cycles are
/// legal input.
pub fn find_cycles(graph: &DependencyGraph) -> Vec<Vec<EntityId>> {
    tarjan_scc(&graph.graph)
        .into_iter()
        .filter(|scc| scc.len() > 1)
        .map(|scc| {
            let mut ids: Vec<EntityId> = scc
                .into_iter()
                .filter_map(|idx| graph.graph.node_weight(idx))
                .map(|node| node.entity_id.clone())
                .collect();
            ids.sort();
            ids
        })
        .collect()
}
