//! petgraph::StableGraph wrapper with entity-id indexed access.

use std::collections::{HashMap, HashSet};

use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::visit::EdgeRef;
use petgraph::{Directed, Direction};

use lore_core::errors::{GraphError, LoreError, LoreResult};
use lore_core::models::Durability;
use lore_core::types::EntityId;

use crate::edges::{DependencyEdge, DependencyKind, DependencyNode};

/// The underlying directed graph type. An edge `a -> b` records that
/// `a` depends on `b`; invalidation flows against edge direction.
pub type DependencyStableGraph = StableGraph<DependencyNode, DependencyEdge, Directed>;

/// Wrapper providing indexed access to the dependency graph plus the
/// current stale set.
pub struct DependencyGraph {
    pub(crate) graph: DependencyStableGraph,
    /// Map from entity id to NodeIndex for O(1) lookup.
    node_index: HashMap<EntityId, NodeIndex>,
    /// Entities currently awaiting recompute.
    stale: HashSet<EntityId>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self {
            graph: StableGraph::new(),
            node_index: HashMap::new(),
            stale: HashSet::new(),
        }
    }

    /// Get or create the node for an entity, updating its mirrored
    /// durability either way.
    pub fn ensure_node(&mut self, entity_id: &EntityId, durability: Durability) -> NodeIndex {
        if let Some(&idx) = self.node_index.get(entity_id) {
            if let Some(node) = self.graph.node_weight_mut(idx) {
                node.durability = durability;
            }
            return idx;
        }
        let idx = self.graph.add_node(DependencyNode {
            entity_id: entity_id.clone(),
            durability,
        });
        self.node_index.insert(entity_id.clone(), idx);
        idx
    }

    pub fn node(&self, entity_id: &EntityId) -> Option<NodeIndex> {
        self.node_index.get(entity_id).copied()
    }

    pub fn contains(&self, entity_id: &EntityId) -> bool {
        self.node_index.contains_key(entity_id)
    }

    pub fn durability(&self, entity_id: &EntityId) -> Option<Durability> {
        self.node(entity_id)
            .and_then(|idx| self.graph.node_weight(idx))
            .map(|node| node.durability)
    }

    /// Mirror a durability change from the store.
    pub fn set_durability(&mut self, entity_id: &EntityId, durability: Durability) -> LoreResult<()> {
        let idx = self.require(entity_id)?;
        if let Some(node) = self.graph.node_weight_mut(idx) {
            node.durability = durability;
        }
        Ok(())
    }

    /// Record that `from` depends on `to`. Nodes are created on demand
    /// (durability defaults to volatile until the store syncs it).
    /// Re-adding an existing edge updates its kind instead of duplicating.
    pub fn add_edge(&mut self, from: &EntityId, to: &EntityId, kind: DependencyKind) {
        let from_idx = self.ensure_or_default(from);
        let to_idx = self.ensure_or_default(to);
        match self.graph.find_edge(from_idx, to_idx) {
            Some(edge_idx) => {
                if let Some(weight) = self.graph.edge_weight_mut(edge_idx) {
                    weight.kind = kind;
                }
            }
            None => {
                self.graph.add_edge(from_idx, to_idx, DependencyEdge { kind });
            }
        }
    }

    /// Remove an entity, its edges, and any stale marker.
    pub fn remove_entity(&mut self, entity_id: &EntityId) -> bool {
        self.stale.remove(entity_id);
        if let Some(idx) = self.node_index.remove(entity_id) {
            self.graph.remove_node(idx);
            true
        } else {
            false
        }
    }

    /// Drop all outgoing dependency edges of an entity. Called before
    /// re-linking after re-extraction, so deleted imports disappear.
    pub fn clear_dependencies(&mut self, entity_id: &EntityId) {
        let Some(idx) = self.node(entity_id) else {
            return;
        };
        let edges: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| e.id())
            .collect();
        for edge in edges {
            self.graph.remove_edge(edge);
        }
    }

    /// Direct dependents: entities with an edge into `entity_id`.
    /// Unknown entities have no dependents.
    pub fn dependents_of(&self, entity_id: &EntityId) -> Vec<EntityId> {
        self.neighbor_ids(entity_id, Direction::Incoming)
    }

    /// Direct dependencies: entities `entity_id` points at.
    pub fn dependencies_of(&self, entity_id: &EntityId) -> Vec<EntityId> {
        self.neighbor_ids(entity_id, Direction::Outgoing)
    }

    fn neighbor_ids(&self, entity_id: &EntityId, direction: Direction) -> Vec<EntityId> {
        let Some(idx) = self.node(entity_id) else {
            return Vec::new();
        };
        let mut ids: Vec<EntityId> = self
            .graph
            .neighbors_directed(idx, direction)
            .filter_map(|n| self.graph.node_weight(n))
            .map(|node| node.entity_id.clone())
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    /// Entities currently marked stale, in deterministic order.
    pub fn stale_set(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self.stale.iter().cloned().collect();
        ids.sort();
        ids
    }

    pub fn is_stale(&self, entity_id: &EntityId) -> bool {
        self.stale.contains(entity_id)
    }

    /// Clear one stale marker after recompute. Returns whether it was set.
    pub fn clear_stale(&mut self, entity_id: &EntityId) -> bool {
        self.stale.remove(entity_id)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub(crate) fn mark(&mut self, entity_id: EntityId) -> bool {
        self.stale.insert(entity_id)
    }

    pub(crate) fn require(&self, entity_id: &EntityId) -> LoreResult<NodeIndex> {
        self.node(entity_id).ok_or_else(|| {
            LoreError::Graph(GraphError::UnknownEntity {
                id: entity_id.to_string(),
            })
        })
    }

    fn ensure_or_default(&mut self, entity_id: &EntityId) -> NodeIndex {
        match self.node(entity_id) {
            Some(idx) => idx,
            None => self.ensure_node(entity_id, Durability::Volatile),
        }
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}
