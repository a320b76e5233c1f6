//! Node and edge weights for the dependency graph.

use serde::{Deserialize, Serialize};

use lore_core::models::Durability;
use lore_core::types::EntityId;

/// Why one entity depends on another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    /// Source-level dependency: the entity imports or calls the target.
    DependsOn,
    /// Knowledge-level dependency: claims about the entity cite the target.
    DerivedFrom,
}

impl DependencyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyKind::DependsOn => "depends_on",
            DependencyKind::DerivedFrom => "derived_from",
        }
    }
}

/// A node in the dependency graph.
///
/// Durability is mirrored from the store on admission and promotion so
/// propagation can stop at `Immutable` boundaries without a store read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyNode {
    pub entity_id: EntityId,
    pub durability: Durability,
}

/// Weight on a dependency edge. Direction is `dependent -> dependency`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub kind: DependencyKind,
}
