//! Invalidation graph: tracks which entities derive from which, and
//! propagates staleness when content changes.
//!
//! Cyclic dependency structures (mutual imports) are collapsed into
//! strongly-connected components before propagation, so every
//! `mark_stale` call terminates. `Immutable` entities act as
//! propagation boundaries unless their own content changed.

pub mod edges;
pub mod graph;
pub mod propagation;
pub mod resolve;

pub use edges::{DependencyEdge, DependencyKind, DependencyNode};
pub use graph::DependencyGraph;
pub use propagation::{find_cycles, mark_stale};
pub use resolve::{link_entity, SymbolTable};
