//! Resolving structural facts into dependency edges.
//!
//! Import sources are dotted module paths (`core.math_utils`); call
//! targets are bare or dotted symbol names. Resolution is best-effort:
//! an import of something outside the index is skipped with a debug
//! log, never an error.

use std::collections::HashMap;

use lore_core::models::{Entity, EntityKind, Fact, FactPayload};
use lore_core::types::EntityId;

use crate::edges::DependencyKind;
use crate::graph::DependencyGraph;

/// Lookup tables from module paths and symbol names to entity ids.
pub struct SymbolTable {
    /// Dotted module path (`src.core.math_utils`) to file entity.
    files: HashMap<String, EntityId>,
    /// Bare symbol name to defining entities, sorted for determinism.
    symbols: HashMap<String, Vec<EntityId>>,
}

impl SymbolTable {
    pub fn build(entities: &[Entity]) -> Self {
        let mut files = HashMap::new();
        let mut symbols: HashMap<String, Vec<EntityId>> = HashMap::new();

        for entity in entities {
            match entity.kind {
                EntityKind::File | EntityKind::Module => {
                    files.insert(dotted_path(&entity.location.path), entity.id.clone());
                }
                EntityKind::Function | EntityKind::Method | EntityKind::Struct => {
                    if let Some(symbol) = entity.id.as_str().rsplit("::").next() {
                        symbols
                            .entry(symbol.to_string())
                            .or_default()
                            .push(entity.id.clone());
                    }
                }
            }
        }
        for ids in symbols.values_mut() {
            ids.sort();
            ids.dedup();
        }

        Self { files, symbols }
    }

    /// Resolve a dotted import source to a file entity. Falls back to a
    /// suffix match so `core.math_utils` finds `src/core/math_utils.py`.
    /// Ambiguity resolves to the smallest entity id.
    pub fn resolve_import(&self, source: &str) -> Option<EntityId> {
        if let Some(id) = self.files.get(source) {
            return Some(id.clone());
        }
        let suffix = format!(".{source}");
        self.files
            .iter()
            .filter(|(path, _)| path.ends_with(&suffix))
            .map(|(_, id)| id)
            .min()
            .cloned()
    }

    /// Resolve a call target. Dotted callees match on their last segment.
    pub fn resolve_call(&self, callee: &str) -> Option<EntityId> {
        let symbol = callee.rsplit('.').next().unwrap_or(callee);
        self.symbols.get(symbol).and_then(|ids| ids.first()).cloned()
    }
}

/// Strip the extension and replace separators: `src/core/math_utils.py`
/// becomes `src.core.math_utils`.
fn dotted_path(path: &str) -> String {
    let trimmed = match path.rsplit_once('.') {
        Some((stem, ext)) if !ext.contains('/') => stem,
        _ => path,
    };
    trimmed.replace('/', ".")
}

/// Rebuild an entity's outgoing dependency edges from its current facts.
pub fn link_entity(
    graph: &mut DependencyGraph,
    entity: &Entity,
    facts: &[Fact],
    table: &SymbolTable,
) {
    graph.ensure_node(&entity.id, entity.durability);
    graph.clear_dependencies(&entity.id);

    for fact in facts {
        let target = match &fact.payload {
            FactPayload::Import { source } => table.resolve_import(source),
            FactPayload::Call { callee } => table.resolve_call(callee),
            _ => None,
        };
        match target {
            Some(target) if target != entity.id => {
                graph.add_edge(&entity.id, &target, DependencyKind::DependsOn);
            }
            Some(_) => {}
            None => {
                if let FactPayload::Import { source } = &fact.payload {
                    tracing::debug!(%source, "import target not in index, skipping edge");
                }
            }
        }
    }
}
