//! Seed entity resolution.
//!
//! Seeds are entities the query names directly, either through a path
//! constraint or by mentioning a symbol or file stem in the query text.
//! They anchor the proximity walk and the co-change correlation; a query
//! that resolves no seeds simply runs without those two signals.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use lore_core::errors::LoreResult;
use lore_core::traits::IIndexStore;
use lore_core::types::EntityId;

/// Upper bound on resolved seeds; a query mentioning everything anchors
/// nothing in particular.
const MAX_SEEDS: usize = 16;

/// Query words that never name an entity.
const STOPWORDS: &[&str] = &[
    "the", "and", "can", "does", "what", "how", "why", "where", "when", "with", "from", "this",
    "that", "are", "was", "for", "not", "all", "its", "into",
];

/// Resolve the entities a query anchors on.
///
/// Path-constrained entities come first, then entities whose symbol name
/// or file stem appears as a word in the query text. The result is
/// deduplicated and sorted by id for determinism.
pub fn resolve_seeds(
    store: &dyn IIndexStore,
    query: &str,
    seed_paths: &[String],
) -> LoreResult<Vec<EntityId>> {
    let mut seeds: BTreeSet<EntityId> = BTreeSet::new();

    for prefix in seed_paths {
        for entity in store.entities_in_path(prefix)? {
            seeds.insert(entity.id);
        }
    }

    let tokens = query_tokens(query);
    if !tokens.is_empty() {
        for entity in store.entities()? {
            let id = entity.id.as_str();
            if tokens.contains(&symbol_of(id)) || tokens.contains(&file_stem(&entity.location.path))
            {
                seeds.insert(entity.id);
            }
        }
    }

    let mut resolved: Vec<EntityId> = seeds.into_iter().collect();
    resolved.truncate(MAX_SEEDS);
    debug!(seeds = resolved.len(), "resolved seed entities");
    Ok(resolved)
}

/// Identifier-shaped words.
static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").unwrap());

/// Lowercased identifier-shaped words of length >= 3, stopwords removed.
pub(crate) fn query_tokens(query: &str) -> BTreeSet<String> {
    WORD_RE
        .find_iter(query)
        .map(|m| m.as_str().to_lowercase())
        .filter(|t| t.len() >= 3 && !STOPWORDS.contains(&t.as_str()))
        .collect()
}

/// The symbol part of a `path::symbol` id, or the whole id for files.
fn symbol_of(entity_id: &str) -> String {
    entity_id
        .rsplit("::")
        .next()
        .unwrap_or(entity_id)
        .to_lowercase()
}

/// `src/api/calculate.py` -> `calculate`.
fn file_stem(path: &str) -> String {
    let name = path.rsplit('/').next().unwrap_or(path);
    name.split('.').next().unwrap_or(name).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_drop_stopwords_and_short_words() {
        let tokens = query_tokens("What does divide do and why?");
        assert!(tokens.contains("divide"));
        assert!(!tokens.contains("what"));
        assert!(!tokens.contains("do"));
    }

    #[test]
    fn symbol_and_stem_extraction() {
        assert_eq!(symbol_of("src/calculator.py::divide"), "divide");
        assert_eq!(symbol_of("src/calculator.py"), "src/calculator.py");
        assert_eq!(file_stem("src/api/calculate.py"), "calculate");
    }
}
