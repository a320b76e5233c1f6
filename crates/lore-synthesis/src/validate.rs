//! Citation validation against stored content hashes.
//!
//! A citation resolves when the hash it pins still matches reality at
//! its path: either an entity's current content hash or one of that
//! entity's fact hashes. Anything else is an invented span or a stale
//! one, and the claim carrying it is quarantined.

use lore_core::errors::LoreResult;
use lore_core::models::Citation;
use lore_core::traits::IIndexStore;

/// Split of a draft's citations into resolved and unresolved.
#[derive(Debug, Default)]
pub struct CitationReport {
    pub verified: Vec<Citation>,
    pub failed: Vec<Citation>,
}

impl CitationReport {
    /// A draft validates only when every citation resolved and at least
    /// one exists. A citation-free draft never validates.
    pub fn all_verified(&self) -> bool {
        self.failed.is_empty() && !self.verified.is_empty()
    }
}

/// Check every citation against the store.
pub fn check_citations(
    store: &dyn IIndexStore,
    citations: &[Citation],
) -> LoreResult<CitationReport> {
    let mut report = CitationReport::default();
    for citation in citations {
        if resolves(store, citation)? {
            report.verified.push(citation.clone());
        } else {
            report.failed.push(citation.clone());
        }
    }
    Ok(report)
}

fn resolves(store: &dyn IIndexStore, citation: &Citation) -> LoreResult<bool> {
    for entity in store.entities_in_path(&citation.path)? {
        if entity.location.path != citation.path {
            continue;
        }
        if entity.content_hash == citation.content_hash {
            return Ok(true);
        }
        for fact in store.facts(&entity.id)? {
            if fact.content_hash == citation.content_hash {
                return Ok(true);
            }
        }
    }
    Ok(false)
}
