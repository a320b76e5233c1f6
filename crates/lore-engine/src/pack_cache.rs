//! Served-result cache with entity-trigger invalidation.
//!
//! Results are cached under a fingerprint of the request shape, not the
//! index revision: an entry stays servable until an entity it cites
//! changes. A reverse index from entity to fingerprints makes that
//! eviction exact instead of a full flush.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use moka::sync::Cache;

use lore_core::models::{QueryRequest, QueryResult};
use lore_core::types::EntityId;

pub struct PackCache {
    results: Cache<String, QueryResult>,
    /// Which cached fingerprints a change to this entity invalidates.
    triggers: DashMap<EntityId, HashSet<String>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl PackCache {
    pub fn new(max_entries: u64, ttl: Duration) -> Self {
        let results = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();
        Self {
            results,
            triggers: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn get(&self, fingerprint: &str) -> Option<QueryResult> {
        let found = self.results.get(fingerprint);
        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    /// Cache a served result and index every entity whose change must
    /// evict it: each pack's subject plus its invalidation triggers.
    pub fn insert(&self, fingerprint: String, result: &QueryResult) {
        for pack in &result.packs {
            for entity in std::iter::once(&pack.entity_id).chain(&pack.invalidation_triggers) {
                self.triggers
                    .entry(entity.clone())
                    .or_default()
                    .insert(fingerprint.clone());
            }
        }
        self.results.insert(fingerprint, result.clone());
    }

    /// Evict every cached result that cited this entity. Returns how
    /// many fingerprints were dropped.
    pub fn evict_entity(&self, entity_id: &EntityId) -> usize {
        match self.triggers.remove(entity_id) {
            Some((_, fingerprints)) => {
                for fingerprint in &fingerprints {
                    self.results.invalidate(fingerprint);
                }
                fingerprints.len()
            }
            None => 0,
        }
    }

    /// Drop trigger entries whose fingerprints are no longer servable,
    /// so the index only tracks what the cache actually holds.
    pub fn prune(&self) {
        self.triggers.retain(|_, fingerprints| {
            fingerprints.retain(|fingerprint| self.results.contains_key(fingerprint));
            !fingerprints.is_empty()
        });
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Entities currently indexed for eviction.
    pub fn tracked_entities(&self) -> usize {
        self.triggers.len()
    }
}

/// Fingerprint of everything that shapes a result: normalized query
/// text, declared intent, depth, constraints, and budgets.
pub fn fingerprint(request: &QueryRequest) -> String {
    let normalized = request
        .query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    let mut hasher = blake3::Hasher::new();
    hasher.update(normalized.as_bytes());
    hasher.update(b"\0");
    hasher.update(format!("{:?}", request.intent).as_bytes());
    hasher.update(b"\0");
    hasher.update(format!("{:?}", request.depth).as_bytes());
    hasher.update(b"\0");
    let mut seeds: Vec<&str> = request
        .constraints
        .seed_paths
        .iter()
        .map(String::as_str)
        .collect();
    seeds.sort_unstable();
    for seed in seeds {
        hasher.update(seed.as_bytes());
        hasher.update(b",");
    }
    hasher.update(b"\0");
    hasher.update(format!("{:?}", request.constraints.max_packs).as_bytes());
    hasher.update(&request.token_budget.to_le_bytes());
    hasher.update(&request.time_budget_ms.to_le_bytes());
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Utc;

    use lore_core::models::{
        AbsentReason, ConfidenceValue, ContextPack, DepthLevel, ResultFreshness,
    };
    use lore_core::types::{PackId, QueryId};

    fn pack_for(entity: &EntityId, triggers: Vec<EntityId>) -> ContextPack {
        ContextPack {
            id: PackId::generate(),
            entity_id: entity.clone(),
            summary: "cached".to_string(),
            sections: Vec::new(),
            citations: Vec::new(),
            claim_ids: Vec::new(),
            confidence: ConfidenceValue::absent(AbsentReason::Uncalibrated),
            active_defeaters: Vec::new(),
            freshness: Utc::now(),
            invalidation_triggers: triggers,
            token_cost: 32,
            depth: DepthLevel::Signatures,
        }
    }

    fn result_with(packs: Vec<ContextPack>) -> QueryResult {
        QueryResult {
            query_id: QueryId::generate(),
            packs,
            omitted_packs: 0,
            confidence_summary: Default::default(),
            coverage_gaps: Vec::new(),
            latency_ms: 3,
            budget_exceeded: false,
            index_revision: 1,
            freshness: ResultFreshness::Current,
        }
    }

    #[test]
    fn hits_and_misses_are_counted() {
        let cache = PackCache::new(16, Duration::from_secs(60));
        assert!(cache.get("absent").is_none());
        assert_eq!(cache.misses(), 1);

        let entity = EntityId::for_file("src/a.py");
        cache.insert("fp-a".to_string(), &result_with(vec![pack_for(&entity, vec![])]));
        assert!(cache.get("fp-a").is_some());
        assert_eq!(cache.hits(), 1);
    }

    #[test]
    fn changed_entities_evict_exactly_their_results() {
        let cache = PackCache::new(16, Duration::from_secs(60));
        let a = EntityId::for_file("src/a.py");
        let b = EntityId::for_file("src/b.py");
        cache.insert("fp-a".to_string(), &result_with(vec![pack_for(&a, vec![])]));
        cache.insert("fp-b".to_string(), &result_with(vec![pack_for(&b, vec![])]));

        assert_eq!(cache.evict_entity(&a), 1);
        assert!(cache.get("fp-a").is_none());
        assert!(cache.get("fp-b").is_some(), "unrelated results survive");
    }

    #[test]
    fn invalidation_triggers_evict_too() {
        let cache = PackCache::new(16, Duration::from_secs(60));
        let subject = EntityId::for_symbol("src/a.py", "reader");
        let dependency = EntityId::for_symbol("src/b.py", "parser");
        let pack = pack_for(&subject, vec![dependency.clone()]);
        cache.insert("fp".to_string(), &result_with(vec![pack]));

        assert_eq!(cache.evict_entity(&dependency), 1);
        assert!(cache.get("fp").is_none());
    }

    #[test]
    fn prune_drops_dead_trigger_entries() {
        let cache = PackCache::new(16, Duration::from_secs(60));
        let subject = EntityId::for_symbol("src/a.py", "reader");
        let dependency = EntityId::for_symbol("src/b.py", "parser");
        cache.insert(
            "fp".to_string(),
            &result_with(vec![pack_for(&subject, vec![dependency.clone()])]),
        );
        assert_eq!(cache.tracked_entities(), 2);

        // Evicting via the subject leaves the dependency's entry behind
        // until the next prune.
        cache.evict_entity(&subject);
        assert_eq!(cache.tracked_entities(), 1);
        cache.prune();
        assert_eq!(cache.tracked_entities(), 0);
    }

    #[test]
    fn fingerprints_normalize_text_and_split_on_shape() {
        let loud = QueryRequest::new("What  does DIVIDE do?", 2_000, 1_000);
        let quiet = QueryRequest::new("what does divide do?", 2_000, 1_000);
        assert_eq!(fingerprint(&loud), fingerprint(&quiet));

        let deeper = QueryRequest::new("what does divide do?", 2_000, 1_000)
            .with_depth(DepthLevel::Implementation);
        assert_ne!(fingerprint(&quiet), fingerprint(&deeper));

        let tighter = QueryRequest::new("what does divide do?", 500, 1_000);
        assert_ne!(fingerprint(&quiet), fingerprint(&tighter));
    }
}
