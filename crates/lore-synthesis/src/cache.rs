//! Synthesis result cache.
//!
//! Keyed by (entity id, content hash, prompt version): content or prompt
//! changes miss naturally, so entries never need explicit invalidation.
//! Unchanged entities never re-pay a provider call.

use std::sync::atomic::{AtomicU64, Ordering};

use moka::sync::Cache;

use lore_core::models::Entity;
use lore_core::types::{ClaimId, EntityId};

/// Cache key. The content hash and prompt version are part of identity;
/// stale entries simply stop being addressed and age out.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SynthesisKey {
    pub entity_id: EntityId,
    pub content_hash: String,
    pub prompt_version: String,
}

impl SynthesisKey {
    pub fn new(entity: &Entity, prompt_version: &str) -> Self {
        Self {
            entity_id: entity.id.clone(),
            content_hash: entity.content_hash.clone(),
            prompt_version: prompt_version.to_string(),
        }
    }
}

/// What one synthesis run produced, by claim id.
#[derive(Debug, Clone, Default)]
pub struct SynthesisReceipt {
    pub validated: Vec<ClaimId>,
    pub quarantined: Vec<ClaimId>,
}

/// moka-backed receipt cache with hit/miss counters.
pub struct SynthesisCache {
    cache: Cache<SynthesisKey, SynthesisReceipt>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl SynthesisCache {
    pub fn new(capacity: u64) -> Self {
        Self {
            cache: Cache::new(capacity),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn get(&self, key: &SynthesisKey) -> Option<SynthesisReceipt> {
        match self.cache.get(key) {
            Some(receipt) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(receipt)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn put(&self, key: SynthesisKey, receipt: SynthesisReceipt) {
        self.cache.insert(key, receipt);
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits() as f64;
        let total = hits + self.misses() as f64;
        if total == 0.0 {
            0.0
        } else {
            hits / total
        }
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}
