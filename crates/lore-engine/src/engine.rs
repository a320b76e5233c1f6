//! The engine facade: intake, maintenance, queries, feedback, sessions.
//!
//! Maintenance runs in explicit passes, one at a time. A pass drains
//! quiet paths from the change queue, re-extracts them in parallel,
//! admits what actually changed (an unchanged content hash stops
//! everything downstream), relinks the dependency graph, lets staleness
//! flow to dependents, and re-synthesizes whatever the pass touched.
//! Extraction and synthesis problems degrade into report entries; only
//! a storage failure aborts a pass. Queries never wait on maintenance:
//! they read the latest committed revision or the pack cache.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use rayon::prelude::*;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use lore_core::config::LoreConfig;
use lore_core::constants::VERSION;
use lore_core::errors::{GraphError, LoreError, LoreResult};
use lore_core::intent::{load_weight_overrides, QueryIntent, SignalKind};
use lore_core::models::{
    ClaimState, Entity, Fact, FeedbackOutcome, QueryRequest, QueryResult, ResultFreshness,
    SemanticClaim,
};
use lore_core::traits::{
    ClaimEmbedding, ExtractedEntity, IContentSource, IEmbeddingProvider, IExtractionAdapter,
    IIndexStore, ISynthesisProvider,
};
use lore_core::types::{EntityId, PackId, QueryId};
use lore_feedback::FeedbackIngestor;
use lore_graph::{link_entity, mark_stale, DependencyGraph, SymbolTable};
use lore_ledger::EpistemicsLedger;
use lore_retrieval::RetrievalEngine;
use lore_store::StoreEngine;
use lore_synthesis::{CapabilityPipeline, SynthesisEngine};
use lore_tokens::TokenCounter;

use crate::change_queue::ChangeQueue;
use crate::observability::init_tracing;
use crate::pack_cache::{fingerprint, PackCache};
use crate::report::{ExtractionGap, MaintenanceReport};

pub struct LoreEngine {
    store: Arc<StoreEngine>,
    ledger: Arc<EpistemicsLedger>,
    graph: Arc<RwLock<DependencyGraph>>,
    retrieval: RetrievalEngine,
    synthesis: SynthesisEngine,
    feedback: FeedbackIngestor,
    adapters: Vec<Arc<dyn IExtractionAdapter>>,
    content: Arc<dyn IContentSource>,
    embedder: Arc<dyn IEmbeddingProvider>,
    queue: ChangeQueue,
    cache: PackCache,
    /// Bumped once per pass that changed the index. Queries carry it.
    revision: AtomicU64,
    /// One maintenance pass at a time; intake and queries never wait.
    maintenance: Mutex<()>,
    config: LoreConfig,
}

impl LoreEngine {
    /// Open (or create) the index at the configured path and wire every
    /// subsystem around it.
    pub fn new(
        config: LoreConfig,
        adapters: Vec<Arc<dyn IExtractionAdapter>>,
        provider: Option<Arc<dyn ISynthesisProvider>>,
        embedder: Arc<dyn IEmbeddingProvider>,
        content: Arc<dyn IContentSource>,
    ) -> LoreResult<Self> {
        let store = Arc::new(StoreEngine::open(
            Path::new(&config.store.db_path),
            &config.store,
        )?);
        Self::with_store(store, config, adapters, provider, embedder, content)
    }

    /// Wire the engine around an already-open store. The dependency
    /// graph is relinked from persisted entities and facts, so a
    /// restart resumes with full propagation.
    pub fn with_store(
        store: Arc<StoreEngine>,
        config: LoreConfig,
        adapters: Vec<Arc<dyn IExtractionAdapter>>,
        provider: Option<Arc<dyn ISynthesisProvider>>,
        embedder: Arc<dyn IEmbeddingProvider>,
        content: Arc<dyn IContentSource>,
    ) -> LoreResult<Self> {
        init_tracing(&config.observability);

        let ledger = Arc::new(EpistemicsLedger::for_store(&store, config.ledger.clone()));
        let graph = Arc::new(RwLock::new(DependencyGraph::new()));
        let relinked = rebuild_graph(&store, &graph)?;

        let overrides = match &config.retrieval.intent_weights_path {
            Some(path) => load_intent_weights(path)?,
            None => HashMap::new(),
        };
        let retrieval = RetrievalEngine::new(
            store.clone(),
            ledger.clone(),
            graph.clone(),
            embedder.clone(),
            Arc::new(TokenCounter::default()),
            overrides,
            config.retrieval.clone(),
        );

        let pipeline = match provider {
            Some(provider) => CapabilityPipeline::with_provider(provider),
            None => CapabilityPipeline::structural(),
        };
        let synthesis = SynthesisEngine::new(
            store.clone(),
            ledger.clone(),
            pipeline,
            config.synthesis.clone(),
        );
        let feedback = FeedbackIngestor::new(store.clone(), ledger.clone());

        let queue = ChangeQueue::new(config.scheduler.queue_threshold);
        let cache = PackCache::new(
            config.scheduler.pack_cache_size,
            Duration::from_secs(config.scheduler.pack_cache_ttl_secs),
        );

        info!(version = VERSION, entities = relinked, "engine wired");
        Ok(Self {
            store,
            ledger,
            graph,
            retrieval,
            synthesis,
            feedback,
            adapters,
            content,
            embedder,
            queue,
            cache,
            revision: AtomicU64::new(1),
            maintenance: Mutex::new(()),
            config,
        })
    }

    /// Note that a source file changed. Cheap enough for watcher
    /// callbacks: no I/O, no locks beyond one queue shard. Returns true
    /// when the path was not already pending.
    pub fn notify_change(&self, path: &str) -> bool {
        let fresh = self.queue.notify(path);
        debug!(path, fresh, pending = self.queue.len(), "change noted");
        fresh
    }

    /// Run one maintenance pass and report what it did.
    ///
    /// Entities left stale by an earlier failed synthesis and entities
    /// holding quarantined claims get another synthesis attempt every
    /// pass, whether or not anything was drained.
    pub async fn run_maintenance(&self) -> LoreResult<MaintenanceReport> {
        let _pass = self.maintenance.lock().await;
        let mut report = MaintenanceReport::default();

        let debounce = Duration::from_millis(self.config.scheduler.debounce_ms);
        let paths = self.queue.drain_ready(debounce);

        let mut resynthesize: Vec<EntityId> = Vec::new();
        for claim in self.store.claims_in_state(ClaimState::Quarantined)? {
            resynthesize.push(claim.entity_id);
        }
        let leftover_stale = read_graph(&self.graph)?.stale_set();

        if paths.is_empty() && resynthesize.is_empty() && leftover_stale.is_empty() {
            report.index_revision = self.revision.load(Ordering::SeqCst);
            debug!("maintenance pass found nothing to do");
            return Ok(report);
        }
        report.files_processed = paths.len();

        // Extract in parallel, batch by batch. Failures become gaps.
        let mut extractions: Vec<(String, Vec<ExtractedEntity>)> = Vec::new();
        let mut removed_paths: Vec<String> = Vec::new();
        for batch in paths.chunks(self.config.scheduler.maintenance_batch.max(1)) {
            let outcomes: Vec<Result<PathOutcome, ExtractionGap>> =
                batch.par_iter().map(|path| self.extract_path(path)).collect();
            for outcome in outcomes {
                match outcome {
                    Ok(PathOutcome::Extracted(path, extracted)) => {
                        extractions.push((path, extracted));
                    }
                    Ok(PathOutcome::Gone(path)) => removed_paths.push(path),
                    Err(gap) => {
                        warn!(path = %gap.path, reason = %gap.reason, "extraction gap");
                        report.extraction_gaps.push(gap);
                    }
                }
            }
        }

        // Admit sequentially; the writer is single-threaded anyway. An
        // unchanged hash stops here: no relink, no staleness, no synthesis.
        let mut changed: Vec<(Entity, Vec<Fact>)> = Vec::new();
        for (path, extracted) in extractions {
            debug!(path = %path, entities = extracted.len(), "file extracted");
            for item in extracted {
                if self.store.admit(&item.entity, &item.facts)?.changed() {
                    changed.push((item.entity, item.facts));
                } else {
                    report.entities_unchanged += 1;
                }
            }
        }
        report.entities_changed = changed.len();

        // Paths whose content is gone take their entities out of the
        // index. Dependents go stale first, while the edges still exist.
        let mut propagated: Vec<EntityId> = Vec::new();
        let mut removed_ids: HashSet<EntityId> = HashSet::new();
        for path in &removed_paths {
            let doomed: Vec<Entity> = self
                .store
                .entities_in_path(path)?
                .into_iter()
                .filter(|entity| entity.location.path == *path)
                .collect();
            {
                let mut graph = write_graph(&self.graph)?;
                for entity in &doomed {
                    if graph.contains(&entity.id) {
                        propagated.extend(mark_stale(&mut graph, &entity.id)?);
                    }
                    graph.remove_entity(&entity.id);
                }
            }
            for entity in &doomed {
                self.store.remove_entity(&entity.id)?;
                removed_ids.insert(entity.id.clone());
            }
            report.entities_removed += doomed.len();
            if !doomed.is_empty() {
                warn!(path = %path, entities = doomed.len(), "source gone, removed from index");
            }
        }

        // Relink changed entities against the full symbol table, then
        // let staleness flow to their dependents.
        if !changed.is_empty() {
            let all = self.store.entities()?;
            let table = SymbolTable::build(&all);
            let mut graph = write_graph(&self.graph)?;
            for (entity, facts) in &changed {
                link_entity(&mut graph, entity, facts, &table);
            }
            for (entity, _) in &changed {
                propagated.extend(mark_stale(&mut graph, &entity.id)?);
            }
        }
        let changed_ids: HashSet<EntityId> =
            changed.iter().map(|(entity, _)| entity.id.clone()).collect();
        report.stale_marked = propagated
            .iter()
            .filter(|id| !changed_ids.contains(*id) && !removed_ids.contains(*id))
            .count();

        // Everything stale plus everything holding quarantined claims
        // gets a synthesis attempt. Failures leave the stale flag in
        // place, so the next pass tries again.
        let mut synthesis_set = read_graph(&self.graph)?.stale_set();
        let mut seen: HashSet<EntityId> = synthesis_set.iter().cloned().collect();
        for id in resynthesize {
            if !removed_ids.contains(&id) && seen.insert(id.clone()) {
                synthesis_set.push(id);
            }
        }

        for entity_id in &synthesis_set {
            match self.synthesis.request_synthesis(entity_id).await {
                Ok(outcome) => {
                    report.claims_validated += outcome.validated.len();
                    report.claims_quarantined += outcome.quarantined.len();
                    if !outcome.from_cache {
                        report.embeddings_failed += self.embed_claims(&outcome.validated)?;
                    }
                    write_graph(&self.graph)?.clear_stale(entity_id);
                }
                Err(e) => {
                    report.synthesis_failures += 1;
                    warn!(entity = %entity_id, error = %e, "synthesis failed, entity stays stale");
                }
            }
        }

        // Anything re-synthesized or removed may invalidate cached packs.
        for entity_id in synthesis_set.iter().chain(removed_ids.iter()) {
            report.packs_evicted += self.cache.evict_entity(entity_id);
        }
        self.cache.prune();

        if report.entities_changed > 0 || report.entities_removed > 0 {
            report.index_revision = self.revision.fetch_add(1, Ordering::SeqCst) + 1;
            self.store.checkpoint()?;
        } else {
            report.index_revision = self.revision.load(Ordering::SeqCst);
        }

        info!(
            files = report.files_processed,
            changed = report.entities_changed,
            unchanged = report.entities_unchanged,
            removed = report.entities_removed,
            stale = report.stale_marked,
            validated = report.claims_validated,
            quarantined = report.claims_quarantined,
            failures = report.synthesis_failures,
            gaps = report.extraction_gaps.len(),
            evicted = report.packs_evicted,
            revision = report.index_revision,
            "maintenance pass complete"
        );
        Ok(report)
    }

    /// Serve a query from the pack cache or the retrieval pipeline.
    ///
    /// Cache hits come back marked `PossiblyStale`: nothing the result
    /// cites has changed since it was computed, but it was not
    /// recomputed against the current revision.
    pub fn query(&self, request: &QueryRequest) -> LoreResult<QueryResult> {
        let key = fingerprint(request);
        if let Some(mut cached) = self.cache.get(&key) {
            cached.freshness = ResultFreshness::PossiblyStale;
            debug!(query = %cached.query_id, "query served from pack cache");
            return Ok(cached);
        }
        let revision = self.revision.load(Ordering::SeqCst);
        let result = self.retrieval.retrieve(request, revision)?;
        self.cache.insert(key, &result);
        Ok(result)
    }

    /// Route an agent outcome to the ledger. `Failed` also evicts
    /// cached results covering the named packs' entities, since their
    /// confidence just moved.
    pub async fn submit_feedback(
        &self,
        query_id: &QueryId,
        pack_ids: &[PackId],
        outcome: FeedbackOutcome,
    ) -> LoreResult<Vec<u64>> {
        let sequences = self
            .feedback
            .submit_feedback(query_id, pack_ids, outcome)
            .await?;
        if matches!(outcome, FeedbackOutcome::Failed) {
            for pack_id in pack_ids {
                if let Some(pack) = self.store.pack(pack_id)? {
                    self.cache.evict_entity(&pack.entity_id);
                }
            }
        }
        Ok(sequences)
    }

    /// Open a new change session; durability promotion runs inside.
    pub fn begin_session(&self) -> LoreResult<u64> {
        let session = self.store.begin_session()?;
        info!(session, "change session opened");
        Ok(session)
    }

    pub fn index_revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }

    /// Changes noted but not yet drained by a maintenance pass.
    pub fn pending_changes(&self) -> usize {
        self.queue.len()
    }

    pub fn ledger(&self) -> &Arc<EpistemicsLedger> {
        &self.ledger
    }

    pub fn pack_cache(&self) -> &PackCache {
        &self.cache
    }

    /// Read, pick an adapter, extract. Every failure mode short of a
    /// crash becomes a gap the report discloses.
    fn extract_path(&self, path: &str) -> Result<PathOutcome, ExtractionGap> {
        let content = match self.content.read(path) {
            Ok(Some(content)) => content,
            Ok(None) => return Ok(PathOutcome::Gone(path.to_string())),
            Err(e) => {
                return Err(ExtractionGap {
                    path: path.to_string(),
                    reason: format!("content unavailable: {e}"),
                })
            }
        };
        let adapter = match self.adapters.iter().find(|a| a.handles(path)) {
            Some(adapter) => adapter,
            None => {
                return Err(ExtractionGap {
                    path: path.to_string(),
                    reason: "no adapter handles this path".to_string(),
                })
            }
        };
        match adapter.extract(path, &content) {
            Ok(extracted) => Ok(PathOutcome::Extracted(path.to_string(), extracted)),
            Err(e) => Err(ExtractionGap {
                path: path.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    /// Embed freshly validated claims for the semantic signal. Storage
    /// failures abort; provider failures degrade and are counted.
    fn embed_claims(&self, claims: &[SemanticClaim]) -> LoreResult<usize> {
        let mut failures = 0;
        for claim in claims {
            match self.embedder.embed(&claim.text) {
                Ok(vector) => {
                    self.store.put_embedding(&ClaimEmbedding {
                        claim_id: claim.id.clone(),
                        entity_id: claim.entity_id.clone(),
                        vector,
                    })?;
                }
                Err(e) => {
                    failures += 1;
                    warn!(claim = %claim.id, error = %e, "claim not embedded, semantic signal will miss it");
                }
            }
        }
        Ok(failures)
    }
}

/// What happened to one drained path during extraction.
enum PathOutcome {
    Extracted(String, Vec<ExtractedEntity>),
    /// The content source no longer has the path.
    Gone(String),
}

/// Relink the dependency graph from persisted entities and facts.
fn rebuild_graph(store: &Arc<StoreEngine>, graph: &RwLock<DependencyGraph>) -> LoreResult<usize> {
    let entities = store.entities()?;
    if entities.is_empty() {
        return Ok(0);
    }
    let table = SymbolTable::build(&entities);
    let mut guard = write_graph(graph)?;
    for entity in &entities {
        let facts = store.facts(&entity.id)?;
        link_entity(&mut guard, entity, &facts, &table);
    }
    Ok(entities.len())
}

/// Read per-intent signal weight overrides from a TOML table of
/// `"intent:signal" = weight` pairs.
fn load_intent_weights(path: &str) -> LoreResult<HashMap<(QueryIntent, SignalKind), f64>> {
    let raw = std::fs::read_to_string(path).map_err(|e| LoreError::Config {
        reason: format!("intent weights at {path}: {e}"),
    })?;
    let table: HashMap<String, f64> = toml::from_str(&raw).map_err(|e| LoreError::Config {
        reason: format!("intent weights at {path}: {e}"),
    })?;
    Ok(load_weight_overrides(&table))
}

fn read_graph(graph: &RwLock<DependencyGraph>) -> LoreResult<RwLockReadGuard<'_, DependencyGraph>> {
    graph.read().map_err(|e| {
        GraphError::Inconsistency {
            details: format!("graph lock poisoned: {e}"),
        }
        .into()
    })
}

fn write_graph(
    graph: &RwLock<DependencyGraph>,
) -> LoreResult<RwLockWriteGuard<'_, DependencyGraph>> {
    graph.write().map_err(|e| {
        GraphError::Inconsistency {
            details: format!("graph lock poisoned: {e}"),
        }
        .into()
    })
}
