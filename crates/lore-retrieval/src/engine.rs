//! The staged retrieval pipeline behind one entry point.
//!
//! Stages run in a fixed order: seed resolution, signal collection,
//! fusion, ranking, deduplication, assembly, persistence. Signal-level
//! problems degrade into coverage gaps; only an invalid request or a
//! storage failure aborts the query.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use chrono::Utc;
use tracing::{debug, info, warn};

use lore_core::config::RetrievalConfig;
use lore_core::constants::MIN_TOKEN_BUDGET;
use lore_core::errors::{GraphError, LedgerError, LoreResult, RetrievalError};
use lore_core::intent::{effective_weights, QueryIntent, SignalKind};
use lore_core::models::{QueryRequest, QueryResult, ResultFreshness};
use lore_core::traits::{IEmbeddingProvider, IIndexStore, SignalQuery};
use lore_core::types::QueryId;
use lore_graph::DependencyGraph;
use lore_ledger::{ConfidenceView, EpistemicsLedger};
use lore_tokens::TokenCounter;

use crate::assembly::{PackAssembler, PackRenderer};
use crate::deadline::Deadline;
use crate::fusion::fuse;
use crate::intent::classify_intent;
use crate::ranking::{dedup_overlapping, RankingPipeline};
use crate::seeds::resolve_seeds;
use crate::signals::{CoChangeSignal, LexicalSignal, ProximitySignal, SemanticSignal, SignalSet};

pub struct RetrievalEngine {
    store: Arc<dyn IIndexStore>,
    ledger: Arc<EpistemicsLedger>,
    graph: Arc<RwLock<DependencyGraph>>,
    embedder: Arc<dyn IEmbeddingProvider>,
    signals: SignalSet,
    ranking: RankingPipeline,
    assembler: PackAssembler,
    /// Per-(intent, signal) weight overrides from configuration.
    overrides: HashMap<(QueryIntent, SignalKind), f64>,
    /// Incrementally folded ledger view; queries score against a clone.
    view: Mutex<ConfidenceView>,
    config: RetrievalConfig,
}

impl RetrievalEngine {
    pub fn new(
        store: Arc<dyn IIndexStore>,
        ledger: Arc<EpistemicsLedger>,
        graph: Arc<RwLock<DependencyGraph>>,
        embedder: Arc<dyn IEmbeddingProvider>,
        counter: Arc<TokenCounter>,
        overrides: HashMap<(QueryIntent, SignalKind), f64>,
        config: RetrievalConfig,
    ) -> Self {
        let mut signals = SignalSet::new(config.signal_timeout_ms);
        signals.register(
            SignalKind::Semantic,
            Box::new(SemanticSignal::new(store.clone())),
        );
        signals.register(
            SignalKind::Proximity,
            Box::new(ProximitySignal::new(
                graph.clone(),
                config.proximity_decay,
                config.proximity_max_hops,
            )),
        );
        signals.register(
            SignalKind::CoChange,
            Box::new(CoChangeSignal::new(store.clone())),
        );
        signals.register(
            SignalKind::Lexical,
            Box::new(LexicalSignal::new(store.clone())),
        );
        let ranking = RankingPipeline::new(store.clone(), ledger.clone());
        let assembler = PackAssembler::new(
            PackRenderer::new(store.clone(), counter),
            config.budget_slack,
        );
        Self {
            store,
            ledger,
            graph,
            embedder,
            signals,
            ranking,
            assembler,
            overrides,
            view: Mutex::new(ConfidenceView::new()),
            config,
        }
    }

    /// Serve one query against the given index revision.
    ///
    /// A zero token or time budget in the request means "use the
    /// configured default". The result is always returned; degradation
    /// shows up as coverage gaps, omitted pack counts, and the
    /// `budget_exceeded` flag rather than as errors.
    pub fn retrieve(&self, request: &QueryRequest, index_revision: u64) -> LoreResult<QueryResult> {
        if request.query.trim().is_empty() {
            return Err(RetrievalError::InvalidQuery {
                reason: "query text is empty".to_string(),
            }
            .into());
        }
        let token_budget = if request.token_budget == 0 {
            self.config.default_token_budget
        } else {
            request.token_budget
        };
        if token_budget < MIN_TOKEN_BUDGET {
            return Err(RetrievalError::InvalidQuery {
                reason: format!("token budget {token_budget} below the {MIN_TOKEN_BUDGET} floor"),
            }
            .into());
        }
        let time_budget_ms = if request.time_budget_ms == 0 {
            self.config.default_time_budget_ms
        } else {
            request.time_budget_ms
        };
        let deadline = Deadline::new(time_budget_ms);
        let now = Utc::now();

        let intent = request
            .intent
            .unwrap_or_else(|| classify_intent(&request.query));
        let view = self.snapshot_view()?;
        let seed_entities = resolve_seeds(
            self.store.as_ref(),
            &request.query,
            &request.constraints.seed_paths,
        )?;
        debug!(
            intent = intent.as_str(),
            seeds = seed_entities.len(),
            "query prepared"
        );

        // Embedded once, shared by every provider. Failure degrades the
        // semantic signal into a gap instead of aborting.
        let embedding = match self.embedder.embed(&request.query) {
            Ok(vector) => Some(vector),
            Err(err) => {
                warn!(error = %err, "query embedding unavailable");
                None
            }
        };

        let signal_query = SignalQuery {
            text: request.query.clone(),
            intent,
            seed_entities,
            embedding,
        };
        let collected = self
            .signals
            .collect(&signal_query, self.config.signal_top_k, &deadline);

        let weights = effective_weights(intent, &self.overrides);
        let mut fused = fuse(&collected.hits, &weights);
        fused.truncate(self.config.signal_top_k);

        let ranked = dedup_overlapping(self.ranking.rank(&view, &fused, now)?);

        let max_packs = request
            .constraints
            .max_packs
            .map(|cap| cap.min(self.config.max_packs))
            .unwrap_or(self.config.max_packs);
        let graph = self.graph.read().map_err(|e| GraphError::Inconsistency {
            details: format!("graph lock poisoned: {e}"),
        })?;
        let assembly = self.assembler.assemble(
            &ranked,
            request.depth,
            token_budget,
            max_packs,
            &deadline,
            &graph,
        )?;
        drop(graph);

        // Packs reference the query row, so the query is recorded first.
        let query_id = QueryId::generate();
        self.store
            .record_query(&query_id, &request.query, intent, index_revision)?;
        for pack in &assembly.packs {
            self.store.put_pack(pack, &query_id)?;
        }

        let confidence_summary = QueryResult::summarize_confidence(&assembly.packs);
        let result = QueryResult {
            query_id,
            packs: assembly.packs,
            omitted_packs: assembly.omitted,
            confidence_summary,
            coverage_gaps: collected.gaps,
            latency_ms: deadline.elapsed_ms(),
            budget_exceeded: collected.cut_short || assembly.cut_short,
            index_revision,
            freshness: ResultFreshness::Current,
        };
        info!(
            query_id = %result.query_id,
            packs = result.packs.len(),
            omitted = result.omitted_packs,
            gaps = result.coverage_gaps.len(),
            latency_ms = result.latency_ms,
            "retrieval complete"
        );
        Ok(result)
    }

    /// Fold any new ledger events into the shared view, then clone it so
    /// the query scores against a stable snapshot.
    fn snapshot_view(&self) -> LoreResult<ConfidenceView> {
        let mut guard = self.view.lock().map_err(|e| LedgerError::ReplayFailed {
            sequence: 0,
            reason: format!("confidence view lock poisoned: {e}"),
        })?;
        let folded = self.ledger.refresh_view(&mut guard)?;
        if folded > 0 {
            debug!(events = folded, "confidence view caught up");
        }
        Ok(guard.clone())
    }
}
