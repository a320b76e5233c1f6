//! Orchestrator end-to-end tests: structural claims without a provider,
//! fail-closed provider outages, quarantine and retry, the synthesis
//! cache, and budget cancellation.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lore_core::config::{LedgerConfig, SynthesisConfig};
use lore_core::errors::{LoreError, LoreResult, SynthesisError};
use lore_core::models::{
    hash_content, Citation, ClaimState, ConfidenceBasis, ConfidenceValue, Durability, Entity,
    EntityKind, ExtractionMethod, Fact, FactPayload, SourceLocation,
};
use lore_core::traits::{IIndexStore, ISynthesisProvider, ProviderClaim, SynthesisBudget};
use lore_core::types::{AdapterId, ClaimId, EntityId};
use lore_ledger::{EpistemicsLedger, LedgerEventKind, GLOBAL_COHORT};
use lore_store::StoreEngine;
use lore_synthesis::{CapabilityPipeline, SynthesisEngine};

fn make_store() -> Arc<StoreEngine> {
    Arc::new(StoreEngine::open_in_memory().unwrap())
}

fn make_ledger(store: &Arc<StoreEngine>) -> Arc<EpistemicsLedger> {
    Arc::new(EpistemicsLedger::for_store(store, LedgerConfig::default()))
}

fn make_engine(
    store: &Arc<StoreEngine>,
    ledger: &Arc<EpistemicsLedger>,
    pipeline: CapabilityPipeline,
) -> SynthesisEngine {
    SynthesisEngine::new(
        store.clone(),
        ledger.clone(),
        pipeline,
        SynthesisConfig::default(),
    )
}

fn divide_entity(version: &str) -> Entity {
    Entity::new(
        EntityId::for_symbol("src/calculator.py", "divide"),
        EntityKind::Function,
        SourceLocation::new("src/calculator.py", 12, 20),
        hash_content(&format!("def divide(a, b): {version}")),
    )
}

fn divide_facts(entity: &Entity) -> Vec<Fact> {
    vec![
        Fact::new(
            entity.id.clone(),
            FactPayload::Signature {
                name: "divide".to_string(),
                parameters: vec!["a".to_string(), "b".to_string()],
                returns: Some("float".to_string()),
            },
            AdapterId::new("py-regex"),
        ),
        Fact::new(
            entity.id.clone(),
            FactPayload::Guard {
                condition: "b == 0".to_string(),
                raises: "ZeroDivisionError".to_string(),
            },
            AdapterId::new("py-regex"),
        ),
    ]
}

/// Admit the divide entity and return it with its guard fact hash, the
/// hash providers cite to stay valid across content revisions.
fn seed_divide(store: &StoreEngine, version: &str) -> (Entity, String) {
    let entity = divide_entity(version);
    let facts = divide_facts(&entity);
    store.admit(&entity, &facts).unwrap();
    let guard_hash = facts[1].content_hash.clone();
    (entity, guard_hash)
}

fn provider_claim(text: &str, hash: &str) -> ProviderClaim {
    ProviderClaim {
        text: text.to_string(),
        citations: vec![Citation::new("src/calculator.py", 14, 16, hash)],
        model: "scripted-v1".to_string(),
    }
}

/// Counts calls; cites one fixed hash on every claim.
struct CountingProvider {
    calls: AtomicUsize,
    cited_hash: String,
}

impl CountingProvider {
    fn new(cited_hash: impl Into<String>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            cited_hash: cited_hash.into(),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ISynthesisProvider for CountingProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn synthesize(
        &self,
        _entity: &Entity,
        _facts: &[Fact],
        _budget: &SynthesisBudget,
    ) -> LoreResult<Vec<ProviderClaim>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![provider_claim(
            "Divides a by b, refusing a zero divisor.",
            &self.cited_hash,
        )])
    }
}

/// Plays back a script of responses, one per call; empty after that.
struct ScriptedProvider {
    script: Mutex<VecDeque<Vec<ProviderClaim>>>,
}

impl ScriptedProvider {
    fn new(script: Vec<Vec<ProviderClaim>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
        }
    }
}

impl ISynthesisProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn synthesize(
        &self,
        _entity: &Entity,
        _facts: &[Fact],
        _budget: &SynthesisBudget,
    ) -> LoreResult<Vec<ProviderClaim>> {
        Ok(self.script.lock().unwrap().pop_front().unwrap_or_default())
    }
}

struct DeadProvider;

impl ISynthesisProvider for DeadProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn synthesize(
        &self,
        _entity: &Entity,
        _facts: &[Fact],
        _budget: &SynthesisBudget,
    ) -> LoreResult<Vec<ProviderClaim>> {
        Err(LoreError::Synthesis(SynthesisError::ProviderUnavailable {
            provider: "anthropic".to_string(),
            reason: "connection refused".to_string(),
        }))
    }
}

/// Sleeps past any reasonable budget before answering.
struct SleepyProvider {
    sleep: Duration,
    cited_hash: String,
}

impl ISynthesisProvider for SleepyProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn synthesize(
        &self,
        _entity: &Entity,
        _facts: &[Fact],
        _budget: &SynthesisBudget,
    ) -> LoreResult<Vec<ProviderClaim>> {
        std::thread::sleep(self.sleep);
        Ok(vec![provider_claim("Too slow to matter.", &self.cited_hash)])
    }
}

// ── Structural pipeline ───────────────────────────────────────────────────

#[tokio::test]
async fn structural_claims_validate_without_a_provider() {
    let store = make_store();
    let ledger = make_ledger(&store);
    let engine = make_engine(&store, &ledger, CapabilityPipeline::structural());
    let (entity, _) = seed_divide(&store, "v1");

    let outcome = engine.request_synthesis(&entity.id).await.unwrap();

    assert_eq!(outcome.validated.len(), 2);
    assert!(outcome.quarantined.is_empty());
    assert!(!outcome.from_cache);
    for claim in &outcome.validated {
        assert_eq!(claim.state, ClaimState::Validated);
        let evidence = store.evidence_for_claim(&claim.id).unwrap();
        assert!(!evidence.is_empty());
        assert!(evidence
            .iter()
            .all(|e| e.method == ExtractionMethod::StructuralFact));
    }
    let texts: Vec<&str> = outcome.validated.iter().map(|c| c.text.as_str()).collect();
    assert!(texts.iter().any(|t| t.contains("`divide` is a function")));
    assert!(texts
        .iter()
        .any(|t| t.contains("raises ZeroDivisionError when b == 0")));
}

#[tokio::test]
async fn structural_confidence_is_present_without_a_curve() {
    let store = make_store();
    let ledger = make_ledger(&store);
    let engine = make_engine(&store, &ledger, CapabilityPipeline::structural());
    let (entity, _) = seed_divide(&store, "v1");

    let outcome = engine.request_synthesis(&entity.id).await.unwrap();
    let view = ledger.rebuild_view().unwrap();

    for claim in &outcome.validated {
        let confidence = ledger
            .confidence(
                &view,
                &claim.id,
                Durability::Volatile,
                GLOBAL_COHORT,
                chrono::Utc::now(),
            )
            .unwrap();
        assert!(matches!(
            confidence,
            ConfidenceValue::Present {
                basis: ConfidenceBasis::DirectEvidence { .. },
                ..
            }
        ));
    }
}

// ── Fail-closed paths ─────────────────────────────────────────────────────

#[tokio::test]
async fn provider_outage_fails_the_whole_request_closed() {
    let store = make_store();
    let ledger = make_ledger(&store);
    let engine = make_engine(
        &store,
        &ledger,
        CapabilityPipeline::with_provider(Arc::new(DeadProvider)),
    );
    let (entity, _) = seed_divide(&store, "v1");

    let err = engine.request_synthesis(&entity.id).await.unwrap_err();

    assert!(matches!(
        err,
        LoreError::Synthesis(SynthesisError::ProviderUnavailable { .. })
    ));
    assert!(store.claims_for_entity(&entity.id).unwrap().is_empty());
    assert_eq!(ledger.event_count().unwrap(), 0);
}

#[tokio::test]
async fn wall_clock_budget_cancels_slow_providers() {
    let store = make_store();
    let ledger = make_ledger(&store);
    let (entity, guard_hash) = seed_divide(&store, "v1");
    let engine = SynthesisEngine::new(
        store.clone(),
        ledger.clone(),
        CapabilityPipeline::with_provider(Arc::new(SleepyProvider {
            sleep: Duration::from_millis(300),
            cited_hash: guard_hash,
        })),
        SynthesisConfig {
            wall_clock_ms: 50,
            ..SynthesisConfig::default()
        },
    );

    let err = engine.request_synthesis(&entity.id).await.unwrap_err();

    assert!(matches!(
        err,
        LoreError::Synthesis(SynthesisError::BudgetExhausted { budget_ms: 50, .. })
    ));
    assert!(store.claims_for_entity(&entity.id).unwrap().is_empty());
    assert_eq!(ledger.event_count().unwrap(), 0);
}

#[tokio::test]
async fn citation_free_provider_claims_are_malformed() {
    let store = make_store();
    let ledger = make_ledger(&store);
    let engine = make_engine(
        &store,
        &ledger,
        CapabilityPipeline::with_provider(Arc::new(ScriptedProvider::new(vec![vec![
            ProviderClaim {
                text: "Trust me on this one.".to_string(),
                citations: Vec::new(),
                model: "scripted-v1".to_string(),
            },
        ]]))),
    );
    let (entity, _) = seed_divide(&store, "v1");

    let err = engine.request_synthesis(&entity.id).await.unwrap_err();

    assert!(matches!(
        err,
        LoreError::Synthesis(SynthesisError::MalformedResponse { .. })
    ));
    assert!(store.claims_for_entity(&entity.id).unwrap().is_empty());
}

#[tokio::test]
async fn empty_pipeline_is_an_empty_synthesis() {
    let store = make_store();
    let ledger = make_ledger(&store);
    let engine = make_engine(&store, &ledger, CapabilityPipeline::new(Vec::new()));
    let (entity, _) = seed_divide(&store, "v1");

    let err = engine.request_synthesis(&entity.id).await.unwrap_err();

    assert!(matches!(
        err,
        LoreError::Synthesis(SynthesisError::EmptySynthesis { .. })
    ));
}

// ── Quarantine ────────────────────────────────────────────────────────────

#[tokio::test]
async fn invented_citations_are_quarantined_not_stored_as_valid() {
    let store = make_store();
    let ledger = make_ledger(&store);
    let engine = make_engine(
        &store,
        &ledger,
        CapabilityPipeline::with_provider(Arc::new(ScriptedProvider::new(vec![vec![
            provider_claim("Cites a span that never existed.", "fabricated-hash"),
        ]]))),
    );
    let (entity, _) = seed_divide(&store, "v1");

    let outcome = engine.request_synthesis(&entity.id).await.unwrap();

    assert_eq!(outcome.validated.len(), 2);
    assert_eq!(outcome.quarantined.len(), 1);
    assert!(matches!(
        outcome.failures[0],
        SynthesisError::QuarantinedClaim {
            failed_citations: 1,
            ..
        }
    ));

    let quarantined = &outcome.quarantined[0];
    assert_eq!(quarantined.state, ClaimState::Quarantined);
    assert!(store
        .claims_in_state(ClaimState::Validated)
        .unwrap()
        .iter()
        .all(|c| c.id != quarantined.id));

    // Unverified synthesis evidence with no curve reports absent.
    let view = ledger.rebuild_view().unwrap();
    let confidence = ledger
        .confidence(
            &view,
            &quarantined.id,
            Durability::Volatile,
            GLOBAL_COHORT,
            chrono::Utc::now(),
        )
        .unwrap();
    assert!(!confidence.is_present());
}

#[tokio::test]
async fn quarantine_retry_reuses_the_claim_id() {
    let store = make_store();
    let ledger = make_ledger(&store);
    let (entity, guard_hash) = seed_divide(&store, "v1");
    let engine = make_engine(
        &store,
        &ledger,
        CapabilityPipeline::with_provider(Arc::new(ScriptedProvider::new(vec![
            vec![provider_claim("First attempt, bad citation.", "bogus")],
            vec![provider_claim("Second attempt, real citation.", &guard_hash)],
        ]))),
    );

    let first = engine.request_synthesis(&entity.id).await.unwrap();
    assert_eq!(first.quarantined.len(), 1);
    let quarantined_id = first.quarantined[0].id.clone();

    // Same content: the cached receipt holds a quarantined claim, so the
    // engine retries instead of serving the cache.
    let second = engine.request_synthesis(&entity.id).await.unwrap();
    assert!(!second.from_cache);
    assert!(second.quarantined.is_empty());
    assert!(second.validated.iter().any(|c| c.id == quarantined_id));

    let transitions: Vec<(ClaimState, ClaimState)> = ledger
        .events_since(0)
        .unwrap()
        .into_iter()
        .filter(|e| e.claim_id.as_ref() == Some(&quarantined_id))
        .filter_map(|e| match e.kind {
            LedgerEventKind::ClaimStateChanged { from, to } => Some((from, to)),
            _ => None,
        })
        .collect();
    assert_eq!(
        transitions,
        vec![
            (ClaimState::Synthesized, ClaimState::Quarantined),
            (ClaimState::Quarantined, ClaimState::Stale),
            (ClaimState::Stale, ClaimState::Pending),
            (ClaimState::Pending, ClaimState::Synthesized),
            (ClaimState::Synthesized, ClaimState::Validated),
        ]
    );
}

// ── Cache & re-synthesis ──────────────────────────────────────────────────

#[tokio::test]
async fn cache_short_circuits_unchanged_entities() {
    let store = make_store();
    let ledger = make_ledger(&store);
    let (entity, guard_hash) = seed_divide(&store, "v1");
    let provider = Arc::new(CountingProvider::new(guard_hash));
    let engine = make_engine(
        &store,
        &ledger,
        CapabilityPipeline::with_provider(provider.clone()),
    );

    let first = engine.request_synthesis(&entity.id).await.unwrap();
    let second = engine.request_synthesis(&entity.id).await.unwrap();

    assert_eq!(provider.calls(), 1);
    assert!(!first.from_cache);
    assert!(second.from_cache);
    let first_ids: HashSet<ClaimId> = first.validated.iter().map(|c| c.id.clone()).collect();
    let second_ids: HashSet<ClaimId> = second.validated.iter().map(|c| c.id.clone()).collect();
    assert_eq!(first_ids, second_ids);
    assert_eq!(engine.cache().hits(), 1);
}

#[tokio::test]
async fn content_change_resynthesizes_and_keeps_claim_ids() {
    let store = make_store();
    let ledger = make_ledger(&store);
    let (entity, guard_hash) = seed_divide(&store, "v1");
    let provider = Arc::new(CountingProvider::new(guard_hash));
    let engine = make_engine(
        &store,
        &ledger,
        CapabilityPipeline::with_provider(provider.clone()),
    );

    let first = engine.request_synthesis(&entity.id).await.unwrap();

    // New content, same facts: revision bumps, fact hashes survive.
    let v2 = divide_entity("v2");
    let outcome = store.admit(&v2, &divide_facts(&v2)).unwrap();
    assert!(outcome.changed());

    let second = engine.request_synthesis(&entity.id).await.unwrap();

    assert_eq!(provider.calls(), 2);
    assert!(!second.from_cache);
    let first_ids: HashSet<ClaimId> = first.validated.iter().map(|c| c.id.clone()).collect();
    let second_ids: HashSet<ClaimId> = second.validated.iter().map(|c| c.id.clone()).collect();
    assert_eq!(first_ids, second_ids);
    for claim in &second.validated {
        assert_eq!(claim.revision, 2);
        assert_eq!(claim.state, ClaimState::Validated);
    }
}

#[tokio::test]
async fn claims_without_a_draft_this_cycle_go_stale() {
    let store = make_store();
    let ledger = make_ledger(&store);
    let (entity, guard_hash) = seed_divide(&store, "v1");
    let engine = make_engine(
        &store,
        &ledger,
        CapabilityPipeline::with_provider(Arc::new(ScriptedProvider::new(vec![
            vec![provider_claim("Checked division helper.", &guard_hash)],
            Vec::new(),
        ]))),
    );

    let first = engine.request_synthesis(&entity.id).await.unwrap();
    assert_eq!(first.validated.len(), 3);
    let semantic_id = first
        .validated
        .iter()
        .find(|c| c.provenance.provider == "scripted")
        .map(|c| c.id.clone())
        .unwrap();

    let v2 = divide_entity("v2");
    store.admit(&v2, &divide_facts(&v2)).unwrap();
    let second = engine.request_synthesis(&entity.id).await.unwrap();

    // The provider went quiet; the structural claims survive, the old
    // semantic claim is retired instead of lingering as retrievable.
    assert_eq!(second.validated.len(), 2);
    let retired = store.claim(&semantic_id).unwrap().unwrap();
    assert_eq!(retired.state, ClaimState::Stale);
}
