//! Feedback ingestion tests: outcomes land as ledger events, failures
//! escalate to capping defeaters, and bad ids are rejected before any
//! event is appended.

use std::sync::Arc;

use chrono::Utc;

use lore_core::config::LedgerConfig;
use lore_core::models::{
    hash_content, AbsentReason, ClaimProvenance, ConfidenceValue, ContextPack, DefeaterKind,
    DefeaterSeverity, DepthLevel, Entity, EntityKind, Fact, FactPayload, FeedbackOutcome,
    SemanticClaim, SourceLocation,
};
use lore_core::traits::IIndexStore;
use lore_core::types::{AdapterId, ClaimId, EntityId, PackId, QueryId};
use lore_core::QueryIntent;
use lore_feedback::FeedbackIngestor;
use lore_ledger::{EpistemicsLedger, LedgerEventKind};
use lore_store::StoreEngine;

// ── Fixtures ──────────────────────────────────────────────────────────────

struct World {
    ledger: Arc<EpistemicsLedger>,
    ingestor: FeedbackIngestor,
    query: QueryId,
    auth_pack: PackId,
    issue_pack: PackId,
    other_pack: PackId,
    check: EntityId,
    check_claim: ClaimId,
    parse_claim: ClaimId,
    issue_claim: ClaimId,
}

fn provenance() -> ClaimProvenance {
    ClaimProvenance {
        provider: "scripted".to_string(),
        model: "scripted-v1".to_string(),
        prompt_version: "v1".to_string(),
    }
}

fn admit_function(store: &StoreEngine, path: &str, symbol: &str, start: u32, end: u32) -> Entity {
    let entity = Entity::new(
        EntityId::for_symbol(path, symbol),
        EntityKind::Function,
        SourceLocation::new(path, start, end),
        hash_content(&format!("def {symbol}(token): ...")),
    );
    let fact = Fact::new(
        entity.id.clone(),
        FactPayload::Signature {
            name: symbol.to_string(),
            parameters: vec!["token".to_string()],
            returns: Some("bool".to_string()),
        },
        AdapterId::new("fixture"),
    );
    store.admit(&entity, &[fact]).unwrap();
    entity
}

fn put_claim(store: &StoreEngine, entity: &Entity, text: &str) -> ClaimId {
    let claim = SemanticClaim::new(entity.id.clone(), text, provenance(), entity.revision);
    store.put_claim(&claim).unwrap();
    claim.id
}

fn make_pack(entity: &Entity, claims: &[&ClaimId]) -> ContextPack {
    ContextPack {
        id: PackId::generate(),
        entity_id: entity.id.clone(),
        summary: format!("context for {}", entity.id),
        sections: vec![],
        citations: vec![],
        claim_ids: claims.iter().map(|c| (*c).clone()).collect(),
        confidence: ConfidenceValue::absent(AbsentReason::Uncalibrated),
        active_defeaters: vec![],
        freshness: Utc::now(),
        invalidation_triggers: vec![entity.id.clone()],
        token_cost: 64,
        depth: DepthLevel::Signatures,
    }
}

/// Two queries over a small auth module. The main query delivered two
/// packs; `check_claim` is cited by both (the issue pack pulls it in as
/// dependency context). A third pack belongs to the other query.
fn auth_world() -> World {
    let store = Arc::new(StoreEngine::open_in_memory().unwrap());
    let ledger = Arc::new(EpistemicsLedger::for_store(&store, LedgerConfig::default()));

    let check = admit_function(&store, "src/auth.py", "check_token", 5, 40);
    let issue = admit_function(&store, "src/auth.py", "issue_token", 42, 80);

    let check_claim = put_claim(&store, &check, "check_token rejects expired bearer tokens");
    let parse_claim = put_claim(&store, &check, "check_token parses the Authorization header");
    let issue_claim = put_claim(&store, &issue, "issue_token signs a fresh bearer token");

    let query = QueryId::generate();
    store
        .record_query(&query, "how is a bearer token checked?", QueryIntent::Understand, 1)
        .unwrap();
    let auth_pack = make_pack(&check, &[&check_claim, &parse_claim]);
    let issue_pack = make_pack(&issue, &[&issue_claim, &check_claim]);
    store.put_pack(&auth_pack, &query).unwrap();
    store.put_pack(&issue_pack, &query).unwrap();

    let other_query = QueryId::generate();
    store
        .record_query(&other_query, "who calls issue_token?", QueryIntent::Navigate, 1)
        .unwrap();
    let other_pack = make_pack(&issue, &[&issue_claim]);
    store.put_pack(&other_pack, &other_query).unwrap();

    let ingestor = FeedbackIngestor::new(store.clone(), ledger.clone());
    World {
        ledger,
        ingestor,
        query,
        auth_pack: auth_pack.id,
        issue_pack: issue_pack.id,
        other_pack: other_pack.id,
        check: check.id,
        check_claim,
        parse_claim,
        issue_claim,
    }
}

// ── Recording outcomes ────────────────────────────────────────────────────

#[tokio::test]
async fn worked_outcome_lands_in_the_ledger() {
    let world = auth_world();
    let before = world.ledger.event_count().unwrap();

    let sequences = world
        .ingestor
        .submit_feedback(&world.query, &[world.auth_pack.clone()], FeedbackOutcome::Worked)
        .await
        .unwrap();

    assert_eq!(sequences.len(), 2, "one event per cited claim");
    let events = world.ledger.events_since(before).unwrap();
    assert_eq!(events.len(), 2);
    for event in &events {
        match &event.kind {
            LedgerEventKind::OutcomeRecorded {
                query_id,
                pack_id,
                outcome,
            } => {
                assert_eq!(query_id, &world.query);
                assert_eq!(pack_id, &world.auth_pack);
                assert_eq!(*outcome, FeedbackOutcome::Worked);
            }
            other => panic!("expected an outcome event, got {other:?}"),
        }
        assert_eq!(event.entity_id.as_ref(), Some(&world.check));
    }
    let recorded: Vec<ClaimId> = events.iter().filter_map(|e| e.claim_id.clone()).collect();
    assert!(recorded.contains(&world.check_claim));
    assert!(recorded.contains(&world.parse_claim));
}

#[tokio::test]
async fn irrelevant_outcomes_never_escalate() {
    let world = auth_world();
    let before = world.ledger.event_count().unwrap();

    world
        .ingestor
        .submit_feedback(&world.query, &[world.issue_pack.clone()], FeedbackOutcome::Irrelevant)
        .await
        .unwrap();

    let events = world.ledger.events_since(before).unwrap();
    assert!(events
        .iter()
        .all(|e| matches!(e.kind, LedgerEventKind::OutcomeRecorded { .. })));
    let view = world.ledger.rebuild_view().unwrap();
    assert!(view
        .claim(&world.issue_claim)
        .unwrap()
        .active_defeaters
        .is_empty());
}

// ── Failure escalation ────────────────────────────────────────────────────

#[tokio::test]
async fn failed_outcome_caps_each_cited_claim() {
    let world = auth_world();

    let sequences = world
        .ingestor
        .submit_feedback(&world.query, &[world.auth_pack.clone()], FeedbackOutcome::Failed)
        .await
        .unwrap();

    // Two outcome events plus two defeater activations.
    assert_eq!(sequences.len(), 4);

    let view = world.ledger.rebuild_view().unwrap();
    for claim_id in [&world.check_claim, &world.parse_claim] {
        let state = view.claim(claim_id).unwrap();
        assert_eq!(state.active_defeaters.len(), 1, "one capping defeater");
        let defeater = &state.active_defeaters[0];
        assert_eq!(defeater.kind, DefeaterKind::FailedOutcome);
        assert_eq!(defeater.severity, DefeaterSeverity::CapsConfidence { cap: 0.4 });
    }
}

#[tokio::test]
async fn repeated_failures_never_stack_defeaters() {
    let world = auth_world();

    world
        .ingestor
        .submit_feedback(&world.query, &[world.auth_pack.clone()], FeedbackOutcome::Failed)
        .await
        .unwrap();
    let second = world
        .ingestor
        .submit_feedback(&world.query, &[world.auth_pack.clone()], FeedbackOutcome::Failed)
        .await
        .unwrap();

    // The second submission appends outcome events only.
    assert_eq!(second.len(), 2);

    let view = world.ledger.rebuild_view().unwrap();
    let check = view.claim(&world.check_claim).unwrap();
    assert_eq!(check.active_defeaters.len(), 1);
    assert_eq!(check.outcomes.len(), 2, "both failures stay on the record");
}

#[tokio::test]
async fn shared_claims_get_one_event_per_pack_and_one_defeater() {
    let world = auth_world();

    let sequences = world
        .ingestor
        .submit_feedback(
            &world.query,
            &[world.auth_pack.clone(), world.issue_pack.clone()],
            FeedbackOutcome::Failed,
        )
        .await
        .unwrap();

    // check_claim is cited by both packs: four outcome events, three
    // defeater activations.
    assert_eq!(sequences.len(), 7);

    let view = world.ledger.rebuild_view().unwrap();
    let check = view.claim(&world.check_claim).unwrap();
    assert_eq!(check.outcomes.len(), 2, "one outcome per citing pack");
    assert_eq!(check.active_defeaters.len(), 1);
}

// ── Validation ────────────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_query_is_rejected() {
    let world = auth_world();

    let err = world
        .ingestor
        .submit_feedback(
            &QueryId::new("no-such-query"),
            &[world.auth_pack.clone()],
            FeedbackOutcome::Worked,
        )
        .await
        .unwrap_err();

    assert!(err.to_string().contains("unknown query"), "got: {err}");
    assert_eq!(world.ledger.event_count().unwrap(), 0, "nothing recorded");
}

#[tokio::test]
async fn pack_from_another_query_is_rejected() {
    let world = auth_world();

    let err = world
        .ingestor
        .submit_feedback(
            &world.query,
            &[world.auth_pack.clone(), world.other_pack.clone()],
            FeedbackOutcome::Worked,
        )
        .await
        .unwrap_err();

    assert!(err.to_string().contains("unknown pack"), "got: {err}");
    assert_eq!(
        world.ledger.event_count().unwrap(),
        0,
        "validation precedes any append"
    );
}

#[tokio::test]
async fn empty_pack_list_is_rejected() {
    let world = auth_world();

    let err = world
        .ingestor
        .submit_feedback(&world.query, &[], FeedbackOutcome::Worked)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("outcome rejected"), "got: {err}");
}
