//! Criterion benchmarks for the index store.
//!
//! Targets:
//! - Admission of an unchanged entity (pure hash comparison) < 0.05ms
//! - Admission of a new entity with 4 facts < 2ms
//! - FTS search over 500 validated claims < 5ms

use criterion::{criterion_group, criterion_main, Criterion};

use lore_core::models::{
    hash_content, ClaimProvenance, ClaimState, Entity, EntityKind, Fact, FactPayload,
    SemanticClaim, SourceLocation,
};
use lore_core::traits::IIndexStore;
use lore_core::types::{AdapterId, EntityId};
use lore_store::StoreEngine;

fn make_entity(n: usize, content: &str) -> Entity {
    Entity::new(
        EntityId::for_symbol(&format!("src/module_{n}.py"), "handler"),
        EntityKind::Function,
        SourceLocation::new(format!("src/module_{n}.py"), 1, 40),
        hash_content(content),
    )
}

fn make_facts(entity: &Entity) -> Vec<Fact> {
    let adapter = AdapterId::new("py-regex");
    vec![
        Fact::new(
            entity.id.clone(),
            FactPayload::Signature {
                name: "handler".to_string(),
                parameters: vec!["request".to_string()],
                returns: Some("Response".to_string()),
            },
            adapter.clone(),
        ),
        Fact::new(
            entity.id.clone(),
            FactPayload::Import {
                source: "core.math_utils".to_string(),
            },
            adapter.clone(),
        ),
        Fact::new(
            entity.id.clone(),
            FactPayload::Call {
                callee: "checked_div".to_string(),
            },
            adapter.clone(),
        ),
        Fact::new(
            entity.id.clone(),
            FactPayload::Metrics {
                lines: 40,
                branches: 3,
            },
            adapter,
        ),
    ]
}

fn bench_admit_unchanged(c: &mut Criterion) {
    let engine = StoreEngine::open_in_memory().unwrap();
    let entity = make_entity(0, "def handler(request): ...");
    let facts = make_facts(&entity);
    engine.admit(&entity, &facts).unwrap();

    c.bench_function("admit_unchanged_entity", |bench| {
        bench.iter(|| engine.admit(&entity, &facts).unwrap())
    });
}

fn bench_admit_new(c: &mut Criterion) {
    let engine = StoreEngine::open_in_memory().unwrap();
    let mut n = 0usize;

    c.bench_function("admit_new_entity_4_facts", |bench| {
        bench.iter(|| {
            n += 1;
            let entity = make_entity(n, "def handler(request): ...");
            let facts = make_facts(&entity);
            engine.admit(&entity, &facts).unwrap()
        })
    });
}

fn bench_fts_search(c: &mut Criterion) {
    let engine = StoreEngine::open_in_memory().unwrap();
    for n in 0..500 {
        let entity = make_entity(n, "def handler(request): ...");
        engine.admit(&entity, &[]).unwrap();
        let claim = SemanticClaim::new(
            entity.id.clone(),
            format!("handler {n} validates the request payload before dispatch"),
            ClaimProvenance {
                provider: "scripted".to_string(),
                model: "scripted-v1".to_string(),
                prompt_version: "v1".to_string(),
            },
            1,
        );
        engine.put_claim(&claim).unwrap();
        engine.set_claim_state(&claim.id, ClaimState::Validated).unwrap();
    }

    c.bench_function("fts_search_500_claims", |bench| {
        bench.iter(|| engine.search_text("validates payload", 20).unwrap())
    });
}

criterion_group!(
    benches,
    bench_admit_unchanged,
    bench_admit_new,
    bench_fts_search
);
criterion_main!(benches);
