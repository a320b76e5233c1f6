//! Property tests: admission cutoff, fact round-trips, claim text fidelity.

use proptest::prelude::*;

use lore_core::models::{
    hash_content, ClaimProvenance, Entity, EntityKind, Fact, FactPayload, SemanticClaim,
    SourceLocation,
};
use lore_core::traits::{IIndexStore, StoreOutcome};
use lore_core::types::{AdapterId, EntityId};
use lore_store::StoreEngine;

fn make_entity(content: &str) -> Entity {
    Entity::new(
        EntityId::for_symbol("src/prop.py", "subject"),
        EntityKind::Function,
        SourceLocation::new("src/prop.py", 1, 10),
        hash_content(content),
    )
}

proptest! {
    /// Re-admitting byte-identical content is always a no-op, whatever
    /// the content looks like.
    #[test]
    fn prop_readmission_is_unchanged(content in "[ -~]{1,200}") {
        let engine = StoreEngine::open_in_memory().unwrap();
        let entity = make_entity(&content);
        let facts = vec![Fact::new(
            entity.id.clone(),
            FactPayload::Doc { text: content.clone() },
            AdapterId::new("py-regex"),
        )];

        let first = engine.admit(&entity, &facts).unwrap();
        prop_assert_eq!(first, StoreOutcome::Created { revision: 1 });

        let second = engine.admit(&entity, &facts).unwrap();
        prop_assert_eq!(second, StoreOutcome::Unchanged);
    }

    /// Fact payloads survive the JSON column round trip byte for byte.
    #[test]
    fn prop_fact_payload_roundtrip(
        name in "[a-z_][a-z0-9_]{0,30}",
        params in prop::collection::vec("[a-z][a-z0-9]{0,10}", 0..5),
    ) {
        let engine = StoreEngine::open_in_memory().unwrap();
        let entity = make_entity("fixed content");
        let payload = FactPayload::Signature {
            name: name.clone(),
            parameters: params.clone(),
            returns: None,
        };
        let fact = Fact::new(entity.id.clone(), payload.clone(), AdapterId::new("py-regex"));

        engine.admit(&entity, std::slice::from_ref(&fact)).unwrap();
        let stored = engine.facts(&entity.id).unwrap();

        prop_assert_eq!(stored.len(), 1);
        prop_assert_eq!(&stored[0].payload, &payload);
        prop_assert_eq!(&stored[0].content_hash, &fact.content_hash);
    }

    /// Claim text is stored verbatim, including characters FTS treats
    /// as operators.
    #[test]
    fn prop_claim_text_fidelity(text in "[ -~]{1,120}") {
        let engine = StoreEngine::open_in_memory().unwrap();
        let entity = make_entity("fixed content");
        engine.admit(&entity, &[]).unwrap();

        let claim = SemanticClaim::new(
            entity.id.clone(),
            text.clone(),
            ClaimProvenance {
                provider: "scripted".to_string(),
                model: "scripted-v1".to_string(),
                prompt_version: "v1".to_string(),
            },
            1,
        );
        engine.put_claim(&claim).unwrap();

        let loaded = engine.claim(&claim.id).unwrap().unwrap();
        prop_assert_eq!(loaded.text, text);
    }
}
