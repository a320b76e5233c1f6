//! Fact persistence. Facts are replaced wholesale when their entity's
//! content changes; there is no per-fact update path.

use rusqlite::{params, Connection};

use lore_core::errors::{LoreError, LoreResult, StoreError};
use lore_core::models::{Fact, FactPayload};
use lore_core::types::{AdapterId, EntityId, FactId};

use crate::to_store_err;

pub fn insert_facts(conn: &Connection, facts: &[Fact]) -> LoreResult<()> {
    let mut stmt = conn
        .prepare(
            "INSERT OR IGNORE INTO facts
                (id, entity_id, kind, payload, search_text, content_hash, adapter)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .map_err(|e| to_store_err(e.to_string()))?;
    for fact in facts {
        let payload_json = serde_json::to_string(&fact.payload)
            .map_err(|e| to_store_err(format!("fact payload: {e}")))?;
        stmt.execute(params![
            fact.id.as_str(),
            fact.entity_id.as_str(),
            fact.payload.kind(),
            payload_json,
            search_text(&fact.payload),
            fact.content_hash,
            fact.adapter.as_str(),
        ])
        .map_err(|e| to_store_err(format!("fact insert: {e}")))?;
    }
    Ok(())
}

pub fn facts_for_entity(conn: &Connection, entity_id: &EntityId) -> LoreResult<Vec<Fact>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, entity_id, payload, content_hash, adapter
             FROM facts WHERE entity_id = ?1 ORDER BY id",
        )
        .map_err(|e| to_store_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![entity_id.as_str()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })
        .map_err(|e| to_store_err(e.to_string()))?;

    let mut facts = Vec::new();
    for row in rows {
        let (id, entity, payload_json, content_hash, adapter) =
            row.map_err(|e| to_store_err(e.to_string()))?;
        let payload: FactPayload = serde_json::from_str(&payload_json).map_err(|e| {
            LoreError::Store(StoreError::Serialization {
                reason: format!("fact {id}: {e}"),
            })
        })?;
        facts.push(Fact {
            id: FactId::new(id),
            entity_id: EntityId::new(entity),
            payload,
            content_hash,
            adapter: AdapterId::new(adapter),
        });
    }
    Ok(facts)
}

/// Plain-text rendering of a payload for the FTS mirror.
pub fn search_text(payload: &FactPayload) -> String {
    match payload {
        FactPayload::Signature {
            name,
            parameters,
            returns,
        } => {
            let mut text = name.clone();
            for p in parameters {
                text.push(' ');
                text.push_str(p);
            }
            if let Some(r) = returns {
                text.push(' ');
                text.push_str(r);
            }
            text
        }
        FactPayload::Import { source } => source.clone(),
        FactPayload::Export { symbol } => symbol.clone(),
        FactPayload::Call { callee } => callee.clone(),
        FactPayload::Guard { condition, raises } => format!("{condition} {raises}"),
        FactPayload::Doc { text } => text.clone(),
        FactPayload::Metrics { .. } => String::new(),
    }
}
