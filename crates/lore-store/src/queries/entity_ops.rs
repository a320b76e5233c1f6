//! Entity admission and lookup.
//!
//! Admission is the early-cutoff point for the whole pipeline: an
//! unchanged content hash writes nothing, so nothing downstream recomputes.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use lore_core::errors::{LoreError, LoreResult, StoreError};
use lore_core::models::{Durability, Entity, EntityKind, Fact, SourceLocation};
use lore_core::traits::StoreOutcome;
use lore_core::types::EntityId;

use super::fact_ops;
use crate::to_store_err;

/// Admit an entity with its facts. Hash-compare first; write only on
/// change. The whole admission is one transaction.
pub fn admit(conn: &Connection, entity: &Entity, facts: &[Fact]) -> LoreResult<StoreOutcome> {
    let existing: Option<(String, u64)> = conn
        .query_row(
            "SELECT content_hash, revision FROM entities WHERE id = ?1",
            params![entity.id.as_str()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .map(Some)
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(to_store_err(other.to_string())),
        })?;

    match existing {
        Some((hash, _)) if hash == entity.content_hash => Ok(StoreOutcome::Unchanged),
        Some((previous_hash, revision)) => {
            let tx = conn
                .unchecked_transaction()
                .map_err(|e| to_store_err(format!("admit begin: {e}")))?;
            let next_revision = revision + 1;
            tx.execute(
                "UPDATE entities
                 SET kind = ?2, path = ?3, line_start = ?4, line_end = ?5,
                     content_hash = ?6, durability = 'volatile', revision = ?7,
                     last_changed = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1",
                params![
                    entity.id.as_str(),
                    entity.kind.as_str(),
                    entity.location.path,
                    entity.location.line_start,
                    entity.location.line_end,
                    entity.content_hash,
                    next_revision,
                ],
            )
            .map_err(|e| to_store_err(format!("admit update: {e}")))?;
            tx.execute(
                "DELETE FROM facts WHERE entity_id = ?1",
                params![entity.id.as_str()],
            )
            .map_err(|e| to_store_err(format!("admit clear facts: {e}")))?;
            fact_ops::insert_facts(&tx, facts)?;
            record_change(&tx, &entity.id)?;
            tx.commit()
                .map_err(|e| to_store_err(format!("admit commit: {e}")))?;
            Ok(StoreOutcome::Superseded {
                previous_hash,
                revision: next_revision,
            })
        }
        None => {
            let tx = conn
                .unchecked_transaction()
                .map_err(|e| to_store_err(format!("admit begin: {e}")))?;
            tx.execute(
                "INSERT INTO entities (id, kind, path, line_start, line_end, content_hash)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    entity.id.as_str(),
                    entity.kind.as_str(),
                    entity.location.path,
                    entity.location.line_start,
                    entity.location.line_end,
                    entity.content_hash,
                ],
            )
            .map_err(|e| to_store_err(format!("admit insert: {e}")))?;
            fact_ops::insert_facts(&tx, facts)?;
            record_change(&tx, &entity.id)?;
            tx.commit()
                .map_err(|e| to_store_err(format!("admit commit: {e}")))?;
            Ok(StoreOutcome::Created { revision: 1 })
        }
    }
}

fn record_change(conn: &Connection, entity_id: &EntityId) -> LoreResult<()> {
    conn.execute(
        "INSERT OR IGNORE INTO change_log (session, entity_id)
         VALUES ((SELECT MAX(session) FROM change_sessions), ?1)",
        params![entity_id.as_str()],
    )
    .map_err(|e| to_store_err(format!("record change: {e}")))?;
    Ok(())
}

pub fn get_entity(conn: &Connection, id: &EntityId) -> LoreResult<Option<Entity>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, kind, path, line_start, line_end, content_hash,
                    durability, revision, first_seen, last_changed
             FROM entities WHERE id = ?1",
        )
        .map_err(|e| to_store_err(e.to_string()))?;
    let mut rows = stmt
        .query_map(params![id.as_str()], |row| Ok(parse_entity_row(row)))
        .map_err(|e| to_store_err(e.to_string()))?;
    match rows.next() {
        Some(row) => Ok(Some(row.map_err(|e| to_store_err(e.to_string()))??)),
        None => Ok(None),
    }
}

pub fn all_entities(conn: &Connection) -> LoreResult<Vec<Entity>> {
    entities_where(conn, "1 = 1", &[])
}

pub fn entities_in_path(conn: &Connection, prefix: &str) -> LoreResult<Vec<Entity>> {
    let pattern = format!("{}%", prefix.replace('%', "\\%").replace('_', "\\_"));
    entities_where(conn, "path LIKE ?1 ESCAPE '\\'", &[&pattern])
}

fn entities_where(
    conn: &Connection,
    clause: &str,
    args: &[&dyn rusqlite::types::ToSql],
) -> LoreResult<Vec<Entity>> {
    let sql = format!(
        "SELECT id, kind, path, line_start, line_end, content_hash,
                durability, revision, first_seen, last_changed
         FROM entities WHERE {clause} ORDER BY id"
    );
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| to_store_err(e.to_string()))?;
    let rows = stmt
        .query_map(args, |row| Ok(parse_entity_row(row)))
        .map_err(|e| to_store_err(e.to_string()))?;
    let mut results = Vec::new();
    for row in rows {
        results.push(row.map_err(|e| to_store_err(e.to_string()))??);
    }
    Ok(results)
}

pub fn remove_entity(conn: &Connection, id: &EntityId) -> LoreResult<()> {
    conn.execute("DELETE FROM entities WHERE id = ?1", params![id.as_str()])
        .map_err(|e| to_store_err(e.to_string()))?;
    Ok(())
}

pub fn set_durability(
    conn: &Connection,
    id: &EntityId,
    durability: Durability,
) -> LoreResult<()> {
    let updated = conn
        .execute(
            "UPDATE entities SET durability = ?2 WHERE id = ?1",
            params![id.as_str(), durability.as_str()],
        )
        .map_err(|e| to_store_err(e.to_string()))?;
    if updated == 0 {
        return Err(LoreError::Store(StoreError::NotFound {
            kind: "entity",
            id: id.as_str().to_string(),
        }));
    }
    Ok(())
}

/// Parse one entities row. Column order matches every SELECT above.
pub fn parse_entity_row(row: &Row<'_>) -> LoreResult<Entity> {
    let kind_raw: String = row.get(1).map_err(|e| to_store_err(e.to_string()))?;
    let kind = parse_kind(&kind_raw)?;
    let durability_raw: String = row.get(6).map_err(|e| to_store_err(e.to_string()))?;
    let durability = parse_durability(&durability_raw)?;
    Ok(Entity {
        id: EntityId::new(row.get::<_, String>(0).map_err(|e| to_store_err(e.to_string()))?),
        kind,
        location: SourceLocation {
            path: row.get(2).map_err(|e| to_store_err(e.to_string()))?,
            line_start: row.get(3).map_err(|e| to_store_err(e.to_string()))?,
            line_end: row.get(4).map_err(|e| to_store_err(e.to_string()))?,
        },
        content_hash: row.get(5).map_err(|e| to_store_err(e.to_string()))?,
        durability,
        revision: row.get(7).map_err(|e| to_store_err(e.to_string()))?,
        first_seen: parse_timestamp(&row.get::<_, String>(8).map_err(|e| to_store_err(e.to_string()))?)?,
        last_changed: parse_timestamp(&row.get::<_, String>(9).map_err(|e| to_store_err(e.to_string()))?)?,
    })
}

fn parse_kind(raw: &str) -> LoreResult<EntityKind> {
    match raw {
        "file" => Ok(EntityKind::File),
        "module" => Ok(EntityKind::Module),
        "function" => Ok(EntityKind::Function),
        "method" => Ok(EntityKind::Method),
        "struct" => Ok(EntityKind::Struct),
        other => Err(LoreError::Store(StoreError::Serialization {
            reason: format!("unknown entity kind '{other}'"),
        })),
    }
}

fn parse_durability(raw: &str) -> LoreResult<Durability> {
    match raw {
        "immutable" => Ok(Durability::Immutable),
        "stable" => Ok(Durability::Stable),
        "volatile" => Ok(Durability::Volatile),
        other => Err(LoreError::Store(StoreError::Serialization {
            reason: format!("unknown durability '{other}'"),
        })),
    }
}

pub fn parse_timestamp(raw: &str) -> LoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            LoreError::Store(StoreError::Serialization {
                reason: format!("bad timestamp '{raw}': {e}"),
            })
        })
}
