//! Query log and served-pack persistence.
//!
//! Packs are stored as serialized JSON bodies keyed by pack id. The
//! query row must exist before its packs: `packs.query_id` references
//! `query_log` and deletes cascade with it.

use rusqlite::{params, Connection, OptionalExtension};

use lore_core::errors::LoreResult;
use lore_core::intent::QueryIntent;
use lore_core::models::ContextPack;
use lore_core::types::{PackId, QueryId};

use crate::to_store_err;

/// Record a served query. Idempotent on query id.
pub fn record_query(
    conn: &Connection,
    query_id: &QueryId,
    text: &str,
    intent: QueryIntent,
    revision: u64,
) -> LoreResult<()> {
    conn.execute(
        "INSERT OR IGNORE INTO query_log (id, query_text, intent, revision) VALUES (?1, ?2, ?3, ?4)",
        params![query_id.as_str(), text, intent.as_str(), revision],
    )
    .map_err(|e| to_store_err(format!("record_query: {e}")))?;
    Ok(())
}

pub fn query_exists(conn: &Connection, query_id: &QueryId) -> LoreResult<bool> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM query_log WHERE id = ?1",
            params![query_id.as_str()],
            |row| row.get(0),
        )
        .map_err(|e| to_store_err(format!("query_exists: {e}")))?;
    Ok(count > 0)
}

/// Store a pack served for a query. Replaces any prior body under the
/// same pack id.
pub fn put_pack(conn: &Connection, pack: &ContextPack, query_id: &QueryId) -> LoreResult<()> {
    let body = serde_json::to_string(pack).map_err(|e| to_store_err(e.to_string()))?;
    conn.execute(
        "INSERT INTO packs (id, query_id, entity_id, body)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET
            query_id = excluded.query_id,
            entity_id = excluded.entity_id,
            body = excluded.body",
        params![
            pack.id.as_str(),
            query_id.as_str(),
            pack.entity_id.as_str(),
            body,
        ],
    )
    .map_err(|e| to_store_err(format!("put_pack: {e}")))?;
    Ok(())
}

pub fn get_pack(conn: &Connection, id: &PackId) -> LoreResult<Option<ContextPack>> {
    let body: Option<String> = conn
        .query_row(
            "SELECT body FROM packs WHERE id = ?1",
            params![id.as_str()],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| to_store_err(format!("get_pack: {e}")))?;
    match body {
        Some(body) => {
            let pack = serde_json::from_str(&body).map_err(|e| to_store_err(e.to_string()))?;
            Ok(Some(pack))
        }
        None => Ok(None),
    }
}

/// All packs served for a query, in serve order.
pub fn packs_for_query(conn: &Connection, query_id: &QueryId) -> LoreResult<Vec<ContextPack>> {
    let mut stmt = conn
        .prepare("SELECT body FROM packs WHERE query_id = ?1 ORDER BY created_at, id")
        .map_err(|e| to_store_err(e.to_string()))?;
    let bodies = stmt
        .query_map(params![query_id.as_str()], |row| row.get::<_, String>(0))
        .map_err(|e| to_store_err(e.to_string()))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| to_store_err(e.to_string()))?;

    bodies
        .iter()
        .map(|body| serde_json::from_str(body).map_err(|e| to_store_err(e.to_string())))
        .collect()
}
