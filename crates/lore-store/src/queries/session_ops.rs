//! Change sessions: the clock durability classification ticks against.

use rusqlite::{params, Connection};

use lore_core::errors::LoreResult;
use lore_core::types::EntityId;

use crate::to_store_err;

/// Open a new session and return its number.
pub fn begin_session(conn: &Connection) -> LoreResult<u64> {
    conn.execute("INSERT INTO change_sessions DEFAULT VALUES", [])
        .map_err(|e| to_store_err(format!("begin session: {e}")))?;
    current_session(conn)
}

/// The newest session number. At least one session always exists; the
/// first migration seeds it.
pub fn current_session(conn: &Connection) -> LoreResult<u64> {
    conn.query_row(
        "SELECT COALESCE(MAX(session), 1) FROM change_sessions",
        [],
        |row| row.get(0),
    )
    .map_err(|e| to_store_err(e.to_string()))
}

/// Sessions in which an entity changed, ascending.
pub fn change_sessions(conn: &Connection, entity_id: &EntityId) -> LoreResult<Vec<u64>> {
    let mut stmt = conn
        .prepare("SELECT session FROM change_log WHERE entity_id = ?1 ORDER BY session")
        .map_err(|e| to_store_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![entity_id.as_str()], |row| row.get::<_, u64>(0))
        .map_err(|e| to_store_err(e.to_string()))?;
    let mut sessions = Vec::new();
    for row in rows {
        sessions.push(row.map_err(|e| to_store_err(e.to_string()))?);
    }
    Ok(sessions)
}
