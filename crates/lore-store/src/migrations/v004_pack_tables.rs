//! v004: served packs and the query log feedback routes through.

use rusqlite::Connection;

use lore_core::errors::LoreResult;

use crate::to_store_err;

pub fn migrate(conn: &Connection) -> LoreResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS query_log (
            id          TEXT PRIMARY KEY,
            query_text  TEXT NOT NULL,
            intent      TEXT NOT NULL,
            revision    INTEGER NOT NULL,
            served_at   TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );

        CREATE TABLE IF NOT EXISTS packs (
            id          TEXT PRIMARY KEY,
            query_id    TEXT NOT NULL REFERENCES query_log(id) ON DELETE CASCADE,
            entity_id   TEXT NOT NULL,
            body        TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_packs_query ON packs(query_id);
        CREATE INDEX IF NOT EXISTS idx_packs_entity ON packs(entity_id);
        ",
    )
    .map_err(|e| to_store_err(e.to_string()))?;
    Ok(())
}
