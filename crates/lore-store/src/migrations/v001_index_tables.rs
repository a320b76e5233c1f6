//! v001: entities, facts, change_sessions, change_log.

use rusqlite::Connection;

use lore_core::errors::LoreResult;

use crate::to_store_err;

pub fn migrate(conn: &Connection) -> LoreResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS entities (
            id            TEXT PRIMARY KEY,
            kind          TEXT NOT NULL,
            path          TEXT NOT NULL,
            line_start    INTEGER NOT NULL,
            line_end      INTEGER NOT NULL,
            content_hash  TEXT NOT NULL,
            durability    TEXT NOT NULL DEFAULT 'volatile',
            revision      INTEGER NOT NULL DEFAULT 1,
            first_seen    TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            last_changed  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_entities_path ON entities(path);
        CREATE INDEX IF NOT EXISTS idx_entities_durability ON entities(durability);

        CREATE TABLE IF NOT EXISTS facts (
            id            TEXT PRIMARY KEY,
            entity_id     TEXT NOT NULL REFERENCES entities(id) ON DELETE CASCADE,
            kind          TEXT NOT NULL,
            payload       TEXT NOT NULL,
            search_text   TEXT NOT NULL,
            content_hash  TEXT NOT NULL,
            adapter       TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_facts_entity ON facts(entity_id);

        CREATE TABLE IF NOT EXISTS change_sessions (
            session     INTEGER PRIMARY KEY AUTOINCREMENT,
            started_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );

        INSERT INTO change_sessions (session)
            SELECT 1 WHERE NOT EXISTS (SELECT 1 FROM change_sessions);

        CREATE TABLE IF NOT EXISTS change_log (
            session     INTEGER NOT NULL REFERENCES change_sessions(session),
            entity_id   TEXT NOT NULL,
            changed_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            PRIMARY KEY (session, entity_id)
        );

        CREATE INDEX IF NOT EXISTS idx_change_entity ON change_log(entity_id);
        ",
    )
    .map_err(|e| to_store_err(e.to_string()))?;
    Ok(())
}
