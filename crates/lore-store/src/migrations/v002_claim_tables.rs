//! v002: claims, evidence, claim_embeddings, FTS5 mirrors with sync
//! triggers.

use rusqlite::Connection;

use lore_core::errors::LoreResult;

use crate::to_store_err;

pub fn migrate(conn: &Connection) -> LoreResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS claims (
            id             TEXT PRIMARY KEY,
            entity_id      TEXT NOT NULL REFERENCES entities(id) ON DELETE CASCADE,
            text           TEXT NOT NULL,
            state          TEXT NOT NULL DEFAULT 'pending',
            provider       TEXT NOT NULL,
            model          TEXT NOT NULL,
            prompt_version TEXT NOT NULL,
            revision       INTEGER NOT NULL,
            created_at     TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_claims_entity ON claims(entity_id);
        CREATE INDEX IF NOT EXISTS idx_claims_state ON claims(state);

        CREATE TABLE IF NOT EXISTS evidence (
            id            TEXT PRIMARY KEY,
            claim_id      TEXT NOT NULL REFERENCES claims(id) ON DELETE CASCADE,
            path          TEXT NOT NULL,
            line_start    INTEGER NOT NULL,
            line_end      INTEGER NOT NULL,
            content_hash  TEXT NOT NULL,
            method        TEXT NOT NULL,
            recorded_at   TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_evidence_claim ON evidence(claim_id);

        CREATE TABLE IF NOT EXISTS claim_embeddings (
            claim_id   TEXT PRIMARY KEY REFERENCES claims(id) ON DELETE CASCADE,
            entity_id  TEXT NOT NULL,
            vector     BLOB NOT NULL,
            dims       INTEGER NOT NULL
        );

        CREATE VIRTUAL TABLE IF NOT EXISTS claim_fts USING fts5(
            text,
            content='claims',
            content_rowid='rowid'
        );

        CREATE TRIGGER IF NOT EXISTS claims_fts_insert AFTER INSERT ON claims BEGIN
            INSERT INTO claim_fts(rowid, text) VALUES (new.rowid, new.text);
        END;

        CREATE TRIGGER IF NOT EXISTS claims_fts_delete AFTER DELETE ON claims BEGIN
            INSERT INTO claim_fts(claim_fts, rowid, text) VALUES ('delete', old.rowid, old.text);
        END;

        CREATE TRIGGER IF NOT EXISTS claims_fts_update AFTER UPDATE OF text ON claims BEGIN
            INSERT INTO claim_fts(claim_fts, rowid, text) VALUES ('delete', old.rowid, old.text);
            INSERT INTO claim_fts(rowid, text) VALUES (new.rowid, new.text);
        END;

        CREATE VIRTUAL TABLE IF NOT EXISTS fact_fts USING fts5(
            search_text,
            content='facts',
            content_rowid='rowid'
        );

        CREATE TRIGGER IF NOT EXISTS facts_fts_insert AFTER INSERT ON facts BEGIN
            INSERT INTO fact_fts(rowid, search_text) VALUES (new.rowid, new.search_text);
        END;

        CREATE TRIGGER IF NOT EXISTS facts_fts_delete AFTER DELETE ON facts BEGIN
            INSERT INTO fact_fts(fact_fts, rowid, search_text)
                VALUES ('delete', old.rowid, old.search_text);
        END;
        ",
    )
    .map_err(|e| to_store_err(e.to_string()))?;
    Ok(())
}
