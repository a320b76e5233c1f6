//! v003: ledger_events (append-only), calibration_curves.

use rusqlite::Connection;

use lore_core::errors::LoreResult;

use crate::to_store_err;

pub fn migrate(conn: &Connection) -> LoreResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS ledger_events (
            sequence    INTEGER PRIMARY KEY AUTOINCREMENT,
            event_type  TEXT NOT NULL,
            claim_id    TEXT,
            entity_id   TEXT,
            payload     TEXT NOT NULL,
            recorded_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_ledger_claim ON ledger_events(claim_id);
        CREATE INDEX IF NOT EXISTS idx_ledger_type ON ledger_events(event_type);

        CREATE TABLE IF NOT EXISTS calibration_curves (
            cohort      TEXT PRIMARY KEY,
            curve       TEXT NOT NULL,
            cohort_size INTEGER NOT NULL,
            fitted_at   TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );
        ",
    )
    .map_err(|e| to_store_err(e.to_string()))?;
    Ok(())
}
