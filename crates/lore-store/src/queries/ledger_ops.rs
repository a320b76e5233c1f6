//! Append-only ledger event rows and calibration curve persistence.
//!
//! Rows are never updated or deleted. The materialized confidence view is
//! rebuilt by replaying these rows in sequence order.

use rusqlite::{params, Connection};

use lore_core::errors::LoreResult;

use crate::to_store_err;

/// One event row ready for insertion or replay. Serialization of the
/// typed event lives in the ledger crate; the store sees opaque payloads.
#[derive(Debug, Clone)]
pub struct EventRow {
    pub sequence: u64,
    pub event_type: String,
    pub claim_id: Option<String>,
    pub entity_id: Option<String>,
    pub payload: String,
    pub recorded_at: String,
}

pub fn insert_event(
    conn: &Connection,
    event_type: &str,
    claim_id: Option<&str>,
    entity_id: Option<&str>,
    payload: &str,
    recorded_at: &str,
) -> LoreResult<u64> {
    conn.execute(
        "INSERT INTO ledger_events (event_type, claim_id, entity_id, payload, recorded_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![event_type, claim_id, entity_id, payload, recorded_at],
    )
    .map_err(|e| to_store_err(format!("event insert: {e}")))?;
    Ok(conn.last_insert_rowid() as u64)
}

/// Events with sequence strictly greater than `after`, ascending.
pub fn events_since(conn: &Connection, after: u64) -> LoreResult<Vec<EventRow>> {
    let mut stmt = conn
        .prepare(
            "SELECT sequence, event_type, claim_id, entity_id, payload, recorded_at
             FROM ledger_events WHERE sequence > ?1 ORDER BY sequence",
        )
        .map_err(|e| to_store_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![after], |row| {
            Ok(EventRow {
                sequence: row.get(0)?,
                event_type: row.get(1)?,
                claim_id: row.get(2)?,
                entity_id: row.get(3)?,
                payload: row.get(4)?,
                recorded_at: row.get(5)?,
            })
        })
        .map_err(|e| to_store_err(e.to_string()))?;
    let mut events = Vec::new();
    for row in rows {
        events.push(row.map_err(|e| to_store_err(e.to_string()))?);
    }
    Ok(events)
}

pub fn event_count(conn: &Connection) -> LoreResult<u64> {
    conn.query_row("SELECT COUNT(*) FROM ledger_events", [], |row| row.get(0))
        .map_err(|e| to_store_err(e.to_string()))
}

/// Persist a fitted calibration curve for a cohort.
pub fn upsert_curve(
    conn: &Connection,
    cohort: &str,
    curve_json: &str,
    cohort_size: usize,
    fitted_at: &str,
) -> LoreResult<()> {
    conn.execute(
        "INSERT INTO calibration_curves (cohort, curve, cohort_size, fitted_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(cohort) DO UPDATE SET
            curve = excluded.curve,
            cohort_size = excluded.cohort_size,
            fitted_at = excluded.fitted_at",
        params![cohort, curve_json, cohort_size as i64, fitted_at],
    )
    .map_err(|e| to_store_err(format!("curve upsert: {e}")))?;
    Ok(())
}

/// Load a cohort's fitted curve: (curve json, cohort size, fitted_at).
pub fn get_curve(conn: &Connection, cohort: &str) -> LoreResult<Option<(String, usize, String)>> {
    let result = conn.query_row(
        "SELECT curve, cohort_size, fitted_at FROM calibration_curves WHERE cohort = ?1",
        params![cohort],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)? as usize,
                row.get::<_, String>(2)?,
            ))
        },
    );
    match result {
        Ok(found) => Ok(Some(found)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(to_store_err(e.to_string())),
    }
}

pub fn all_curves(conn: &Connection) -> LoreResult<Vec<(String, String, usize, String)>> {
    let mut stmt = conn
        .prepare("SELECT cohort, curve, cohort_size, fitted_at FROM calibration_curves")
        .map_err(|e| to_store_err(e.to_string()))?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)? as usize,
                row.get::<_, String>(3)?,
            ))
        })
        .map_err(|e| to_store_err(e.to_string()))?;
    let mut curves = Vec::new();
    for row in rows {
        curves.push(row.map_err(|e| to_store_err(e.to_string()))?);
    }
    Ok(curves)
}

/// Guard against ledger rows being rewritten: the sequence column must
/// never regress. Used by integrity checks in tests.
pub fn max_sequence(conn: &Connection) -> LoreResult<u64> {
    conn.query_row(
        "SELECT COALESCE(MAX(sequence), 0) FROM ledger_events",
        [],
        |row| row.get(0),
    )
    .map_err(|e| to_store_err(e.to_string()))
}
