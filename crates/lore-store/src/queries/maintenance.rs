//! VACUUM, checkpoint, integrity check.

use rusqlite::Connection;

use lore_core::errors::LoreResult;

use crate::to_store_err;

/// Run full vacuum.
pub fn full_vacuum(conn: &Connection) -> LoreResult<()> {
    conn.execute_batch("VACUUM")
        .map_err(|e| to_store_err(e.to_string()))?;
    Ok(())
}

/// WAL checkpoint.
pub fn wal_checkpoint(conn: &Connection) -> LoreResult<()> {
    conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE)")
        .map_err(|e| to_store_err(e.to_string()))?;
    Ok(())
}

/// Run integrity check. Returns true if the database is OK.
pub fn integrity_check(conn: &Connection) -> LoreResult<bool> {
    let result: String = conn
        .query_row("PRAGMA integrity_check", [], |row| row.get(0))
        .map_err(|e| to_store_err(e.to_string()))?;
    Ok(result == "ok")
}
