//! Numbered schema migrations, applied in order at startup.
//!
//! `PRAGMA user_version` records the last applied migration; reruns are
//! no-ops. Every migration uses IF NOT EXISTS so a partially applied
//! schema heals on the next run.

pub mod v001_index_tables;
pub mod v002_claim_tables;
pub mod v003_ledger_tables;
pub mod v004_pack_tables;

use rusqlite::Connection;

use lore_core::errors::{LoreError, LoreResult, StoreError};

use crate::to_store_err;

type Migration = (u32, fn(&Connection) -> LoreResult<()>);

const MIGRATIONS: &[Migration] = &[
    (1, v001_index_tables::migrate),
    (2, v002_claim_tables::migrate),
    (3, v003_ledger_tables::migrate),
    (4, v004_pack_tables::migrate),
];

/// Apply all migrations newer than the database's recorded version.
pub fn run_migrations(conn: &Connection) -> LoreResult<()> {
    let current: u32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(|e| to_store_err(e.to_string()))?;

    for (version, migrate) in MIGRATIONS {
        if *version <= current {
            continue;
        }
        migrate(conn).map_err(|e| {
            LoreError::Store(StoreError::MigrationFailed {
                version: *version,
                reason: e.to_string(),
            })
        })?;
        conn.pragma_update(None, "user_version", version)
            .map_err(|e| to_store_err(e.to_string()))?;
        tracing::debug!(version, "applied migration");
    }
    Ok(())
}

/// The schema version this build expects.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map(|(v, _)| *v).unwrap_or(0)
}
