//! Single write connection behind a mutex.
//! Serialized writes, no global read/write lock.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;

use lore_core::errors::LoreResult;

use super::pragmas::apply_pragmas;
use crate::to_store_err;

/// A single write connection protected by a mutex. Write closures are
/// synchronous and short; the guard never spans an await, so both the
/// async and the sync entry points take the same lock.
pub struct WriteConnection {
    conn: Mutex<Connection>,
}

impl WriteConnection {
    /// Open a new write connection to the given database path.
    pub fn open(path: &Path) -> LoreResult<Self> {
        let conn = Connection::open(path).map_err(|e| to_store_err(e.to_string()))?;
        apply_pragmas(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> LoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| to_store_err(e.to_string()))?;
        apply_pragmas(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the write lock and execute a closure with the connection.
    pub async fn with_conn<F, T>(&self, f: F) -> LoreResult<T>
    where
        F: FnOnce(&Connection) -> LoreResult<T>,
    {
        self.with_conn_sync(f)
    }

    /// Synchronous access for non-async contexts (migrations at startup,
    /// the store trait's write methods).
    pub fn with_conn_sync<F, T>(&self, f: F) -> LoreResult<T>
    where
        F: FnOnce(&Connection) -> LoreResult<T>,
    {
        let guard = self
            .conn
            .lock()
            .map_err(|e| to_store_err(format!("write connection poisoned: {e}")))?;
        f(&guard)
    }
}
