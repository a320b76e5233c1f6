//! # lore-store
//!
//! SQLite persistence layer for the knowledge index: entities, facts,
//! claims, evidence, embeddings, change history, the append-only ledger,
//! and served packs. One write connection, a WAL read pool, numbered
//! migrations.

pub mod durability;
pub mod engine;
pub mod migrations;
pub mod pool;
pub mod queries;

pub use engine::StoreEngine;

use lore_core::errors::{LoreError, StoreError};

/// Wrap a low-level SQLite failure message into the workspace error type.
pub fn to_store_err(message: String) -> LoreError {
    LoreError::Store(StoreError::SqliteError { message })
}
