//! Durability classification: observed change frequency, not annotation.
//!
//! Every entity starts `Volatile`. Sitting out whole change sessions
//! promotes it toward `Immutable`; any content change drops it straight
//! back to `Volatile` (handled in admission).

use rusqlite::{params, Connection};

use lore_core::config::StoreConfig;
use lore_core::models::Durability;

use lore_core::errors::LoreResult;

use crate::to_store_err;

/// Classify from the number of sessions since last change.
pub fn classify(quiet_sessions: u64, config: &StoreConfig) -> Durability {
    if quiet_sessions >= config.immutable_after_sessions {
        Durability::Immutable
    } else if quiet_sessions >= config.stable_after_sessions {
        Durability::Stable
    } else {
        Durability::Volatile
    }
}

/// Promote entities that have been quiet long enough. Called when a new
/// session opens. Returns (promoted_to_stable, promoted_to_immutable).
pub fn apply_promotions(
    conn: &Connection,
    current_session: u64,
    config: &StoreConfig,
) -> LoreResult<(usize, usize)> {
    let to_stable = conn
        .execute(
            "UPDATE entities SET durability = 'stable'
             WHERE durability = 'volatile'
               AND ?1 - COALESCE(
                     (SELECT MAX(session) FROM change_log
                      WHERE change_log.entity_id = entities.id),
                     ?1
                   ) >= ?2",
            params![current_session, config.stable_after_sessions],
        )
        .map_err(|e| to_store_err(format!("stable promotion: {e}")))?;

    let to_immutable = conn
        .execute(
            "UPDATE entities SET durability = 'immutable'
             WHERE durability = 'stable'
               AND ?1 - COALESCE(
                     (SELECT MAX(session) FROM change_log
                      WHERE change_log.entity_id = entities.id),
                     ?1
                   ) >= ?2",
            params![current_session, config.immutable_after_sessions],
        )
        .map_err(|e| to_store_err(format!("immutable promotion: {e}")))?;

    Ok((to_stable, to_immutable))
}
