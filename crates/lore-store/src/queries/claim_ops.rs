//! Claim persistence, state changes, and FTS5 search.

use rusqlite::{params, Connection, OptionalExtension, Row};

use lore_core::errors::{LedgerError, LoreError, LoreResult, StoreError};
use lore_core::models::{ClaimProvenance, ClaimState, SemanticClaim};
use lore_core::types::{ClaimId, EntityId, EvidenceId};

use super::entity_ops::parse_timestamp;
use crate::to_store_err;

pub fn upsert_claim(conn: &Connection, claim: &SemanticClaim) -> LoreResult<()> {
    conn.execute(
        "INSERT INTO claims
            (id, entity_id, text, state, provider, model, prompt_version, revision, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT(id) DO UPDATE SET
            text = excluded.text,
            state = excluded.state,
            provider = excluded.provider,
            model = excluded.model,
            prompt_version = excluded.prompt_version,
            revision = excluded.revision",
        params![
            claim.id.as_str(),
            claim.entity_id.as_str(),
            claim.text,
            claim.state.as_str(),
            claim.provenance.provider,
            claim.provenance.model,
            claim.provenance.prompt_version,
            claim.revision,
            claim.created_at.to_rfc3339(),
        ],
    )
    .map_err(|e| to_store_err(format!("claim upsert: {e}")))?;
    Ok(())
}

pub fn get_claim(conn: &Connection, id: &ClaimId) -> LoreResult<Option<SemanticClaim>> {
    let mut stmt = conn
        .prepare(&format!("{CLAIM_SELECT} WHERE c.id = ?1"))
        .map_err(|e| to_store_err(e.to_string()))?;
    let mut rows = stmt
        .query_map(params![id.as_str()], |row| Ok(parse_claim_row(row)))
        .map_err(|e| to_store_err(e.to_string()))?;
    match rows.next() {
        Some(row) => {
            let mut claim = row.map_err(|e| to_store_err(e.to_string()))??;
            claim.evidence = evidence_ids(conn, &claim.id)?;
            Ok(Some(claim))
        }
        None => Ok(None),
    }
}

pub fn claims_for_entity(conn: &Connection, entity_id: &EntityId) -> LoreResult<Vec<SemanticClaim>> {
    claims_where(conn, "c.entity_id = ?1", params![entity_id.as_str()])
}

pub fn claims_in_state(conn: &Connection, state: ClaimState) -> LoreResult<Vec<SemanticClaim>> {
    claims_where(conn, "c.state = ?1", params![state.as_str()])
}

const CLAIM_SELECT: &str = "SELECT c.id, c.entity_id, c.text, c.state, c.provider,
        c.model, c.prompt_version, c.revision, c.created_at FROM claims c";

fn claims_where(
    conn: &Connection,
    clause: &str,
    args: impl rusqlite::Params,
) -> LoreResult<Vec<SemanticClaim>> {
    let sql = format!("{CLAIM_SELECT} WHERE {clause} ORDER BY c.created_at, c.id");
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| to_store_err(e.to_string()))?;
    let rows = stmt
        .query_map(args, |row| Ok(parse_claim_row(row)))
        .map_err(|e| to_store_err(e.to_string()))?;
    let mut claims = Vec::new();
    for row in rows {
        claims.push(row.map_err(|e| to_store_err(e.to_string()))??);
    }
    for claim in &mut claims {
        claim.evidence = evidence_ids(conn, &claim.id)?;
    }
    Ok(claims)
}

/// Current lifecycle state of a claim, `None` when the claim is unknown.
pub fn claim_state(conn: &Connection, id: &ClaimId) -> LoreResult<Option<ClaimState>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT state FROM claims WHERE id = ?1",
            params![id.as_str()],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| to_store_err(e.to_string()))?;
    match raw {
        None => Ok(None),
        Some(raw) => ClaimState::parse(&raw).map(Some).ok_or_else(|| {
            LoreError::Store(StoreError::Serialization {
                reason: format!("unknown claim state '{raw}'"),
            })
        }),
    }
}

/// Change a claim's lifecycle state, rejecting illegal transitions.
pub fn set_claim_state(conn: &Connection, id: &ClaimId, next: ClaimState) -> LoreResult<()> {
    let current_raw: String = conn
        .query_row(
            "SELECT state FROM claims WHERE id = ?1",
            params![id.as_str()],
            |row| row.get(0),
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => LoreError::Ledger(LedgerError::UnknownClaim {
                claim_id: id.as_str().to_string(),
            }),
            other => to_store_err(other.to_string()),
        })?;
    let current = ClaimState::parse(&current_raw).ok_or_else(|| {
        LoreError::Store(StoreError::Serialization {
            reason: format!("unknown claim state '{current_raw}'"),
        })
    })?;
    if current == next {
        return Ok(());
    }
    if !current.can_transition(next) {
        return Err(LoreError::Ledger(LedgerError::InvalidClaimTransition {
            claim_id: id.as_str().to_string(),
            from: current.as_str(),
            to: next.as_str(),
        }));
    }
    conn.execute(
        "UPDATE claims SET state = ?2 WHERE id = ?1",
        params![id.as_str(), next.as_str()],
    )
    .map_err(|e| to_store_err(e.to_string()))?;
    Ok(())
}

/// FTS5 match over claim text and fact search text.
/// Scores are `-rank` (bm25), larger is more relevant. Only validated
/// claims surface; fact matches surface as entity hits without a claim.
pub fn search_text(
    conn: &Connection,
    query: &str,
    limit: usize,
) -> LoreResult<Vec<(Option<ClaimId>, EntityId, f64)>> {
    let mut results: Vec<(Option<ClaimId>, EntityId, f64)> = Vec::new();

    let mut stmt = conn
        .prepare(
            "SELECT c.id, c.entity_id, -rank AS score
             FROM claim_fts fts
             JOIN claims c ON c.rowid = fts.rowid
             WHERE claim_fts MATCH ?1 AND c.state = 'validated'
             ORDER BY rank
             LIMIT ?2",
        )
        .map_err(|e| to_store_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![query, limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
            ))
        })
        .map_err(|e| to_store_err(e.to_string()))?;
    for row in rows {
        let (claim_id, entity_id, score) = row.map_err(|e| to_store_err(e.to_string()))?;
        results.push((
            Some(ClaimId::new(claim_id)),
            EntityId::new(entity_id),
            score,
        ));
    }

    let mut stmt = conn
        .prepare(
            "SELECT f.entity_id, -rank AS score
             FROM fact_fts fts
             JOIN facts f ON f.rowid = fts.rowid
             WHERE fact_fts MATCH ?1
             ORDER BY rank
             LIMIT ?2",
        )
        .map_err(|e| to_store_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![query, limit as i64], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
        })
        .map_err(|e| to_store_err(e.to_string()))?;
    for row in rows {
        let (entity_id, score) = row.map_err(|e| to_store_err(e.to_string()))?;
        results.push((None, EntityId::new(entity_id), score));
    }

    results.sort_by(|a, b| {
        b.2.partial_cmp(&a.2)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.1.cmp(&b.1))
    });
    results.truncate(limit);
    Ok(results)
}

fn evidence_ids(conn: &Connection, claim_id: &ClaimId) -> LoreResult<Vec<EvidenceId>> {
    let mut stmt = conn
        .prepare("SELECT id FROM evidence WHERE claim_id = ?1 ORDER BY recorded_at, id")
        .map_err(|e| to_store_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![claim_id.as_str()], |row| row.get::<_, String>(0))
        .map_err(|e| to_store_err(e.to_string()))?;
    let mut ids = Vec::new();
    for row in rows {
        ids.push(EvidenceId::new(row.map_err(|e| to_store_err(e.to_string()))?));
    }
    Ok(ids)
}

fn parse_claim_row(row: &Row<'_>) -> LoreResult<SemanticClaim> {
    let state_raw: String = row.get(3).map_err(|e| to_store_err(e.to_string()))?;
    let state = ClaimState::parse(&state_raw).ok_or_else(|| {
        LoreError::Store(StoreError::Serialization {
            reason: format!("unknown claim state '{state_raw}'"),
        })
    })?;
    Ok(SemanticClaim {
        id: ClaimId::new(row.get::<_, String>(0).map_err(|e| to_store_err(e.to_string()))?),
        entity_id: EntityId::new(row.get::<_, String>(1).map_err(|e| to_store_err(e.to_string()))?),
        text: row.get(2).map_err(|e| to_store_err(e.to_string()))?,
        evidence: Vec::new(),
        state,
        provenance: ClaimProvenance {
            provider: row.get(4).map_err(|e| to_store_err(e.to_string()))?,
            model: row.get(5).map_err(|e| to_store_err(e.to_string()))?,
            prompt_version: row.get(6).map_err(|e| to_store_err(e.to_string()))?,
        },
        revision: row.get(7).map_err(|e| to_store_err(e.to_string()))?,
        created_at: parse_timestamp(&row.get::<_, String>(8).map_err(|e| to_store_err(e.to_string()))?)?,
    })
}
