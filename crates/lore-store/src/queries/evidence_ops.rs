//! Evidence records. Append-only: no update or delete path exists.

use rusqlite::{params, Connection};

use lore_core::errors::{LoreError, LoreResult, StoreError};
use lore_core::models::{Citation, EvidenceRecord, ExtractionMethod};
use lore_core::types::{ClaimId, EvidenceId};

use super::entity_ops::parse_timestamp;
use crate::to_store_err;

pub fn insert_evidence(conn: &Connection, record: &EvidenceRecord) -> LoreResult<()> {
    conn.execute(
        "INSERT INTO evidence
            (id, claim_id, path, line_start, line_end, content_hash, method, recorded_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            record.id.as_str(),
            record.claim_id.as_str(),
            record.citation.path,
            record.citation.line_start,
            record.citation.line_end,
            record.citation.content_hash,
            record.method.as_str(),
            record.recorded_at.to_rfc3339(),
        ],
    )
    .map_err(|e| to_store_err(format!("evidence insert: {e}")))?;
    Ok(())
}

pub fn evidence_for_claim(conn: &Connection, claim_id: &ClaimId) -> LoreResult<Vec<EvidenceRecord>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, claim_id, path, line_start, line_end, content_hash, method, recorded_at
             FROM evidence WHERE claim_id = ?1 ORDER BY recorded_at, id",
        )
        .map_err(|e| to_store_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![claim_id.as_str()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, u32>(3)?,
                row.get::<_, u32>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, String>(7)?,
            ))
        })
        .map_err(|e| to_store_err(e.to_string()))?;

    let mut records = Vec::new();
    for row in rows {
        let (id, claim, path, line_start, line_end, content_hash, method_raw, recorded_at) =
            row.map_err(|e| to_store_err(e.to_string()))?;
        let method = match method_raw.as_str() {
            "structural_fact" => ExtractionMethod::StructuralFact,
            "synthesis" => ExtractionMethod::Synthesis,
            other => {
                return Err(LoreError::Store(StoreError::Serialization {
                    reason: format!("unknown extraction method '{other}'"),
                }))
            }
        };
        records.push(EvidenceRecord {
            id: EvidenceId::new(id),
            claim_id: ClaimId::new(claim),
            citation: Citation {
                path,
                line_start,
                line_end,
                content_hash,
            },
            method,
            recorded_at: parse_timestamp(&recorded_at)?,
        });
    }
    Ok(records)
}
