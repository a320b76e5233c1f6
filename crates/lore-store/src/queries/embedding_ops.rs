//! Claim embedding storage. Vectors are f32 little-endian BLOBs.

use rusqlite::{params, Connection};

use lore_core::errors::{LoreError, LoreResult, StoreError};
use lore_core::traits::ClaimEmbedding;
use lore_core::types::{ClaimId, EntityId};

use crate::to_store_err;

pub fn upsert_embedding(conn: &Connection, embedding: &ClaimEmbedding) -> LoreResult<()> {
    let blob = vector_to_blob(&embedding.vector);
    conn.execute(
        "INSERT INTO claim_embeddings (claim_id, entity_id, vector, dims)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(claim_id) DO UPDATE SET
            entity_id = excluded.entity_id,
            vector = excluded.vector,
            dims = excluded.dims",
        params![
            embedding.claim_id.as_str(),
            embedding.entity_id.as_str(),
            blob,
            embedding.vector.len() as i64,
        ],
    )
    .map_err(|e| to_store_err(format!("embedding upsert: {e}")))?;
    Ok(())
}

pub fn all_embeddings(conn: &Connection) -> LoreResult<Vec<ClaimEmbedding>> {
    let mut stmt = conn
        .prepare("SELECT claim_id, entity_id, vector, dims FROM claim_embeddings")
        .map_err(|e| to_store_err(e.to_string()))?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Vec<u8>>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })
        .map_err(|e| to_store_err(e.to_string()))?;

    let mut embeddings = Vec::new();
    for row in rows {
        let (claim_id, entity_id, blob, dims) = row.map_err(|e| to_store_err(e.to_string()))?;
        let vector = blob_to_vector(&blob)?;
        if vector.len() != dims as usize {
            return Err(LoreError::Store(StoreError::CorruptionDetected {
                details: format!(
                    "embedding for claim {claim_id}: blob holds {} dims, row says {dims}",
                    vector.len()
                ),
            }));
        }
        embeddings.push(ClaimEmbedding {
            claim_id: ClaimId::new(claim_id),
            entity_id: EntityId::new(entity_id),
            vector,
        });
    }
    Ok(embeddings)
}

fn vector_to_blob(vector: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(vector.len() * 4);
    for value in vector {
        blob.extend_from_slice(&value.to_le_bytes());
    }
    blob
}

fn blob_to_vector(blob: &[u8]) -> LoreResult<Vec<f32>> {
    if blob.len() % 4 != 0 {
        return Err(LoreError::Store(StoreError::CorruptionDetected {
            details: format!("embedding blob length {} is not a multiple of 4", blob.len()),
        }));
    }
    Ok(blob
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}
