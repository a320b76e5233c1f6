//! The ledger engine: append path, derived reads, calibration refits.
//!
//! Holds its own handles to the shared store pool. All writes go through
//! the single write connection; reads route through the read pool on
//! file-backed databases and through the writer in-memory, matching the
//! store engine's routing.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use lore_core::config::LedgerConfig;
use lore_core::errors::{LedgerError, LoreError, LoreResult};
use lore_core::models::{
    AbsentReason, ClaimState, ConfidenceValue, Defeater, DefeaterSeverity, Durability,
    EvidenceRecord, FeedbackOutcome,
};
use lore_core::types::{ClaimId, DefeaterId, EntityId, PackId, QueryId};
use lore_store::pool::{ReadPool, WriteConnection};
use lore_store::queries::{claim_ops, evidence_ops, ledger_ops};
use lore_store::{to_store_err, StoreEngine};

use crate::calibration::{CalibrationCurve, CalibrationSample};
use crate::confidence::{compute_confidence, raw_score};
use crate::events::{LedgerEvent, LedgerEventKind};
use crate::view::ConfidenceView;

/// Append-only epistemics ledger over the shared database.
pub struct EpistemicsLedger {
    writer: Arc<WriteConnection>,
    readers: Arc<ReadPool>,
    use_read_pool: bool,
    config: LedgerConfig,
}

impl EpistemicsLedger {
    pub fn new(
        writer: Arc<WriteConnection>,
        readers: Arc<ReadPool>,
        use_read_pool: bool,
        config: LedgerConfig,
    ) -> Self {
        Self {
            writer,
            readers,
            use_read_pool,
            config,
        }
    }

    /// A ledger sharing the given store's connections.
    pub fn for_store(store: &StoreEngine, config: LedgerConfig) -> Self {
        Self::new(
            store.pool().writer.clone(),
            store.pool().readers.clone(),
            store.uses_read_pool(),
            config,
        )
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    fn with_reader<F, T>(&self, f: F) -> LoreResult<T>
    where
        F: FnOnce(&Connection) -> LoreResult<T>,
    {
        if self.use_read_pool {
            self.readers.with_conn(f)
        } else {
            self.writer.with_conn_sync(f)
        }
    }

    // --- Append path ---

    /// Append one event, returning its assigned sequence number.
    pub async fn append(&self, event: &LedgerEvent) -> LoreResult<u64> {
        // Serialize before taking the write lock.
        let payload = event.payload()?;
        let recorded_at = event.recorded_at.to_rfc3339();
        self.writer
            .with_conn(|conn| {
                ledger_ops::insert_event(
                    conn,
                    event.kind.name(),
                    event.claim_id.as_ref().map(|id| id.as_str()),
                    event.entity_id.as_ref().map(|id| id.as_str()),
                    &payload,
                    &recorded_at,
                )
            })
            .await
    }

    /// Append a batch atomically. Oversized batches are rejected up front
    /// so a runaway producer cannot hold the write lock indefinitely.
    pub async fn append_batch(&self, events: &[LedgerEvent]) -> LoreResult<Vec<u64>> {
        if events.len() > self.config.max_event_batch {
            return Err(LoreError::Ledger(LedgerError::BatchTooLarge {
                size: events.len(),
                max: self.config.max_event_batch,
            }));
        }

        let mut prepared = Vec::with_capacity(events.len());
        for event in events {
            prepared.push((
                event.kind.name(),
                event.claim_id.as_ref().map(|id| id.as_str().to_string()),
                event.entity_id.as_ref().map(|id| id.as_str().to_string()),
                event.payload()?,
                event.recorded_at.to_rfc3339(),
            ));
        }

        tracing::debug!(count = prepared.len(), "appending event batch");
        self.writer
            .with_conn(|conn| {
                let tx = conn
                    .unchecked_transaction()
                    .map_err(|e| to_store_err(format!("batch begin: {e}")))?;
                let mut sequences = Vec::with_capacity(prepared.len());
                for (event_type, claim_id, entity_id, payload, recorded_at) in &prepared {
                    sequences.push(ledger_ops::insert_event(
                        &tx,
                        event_type,
                        claim_id.as_deref(),
                        entity_id.as_deref(),
                        payload,
                        recorded_at,
                    )?);
                }
                tx.commit()
                    .map_err(|e| to_store_err(format!("batch commit: {e}")))?;
                Ok(sequences)
            })
            .await
    }

    /// Persist an evidence record and its ledger event in one transaction.
    /// This is the only write path for evidence; the record and the event
    /// never disagree.
    pub async fn record_evidence(
        &self,
        record: &EvidenceRecord,
        entity_id: Option<&EntityId>,
        citation_verified: bool,
    ) -> LoreResult<u64> {
        let mut event = LedgerEvent::for_claim(
            record.claim_id.clone(),
            entity_id.cloned(),
            LedgerEventKind::EvidenceAdded {
                evidence_id: record.id.clone(),
                method: record.method,
                citation_verified,
            },
        );
        event.recorded_at = record.recorded_at;
        let payload = event.payload()?;

        self.writer
            .with_conn(|conn| {
                let tx = conn
                    .unchecked_transaction()
                    .map_err(|e| to_store_err(format!("evidence begin: {e}")))?;
                evidence_ops::insert_evidence(&tx, record)?;
                let sequence = ledger_ops::insert_event(
                    &tx,
                    event.kind.name(),
                    Some(record.claim_id.as_str()),
                    event.entity_id.as_ref().map(|id| id.as_str()),
                    &payload,
                    &event.recorded_at.to_rfc3339(),
                )?;
                tx.commit()
                    .map_err(|e| to_store_err(format!("evidence commit: {e}")))?;
                Ok(sequence)
            })
            .await
    }

    /// Move a claim through its lifecycle and log the transition. Illegal
    /// transitions are rejected by the store; a same-state call appends
    /// nothing and returns `None`.
    pub async fn transition_claim(
        &self,
        claim_id: &ClaimId,
        entity_id: Option<&EntityId>,
        to: ClaimState,
    ) -> LoreResult<Option<u64>> {
        self.writer
            .with_conn(|conn| {
                let Some(from) = claim_ops::claim_state(conn, claim_id)? else {
                    return Err(LoreError::Ledger(LedgerError::UnknownClaim {
                        claim_id: claim_id.as_str().to_string(),
                    }));
                };
                if from == to {
                    return Ok(None);
                }
                let tx = conn
                    .unchecked_transaction()
                    .map_err(|e| to_store_err(format!("transition begin: {e}")))?;
                claim_ops::set_claim_state(&tx, claim_id, to)?;
                let sequence =
                    insert_state_change(&tx, claim_id, entity_id, from, to)?;
                tx.commit()
                    .map_err(|e| to_store_err(format!("transition commit: {e}")))?;
                Ok(Some(sequence))
            })
            .await
    }

    /// Activate a defeater. A `ForcesAbsent` defeater also moves the claim
    /// to `Defeated`; a capping defeater leaves the state alone and only
    /// clamps computed confidence. Returns all appended sequences.
    pub async fn activate_defeater(
        &self,
        defeater: &Defeater,
        entity_id: Option<&EntityId>,
    ) -> LoreResult<Vec<u64>> {
        let event = LedgerEvent::for_claim(
            defeater.claim_id.clone(),
            entity_id.cloned(),
            LedgerEventKind::DefeaterActivated {
                defeater_id: defeater.id.clone(),
                kind: defeater.kind,
                severity: defeater.severity,
                detail: defeater.detail.clone(),
            },
        );
        let payload = event.payload()?;
        let forces_absent = matches!(defeater.severity, DefeaterSeverity::ForcesAbsent);

        self.writer
            .with_conn(|conn| {
                let tx = conn
                    .unchecked_transaction()
                    .map_err(|e| to_store_err(format!("defeater begin: {e}")))?;
                let mut sequences = vec![ledger_ops::insert_event(
                    &tx,
                    event.kind.name(),
                    Some(defeater.claim_id.as_str()),
                    event.entity_id.as_ref().map(|id| id.as_str()),
                    &payload,
                    &event.recorded_at.to_rfc3339(),
                )?];
                if forces_absent {
                    let Some(from) = claim_ops::claim_state(&tx, &defeater.claim_id)? else {
                        return Err(LoreError::Ledger(LedgerError::UnknownClaim {
                            claim_id: defeater.claim_id.as_str().to_string(),
                        }));
                    };
                    if from != ClaimState::Defeated {
                        claim_ops::set_claim_state(&tx, &defeater.claim_id, ClaimState::Defeated)?;
                        sequences.push(insert_state_change(
                            &tx,
                            &defeater.claim_id,
                            entity_id,
                            from,
                            ClaimState::Defeated,
                        )?);
                    }
                }
                tx.commit()
                    .map_err(|e| to_store_err(format!("defeater commit: {e}")))?;
                Ok(sequences)
            })
            .await
    }

    /// Log a defeater as resolved. The claim's lifecycle is untouched;
    /// re-validation happens through the normal stale/pending path.
    pub async fn resolve_defeater(
        &self,
        claim_id: &ClaimId,
        defeater_id: &DefeaterId,
        entity_id: Option<&EntityId>,
    ) -> LoreResult<u64> {
        let event = LedgerEvent::for_claim(
            claim_id.clone(),
            entity_id.cloned(),
            LedgerEventKind::DefeaterResolved {
                defeater_id: defeater_id.clone(),
            },
        );
        self.append(&event).await
    }

    /// Record an agent outcome against a claim. Outcomes only ever become
    /// events; the score they eventually influence is the calibration
    /// curve, refitted separately.
    pub async fn record_outcome(
        &self,
        claim_id: &ClaimId,
        entity_id: Option<&EntityId>,
        query_id: &QueryId,
        pack_id: &PackId,
        outcome: FeedbackOutcome,
    ) -> LoreResult<u64> {
        let event = LedgerEvent::for_claim(
            claim_id.clone(),
            entity_id.cloned(),
            LedgerEventKind::OutcomeRecorded {
                query_id: query_id.clone(),
                pack_id: pack_id.clone(),
                outcome,
            },
        );
        self.append(&event).await
    }

    // --- Derived reads ---

    /// Events with sequence strictly greater than `after`, in order.
    pub fn events_since(&self, after: u64) -> LoreResult<Vec<LedgerEvent>> {
        let rows = self.with_reader(|conn| ledger_ops::events_since(conn, after))?;
        rows.into_iter().map(LedgerEvent::from_row).collect()
    }

    pub fn event_count(&self) -> LoreResult<u64> {
        self.with_reader(ledger_ops::event_count)
    }

    /// Rebuild the confidence view from the full log.
    pub fn rebuild_view(&self) -> LoreResult<ConfidenceView> {
        ConfidenceView::replay(&self.events_since(0)?)
    }

    /// Fold events the view has not seen yet. Returns how many applied.
    pub fn refresh_view(&self, view: &mut ConfidenceView) -> LoreResult<usize> {
        let events = self.events_since(view.last_sequence())?;
        for event in &events {
            view.apply(event)?;
        }
        Ok(events.len())
    }

    /// The fitted curve for a cohort, if one exists.
    pub fn curve(&self, cohort: &str) -> LoreResult<Option<CalibrationCurve>> {
        let row = self.with_reader(|conn| ledger_ops::get_curve(conn, cohort))?;
        match row {
            None => Ok(None),
            Some((json, _, _)) => Ok(Some(serde_json::from_str(&json)?)),
        }
    }

    /// Compute a claim's confidence against the given view. A claim the
    /// log has never seen has zero evidence and reports
    /// `absent(uncalibrated)`.
    pub fn confidence(
        &self,
        view: &ConfidenceView,
        claim_id: &ClaimId,
        durability: Durability,
        cohort: &str,
        now: DateTime<Utc>,
    ) -> LoreResult<ConfidenceValue> {
        let Some(state) = view.claim(claim_id) else {
            return Ok(ConfidenceValue::absent(AbsentReason::Uncalibrated));
        };
        let curve = self.curve(cohort)?;
        Ok(compute_confidence(
            state,
            durability,
            curve.as_ref(),
            now,
            &self.config,
        ))
    }

    // --- Calibration pipeline ---

    /// Build refit samples from every claim with decided outcomes. Each
    /// worked/failed outcome becomes one sample at the claim's raw score,
    /// weighted down by age; irrelevant outcomes carry no signal.
    pub fn calibration_samples(
        &self,
        view: &ConfidenceView,
        now: DateTime<Utc>,
    ) -> Vec<CalibrationSample> {
        let half_life = self.config.outcome_half_life_days;
        let mut samples = Vec::new();
        for claim in view.claims() {
            let raw = raw_score(claim);
            for (outcome, at) in &claim.outcomes {
                let worked = match outcome {
                    FeedbackOutcome::Worked => true,
                    FeedbackOutcome::Failed => false,
                    FeedbackOutcome::Irrelevant => continue,
                };
                let age_days =
                    now.signed_duration_since(*at).num_seconds().max(0) as f64 / 86_400.0;
                let weight = (-age_days * std::f64::consts::LN_2 / half_life).exp();
                samples.push(CalibrationSample::weighted(raw, worked, weight));
            }
        }
        samples
    }

    /// Refit and persist a cohort's curve, logging the refit as an event.
    /// Fails below `calibration_min_samples` and leaves any prior curve
    /// in place.
    pub async fn refit_calibration(
        &self,
        cohort: &str,
        samples: &[CalibrationSample],
        now: DateTime<Utc>,
    ) -> LoreResult<CalibrationCurve> {
        let curve = CalibrationCurve::fit(
            cohort,
            samples,
            self.config.calibration_bins,
            self.config.calibration_min_samples,
            now,
        )?;
        let json = serde_json::to_string(&curve)?;
        let event = LedgerEvent::global(LedgerEventKind::CalibrationFitted {
            cohort: cohort.to_string(),
            cohort_size: curve.cohort_size,
        });
        let payload = event.payload()?;

        self.writer
            .with_conn(|conn| {
                let tx = conn
                    .unchecked_transaction()
                    .map_err(|e| to_store_err(format!("refit begin: {e}")))?;
                ledger_ops::upsert_curve(
                    &tx,
                    &curve.cohort,
                    &json,
                    curve.cohort_size as usize,
                    &curve.fitted_at.to_rfc3339(),
                )?;
                ledger_ops::insert_event(
                    &tx,
                    event.kind.name(),
                    None,
                    None,
                    &payload,
                    &event.recorded_at.to_rfc3339(),
                )?;
                tx.commit()
                    .map_err(|e| to_store_err(format!("refit commit: {e}")))?;
                Ok(())
            })
            .await?;

        tracing::info!(
            cohort = curve.cohort.as_str(),
            cohort_size = curve.cohort_size,
            "calibration curve refitted"
        );
        Ok(curve)
    }
}

fn insert_state_change(
    conn: &Connection,
    claim_id: &ClaimId,
    entity_id: Option<&EntityId>,
    from: ClaimState,
    to: ClaimState,
) -> LoreResult<u64> {
    let event = LedgerEvent::for_claim(
        claim_id.clone(),
        entity_id.cloned(),
        LedgerEventKind::ClaimStateChanged { from, to },
    );
    ledger_ops::insert_event(
        conn,
        event.kind.name(),
        Some(claim_id.as_str()),
        entity_id.map(|id| id.as_str()),
        &event.payload()?,
        &event.recorded_at.to_rfc3339(),
    )
}
