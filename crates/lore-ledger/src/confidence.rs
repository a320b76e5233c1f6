//! Pure confidence computation over the derived view.
//!
//! Rule order, first match wins the absence decisions:
//! 1. an active `ForcesAbsent` defeater makes the value `absent(defeated)`;
//! 2. zero evidence makes it `absent(uncalibrated)`;
//! 3. claims backed only by verified structural facts are `Present` with a
//!    `DirectEvidence` basis and need no curve (the citations are
//!    hash-checked, there is nothing to calibrate);
//! 4. anything touched by synthesis maps its raw score through the
//!    cohort's fitted curve; with no curve fitted the value is
//!    `absent(uncalibrated)`, never a numeric placeholder.
//!
//! Present values then decay past the staleness threshold (suppressed for
//! immutable entities) and are clamped by any active confidence caps.
//!
//! Outcomes never enter the score directly. They reach confidence only as
//! calibration labels at refit time and as defeaters.

use chrono::{DateTime, Utc};

use lore_core::config::LedgerConfig;
use lore_core::models::{AbsentReason, ConfidenceBasis, ConfidenceValue, Durability};

use crate::calibration::CalibrationCurve;
use crate::view::ClaimLedgerState;

/// The uncalibrated evidence score: the verified share of a claim's
/// citations. This is what calibration samples use as their x-axis.
pub fn raw_score(state: &ClaimLedgerState) -> f64 {
    let total = state.verified_citations + state.unverified_citations;
    if total == 0 {
        return 0.0;
    }
    f64::from(state.verified_citations) / f64::from(total)
}

/// Compute a claim's confidence from its ledger state. Pure: same view,
/// same curve, same clock, same answer.
pub fn compute_confidence(
    state: &ClaimLedgerState,
    durability: Durability,
    curve: Option<&CalibrationCurve>,
    now: DateTime<Utc>,
    config: &LedgerConfig,
) -> ConfidenceValue {
    if state.forced_absent() {
        return ConfidenceValue::absent(AbsentReason::Defeated);
    }
    if state.total_evidence() == 0 {
        return ConfidenceValue::absent(AbsentReason::Uncalibrated);
    }

    let raw = raw_score(state);
    let decay = staleness_factor(state.last_evidence_at, durability, now, config);

    let direct_only = state.synthesis_evidence == 0 && state.unverified_citations == 0;
    let value = if direct_only {
        ConfidenceValue::present(
            raw * decay,
            ConfidenceBasis::DirectEvidence {
                verified_citations: state.verified_citations,
            },
        )
    } else {
        match curve {
            Some(curve) => ConfidenceValue::present(
                curve.apply(raw) * decay,
                ConfidenceBasis::Calibrated {
                    cohort_size: curve.cohort_size,
                    fitted_at: curve.fitted_at,
                },
            ),
            None => return ConfidenceValue::absent(AbsentReason::Uncalibrated),
        }
    };

    state
        .confidence_caps()
        .fold(value, |v, cap| v.capped(cap))
}

/// Half-life decay once evidence ages past the staleness threshold.
/// Immutable entities never decay: their content provably has not moved.
fn staleness_factor(
    last_evidence_at: Option<DateTime<Utc>>,
    durability: Durability,
    now: DateTime<Utc>,
    config: &LedgerConfig,
) -> f64 {
    if durability == Durability::Immutable {
        return 1.0;
    }
    let Some(last) = last_evidence_at else {
        return 1.0;
    };
    let days = now.signed_duration_since(last).num_seconds() as f64 / 86_400.0;
    let excess = days - config.staleness_threshold_days;
    if excess <= 0.0 {
        return 1.0;
    }
    (-excess * std::f64::consts::LN_2 / config.staleness_half_life_days).exp()
}
