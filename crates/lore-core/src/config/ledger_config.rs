use serde::{Deserialize, Serialize};

use super::defaults;

/// Epistemics ledger configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Maximum events per append batch.
    pub max_event_batch: usize,
    /// Minimum outcome samples per cohort before a curve is fitted.
    pub calibration_min_samples: usize,
    /// Number of score bins in the calibration curve.
    pub calibration_bins: usize,
    /// Half-life for outcome recency weighting, in days.
    pub outcome_half_life_days: f64,
    /// Days without fresh evidence before staleness decay begins.
    /// Suppressed for immutable entities.
    pub staleness_threshold_days: f64,
    /// Half-life of the staleness decay once it begins, in days.
    pub staleness_half_life_days: f64,
    /// Confidence cap applied by a stale-evidence defeater.
    pub stale_evidence_cap: f64,
    /// Confidence cap applied by a failed-outcome defeater.
    pub failed_outcome_cap: f64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_event_batch: defaults::DEFAULT_MAX_EVENT_BATCH,
            calibration_min_samples: defaults::DEFAULT_CALIBRATION_MIN_SAMPLES,
            calibration_bins: defaults::DEFAULT_CALIBRATION_BINS,
            outcome_half_life_days: defaults::DEFAULT_OUTCOME_HALF_LIFE_DAYS,
            staleness_threshold_days: defaults::DEFAULT_STALENESS_THRESHOLD_DAYS,
            staleness_half_life_days: defaults::DEFAULT_STALENESS_HALF_LIFE_DAYS,
            stale_evidence_cap: defaults::DEFAULT_STALE_EVIDENCE_CAP,
            failed_outcome_cap: defaults::DEFAULT_FAILED_OUTCOME_CAP,
        }
    }
}
