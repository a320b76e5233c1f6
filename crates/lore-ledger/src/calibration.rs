//! Calibration curves fitted from ledger outcomes.
//!
//! A curve maps a raw evidence score to the success rate actually
//! observed for claims that scored there. Fitting bins the samples and
//! runs pool-adjacent-violators so the mapping is monotone: a better
//! evidence score never calibrates to a lower confidence. Bins use
//! Laplace smoothing, so a cohort of unanimous outcomes still stays off
//! the 0.0 and 1.0 rails.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lore_core::errors::{LedgerError, LoreError, LoreResult};

/// Cohort used when no finer partitioning is configured.
pub const GLOBAL_COHORT: &str = "global";

/// One (raw score, observed outcome) pair, weighted for recency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationSample {
    pub raw: f64,
    pub worked: bool,
    pub weight: f64,
}

impl CalibrationSample {
    pub fn new(raw: f64, worked: bool) -> Self {
        Self {
            raw,
            worked,
            weight: 1.0,
        }
    }

    pub fn weighted(raw: f64, worked: bool, weight: f64) -> Self {
        Self {
            raw,
            worked,
            weight: weight.max(0.0),
        }
    }
}

/// A fitted, monotone step function over equal-width score bins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationCurve {
    pub cohort: String,
    /// Calibrated value per bin, non-decreasing left to right.
    bins: Vec<f64>,
    pub cohort_size: u32,
    pub fitted_at: DateTime<Utc>,
}

impl CalibrationCurve {
    /// Fit a curve for `cohort`. Refuses to fit below `min_samples`:
    /// a curve fitted on next to nothing would launder guesses into
    /// numbers, which is exactly what the ledger exists to prevent.
    pub fn fit(
        cohort: &str,
        samples: &[CalibrationSample],
        bin_count: usize,
        min_samples: usize,
        fitted_at: DateTime<Utc>,
    ) -> LoreResult<Self> {
        if bin_count == 0 {
            return Err(fit_err("bin count must be positive"));
        }
        if samples.len() < min_samples {
            return Err(fit_err(format!(
                "cohort '{}' has {} samples, need {}",
                cohort,
                samples.len(),
                min_samples
            )));
        }

        let mut worked_weight = vec![0.0_f64; bin_count];
        let mut total_weight = vec![0.0_f64; bin_count];
        for sample in samples {
            let idx = bin_index(sample.raw, bin_count);
            total_weight[idx] += sample.weight;
            if sample.worked {
                worked_weight[idx] += sample.weight;
            }
        }

        // Laplace smoothing per bin; empty bins sit at 0.5 with pseudo
        // weight only, so occupied neighbours dominate them under PAV.
        let mut rates = Vec::with_capacity(bin_count);
        let mut weights = Vec::with_capacity(bin_count);
        for i in 0..bin_count {
            rates.push((worked_weight[i] + 1.0) / (total_weight[i] + 2.0));
            weights.push(total_weight[i] + 2.0);
        }

        let bins = pool_adjacent_violators(&rates, &weights);
        Ok(Self {
            cohort: cohort.to_string(),
            bins,
            cohort_size: samples.len() as u32,
            fitted_at,
        })
    }

    /// Map a raw score through the fitted curve.
    pub fn apply(&self, raw: f64) -> f64 {
        let idx = bin_index(raw, self.bins.len());
        self.bins[idx].clamp(0.0, 1.0)
    }

    pub fn bin_count(&self) -> usize {
        self.bins.len()
    }
}

fn bin_index(raw: f64, bin_count: usize) -> usize {
    let clamped = raw.clamp(0.0, 1.0);
    ((clamped * bin_count as f64) as usize).min(bin_count - 1)
}

/// Weighted isotonic regression: merge adjacent bins until the sequence
/// is non-decreasing, each merge averaging by weight.
fn pool_adjacent_violators(rates: &[f64], weights: &[f64]) -> Vec<f64> {
    // (value, weight, bin span) per block.
    let mut blocks: Vec<(f64, f64, usize)> = Vec::with_capacity(rates.len());
    for (&rate, &weight) in rates.iter().zip(weights) {
        blocks.push((rate, weight, 1));
        while blocks.len() >= 2 {
            let last = blocks[blocks.len() - 1];
            let prev = blocks[blocks.len() - 2];
            if prev.0 <= last.0 {
                break;
            }
            let weight = prev.1 + last.1;
            let value = (prev.0 * prev.1 + last.0 * last.1) / weight;
            let span = prev.2 + last.2;
            blocks.truncate(blocks.len() - 2);
            blocks.push((value, weight, span));
        }
    }
    let mut fitted = Vec::with_capacity(rates.len());
    for (value, _, span) in blocks {
        fitted.extend(std::iter::repeat(value.clamp(0.0, 1.0)).take(span));
    }
    fitted
}

fn fit_err(reason: impl Into<String>) -> LoreError {
    LoreError::Ledger(LedgerError::CalibrationFailed {
        reason: reason.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separated_samples() -> Vec<CalibrationSample> {
        let mut samples = Vec::new();
        for _ in 0..20 {
            samples.push(CalibrationSample::new(0.1, false));
            samples.push(CalibrationSample::new(0.9, true));
        }
        samples
    }

    #[test]
    fn refuses_to_fit_below_min_samples() {
        let samples = vec![CalibrationSample::new(0.5, true)];
        let err = CalibrationCurve::fit(GLOBAL_COHORT, &samples, 10, 30, Utc::now()).unwrap_err();
        assert!(err.to_string().contains("need 30"));
    }

    #[test]
    fn fitted_curve_is_monotone_even_on_adversarial_data() {
        // High raw scores that failed, low raw scores that worked.
        let mut samples = Vec::new();
        for _ in 0..15 {
            samples.push(CalibrationSample::new(0.95, false));
            samples.push(CalibrationSample::new(0.05, true));
            samples.push(CalibrationSample::new(0.55, true));
        }
        let curve = CalibrationCurve::fit(GLOBAL_COHORT, &samples, 10, 30, Utc::now()).unwrap();
        let values: Vec<f64> = (0..curve.bin_count())
            .map(|i| curve.apply((i as f64 + 0.5) / curve.bin_count() as f64))
            .collect();
        for pair in values.windows(2) {
            assert!(pair[0] <= pair[1] + 1e-12, "curve regressed: {values:?}");
        }
    }

    #[test]
    fn separated_outcomes_calibrate_apart() {
        let curve =
            CalibrationCurve::fit(GLOBAL_COHORT, &separated_samples(), 10, 30, Utc::now()).unwrap();
        assert!(curve.apply(0.1) < 0.3);
        assert!(curve.apply(0.9) > 0.7);
    }

    #[test]
    fn unanimous_cohorts_stay_off_the_rails() {
        let samples: Vec<_> = (0..40)
            .map(|_| CalibrationSample::new(0.9, true))
            .collect();
        let curve = CalibrationCurve::fit(GLOBAL_COHORT, &samples, 10, 30, Utc::now()).unwrap();
        let top = curve.apply(0.9);
        assert!(top < 1.0 && top > 0.8);
    }

    #[test]
    fn recency_weights_tilt_the_fit() {
        // Old failures at tiny weight, fresh successes at full weight,
        // all in the same bin.
        let mut samples = Vec::new();
        for _ in 0..20 {
            samples.push(CalibrationSample::weighted(0.7, false, 0.05));
            samples.push(CalibrationSample::weighted(0.7, true, 1.0));
        }
        let curve = CalibrationCurve::fit(GLOBAL_COHORT, &samples, 10, 30, Utc::now()).unwrap();
        assert!(curve.apply(0.7) > 0.6);
    }

    #[test]
    fn zero_bins_is_rejected() {
        let err =
            CalibrationCurve::fit(GLOBAL_COHORT, &separated_samples(), 0, 30, Utc::now())
                .unwrap_err();
        assert!(err.to_string().contains("bin count"));
    }

    #[test]
    fn curve_survives_json_round_trip() {
        let curve =
            CalibrationCurve::fit(GLOBAL_COHORT, &separated_samples(), 10, 30, Utc::now()).unwrap();
        let json = serde_json::to_string(&curve).unwrap();
        let back: CalibrationCurve = serde_json::from_str(&json).unwrap();
        assert_eq!(back, curve);
    }
}
