//! Proper scoring rules for binary probabilistic predictions.
//!
//! - Brier score: quadratic rule, 0 (perfect) to 1 (worst)
//! - Log loss: cross-entropy, 0 to ~34.5 with the default epsilon
//!
//! Both validate their inputs before scoring. The clamp inside log loss only
//! keeps the logarithm finite; it never stands in for validation.

use crate::calibration::{expected_calibration_error, CalibrationBin, CalibrationError};
use crate::probability::{round_to, BinaryOutcome, Probability, ProbabilityError};
use serde::{Deserialize, Serialize};

/// Default clamp for log loss
pub const DEFAULT_LOG_LOSS_EPS: f64 = 1e-15;

/// Brier score for a single prediction: `(p - y)^2`
///
/// # Errors
///
/// Returns `OutOfRange` if `p` is outside `[0, 1]`, `InvalidOutcome` if `y`
/// is not 0 or 1.
pub fn brier_score(p: f64, y: u8) -> Result<f64, ProbabilityError> {
    let p = Probability::new(p)?;
    let y = BinaryOutcome::try_from(y)?;
    Ok(brier(p, y))
}

/// Log loss for a single prediction with the default epsilon
///
/// # Errors
///
/// Returns `OutOfRange` if `p` is outside `[0, 1]`, `InvalidOutcome` if `y`
/// is not 0 or 1.
pub fn log_loss_score(p: f64, y: u8) -> Result<f64, ProbabilityError> {
    log_loss_score_with_eps(p, y, DEFAULT_LOG_LOSS_EPS)
}

/// Log loss for a single prediction, clamping `p` into `[eps, 1 - eps]`
///
/// # Errors
///
/// Returns `OutOfRange`/`InvalidOutcome` for invalid inputs and
/// `InvalidEpsilon` unless `0 < eps < 0.5`.
pub fn log_loss_score_with_eps(p: f64, y: u8, eps: f64) -> Result<f64, ProbabilityError> {
    let p = Probability::new(p)?;
    let y = BinaryOutcome::try_from(y)?;
    validate_eps(eps)?;
    Ok(log_loss(p, y, eps))
}

/// Check that a log-loss epsilon leaves a non-empty clamp window
///
/// # Errors
///
/// Returns `InvalidEpsilon` unless `0 < eps < 0.5`.
pub fn validate_eps(eps: f64) -> Result<(), ProbabilityError> {
    if eps > 0.0 && eps < 0.5 {
        Ok(())
    } else {
        Err(ProbabilityError::InvalidEpsilon(eps))
    }
}

fn brier(p: Probability, y: BinaryOutcome) -> f64 {
    (p.value() - y.value()).powi(2)
}

fn log_loss(p: Probability, y: BinaryOutcome, eps: f64) -> f64 {
    let clamped = p.value().clamp(eps, 1.0 - eps);
    match y {
        BinaryOutcome::Positive => -clamped.ln(),
        BinaryOutcome::Negative => -(1.0 - clamped).ln(),
    }
}

/// Collector for resolved predictions
#[derive(Debug, Default)]
pub struct OutcomeCollector {
    probs: Vec<Probability>,
    outcomes: Vec<BinaryOutcome>,
}

impl OutcomeCollector {
    /// Create an empty collector
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a resolved prediction
    ///
    /// # Errors
    ///
    /// Returns an error if `p` or `y` is outside its domain; nothing is
    /// recorded in that case.
    pub fn record(&mut self, p: f64, y: u8) -> Result<(), ProbabilityError> {
        let p = Probability::new(p)?;
        let y = BinaryOutcome::try_from(y)?;
        self.probs.push(p);
        self.outcomes.push(y);
        Ok(())
    }

    /// Number of recorded predictions
    #[must_use]
    pub fn len(&self) -> usize {
        self.probs.len()
    }

    /// Whether nothing has been recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.probs.is_empty()
    }

    /// Compute mean scoring rules and ECE
    ///
    /// # Errors
    ///
    /// Returns `CalibrationError::ZeroBins` if `n_bins == 0` with a
    /// non-empty collector, or `Invalid` for an unusable epsilon.
    #[allow(clippy::cast_precision_loss)]
    pub fn compute(&self, n_bins: usize, eps: f64) -> Result<OutcomeSummary, CalibrationError> {
        validate_eps(eps)?;
        if self.is_empty() {
            return Ok(OutcomeSummary::default());
        }

        let pairs = || self.probs.iter().copied().zip(self.outcomes.iter().copied());
        let n = self.len() as f64;
        let mean_brier = pairs().map(|(p, y)| brier(p, y)).sum::<f64>() / n;
        let mean_log_loss = pairs().map(|(p, y)| log_loss(p, y, eps)).sum::<f64>() / n;

        let raw_probs: Vec<f64> = self.probs.iter().map(|p| p.value()).collect();
        let raw_outcomes: Vec<u8> = self.outcomes.iter().map(|&y| u8::from(y)).collect();
        let (ece, bins) = expected_calibration_error(&raw_probs, &raw_outcomes, n_bins)?;

        Ok(OutcomeSummary {
            count: self.len(),
            mean_brier: round_to(mean_brier, 4),
            mean_log_loss: round_to(mean_log_loss, 4),
            ece,
            bins,
        })
    }
}

/// Aggregated scoring over resolved predictions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutcomeSummary {
    /// Number of predictions
    pub count: usize,
    /// Mean Brier score
    pub mean_brier: f64,
    /// Mean log loss
    pub mean_log_loss: f64,
    /// Expected Calibration Error
    pub ece: f64,
    /// Per-bin breakdown
    pub bins: Vec<CalibrationBin>,
}
