//! Expected Calibration Error over a population of predictions.
//!
//! Predictions are grouped into equal-width confidence bins. Each bin
//! compares its mean predicted probability against the observed positive
//! rate; ECE is the count-weighted mean of those gaps.

use crate::probability::{round_to, BinaryOutcome, Probability, ProbabilityError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default number of calibration bins
pub const DEFAULT_BINS: usize = 10;

/// Decimal digits kept in ECE output
const ECE_DECIMALS: i32 = 4;

/// Errors that can occur while aggregating calibration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalibrationError {
    #[error("predictions and outcomes must have the same length ({predictions} vs {outcomes})")]
    LengthMismatch { predictions: usize, outcomes: usize },

    #[error("number of calibration bins must be positive")]
    ZeroBins,

    #[error(transparent)]
    Invalid(#[from] ProbabilityError),
}

/// Per-bin calibration statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationBin {
    /// Inclusive lower edge
    pub low: f64,
    /// Upper edge (exclusive, except for the last bin)
    pub high: f64,
    /// Predictions that fell in this bin
    pub count: usize,
    /// Mean predicted probability
    pub avg_confidence: f64,
    /// Observed positive rate
    pub avg_accuracy: f64,
    /// `|avg_accuracy - avg_confidence|`
    pub gap: f64,
}

impl CalibrationBin {
    fn empty(low: f64, high: f64) -> Self {
        Self {
            low,
            high,
            count: 0,
            avg_confidence: 0.0,
            avg_accuracy: 0.0,
            gap: 0.0,
        }
    }
}

#[derive(Default, Clone, Copy)]
struct BinAccumulator {
    count: usize,
    confidence_sum: f64,
    positives: f64,
}

/// Compute Expected Calibration Error.
///
/// Returns the ECE together with exactly `n_bins` per-bin entries (empty bins
/// included). Empty input yields `(0.0, [])`.
///
/// # Errors
///
/// Returns `LengthMismatch` when the slices differ in length, `ZeroBins`
/// when `n_bins == 0`, and `Invalid` when a probability or outcome is
/// outside its domain.
#[allow(clippy::cast_precision_loss)]
pub fn expected_calibration_error(
    probs: &[f64],
    outcomes: &[u8],
    n_bins: usize,
) -> Result<(f64, Vec<CalibrationBin>), CalibrationError> {
    if probs.len() != outcomes.len() {
        return Err(CalibrationError::LengthMismatch {
            predictions: probs.len(),
            outcomes: outcomes.len(),
        });
    }
    if probs.is_empty() {
        return Ok((0.0, Vec::new()));
    }
    if n_bins == 0 {
        return Err(CalibrationError::ZeroBins);
    }

    let edges: Vec<f64> = (0..=n_bins).map(|i| i as f64 / n_bins as f64).collect();
    let mut accumulators = vec![BinAccumulator::default(); n_bins];

    for (&p, &y) in probs.iter().zip(outcomes) {
        let p = Probability::new(p)?;
        let y = BinaryOutcome::try_from(y)?;

        // Edges at or below p, minus one, is the half-open bin index; p == 1.0
        // lands one past the end and belongs to the closed last bin.
        let idx = edges
            .partition_point(|&edge| edge <= p.value())
            .saturating_sub(1)
            .min(n_bins - 1);

        let acc = &mut accumulators[idx];
        acc.count += 1;
        acc.confidence_sum += p.value();
        acc.positives += y.value();
    }

    let total = probs.len() as f64;
    let mut ece = 0.0;
    let bins = accumulators
        .iter()
        .enumerate()
        .map(|(b, acc)| {
            let (low, high) = (edges[b], edges[b + 1]);
            if acc.count == 0 {
                return CalibrationBin::empty(low, high);
            }
            let count = acc.count as f64;
            let avg_confidence = acc.confidence_sum / count;
            let avg_accuracy = acc.positives / count;
            let gap = (avg_accuracy - avg_confidence).abs();
            ece += gap * (count / total);

            CalibrationBin {
                low,
                high,
                count: acc.count,
                avg_confidence: round_to(avg_confidence, ECE_DECIMALS),
                avg_accuracy: round_to(avg_accuracy, ECE_DECIMALS),
                gap: round_to(gap, ECE_DECIMALS),
            }
        })
        .collect();

    Ok((round_to(ece, ECE_DECIMALS), bins))
}
