//! Scores a single estimate against a human-defined defensible range.
//!
//! Calibration score (0-3, same scale as the other grading axes):
//! - 3: inside the ground-truth range
//! - 2: within 10 percentage points of the nearest boundary
//! - 1: within 20 percentage points
//! - 0: further away
//!
//! Expressing a range earns one point; a range that overlaps ground truth
//! earns another.

use crate::probability::{round_to, Probability, ProbabilityRange};
use serde::{Deserialize, Serialize};

/// Largest distance that still scores 2
pub const NEAR_RANGE: f64 = 0.10;

/// Largest distance that still scores 1
pub const MODERATE_RANGE: f64 = 0.20;

/// Highest attainable total
pub const MAX_TOTAL: u8 = 5;

/// Quality of one probability estimate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityScore {
    /// Distance-based tier, 0-3
    pub calibration_score: u8,
    /// 1 if the model expressed a range at all
    pub range_acknowledgment: u8,
    /// 1 if the expressed range overlaps ground truth
    pub range_quality: u8,
    /// Sum of the three components, at most 5
    #[serde(rename = "total_calibration")]
    pub total: u8,
    /// Distance to the nearest ground-truth boundary, 0 when inside
    pub distance_from_range: f64,
}

/// Score an estimate (and optional expressed range) against ground truth
#[must_use]
pub fn score_probability_quality(
    estimate: Probability,
    ground_truth: ProbabilityRange,
    expressed: Option<ProbabilityRange>,
) -> QualityScore {
    // Tiered on the reported precision so 0.4 - 0.3 counts as 0.10
    let distance = round_to(ground_truth.distance_to(estimate), 4);
    let calibration_score = calibration_tier(distance);

    let range_acknowledgment = u8::from(expressed.is_some());
    let range_quality = u8::from(expressed.is_some_and(|r| r.overlaps(&ground_truth)));

    QualityScore {
        calibration_score,
        range_acknowledgment,
        range_quality,
        total: calibration_score + range_acknowledgment + range_quality,
        distance_from_range: distance,
    }
}

fn calibration_tier(distance: f64) -> u8 {
    if distance == 0.0 {
        3
    } else if distance <= NEAR_RANGE {
        2
    } else if distance <= MODERATE_RANGE {
        1
    } else {
        0
    }
}
