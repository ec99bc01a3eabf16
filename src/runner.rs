//! Prediction extraction over graded evaluation results.
//!
//! Joins each graded response with its scenario's ground truth. Responses
//! without a usable probability and scenarios without ground truth are
//! skipped and logged; neither is an error.

use crate::config::{GradedResult, GroundTruthIndex};
use crate::extract::Extractor;
use crate::report::PredictionRecord;
use serde::Serialize;
use std::fmt;

/// Why a scenario produced no prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The response contains no probability the extractor recognizes
    NoProbability,
    /// The scenario has no ground-truth range
    NoGroundTruth,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoProbability => write!(f, "no probability found in response"),
            Self::NoGroundTruth => write!(f, "no ground truth range"),
        }
    }
}

/// A scenario that was left out of the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedScenario {
    /// Scenario identifier
    pub scenario_id: String,
    /// Why it was skipped
    pub reason: SkipReason,
}

/// Result of extracting predictions from a batch of graded results
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Predictions ready for the report
    pub predictions: Vec<PredictionRecord>,
    /// Scenarios that could not be scored
    pub skipped: Vec<SkippedScenario>,
}

/// Build prediction records from graded results
#[must_use]
pub fn extract_predictions(
    results: &[GradedResult],
    index: &GroundTruthIndex,
    extractor: &Extractor,
) -> Extraction {
    let mut extraction = Extraction::default();

    for result in results {
        let scenario_id = result.scenario_id.as_str();

        let Some(estimate) = extractor.extract(&result.base_eval.response) else {
            skip(&mut extraction, scenario_id, SkipReason::NoProbability);
            continue;
        };

        let Some(ground_truth) = index.get(scenario_id) else {
            skip(&mut extraction, scenario_id, SkipReason::NoGroundTruth);
            continue;
        };

        extraction.predictions.push(PredictionRecord {
            scenario_id: scenario_id.to_string(),
            predicted_prob: estimate.point_estimate,
            ground_truth_range: *ground_truth,
            expressed_range: estimate.range.map(|r| r.to_percentage_range()),
        });
    }

    tracing::info!(
        predictions = extraction.predictions.len(),
        skipped = extraction.skipped.len(),
        "Extracted predictions"
    );
    extraction
}

fn skip(extraction: &mut Extraction, scenario_id: &str, reason: SkipReason) {
    tracing::warn!(scenario_id = %scenario_id, reason = %reason, "Skipping scenario");
    extraction.skipped.push(SkippedScenario {
        scenario_id: scenario_id.to_string(),
        reason,
    });
}
