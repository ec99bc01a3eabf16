//! # Calibration Eval
//!
//! Calibration scoring for AI-model responses to financial-reasoning prompts.
//!
//! Measures how well a model's stated probability estimates track a
//! human-defined defensible range, and how well resolved predictions score
//! under proper scoring rules.
//!
//! ## Pipeline
//!
//! ```text
//! Model response (free text)
//!        ↓
//! Probability extraction (range → percentage → decimal)
//!        ↓
//! Range quality scoring against ground truth (0-3 + range bonuses)
//!        ↓
//! Calibration report (per-scenario + aggregate)
//! ```
//!
//! When binary outcomes are known, [`brier_score`], [`log_loss_score`] and
//! [`expected_calibration_error`] score predictions directly.

pub mod calibration;
pub mod config;
pub mod extract;
pub mod metrics;
pub mod probability;
pub mod quality;
pub mod report;
pub mod runner;

pub use calibration::{expected_calibration_error, CalibrationBin, CalibrationError, DEFAULT_BINS};
pub use config::{
    load_outcomes, load_results, BaseEval, CalibrationSettings, ConfigError, GradedResult,
    GroundTruthIndex, OutcomeRecord, ScenarioConfig,
};
pub use extract::{
    parse_probability_from_response, DecimalMatcher, ExtractionMethod, Extractor,
    PercentageMatcher, ProbabilityEstimate, ProbabilityMatcher, RangeMatcher,
};
pub use metrics::{
    brier_score, log_loss_score, log_loss_score_with_eps, OutcomeCollector, OutcomeSummary,
    DEFAULT_LOG_LOSS_EPS,
};
pub use probability::{
    BinaryOutcome, Percentage, PercentageRange, Probability, ProbabilityError, ProbabilityRange,
};
pub use quality::{score_probability_quality, QualityScore};
pub use report::{calibration_report, CalibrationReport, PredictionRecord, ScenarioScore};
pub use runner::{extract_predictions, Extraction, SkipReason, SkippedScenario};
