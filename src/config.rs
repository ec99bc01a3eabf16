//! Configuration and input loading.
//!
//! - `CalibrationSettings`: scoring knobs from YAML
//! - Scenario YAML files: ground-truth ranges indexed by scenario id
//! - Graded result JSON: model responses per scenario
//! - Outcome JSON: resolved binary predictions for the scoring rules

use crate::calibration::DEFAULT_BINS;
use crate::metrics::{validate_eps, DEFAULT_LOG_LOSS_EPS};
use crate::probability::{PercentageRange, ProbabilityError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid glob pattern: {0}")]
    GlobError(String),

    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Invalid setting: {0}")]
    Invalid(String),

    #[error(transparent)]
    Probability(#[from] ProbabilityError),
}

/// Scoring settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalibrationSettings {
    /// Number of ECE bins
    #[serde(default = "default_n_bins")]
    pub n_bins: usize,
    /// Log loss clamp
    #[serde(default = "default_log_loss_eps")]
    pub log_loss_eps: f64,
}

const fn default_n_bins() -> usize {
    DEFAULT_BINS
}
const fn default_log_loss_eps() -> f64 {
    DEFAULT_LOG_LOSS_EPS
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self {
            n_bins: default_n_bins(),
            log_loss_eps: default_log_loss_eps(),
        }
    }
}

impl CalibrationSettings {
    /// Load settings from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse settings from a YAML string
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML cannot be parsed or a value is invalid.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_yaml::from_str(yaml)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check that every value is usable
    ///
    /// # Errors
    ///
    /// Returns `Invalid` for zero bins and `Probability` for a bad epsilon.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n_bins == 0 {
            return Err(ConfigError::Invalid("n_bins must be positive".to_string()));
        }
        validate_eps(self.log_loss_eps)?;
        Ok(())
    }
}

/// Scenario definition, reduced to the fields calibration needs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioConfig {
    /// Scenario identifier
    pub id: String,
    /// Calibration grading axes
    #[serde(default)]
    pub calibration_axes: Option<CalibrationAxes>,
}

/// Calibration axes section of a scenario
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalibrationAxes {
    /// Probability estimate axis
    #[serde(default)]
    pub probability_estimate: Option<ProbabilityEstimateAxis>,
}

/// Probability estimate axis
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProbabilityEstimateAxis {
    /// Defensible range in percentage points
    #[serde(default)]
    pub ground_truth_range: Option<PercentageRange>,
}

impl ScenarioConfig {
    /// Load a scenario from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a scenario from a YAML string
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML cannot be parsed.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Ground-truth range, if the scenario defines one
    #[must_use]
    pub fn ground_truth_range(&self) -> Option<PercentageRange> {
        self.calibration_axes
            .as_ref()?
            .probability_estimate
            .as_ref()?
            .ground_truth_range
    }
}

/// Ground-truth ranges keyed by scenario id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroundTruthIndex {
    ranges: BTreeMap<String, PercentageRange>,
}

impl GroundTruthIndex {
    /// Create an empty index
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every `*.yaml` scenario in `dir` that defines a ground-truth range.
    ///
    /// Files that fail to parse are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `dir` does not exist, or `GlobError` if the
    /// directory path cannot form a glob pattern.
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Self, ConfigError> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(ConfigError::NotFound(dir.display().to_string()));
        }

        let pattern = dir.join("*.yaml");
        let pattern = pattern.to_string_lossy();
        let paths = glob::glob(&pattern).map_err(|e| ConfigError::GlobError(e.to_string()))?;

        let mut index = Self::new();
        for entry in paths {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    tracing::warn!(error = %e, "Unreadable scenario path");
                    continue;
                }
            };

            match ScenarioConfig::load(&path) {
                Ok(scenario) => {
                    if let Some(range) = scenario.ground_truth_range() {
                        index.insert(scenario.id, range);
                    }
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping scenario file");
                }
            }
        }

        tracing::info!(
            dir = %dir.display(),
            scenarios = index.len(),
            "Indexed ground-truth ranges"
        );
        Ok(index)
    }

    /// Add or replace a scenario's range
    pub fn insert(&mut self, scenario_id: impl Into<String>, range: PercentageRange) {
        self.ranges.insert(scenario_id.into(), range);
    }

    /// Look up a scenario's range. A missing entry is not an error.
    #[must_use]
    pub fn get(&self, scenario_id: &str) -> Option<&PercentageRange> {
        self.ranges.get(scenario_id)
    }

    /// Number of indexed scenarios
    #[must_use]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Whether the index is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Iterate in scenario-id order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PercentageRange)> {
        self.ranges.iter().map(|(id, range)| (id.as_str(), range))
    }
}

impl FromIterator<(String, PercentageRange)> for GroundTruthIndex {
    fn from_iter<I: IntoIterator<Item = (String, PercentageRange)>>(iter: I) -> Self {
        Self {
            ranges: iter.into_iter().collect(),
        }
    }
}

/// One graded evaluation result
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GradedResult {
    /// Scenario identifier
    #[serde(default)]
    pub scenario_id: String,
    /// Base (non-adversarial) evaluation
    #[serde(default)]
    pub base_eval: BaseEval,
}

/// Base evaluation payload
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BaseEval {
    /// Model's free-text response
    #[serde(default)]
    pub response: String,
}

/// Load graded results from a JSON file
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_results<P: AsRef<Path>>(path: P) -> Result<Vec<GradedResult>, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// A resolved prediction for the scoring rules
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutcomeRecord {
    /// Optional scenario identifier
    #[serde(default)]
    pub scenario_id: Option<String>,
    /// Predicted probability, validated when scored
    pub predicted_prob: f64,
    /// Realized outcome, validated when scored
    pub outcome: u8,
}

/// Load resolved predictions from a JSON file
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_outcomes<P: AsRef<Path>>(path: P) -> Result<Vec<OutcomeRecord>, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
