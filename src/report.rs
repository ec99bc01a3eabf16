//! Calibration report generation.
//!
//! Turns percentage-unit prediction records into per-scenario quality scores
//! and aggregate metrics, then renders them as JSON, markdown, or plain text.

use crate::probability::{round_to, PercentageRange, Probability};
use crate::quality::{score_probability_quality, QualityScore};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt::Write as FmtWrite;
use tabled::{Table, Tabled};

/// One model prediction paired with its scenario's ground truth.
///
/// Ranges are in percentage points; they are converted to fractions inside
/// [`calibration_report`] and nowhere else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    /// Scenario identifier
    pub scenario_id: String,
    /// Model's point estimate
    pub predicted_prob: Probability,
    /// Defensible range from the scenario author
    pub ground_truth_range: PercentageRange,
    /// Range the model itself stated
    #[serde(default)]
    pub expressed_range: Option<PercentageRange>,
}

/// Quality score for one scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioScore {
    /// Scenario identifier
    pub scenario_id: String,
    /// Model's point estimate
    pub predicted_prob: Probability,
    /// Ground truth in percentage points
    pub ground_truth_range: PercentageRange,
    /// Component scores
    #[serde(flatten)]
    pub quality: QualityScore,
}

/// Aggregate calibration report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReport {
    /// Number of scored scenarios
    pub num_scenarios: usize,
    /// Mean calibration score (0-3), two decimals
    pub avg_calibration_score: f64,
    /// Fraction of scenarios where the model stated a range, two decimals
    pub range_acknowledgment_rate: f64,
    /// Per-scenario detail
    pub per_scenario: Vec<ScenarioScore>,
}

/// Score every prediction and aggregate the results
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn calibration_report(predictions: &[PredictionRecord]) -> CalibrationReport {
    let per_scenario: Vec<ScenarioScore> = predictions
        .iter()
        .map(|pred| {
            let quality = score_probability_quality(
                pred.predicted_prob,
                pred.ground_truth_range.to_probability_range(),
                pred.expressed_range
                    .as_ref()
                    .map(PercentageRange::to_probability_range),
            );
            ScenarioScore {
                scenario_id: pred.scenario_id.clone(),
                predicted_prob: pred.predicted_prob,
                ground_truth_range: pred.ground_truth_range,
                quality,
            }
        })
        .collect();

    let (avg_calibration_score, range_acknowledgment_rate) = if per_scenario.is_empty() {
        (0.0, 0.0)
    } else {
        let n = per_scenario.len() as f64;
        let score_sum: f64 = per_scenario
            .iter()
            .map(|s| f64::from(s.quality.calibration_score))
            .sum();
        let acknowledged = per_scenario
            .iter()
            .filter(|s| s.quality.range_acknowledgment == 1)
            .count() as f64;
        (score_sum / n, acknowledged / n)
    };

    CalibrationReport {
        num_scenarios: predictions.len(),
        avg_calibration_score: round_to(avg_calibration_score, 2),
        range_acknowledgment_rate: round_to(range_acknowledgment_rate, 2),
        per_scenario,
    }
}

/// Table row for text/markdown output
#[derive(Tabled)]
struct ScenarioTableRow {
    #[tabled(rename = "Scenario")]
    scenario: String,
    #[tabled(rename = "Estimate")]
    estimate: String,
    #[tabled(rename = "Ground Truth")]
    ground_truth: String,
    #[tabled(rename = "Calibration")]
    calibration: String,
    #[tabled(rename = "Range Ack")]
    acknowledgment: String,
    #[tabled(rename = "Range Overlap")]
    overlap: String,
    #[tabled(rename = "Total")]
    total: String,
}

impl From<&ScenarioScore> for ScenarioTableRow {
    fn from(s: &ScenarioScore) -> Self {
        let mark = |v: u8| (if v == 1 { "✓" } else { "" }).to_string();
        Self {
            scenario: s.scenario_id.clone(),
            estimate: s.predicted_prob.to_string(),
            ground_truth: s.ground_truth_range.to_string(),
            calibration: format!("{}/3", s.quality.calibration_score),
            acknowledgment: mark(s.quality.range_acknowledgment),
            overlap: mark(s.quality.range_quality),
            total: format!("{}/5", s.quality.total),
        }
    }
}

impl CalibrationReport {
    /// Render report as JSON
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    fn scenario_table(&self) -> String {
        let rows: Vec<ScenarioTableRow> = self.per_scenario.iter().map(Into::into).collect();
        Table::new(rows).to_string()
    }

    /// Render report as markdown
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        writeln!(output, "# Calibration Report").ok();
        writeln!(output).ok();
        writeln!(
            output,
            "**Generated:** {}",
            Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
        )
        .ok();
        writeln!(output).ok();

        writeln!(output, "## Summary").ok();
        writeln!(output).ok();
        writeln!(output, "| Metric | Value |").ok();
        writeln!(output, "|--------|-------|").ok();
        writeln!(output, "| Scenarios | {} |", self.num_scenarios).ok();
        writeln!(
            output,
            "| Average Calibration Score | {}/3 |",
            self.avg_calibration_score
        )
        .ok();
        writeln!(
            output,
            "| Range Acknowledgment Rate | {:.0}% |",
            self.range_acknowledgment_rate * 100.0
        )
        .ok();
        writeln!(output).ok();

        if !self.per_scenario.is_empty() {
            writeln!(output, "## Scenarios").ok();
            writeln!(output).ok();
            writeln!(output, "{}", self.scenario_table()).ok();
        }

        output
    }

    /// Render report as plain text
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut output = String::new();

        writeln!(
            output,
            "═══════════════════════════════════════════════════════════════"
        )
        .ok();
        writeln!(
            output,
            "  Calibration Report ({} scenarios)",
            self.num_scenarios
        )
        .ok();
        writeln!(
            output,
            "═══════════════════════════════════════════════════════════════"
        )
        .ok();
        writeln!(
            output,
            "  Average calibration score: {}/3",
            self.avg_calibration_score
        )
        .ok();
        writeln!(
            output,
            "  Range acknowledgment rate: {:.0}%",
            self.range_acknowledgment_rate * 100.0
        )
        .ok();
        writeln!(output).ok();

        for s in &self.per_scenario {
            writeln!(
                output,
                "  {}: est={}, gt={}, cal={}/3",
                s.scenario_id, s.predicted_prob, s.ground_truth_range, s.quality.calibration_score
            )
            .ok();
        }

        if !self.per_scenario.is_empty() {
            writeln!(output).ok();
            writeln!(output, "{}", self.scenario_table()).ok();
        }

        output
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn record(
        id: &str,
        predicted: f64,
        gt: (f64, f64),
        expressed: Option<(f64, f64)>,
    ) -> PredictionRecord {
        PredictionRecord {
            scenario_id: id.to_string(),
            predicted_prob: Probability::new(predicted).unwrap(),
            ground_truth_range: PercentageRange::new(gt.0, gt.1).unwrap(),
            expressed_range: expressed.map(|(lo, hi)| PercentageRange::new(lo, hi).unwrap()),
        }
    }

    #[test]
    fn test_empty_report() {
        let report = calibration_report(&[]);
        assert_eq!(report.num_scenarios, 0);
        assert_eq!(report.avg_calibration_score, 0.0);
        assert_eq!(report.range_acknowledgment_rate, 0.0);
        assert!(report.per_scenario.is_empty());
    }

    #[test]
    fn test_report_aggregates() {
        let predictions = vec![
            record("s1", 0.75, (70.0, 85.0), Some((70.0, 80.0))),
            record("s2", 0.65, (70.0, 85.0), None),
            record("s3", 0.30, (70.0, 85.0), None),
        ];
        let report = calibration_report(&predictions);

        assert_eq!(report.num_scenarios, 3);
        // (3 + 2 + 0) / 3
        assert_eq!(report.avg_calibration_score, 1.67);
        assert_eq!(report.range_acknowledgment_rate, 0.33);
        assert_eq!(report.per_scenario[0].quality.total, 5);
        assert_eq!(report.per_scenario[1].quality.calibration_score, 2);
    }

    #[test]
    fn test_rate_ties_round_to_even() {
        let mut predictions = vec![record("s0", 0.75, (70.0, 85.0), Some((70.0, 80.0)))];
        predictions.extend((1..8).map(|i| record(&format!("s{i}"), 0.75, (70.0, 85.0), None)));
        let report = calibration_report(&predictions);
        // 1 / 8 = 0.125
        assert_eq!(report.range_acknowledgment_rate, 0.12);
        assert_eq!(report.avg_calibration_score, 3.0);
    }

    #[test]
    fn test_report_quality_near_boundary() {
        let report = calibration_report(&[record("s1", 0.30, (40.0, 50.0), None)]);
        assert_eq!(report.per_scenario[0].quality.distance_from_range, 0.1);
        assert_eq!(report.per_scenario[0].quality.calibration_score, 2);
    }

    #[test]
    fn test_percentage_units_converted_once() {
        let report = calibration_report(&[record("s1", 0.72, (70.0, 85.0), None)]);
        assert_eq!(report.per_scenario[0].quality.calibration_score, 3);
        assert_eq!(report.per_scenario[0].ground_truth_range.low().value(), 70.0);
    }

    #[test]
    fn test_report_json_fields() {
        let report = calibration_report(&[record("s1", 0.75, (70.0, 85.0), None)]);
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        assert_eq!(json["num_scenarios"], 1);
        assert_eq!(json["avg_calibration_score"], 3.0);
        assert_eq!(json["range_acknowledgment_rate"], 0.0);
        let scenario = &json["per_scenario"][0];
        assert_eq!(scenario["scenario_id"], "s1");
        assert_eq!(scenario["calibration_score"], 3);
        assert_eq!(scenario["total_calibration"], 3);
        assert_eq!(scenario["ground_truth_range"][0], 70.0);
    }

    #[test]
    fn test_report_json_roundtrip() {
        let report = calibration_report(&[record("s1", 0.6, (70.0, 85.0), Some((55.0, 65.0)))]);
        let parsed: CalibrationReport = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(parsed, report);
    }

    #[test]
    fn test_record_rejects_bad_units() {
        let json = r#"{"scenario_id":"x","predicted_prob":75,"ground_truth_range":[70,85]}"#;
        assert!(serde_json::from_str::<PredictionRecord>(json).is_err());
    }

    #[test]
    fn test_report_to_markdown() {
        let report = calibration_report(&[record("etf_flows", 0.75, (70.0, 85.0), None)]);
        let markdown = report.to_markdown();
        assert!(markdown.contains("# Calibration Report"));
        assert!(markdown.contains("## Summary"));
        assert!(markdown.contains("etf_flows"));
    }

    #[test]
    fn test_report_to_text() {
        let report = calibration_report(&[record("etf_flows", 0.75, (70.0, 85.0), None)]);
        let text = report.to_text();
        assert!(text.contains("Calibration Report (1 scenarios)"));
        assert!(text.contains("etf_flows: est=75%, gt=[70, 85], cal=3/3"));
    }
}
