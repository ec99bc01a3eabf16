//! Integration tests for calibration-eval CLI and library.
//!
//! These tests verify end-to-end functionality including:
//! - Scenario directories and graded results load and join correctly
//! - Extraction, quality scoring and reporting compose
//! - CLI commands work against real files

#![allow(clippy::needless_raw_string_hashes)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::float_cmp)]

use calibration_eval::{
    calibration_report, expected_calibration_error, extract_predictions, load_results,
    parse_probability_from_response, score_probability_quality, Extractor, GroundTruthIndex,
    OutcomeCollector, Probability, ProbabilityRange, SkipReason, DEFAULT_BINS,
};
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

const SCENARIOS: &[(&str, &str)] = &[
    (
        "07_01_fda_approval.yaml",
        r#"
id: 07_01_fda_approval
module: 07_probabilistic_reasoning
calibration_axes:
  probability_estimate:
    ground_truth_range: [70, 85]
"#,
    ),
    (
        "07_02_rate_cut.yaml",
        r#"
id: 07_02_rate_cut
module: 07_probabilistic_reasoning
calibration_axes:
  probability_estimate:
    ground_truth_range: [20, 35]
"#,
    ),
    (
        "07_03_merger_close.yaml",
        r#"
id: 07_03_merger_close
module: 07_probabilistic_reasoning
calibration_axes:
  probability_estimate:
    ground_truth_range: [55, 65]
"#,
    ),
];

const RESULTS: &str = r#"[
  {
    "scenario_id": "07_01_fda_approval",
    "model": "gpt-4-turbo",
    "base_eval": {"response": "Given the phase III data I'd put approval at 70-80%."}
  },
  {
    "scenario_id": "07_02_rate_cut",
    "base_eval": {"response": "The market implies a probability of 0.40 for a cut."}
  },
  {
    "scenario_id": "07_03_merger_close",
    "base_eval": {"response": "Hard to say; regulatory review is unpredictable."}
  },
  {
    "scenario_id": "08_01_unknown",
    "base_eval": {"response": "Around 60%."}
  }
]"#;

fn write_fixture(dir: &Path) {
    let scenarios = dir.join("scenarios");
    std::fs::create_dir(&scenarios).unwrap();
    for (name, body) in SCENARIOS {
        std::fs::write(scenarios.join(name), body).unwrap();
    }
    std::fs::write(dir.join("results.json"), RESULTS).unwrap();
}

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_calibration-eval"))
}

// ============================================================================
// Library Pipeline Tests
// ============================================================================

#[test]
fn test_pipeline_from_files() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path());

    let index = GroundTruthIndex::load_dir(dir.path().join("scenarios")).unwrap();
    assert_eq!(index.len(), 3);

    let results = load_results(dir.path().join("results.json")).unwrap();
    let extraction = extract_predictions(&results, &index, &Extractor::default());

    assert_eq!(extraction.predictions.len(), 2);
    assert_eq!(extraction.skipped.len(), 2);
    assert_eq!(extraction.skipped[0].reason, SkipReason::NoProbability);
    assert_eq!(extraction.skipped[1].reason, SkipReason::NoGroundTruth);

    let report = calibration_report(&extraction.predictions);
    assert_eq!(report.num_scenarios, 2);

    // fda: 0.75 inside [0.70, 0.85] with overlapping range -> 3 + 1 + 1
    let fda = &report.per_scenario[0];
    assert_eq!(fda.scenario_id, "07_01_fda_approval");
    assert_eq!(fda.quality.total, 5);

    // rate cut: 0.40 is 0.05 above [0.20, 0.35] -> 2
    let rate = &report.per_scenario[1];
    assert_eq!(rate.quality.calibration_score, 2);
    assert_eq!(rate.quality.range_acknowledgment, 0);

    assert_eq!(report.avg_calibration_score, 2.5);
    assert_eq!(report.range_acknowledgment_rate, 0.5);
}

#[test]
fn test_extracted_range_feeds_quality_score() {
    let estimate = parse_probability_from_response("I'd say 65% to 75% is defensible").unwrap();
    let gt = ProbabilityRange::from_fractions(0.70, 0.85).unwrap();
    let score = score_probability_quality(estimate.point_estimate, gt, estimate.range);
    assert_eq!(score.calibration_score, 3);
    assert_eq!(score.range_quality, 1);
    assert_eq!(score.total, 5);
}

#[test]
fn test_outcome_scoring_matches_ece() {
    let probs = [0.9, 0.9, 0.9, 0.9, 0.1, 0.1];
    let outcomes = [1, 1, 0, 0, 0, 0];

    let mut collector = OutcomeCollector::new();
    for (&p, &y) in probs.iter().zip(&outcomes) {
        collector.record(p, y).unwrap();
    }
    let summary = collector.compute(DEFAULT_BINS, 1e-15).unwrap();
    let (ece, bins) = expected_calibration_error(&probs, &outcomes, DEFAULT_BINS).unwrap();

    assert_eq!(summary.ece, ece);
    assert_eq!(summary.bins, bins);
    assert_eq!(summary.count, 6);
}

#[test]
fn test_malformed_ground_truth_fails_fast() {
    assert!(ProbabilityRange::from_fractions(0.85, 0.70).is_err());
    assert!(Probability::new(85.0).is_err());
}

// ============================================================================
// CLI Integration Tests
// ============================================================================

#[test]
fn test_cli_help_command() {
    let output = cli().arg("--help").output().expect("Failed to execute CLI");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("report"), "Help should list report command");
    assert!(stdout.contains("extract"), "Help should list extract command");
    assert!(stdout.contains("outcomes"), "Help should list outcomes command");
}

#[test]
fn test_cli_report_json_output() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path());
    let out_path = dir.path().join("report.json");

    let output = cli()
        .args([
            "report",
            dir.path().join("results.json").to_str().unwrap(),
            "--scenarios-dir",
            dir.path().join("scenarios").to_str().unwrap(),
            "--output",
            out_path.to_str().unwrap(),
        ])
        .output()
        .expect("Failed to execute CLI");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "report failed: {}", stdout);
    assert!(stdout.contains("07_01_fda_approval"), "stdout: {}", stdout);

    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out_path).unwrap()).unwrap();
    assert_eq!(saved["num_scenarios"], 2);
    assert_eq!(saved["per_scenario"][0]["total_calibration"], 5);
}

#[test]
fn test_cli_report_json_stdout_is_pure_json() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path());
    let out_path = dir.path().join("report.json");

    let output = cli()
        .args([
            "report",
            dir.path().join("results.json").to_str().unwrap(),
            "--scenarios-dir",
            dir.path().join("scenarios").to_str().unwrap(),
            "--format",
            "json",
            "--output",
            out_path.to_str().unwrap(),
        ])
        .output()
        .expect("Failed to execute CLI");

    assert!(output.status.success());
    let stdout: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stdout["num_scenarios"], 2);
    assert!(out_path.exists());
}

#[test]
fn test_cli_report_missing_file() {
    let output = cli()
        .args(["report", "/nonexistent/results.json"])
        .output()
        .expect("Failed to execute CLI");
    assert!(!output.status.success());
}

#[test]
fn test_cli_report_without_ground_truth_fails() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path());
    let output = cli()
        .args(["report", dir.path().join("results.json").to_str().unwrap()])
        .output()
        .expect("Failed to execute CLI");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No predictions"), "stderr: {}", stderr);
}

#[test]
fn test_cli_extract_text() {
    let output = cli()
        .args(["extract", "--text", "The probability is 70-80%"])
        .output()
        .expect("Failed to execute CLI");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("\"method\": \"range\""), "stdout: {}", stdout);
}

#[test]
fn test_cli_extract_nothing() {
    let output = cli()
        .args(["extract", "--text", "The market dropped 100% of its gains"])
        .output()
        .expect("Failed to execute CLI");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No probability found"));
}

#[test]
fn test_cli_score_rejects_invalid_probability() {
    let output = cli()
        .args(["score", "--prob", "1.5", "--outcome", "1"])
        .output()
        .expect("Failed to execute CLI");
    assert!(!output.status.success());
}

#[test]
fn test_cli_outcomes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("outcomes.json");
    std::fs::write(
        &path,
        r#"[{"predicted_prob": 0.8, "outcome": 1}, {"predicted_prob": 0.2, "outcome": 0}]"#,
    )
    .unwrap();

    let output = cli()
        .args(["outcomes", path.to_str().unwrap(), "--bins", "5"])
        .output()
        .expect("Failed to execute CLI");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stdout: {}", stdout);
    assert!(stdout.contains("Mean Brier:      0.0400"), "stdout: {}", stdout);
}
