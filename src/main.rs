//! Calibration Eval CLI
//!
//! Scores model probability estimates against ground-truth ranges

use anyhow::{bail, Context, Result};
use calibration_eval::{
    brier_score, calibration_report, extract_predictions, load_outcomes, load_results,
    log_loss_score_with_eps, parse_probability_from_response, CalibrationSettings, Extractor,
    GroundTruthIndex, OutcomeCollector,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tabled::{Table, Tabled};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "calibration-eval")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a calibration report from graded results
    Report {
        /// Graded results JSON with model responses
        results_file: PathBuf,

        /// Directory of scenario YAMLs carrying ground-truth ranges
        #[arg(long)]
        scenarios_dir: Option<PathBuf>,

        /// Write the report as JSON to this path
        #[arg(long)]
        output: Option<PathBuf>,

        /// Console output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Extract a probability estimate from text
    Extract {
        /// Text to scan
        #[arg(long, conflicts_with = "file")]
        text: Option<String>,

        /// File to scan
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Score a single prediction against a binary outcome
    Score {
        /// Predicted probability in [0, 1]
        #[arg(long)]
        prob: f64,

        /// Realized outcome (0 or 1)
        #[arg(long)]
        outcome: u8,

        /// Settings YAML
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Score a file of resolved predictions (Brier, log loss, ECE)
    Outcomes {
        /// Outcomes JSON: [{"predicted_prob": 0.8, "outcome": 1}, ...]
        input: PathBuf,

        /// Number of ECE bins (overrides settings)
        #[arg(long)]
        bins: Option<usize>,

        /// Settings YAML
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Markdown,
    Json,
}

#[derive(Tabled)]
struct BinTableRow {
    #[tabled(rename = "Bin")]
    bin: String,
    #[tabled(rename = "Count")]
    count: usize,
    #[tabled(rename = "Confidence")]
    confidence: String,
    #[tabled(rename = "Accuracy")]
    accuracy: String,
    #[tabled(rename = "Gap")]
    gap: String,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn load_settings(path: Option<&PathBuf>) -> Result<CalibrationSettings> {
    match path {
        Some(path) => CalibrationSettings::load(path)
            .with_context(|| format!("loading settings from {}", path.display())),
        None => Ok(CalibrationSettings::default()),
    }
}

#[allow(clippy::too_many_lines)]
fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Report {
            results_file,
            scenarios_dir,
            output,
            format,
        } => {
            tracing::info!(
                results = %results_file.display(),
                scenarios_dir = ?scenarios_dir,
                output = ?output,
                "Generating calibration report"
            );

            if !results_file.exists() {
                bail!("File not found: {}", results_file.display());
            }
            let results = load_results(&results_file)
                .with_context(|| format!("loading results from {}", results_file.display()))?;

            let index = match &scenarios_dir {
                Some(dir) if dir.exists() => GroundTruthIndex::load_dir(dir)?,
                Some(dir) => {
                    tracing::warn!(dir = %dir.display(), "Scenarios directory not found");
                    GroundTruthIndex::new()
                }
                None => GroundTruthIndex::new(),
            };

            let extraction = extract_predictions(&results, &index, &Extractor::default());
            if extraction.predictions.is_empty() {
                bail!("No predictions with matching ground truth found.");
            }

            let report = calibration_report(&extraction.predictions);
            match format {
                OutputFormat::Text => println!("{}", report.to_text()),
                OutputFormat::Markdown => println!("{}", report.to_markdown()),
                OutputFormat::Json => println!("{}", report.to_json()?),
            }

            if let Some(path) = output {
                std::fs::write(&path, report.to_json()?)
                    .with_context(|| format!("writing report to {}", path.display()))?;
                tracing::info!(path = %path.display(), "Report saved");
            }
        }
        Commands::Extract { text, file } => {
            let text = match (text, file) {
                (Some(text), _) => text,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?,
                (None, None) => bail!("Provide --text or --file"),
            };

            match parse_probability_from_response(&text) {
                Some(estimate) => println!("{}", serde_json::to_string_pretty(&estimate)?),
                None => println!("No probability found"),
            }
        }
        Commands::Score {
            prob,
            outcome,
            config,
        } => {
            let settings = load_settings(config.as_ref())?;
            let brier = brier_score(prob, outcome)?;
            let log_loss = log_loss_score_with_eps(prob, outcome, settings.log_loss_eps)?;
            println!("Brier score: {brier:.4}");
            println!("Log loss:    {log_loss:.4}");
        }
        Commands::Outcomes {
            input,
            bins,
            config,
        } => {
            let mut settings = load_settings(config.as_ref())?;
            if let Some(bins) = bins {
                settings.n_bins = bins;
            }
            settings.validate()?;

            let records = load_outcomes(&input)
                .with_context(|| format!("loading outcomes from {}", input.display()))?;

            let mut collector = OutcomeCollector::new();
            for (i, record) in records.iter().enumerate() {
                collector
                    .record(record.predicted_prob, record.outcome)
                    .with_context(|| {
                        let id = record.scenario_id.as_deref().unwrap_or("-");
                        format!("record {i} ({id})")
                    })?;
            }

            let summary = collector.compute(settings.n_bins, settings.log_loss_eps)?;
            println!("Predictions:     {}", summary.count);
            println!("Mean Brier:      {:.4}", summary.mean_brier);
            println!("Mean log loss:   {:.4}", summary.mean_log_loss);
            println!("ECE:             {:.4}", summary.ece);

            if !summary.bins.is_empty() {
                let rows: Vec<BinTableRow> = summary
                    .bins
                    .iter()
                    .map(|b| BinTableRow {
                        bin: format!("[{:.2}, {:.2})", b.low, b.high),
                        count: b.count,
                        confidence: format!("{:.4}", b.avg_confidence),
                        accuracy: format!("{:.4}", b.avg_accuracy),
                        gap: format!("{:.4}", b.gap),
                    })
                    .collect();
                println!();
                println!("{}", Table::new(rows));
            }
        }
    }

    Ok(())
}
