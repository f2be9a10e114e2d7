mod config;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use meeting_extraction::{
    improvement_report, BatchEvaluator, Collaborators, EvaluationAggregator, EvaluationJob,
    EvaluationRubric, JobOutcome, Segment, TranscriptPipeline,
};

use crate::config::Settings;

#[derive(Parser)]
#[command(name = "meeting", about = "Extract and evaluate meeting transcript artifacts")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract decisions, action items and risks from a segments file
    Extract {
        /// JSON array of {"speaker", "text", "timestamp"} objects
        #[arg(long)]
        input: PathBuf,

        /// Drop items that fail validation
        #[arg(long)]
        drop_invalid: bool,
    },
    /// Aggregate llm/human/metrics evaluations into a verdict
    Evaluate {
        /// One evaluation job object, or an array of them
        #[arg(long)]
        input: PathBuf,

        /// Rubric overriding the built-in one
        #[arg(long)]
        rubric: Option<PathBuf>,
    },
}

/// One line of a segments file. Indices come from array order.
#[derive(Debug, Deserialize)]
struct SegmentInput {
    text: String,
    #[serde(default)]
    speaker: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
}

impl SegmentInput {
    fn into_segment(self, index: usize) -> Segment {
        Segment {
            index,
            text: self.text,
            speaker: self.speaker,
            timestamp: self.timestamp,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JobsInput {
    Many(Vec<EvaluationJob>),
    One(EvaluationJob),
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (stderr, so stdout stays valid JSON)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,meeting_extraction=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env()?;

    match cli.command {
        Command::Extract {
            input,
            drop_invalid,
        } => extract(&settings, &input, drop_invalid).await,
        Command::Evaluate { input, rubric } => evaluate(&settings, &input, rubric.as_deref()).await,
    }
}

async fn extract(settings: &Settings, input: &Path, drop_invalid: bool) -> Result<()> {
    let rows: Vec<SegmentInput> = read_json(input)?;
    let segments: Vec<Segment> = rows
        .into_iter()
        .enumerate()
        .map(|(i, row)| row.into_segment(i))
        .collect();

    tracing::info!(segments = segments.len(), input = %input.display(), "Running extraction");

    let pipeline = TranscriptPipeline::new(
        settings.extraction_config(drop_invalid),
        Collaborators::none(),
    );
    let report = pipeline.run(&segments).await;

    eprintln!(
        "{} {} decisions, {} action items, {} risks ({} filtered)",
        "✓".bright_green(),
        report.decisions.len(),
        report.action_items.len(),
        report.risks.len(),
        report.metadata.filtered
    );
    print_json(&report)
}

async fn evaluate(settings: &Settings, input: &Path, rubric: Option<&Path>) -> Result<()> {
    let rubric: EvaluationRubric = match rubric {
        Some(path) => read_json(path)?,
        None => EvaluationRubric::default(),
    };
    let thresholds = settings.thresholds(rubric.thresholds.clone());
    let aggregator = EvaluationAggregator::default().with_rubric(rubric);

    match read_json::<JobsInput>(input)? {
        JobsInput::One(job) => {
            let evaluation = aggregator.aggregate_job(&job);
            if evaluation.is_empty() {
                tracing::warn!(job = %job.name, "Job has no evaluation sources");
            }
            let report = improvement_report(&evaluation, &thresholds);

            eprintln!(
                "{} {} {}",
                "→".bright_blue(),
                format!("{:.2}/10", evaluation.aggregate_score).bold(),
                thresholds.tier(evaluation.aggregate_score)
            );
            print_json(&json!({ "evaluation": evaluation, "report": report }))
        }
        JobsInput::Many(jobs) => {
            if jobs.is_empty() {
                bail!("{} contains no evaluation jobs", input.display());
            }

            let names: Vec<String> = jobs.iter().map(|j| j.name.clone()).collect();
            let batch = BatchEvaluator::new(aggregator).evaluate_batch(jobs).await;

            let results: Vec<Value> = names
                .into_iter()
                .zip(&batch.outcomes)
                .map(|(name, outcome)| match outcome {
                    JobOutcome::Completed { job_id, evaluation } => {
                        eprintln!("{} {} {:.2}/10", "✓".bright_green(), name, evaluation.aggregate_score);
                        json!({
                            "name": name,
                            "job_id": job_id,
                            "evaluation": evaluation,
                            "report": improvement_report(evaluation, &thresholds),
                        })
                    }
                    JobOutcome::Failed { job_id, reason } => {
                        eprintln!("{} {} {}", "✗".bright_red(), name, reason);
                        json!({ "name": name, "job_id": job_id, "error": reason })
                    }
                })
                .collect();

            print_json(&results)
        }
    }
}
