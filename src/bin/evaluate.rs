//! landmark-evaluate - Measure identification accuracy on held-out embeddings.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use landmark_id::catalog::snapshot::{parse_jsonl, LocalSnapshotStore};
use landmark_id::catalog::Catalog;
use landmark_id::config::Config;
use landmark_id::eval::{evaluate, LabelledQuery};
use landmark_id::search::classifier::Classifier;

/// Measure identification accuracy on held-out embeddings.
///
/// Unset options fall back to the same environment variables the server reads.
#[derive(Parser, Debug)]
#[command(name = "landmark-evaluate")]
struct Args {
    /// Labelled query embeddings (JSONL, same record format as snapshots)
    #[arg(short, long)]
    queries: PathBuf,

    /// Snapshot root directory
    #[arg(long)]
    root: Option<PathBuf>,

    /// Snapshot version (or "latest")
    #[arg(long)]
    version: Option<String>,

    /// Embedding model name
    #[arg(long)]
    model: Option<String>,

    /// Embedding dimension
    #[arg(long)]
    dimension: Option<usize>,

    /// Number of neighbours considered
    #[arg(long)]
    top_k: Option<usize>,

    /// Confidence threshold
    #[arg(long)]
    threshold: Option<f32>,

    /// Backup threshold
    #[arg(long)]
    backup_threshold: Option<f32>,

    /// Print the full report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    let mut config = Config::from_env();
    if let Some(root) = args.root {
        config.catalog.root = root;
    }
    if let Some(version) = args.version {
        config.catalog.version = version;
    }
    if let Some(model) = args.model {
        config.catalog.model = model;
    }
    if let Some(dimension) = args.dimension {
        config.catalog.embedding_dim = dimension;
    }
    if let Some(top_k) = args.top_k {
        config.classifier.top_k = top_k;
    }
    if let Some(threshold) = args.threshold {
        config.classifier.confidence_threshold = threshold;
    }
    if let Some(backup) = args.backup_threshold {
        config.classifier.backup_threshold = backup;
    }
    config.validate()?;

    let classifier = Classifier::new(config.classifier)?;
    let store = LocalSnapshotStore::new(&config.catalog.root, &config.catalog.model);
    let catalog = Catalog::load(&store, &config.catalog.version, config.catalog.embedding_dim)
        .context("Failed to load catalog")?;

    let data = std::fs::read_to_string(&args.queries)
        .with_context(|| format!("Failed to read {}", args.queries.display()))?;
    let queries: Vec<LabelledQuery> = parse_jsonl(&data)
        .context("Failed to parse query file")?
        .into_iter()
        .map(LabelledQuery::from)
        .collect();

    let report = evaluate(&classifier, &catalog, &queries);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", "=".repeat(60));
    println!("EVALUATION RESULTS");
    println!("{}\n", "=".repeat(60));
    println!("Catalog version: {} ({} embeddings)", catalog.version(), catalog.size());
    println!("Total test queries: {}", report.total);
    println!("Top-k: {}", config.classifier.top_k);
    println!(
        "Thresholds: confidence {} / backup {}",
        config.classifier.confidence_threshold, config.classifier.backup_threshold
    );
    println!(
        "\nAccuracy (confident predictions only): {:.1}%",
        report.confident_accuracy() * 100.0
    );
    println!(
        "Accuracy (all predictions): {:.1}%",
        report.overall_accuracy() * 100.0
    );
    if report.errors > 0 {
        println!("Rejected queries: {}", report.errors);
    }

    println!("\nPrediction Status:");
    for (status, count) in &report.status_counts {
        println!(
            "  {status}: {count} ({:.1}%)",
            *count as f64 / report.total.max(1) as f64 * 100.0
        );
    }

    println!("\nPer-Building Accuracy (buildings with errors):");
    for (building, stats) in &report.per_building {
        if stats.correct < stats.total {
            println!(
                "  Building {building}: {:.1}% ({}/{})",
                stats.correct as f64 / stats.total as f64 * 100.0,
                stats.correct,
                stats.total
            );
        }
    }

    Ok(())
}
