//! knn-cv command-line interface
//!
//! Loads a CSV dataset and reports leave-one-out kNN accuracy for one
//! feature mask, or ranks single features by their accuracy.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::KnnCvConfig;
use crate::error::KnnCvError;
use crate::evaluator::{evaluate_masks_parallel, KnnCv};
use crate::loader::{DatasetLoader, LoadedDataset};
use crate::mask::FeatureMask;

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "knn-cv")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Leave-one-out kNN accuracy for feature masks")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Leave-one-out accuracy for one feature mask
    Evaluate {
        /// Input CSV file with a header row
        #[arg(short, long)]
        data: PathBuf,

        /// Target column name
        #[arg(short, long)]
        target: String,

        /// Number of neighbors (overrides the config file)
        #[arg(short)]
        k: Option<usize>,

        /// Feature mask as a bit string, e.g. 1011 (default: all features)
        #[arg(short, long)]
        mask: Option<String>,

        /// Comma-separated nominal column names
        #[arg(long, value_delimiter = ',')]
        nominal: Vec<String>,

        /// Random seed for tie breaking (overrides the config file)
        #[arg(long)]
        seed: Option<u64>,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Rank features by single-feature leave-one-out accuracy
    Rank {
        /// Input CSV file with a header row
        #[arg(short, long)]
        data: PathBuf,

        /// Target column name
        #[arg(short, long)]
        target: String,

        /// Number of neighbors (overrides the config file)
        #[arg(short)]
        k: Option<usize>,

        /// Comma-separated nominal column names
        #[arg(long, value_delimiter = ',')]
        nominal: Vec<String>,

        /// Base random seed; feature i uses seed + i
        #[arg(long, default_value = "42")]
        seed: u64,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

// ─── Shared setup ──────────────────────────────────────────────────────────────

/// Resolve the configuration from an optional file plus command-line overrides
pub fn build_config(
    config_path: Option<&Path>,
    k: Option<usize>,
    seed: Option<u64>,
) -> anyhow::Result<KnnCvConfig> {
    let mut config = match config_path {
        Some(path) => KnnCvConfig::from_json_file(path)?,
        None => KnnCvConfig::default(),
    };
    if let Some(k) = k {
        config.n_neighbors = k;
    }
    if let Some(seed) = seed {
        config.random_state = Some(seed);
    }
    config.validate()?;
    Ok(config)
}

fn load(data_path: &Path, target: &str, nominal: &[String]) -> anyhow::Result<LoadedDataset> {
    step_run("Loading data");
    let start = Instant::now();
    let loaded = DatasetLoader::new(target)
        .with_nominal_columns(nominal.to_vec())
        .load_csv(data_path)?;
    step_done(&format!(
        "{} rows × {} features, {} classes in {:.2?}",
        loaded.dataset.n_rows(),
        loaded.dataset.n_cols(),
        loaded.dataset.n_classes(),
        start.elapsed()
    ));
    Ok(loaded)
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_evaluate(
    data_path: &Path,
    target: &str,
    k: Option<usize>,
    mask: Option<&str>,
    nominal: &[String],
    seed: Option<u64>,
    config_path: Option<&Path>,
) -> anyhow::Result<()> {
    section("Leave-one-out evaluation");

    let config = build_config(config_path, k, seed)?;
    let loaded = load(data_path, target, nominal)?;

    let mask = match mask {
        Some(bits) => bits.parse::<FeatureMask>()?,
        None => FeatureMask::all(loaded.dataset.n_cols()),
    };
    let selected: Vec<&str> = mask
        .selected_indices()
        .into_iter()
        .filter_map(|i| loaded.feature_names.get(i).map(String::as_str))
        .collect();

    println!("  {}", kv("k        ", &config.n_neighbors.to_string()));
    println!("  {}", kv("mask     ", &mask.to_string()));
    println!("  {}", kv("features ", &selected.join(", ")));

    let mut knn = KnnCv::new(loaded.dataset, config)?;
    let start = Instant::now();
    match knn.fitness_for(&mask) {
        Ok(accuracy) => {
            println!();
            println!(
                "  {} {:.4} {}",
                ok("accuracy"),
                accuracy,
                dim(&format!("({:.2?})", start.elapsed()))
            );
        }
        Err(e @ KnnCvError::TooManyTies { .. }) => {
            println!();
            println!("  {} {}", "failed".red(), e);
        }
        Err(e) => return Err(e.into()),
    }

    println!();
    Ok(())
}

pub fn cmd_rank(
    data_path: &Path,
    target: &str,
    k: Option<usize>,
    nominal: &[String],
    seed: u64,
    config_path: Option<&Path>,
) -> anyhow::Result<()> {
    section("Single-feature ranking");

    let config = build_config(config_path, k, None)?;
    let loaded = load(data_path, target, nominal)?;
    let n_cols = loaded.dataset.n_cols();

    let masks = (0..n_cols)
        .map(|i| FeatureMask::from_indices(n_cols, &[i]))
        .collect::<crate::error::Result<Vec<_>>>()?;

    step_run("Evaluating masks");
    let start = Instant::now();
    let results = evaluate_masks_parallel(&loaded.dataset, &config, &masks, seed);
    step_done(&format!("{} masks in {:.2?}", masks.len(), start.elapsed()));

    let mut ranked: Vec<(&str, Option<f64>)> = Vec::with_capacity(n_cols);
    for (name, result) in loaded.feature_names.iter().zip(results) {
        match result {
            Ok(acc) => ranked.push((name.as_str(), Some(acc))),
            Err(KnnCvError::TooManyTies { .. }) => ranked.push((name.as_str(), None)),
            Err(e) => return Err(e.into()),
        }
    }
    ranked.sort_by(|a, b| b.1.unwrap_or(-1.0).total_cmp(&a.1.unwrap_or(-1.0)));

    println!();
    println!("  {:<32} {:>10}", muted("Feature"), muted("Accuracy"));
    println!("  {}", dim(&"─".repeat(43)));
    for (name, acc) in &ranked {
        match acc {
            Some(acc) => println!("  {:<32} {:>10.4}", name, acc),
            None => println!("  {:<32} {:>10}", name, "ties".red()),
        }
    }
    println!();
    Ok(())
}
