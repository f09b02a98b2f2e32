//! knn-cv - Main Entry Point

use clap::Parser;
use knn_cv::cli::{cmd_evaluate, cmd_rank, Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "knn_cv=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Evaluate { data, target, k, mask, nominal, seed, config } => {
            cmd_evaluate(&data, &target, k, mask.as_deref(), &nominal, seed, config.as_deref())?;
        }
        Commands::Rank { data, target, k, nominal, seed, config } => {
            cmd_rank(&data, &target, k, &nominal, seed, config.as_deref())?;
        }
    }

    Ok(())
}
