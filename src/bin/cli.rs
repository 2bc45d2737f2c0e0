//! initiatives CLI
//!
//! Local execution entry point. Intended to be invoked periodically by an
//! external scheduler; each invocation is one batch.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use initiatives_crawler::{
    error::Result,
    models::Config,
    pipeline,
    storage::{ArtifactStore, LocalStorage},
};

/// Swiss popular-initiative dataset pipeline
#[derive(Parser, Debug)]
#[command(
    name = "initiatives",
    version,
    about = "Fetches Swiss popular-initiative data and publishes a validated dataset"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Override the output directory from the config
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the full pipeline: fetch, parse, extract, validate, publish
    Run,

    /// Validate an existing artifact without touching the network
    Validate,

    /// Show metadata of the currently published artifact
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config);
    if let Some(output_dir) = cli.output_dir {
        config.paths.output = output_dir;
    }
    config.validate()?;

    let storage = LocalStorage::from_paths(&config.paths);

    match cli.command {
        Command::Run => {
            let report = pipeline::run_pipeline(&config, &storage).await?;
            log::info!("Pipeline complete: {}", report.summary());
        }

        Command::Validate => {
            let report = pipeline::run_validate(&config, &storage).await?;
            log::info!(
                "Artifact is publishable ({} warnings)",
                report.warnings.len()
            );
        }

        Command::Info => {
            match storage.load_artifact().await? {
                Some(artifact) => {
                    log::info!("Artifact: {}", storage.artifact_path().display());
                    log::info!("Generated at: {}", artifact.metadata.generated_at);
                    log::info!("Data version: {}", artifact.metadata.data_version);
                    log::info!("Records: {}", artifact.initiatives.len());
                    let extracted: usize = artifact
                        .initiatives
                        .iter()
                        .map(|r| r.brochure_texts.len())
                        .sum();
                    log::info!("Brochure texts: {}", extracted);
                }
                None => {
                    log::info!(
                        "No artifact found at {}",
                        storage.artifact_path().display()
                    );
                }
            }
        }
    }

    Ok(())
}
