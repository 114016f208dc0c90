//! Playsift - streaming-history ingestion and genre classification CLI
//!
#![doc = "Playsift - streaming-history ingestion and genre classification CLI"]
#![doc = "Main entry point for the Playsift application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use playsift::cli::{Cli, Commands};
use playsift::commands;
use playsift::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Classify => {
            tracing::info!(
                "Starting classification with {} ({})",
                config.provider.provider_type,
                config.provider.ollama.model
            );
            commands::classify::run_classify(config).await?;
            Ok(())
        }
        Commands::Sync => {
            tracing::info!("Starting history sync");
            commands::sync::run_sync(&config)?;
            Ok(())
        }
        Commands::Enrich => {
            tracing::info!("Starting catalog enrichment");
            commands::enrich::run_enrich(&config).await?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "playsift=debug" } else { "playsift=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
