//! Command-line interface definition for Playsift
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for genre classification, history sync and enrichment.

use clap::{Parser, Subcommand};

/// Playsift - streaming-history ingestion and genre classification
#[derive(Parser, Debug, Clone)]
#[command(name = "playsift")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the configured model
    #[arg(long, env = "PLAYSIFT_MODEL")]
    pub model: Option<String>,

    /// Override the per-item retry budget
    #[arg(long)]
    pub retry_budget: Option<usize>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Playsift
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Classify every sub-genre in the catalog into a fundamental genre
    Classify,

    /// Load the streaming-history export into the local database
    Sync,

    /// Fetch catalog metadata for synced songs and their artists
    Enrich,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            model: None,
            retry_budget: None,
            command: Commands::Classify,
        }
    }
}
