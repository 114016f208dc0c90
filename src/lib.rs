//! Playsift - streaming-history ingestion and LLM-backed genre classification
//!
//! This library provides the core functionality for Playsift: structured
//! extraction from generative-model responses, sub-genre classification,
//! streaming-history import into SQLite, and catalog enrichment.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `extraction`: Structured prompts and the extract, validate, retry connector
//! - `classify`: Sub-genre classification loop and its output mapping
//! - `providers`: Model provider abstraction and the Ollama implementation
//! - `prompts`: Task instructions sent to the model
//! - `catalog`: Sub-genre list loading and the metadata catalog client
//! - `history`: Streaming-history export loading, sync and enrichment
//! - `storage`: SQLite persistence for history
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use playsift::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let outcome = playsift::commands::classify::run_classify(config).await?;
//!     println!("{} classified", outcome.classified_count());
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod classify;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod extraction;
pub mod history;
pub mod prompts;
pub mod providers;
pub mod storage;

// Re-export commonly used types
pub use classify::{classify_genres, ClassificationOutcome, GenreOutcome};
pub use config::Config;
pub use error::{PlaysiftError, Result};
pub use extraction::{Extraction, ModelConnector, StructuredOutput, StructuredPrompt};

#[cfg(test)]
pub mod test_utils;
