//! Error types for Playsift
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Playsift operations
///
/// Covers configuration loading, provider (transport) failures, structured
/// extraction failures, catalog access, history ingestion and storage.
#[derive(Error, Debug)]
pub enum PlaysiftError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Provider-related errors (backend unreachable, bad status, bad transport body)
    #[error("Provider error: {0}")]
    Provider(String),

    /// The model response could not be parsed into the expected schema
    #[error("Parse error: {0}")]
    Parse(String),

    /// The parsed response violated a domain constraint
    #[error("Validation error: {0}")]
    Validation(String),

    /// Sub-genre catalog loading and metadata catalog API errors
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Streaming-history loading errors
    #[error("History error: {0}")]
    History(String),

    /// Database errors
    #[error("Storage error: {0}")]
    Storage(String),
}

impl PlaysiftError {
    /// Whether the structured-extraction loop may retry after this error
    ///
    /// Only parse and validation failures are recoverable; everything else
    /// (notably transport failures) is terminal for the current extraction.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Parse(_) | Self::Validation(_))
    }
}

/// Result type alias for Playsift operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
