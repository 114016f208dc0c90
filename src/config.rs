//! Configuration management for Playsift
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{PlaysiftError, Result};
use crate::providers::SUPPORTED_PROVIDERS;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Main configuration structure for Playsift
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Generative-model backend configuration
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Genre classification settings
    #[serde(default)]
    pub classify: ClassifyConfig,
    /// Streaming-history ingestion settings
    #[serde(default)]
    pub history: HistoryConfig,
    /// Metadata catalog used to enrich synced history
    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Provider configuration
///
/// Specifies which backend to use and its settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Type of provider to use
    #[serde(rename = "type", default = "default_provider_type")]
    pub provider_type: String,

    /// Ollama configuration
    #[serde(default)]
    pub ollama: OllamaConfig,
}

fn default_provider_type() -> String {
    "ollama".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: default_provider_type(),
            ollama: OllamaConfig::default(),
        }
    }
}

/// Ollama provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Ollama server host
    #[serde(default = "default_ollama_host")]
    pub host: String,

    /// Model to use for Ollama
    #[serde(default = "default_ollama_model")]
    pub model: String,

    /// HTTP request timeout in seconds, owned by the transport client
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_ollama_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2:latest".to_string()
}

fn default_request_timeout() -> u64 {
    300
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: default_ollama_host(),
            model: default_ollama_model(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

/// Genre classification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyConfig {
    /// Closed set of permitted fundamental genres
    #[serde(default = "default_fundamental_genres")]
    pub fundamental_genres: Vec<String>,

    /// Correction round-trips allowed per sub-genre
    #[serde(default = "default_retry_budget")]
    pub retry_budget: usize,

    /// File listing the sub-genres to classify
    #[serde(default = "default_genres_path")]
    pub genres_path: PathBuf,

    /// Where the sub-genre to fundamental-genre mapping is written
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
}

fn default_fundamental_genres() -> Vec<String> {
    [
        "rock",
        "pop",
        "hip hop",
        "r&b",
        "electronic",
        "jazz",
        "classical",
        "country",
        "folk",
        "metal",
        "latin",
        "reggae",
        "blues",
        "world",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_retry_budget() -> usize {
    20
}

fn default_genres_path() -> PathBuf {
    PathBuf::from("data/genres.txt")
}

fn default_output_path() -> PathBuf {
    PathBuf::from("classified_genres.json")
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            fundamental_genres: default_fundamental_genres(),
            retry_budget: default_retry_budget(),
            genres_path: default_genres_path(),
            output_path: default_output_path(),
        }
    }
}

/// Streaming-history ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Directory holding the exported `*.json` history files
    #[serde(default = "default_history_dir")]
    pub data_dir: PathBuf,

    /// SQLite database path; the platform data directory is used when unset
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

fn default_history_dir() -> PathBuf {
    PathBuf::from("data/history")
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            data_dir: default_history_dir(),
            db_path: None,
        }
    }
}

/// Metadata catalog configuration
///
/// Credentials are only required by the `enrich` command, so they are not
/// checked by [`Config::validate`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Client-credentials id
    #[serde(default)]
    pub client_id: String,

    /// Client-credentials secret
    #[serde(default, skip_serializing)]
    pub client_secret: String,

    /// Base URL of the Web API
    #[serde(default = "default_catalog_api_base")]
    pub api_base: String,

    /// Token endpoint for the client-credentials grant
    #[serde(default = "default_catalog_auth_url")]
    pub auth_url: String,

    /// Ids per lookup request
    #[serde(default = "default_catalog_batch_size")]
    pub batch_size: usize,

    /// HTTP request timeout in seconds
    #[serde(default = "default_catalog_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_catalog_api_base() -> String {
    "https://api.spotify.com".to_string()
}

fn default_catalog_auth_url() -> String {
    "https://accounts.spotify.com/api/token".to_string()
}

fn default_catalog_batch_size() -> usize {
    crate::catalog::MAX_BATCH_SIZE
}

fn default_catalog_timeout() -> u64 {
    30
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            api_base: default_catalog_api_base(),
            auth_url: default_catalog_auth_url(),
            batch_size: default_catalog_batch_size(),
            request_timeout_seconds: default_catalog_timeout(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// A missing file is not an error: defaults are used and a warning is
    /// logged.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| PlaysiftError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| PlaysiftError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(provider_type) = std::env::var("PLAYSIFT_PROVIDER") {
            self.provider.provider_type = provider_type;
        }

        if let Ok(ollama_host) = std::env::var("PLAYSIFT_OLLAMA_HOST") {
            self.provider.ollama.host = ollama_host;
        }

        if let Ok(ollama_model) = std::env::var("PLAYSIFT_OLLAMA_MODEL") {
            self.provider.ollama.model = ollama_model;
        }

        if let Ok(budget) = std::env::var("PLAYSIFT_RETRY_BUDGET") {
            if let Ok(value) = budget.parse() {
                self.classify.retry_budget = value;
            } else {
                tracing::warn!("Invalid PLAYSIFT_RETRY_BUDGET: {}", budget);
            }
        }

        if let Ok(genres_path) = std::env::var("PLAYSIFT_GENRES_PATH") {
            self.classify.genres_path = PathBuf::from(genres_path);
        }

        if let Ok(output_path) = std::env::var("PLAYSIFT_OUTPUT_PATH") {
            self.classify.output_path = PathBuf::from(output_path);
        }

        if let Ok(data_dir) = std::env::var("PLAYSIFT_HISTORY_DIR") {
            self.history.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(db_path) = std::env::var("PLAYSIFT_HISTORY_DB") {
            tracing::debug!(db_path = %db_path, "Env override: PLAYSIFT_HISTORY_DB");
            self.history.db_path = Some(PathBuf::from(db_path));
        }

        if let Ok(client_id) = std::env::var("PLAYSIFT_CATALOG_CLIENT_ID") {
            self.catalog.client_id = client_id;
        }

        if let Ok(client_secret) = std::env::var("PLAYSIFT_CATALOG_CLIENT_SECRET") {
            self.catalog.client_secret = client_secret;
        }

        if let Ok(api_base) = std::env::var("PLAYSIFT_CATALOG_API_BASE") {
            self.catalog.api_base = api_base;
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(model) = &cli.model {
            self.provider.ollama.model = model.clone();
        }
        if let Some(budget) = cli.retry_budget {
            self.classify.retry_budget = budget;
        }
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }
    }

    /// Validate the configuration
    ///
    /// A retry budget of zero is accepted: every item then fails without
    /// contacting the backend.
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.provider.provider_type.is_empty() {
            return Err(PlaysiftError::Config("Provider type cannot be empty".to_string()).into());
        }

        if !SUPPORTED_PROVIDERS.contains(&self.provider.provider_type.as_str()) {
            return Err(PlaysiftError::Config(format!(
                "Invalid provider type: {}. Must be one of: {}",
                self.provider.provider_type,
                SUPPORTED_PROVIDERS.join(", ")
            ))
            .into());
        }

        url::Url::parse(&self.provider.ollama.host).map_err(|e| {
            PlaysiftError::Config(format!(
                "Invalid ollama host '{}': {}",
                self.provider.ollama.host, e
            ))
        })?;

        if self.provider.ollama.model.trim().is_empty() {
            return Err(PlaysiftError::Config("ollama.model cannot be empty".to_string()).into());
        }

        if self.provider.ollama.request_timeout_seconds == 0 {
            return Err(PlaysiftError::Config(
                "ollama.request_timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.classify.fundamental_genres.is_empty() {
            return Err(PlaysiftError::Config(
                "classify.fundamental_genres cannot be empty".to_string(),
            )
            .into());
        }

        let mut seen = HashSet::new();
        for genre in &self.classify.fundamental_genres {
            let normalized = genre.trim().to_lowercase();
            if normalized.is_empty() {
                return Err(PlaysiftError::Config(
                    "classify.fundamental_genres contains an empty label".to_string(),
                )
                .into());
            }
            if !seen.insert(normalized) {
                return Err(PlaysiftError::Config(format!(
                    "classify.fundamental_genres contains duplicate label: {}",
                    genre
                ))
                .into());
            }
        }

        for (field, value) in [
            ("catalog.api_base", &self.catalog.api_base),
            ("catalog.auth_url", &self.catalog.auth_url),
        ] {
            url::Url::parse(value).map_err(|e| {
                PlaysiftError::Config(format!("Invalid {} '{}': {}", field, value, e))
            })?;
        }

        if !(1..=crate::catalog::MAX_BATCH_SIZE).contains(&self.catalog.batch_size) {
            return Err(PlaysiftError::Config(format!(
                "catalog.batch_size must be between 1 and {}",
                crate::catalog::MAX_BATCH_SIZE
            ))
            .into());
        }

        if self.catalog.request_timeout_seconds == 0 {
            return Err(PlaysiftError::Config(
                "catalog.request_timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }
}
