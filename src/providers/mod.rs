//! Provider module for Playsift
//!
//! This module contains the generative-model backend abstraction and the
//! Ollama implementation.

pub mod base;
pub mod ollama;

pub use base::{CompletionResponse, Message, Provider, Role, TokenUsage};
pub use ollama::OllamaProvider;

use crate::config::ProviderConfig;
use crate::error::{PlaysiftError, Result};

/// Provider types accepted in configuration
pub const SUPPORTED_PROVIDERS: &[&str] = &["ollama"];

/// Create a provider instance based on configuration
///
/// # Errors
///
/// Returns error if the provider type is unknown or initialization fails
///
/// # Examples
///
/// ```
/// use playsift::config::ProviderConfig;
/// use playsift::providers::create_provider;
///
/// let provider = create_provider(&ProviderConfig::default()).unwrap();
/// assert!(provider.get_current_model().is_ok());
/// ```
pub fn create_provider(config: &ProviderConfig) -> Result<Box<dyn Provider>> {
    match config.provider_type.as_str() {
        "ollama" => Ok(Box::new(OllamaProvider::new(config.ollama.clone())?)),
        other => Err(PlaysiftError::Provider(format!("Unknown provider type: {}", other)).into()),
    }
}
