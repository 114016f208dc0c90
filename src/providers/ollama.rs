//! Ollama provider implementation for Playsift
//!
//! This module implements the Provider trait for Ollama, connecting to a local
//! or remote Ollama server through its non-streaming `/api/chat` endpoint.

use crate::config::OllamaConfig;
use crate::error::{PlaysiftError, Result};
use crate::providers::{CompletionResponse, Message, Provider, Role, TokenUsage};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Ollama API provider
///
/// # Examples
///
/// ```no_run
/// use playsift::config::OllamaConfig;
/// use playsift::providers::{OllamaProvider, Provider, Message};
///
/// # async fn example() -> playsift::error::Result<()> {
/// let provider = OllamaProvider::new(OllamaConfig::default())?;
/// let completion = provider.complete(&[Message::user("Hello!")]).await?;
/// println!("{}", completion.text());
/// # Ok(())
/// # }
/// ```
pub struct OllamaProvider {
    client: Client,
    config: OllamaConfig,
}

/// Request structure for Ollama API
#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage>,
    stream: bool,
}

/// Message structure for Ollama API
#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    #[serde(default)]
    content: String,
}

/// Response structure from Ollama API
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaMessage,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    prompt_eval_count: usize,
    #[serde(default)]
    eval_count: usize,
}

impl OllamaProvider {
    /// Create a new Ollama provider instance
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    ///
    /// # Examples
    ///
    /// ```
    /// use playsift::config::OllamaConfig;
    /// use playsift::providers::OllamaProvider;
    ///
    /// let provider = OllamaProvider::new(OllamaConfig::default());
    /// assert!(provider.is_ok());
    /// ```
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent(concat!("playsift/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PlaysiftError::Provider(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            "Initialized Ollama provider: host={}, model={}",
            config.host,
            config.model
        );

        Ok(Self { client, config })
    }

    /// Get the configured Ollama host
    pub fn host(&self) -> &str {
        &self.config.host
    }

    /// Get the configured model name
    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.config.host.trim_end_matches('/'))
    }

    /// Convert Playsift messages to Ollama format
    fn convert_messages(messages: &[Message]) -> Vec<OllamaMessage> {
        messages
            .iter()
            .map(|m| OllamaMessage {
                role: m.role.to_string(),
                content: m.content.clone(),
            })
            .collect()
    }

    /// Convert an Ollama response message back to Playsift format
    ///
    /// The backend is expected to answer as the assistant; any other role is
    /// logged and still treated as assistant text.
    fn convert_response_message(ollama_msg: OllamaMessage) -> Message {
        if ollama_msg.role != "assistant" {
            tracing::debug!(
                "Ollama answered with role '{}', treating it as assistant",
                ollama_msg.role
            );
        }
        Message {
            role: Role::Assistant,
            content: ollama_msg.content,
        }
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    async fn complete(&self, messages: &[Message]) -> Result<CompletionResponse> {
        let url = self.chat_url();
        let request = OllamaRequest {
            model: &self.config.model,
            messages: Self::convert_messages(messages),
            stream: false,
        };

        tracing::debug!("Sending Ollama request: {} messages", request.messages.len());

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Ollama request failed: {}", e);
                PlaysiftError::Provider(format!("Ollama request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Ollama returned error {}: {}", status, error_text);
            return Err(PlaysiftError::Provider(format!(
                "Ollama returned error {}: {}",
                status, error_text
            ))
            .into());
        }

        let ollama_response: OllamaResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse Ollama response: {}", e);
            PlaysiftError::Provider(format!("Failed to parse Ollama response: {}", e))
        })?;

        tracing::debug!(
            "Ollama response: done={}, prompt_tokens={}, completion_tokens={}",
            ollama_response.done,
            ollama_response.prompt_eval_count,
            ollama_response.eval_count
        );

        let message = Self::convert_response_message(ollama_response.message);

        let response = if ollama_response.prompt_eval_count > 0 || ollama_response.eval_count > 0 {
            let usage = TokenUsage::new(
                ollama_response.prompt_eval_count,
                ollama_response.eval_count,
            );
            CompletionResponse::with_usage(message, usage)
        } else {
            CompletionResponse::new(message)
        };

        Ok(response)
    }

    fn get_current_model(&self) -> Result<String> {
        Ok(self.config.model.clone())
    }
}
