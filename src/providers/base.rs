//! Base provider trait and common types for Playsift
//!
//! This module defines the Provider trait that all generative-model backends
//! must implement, along with the chat message and response types shared by
//! the structured extraction loop.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions synthesized by the application
    System,
    /// Requests and corrections sent to the model
    User,
    /// Text produced by the model
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// Message structure for conversation
///
/// Represents one turn of the conversation sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: Role,
    /// Text content of the message
    pub content: String,
}

impl Message {
    /// Creates a new user message
    ///
    /// # Examples
    ///
    /// ```
    /// use playsift::providers::{Message, Role};
    ///
    /// let msg = Message::user("Classify the sub-genre");
    /// assert_eq!(msg.role, Role::User);
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Creates a new assistant message
    ///
    /// # Examples
    ///
    /// ```
    /// use playsift::providers::{Message, Role};
    ///
    /// let msg = Message::assistant("{\"reason\": \"x\"}");
    /// assert_eq!(msg.role, Role::Assistant);
    /// ```
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Creates a new system message
    ///
    /// # Examples
    ///
    /// ```
    /// use playsift::providers::{Message, Role};
    ///
    /// let msg = Message::system("Output nothing but JSON");
    /// assert_eq!(msg.role, Role::System);
    /// ```
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// Token usage information from a completion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of tokens in the prompt
    pub prompt_tokens: usize,
    /// Number of tokens in the completion
    pub completion_tokens: usize,
    /// Total tokens used (prompt + completion)
    pub total_tokens: usize,
}

impl TokenUsage {
    /// Create a new TokenUsage instance
    ///
    /// # Examples
    ///
    /// ```
    /// use playsift::providers::TokenUsage;
    ///
    /// let usage = TokenUsage::new(100, 50);
    /// assert_eq!(usage.total_tokens, 150);
    /// ```
    pub fn new(prompt_tokens: usize, completion_tokens: usize) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Completion response with message and optional token usage
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// The response message from the model
    pub message: Message,
    /// Optional token usage information
    pub usage: Option<TokenUsage>,
}

impl CompletionResponse {
    /// Create a new CompletionResponse without usage data
    pub fn new(message: Message) -> Self {
        Self {
            message,
            usage: None,
        }
    }

    /// Create a new CompletionResponse with token usage
    pub fn with_usage(message: Message, usage: TokenUsage) -> Self {
        Self {
            message,
            usage: Some(usage),
        }
    }

    /// The text content of the response message
    pub fn text(&self) -> &str {
        &self.message.content
    }
}

/// Provider trait for generative-model backends
///
/// A provider turns an ordered list of role/content messages into exactly one
/// text response. Anything that goes wrong while doing so (connection failure,
/// non-success status, undecodable body) is a transport failure and must be
/// returned as an error rather than as response text.
///
/// # Examples
///
/// ```no_run
/// use playsift::providers::{Provider, Message, CompletionResponse};
/// use playsift::error::Result;
/// use async_trait::async_trait;
///
/// struct EchoProvider;
///
/// #[async_trait]
/// impl Provider for EchoProvider {
///     async fn complete(&self, messages: &[Message]) -> Result<CompletionResponse> {
///         let last = messages.last().map(|m| m.content.clone()).unwrap_or_default();
///         Ok(CompletionResponse::new(Message::assistant(last)))
///     }
/// }
/// ```
#[async_trait]
pub trait Provider: Send + Sync {
    /// Completes a conversation with the given messages
    ///
    /// # Errors
    ///
    /// Returns error if the API call fails or the transport response is invalid
    async fn complete(&self, messages: &[Message]) -> Result<CompletionResponse>;

    /// Get the name of the currently active model
    ///
    /// # Default Implementation
    ///
    /// The default implementation returns an error indicating the model name
    /// is unavailable.
    fn get_current_model(&self) -> Result<String> {
        Err(crate::error::PlaysiftError::Provider(
            "Current model information is not available from this provider".to_string(),
        )
        .into())
    }
}
