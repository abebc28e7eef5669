//! Capability interface for the external text-generation service.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// A single-message completion request. No conversation history is sent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, Error)]
pub enum TextGenerationError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("rate limited")]
    RateLimited,
    #[error("invalid api key")]
    InvalidApiKey,
    #[error("json error: {0}")]
    Serde(String),
    #[error("completion had no text content")]
    EmptyCompletion,
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Returns the text of the first completion choice.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, TextGenerationError>;
}
