//! OpenAI-compatible chat completions client (OpenRouter by default).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    config::AiConfig,
    text_generator::{CompletionRequest, TextGenerationError, TextGenerator},
};

/// A message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Request body for the chat completions endpoint
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

/// Token usage information
#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

/// Response from the chat completions endpoint
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl ChatResponse {
    /// Text of the first choice, if it has any
    pub fn first_text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .filter(|text| !text.trim().is_empty())
    }
}

/// Chat completions client
#[derive(Debug)]
pub struct ChatApiClient {
    http: Client,
    api_key: SecretString,
    completions_url: String,
    app_url: String,
    app_title: String,
}

impl ChatApiClient {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

    pub fn new(config: &AiConfig) -> Result<Self, TextGenerationError> {
        let http = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(concat!("programming-ephemeris/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TextGenerationError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            api_key: SecretString::from(config.api_key.expose_secret().to_owned()),
            completions_url: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            app_url: config.app_url.clone(),
            app_title: config.app_title.clone(),
        })
    }

    async fn send_request(&self, request: &ChatRequest<'_>) -> Result<ChatResponse, TextGenerationError> {
        let res = self
            .http
            .post(&self.completions_url)
            .bearer_auth(self.api_key.expose_secret())
            .header("HTTP-Referer", &self.app_url)
            .header("X-Title", &self.app_title)
            .json(request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        match res.status() {
            s if s.is_success() => res
                .json::<ChatResponse>()
                .await
                .map_err(|e| TextGenerationError::Serde(e.to_string())),
            StatusCode::UNAUTHORIZED => Err(TextGenerationError::InvalidApiKey),
            StatusCode::TOO_MANY_REQUESTS => Err(TextGenerationError::RateLimited),
            s => {
                let status = s.as_u16();
                let body = res.text().await.unwrap_or_default();
                Err(TextGenerationError::Http { status, body })
            }
        }
    }
}

#[async_trait]
impl TextGenerator for ChatApiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, TextGenerationError> {
        let body = ChatRequest {
            model: &request.model,
            messages: vec![Message::user(request.prompt.as_str())],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let response = self.send_request(&body).await?;
        if let Some(usage) = &response.usage {
            debug!(
                model = %request.model,
                completion_id = response.id.as_deref().unwrap_or_default(),
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Chat completion finished"
            );
        }

        response
            .first_text()
            .map(str::to_string)
            .ok_or(TextGenerationError::EmptyCompletion)
    }
}

fn map_reqwest_error(e: reqwest::Error) -> TextGenerationError {
    if e.is_timeout() {
        TextGenerationError::Timeout
    } else {
        TextGenerationError::Transport(e.to_string())
    }
}
