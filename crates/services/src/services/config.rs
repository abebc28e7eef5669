//! Process configuration, read once at startup and passed down explicitly.

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
const DEFAULT_MODEL: &str = "openai/gpt-4o";
const DEFAULT_DATABASE_URL: &str = "sqlite://ephemeris.db";
const DEFAULT_APP_URL: &str = "http://localhost:3000";
const APP_TITLE: &str = "Programming Ephemeris Terminal";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required configuration: {0} environment variable not set")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Parameters for the AI fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 200,
            temperature: 0.1,
            max_attempts: 3,
            retry_delay: Duration::from_millis(2000),
        }
    }
}

/// Connection details for the OpenAI-compatible completion endpoint.
#[derive(Debug)]
pub struct AiConfig {
    pub api_key: SecretString,
    pub base_url: String,
    /// Sent as `HTTP-Referer`; OpenRouter uses it to attribute traffic.
    pub app_url: String,
    pub app_title: String,
}

#[derive(Debug)]
pub struct Config {
    pub ai: AiConfig,
    pub generation: GenerationSettings,
    /// Shared secret expected as `Authorization: Bearer <secret>` from schedulers.
    pub cron_secret: Option<SecretString>,
    pub database_url: String,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = get("OPENAI_API_KEY").ok_or(ConfigError::Missing("OPENAI_API_KEY"))?;
        let defaults = GenerationSettings::default();

        let generation = GenerationSettings {
            model: get("AI_MODEL").unwrap_or(defaults.model),
            max_tokens: parse_or("AI_MAX_TOKENS", get("AI_MAX_TOKENS"), defaults.max_tokens)?,
            temperature: parse_or("AI_TEMPERATURE", get("AI_TEMPERATURE"), defaults.temperature)?,
            max_attempts: parse_or("AI_MAX_ATTEMPTS", get("AI_MAX_ATTEMPTS"), defaults.max_attempts)?,
            retry_delay: parse_or::<u64>("AI_RETRY_DELAY_MS", get("AI_RETRY_DELAY_MS"), 2000)
                .map(Duration::from_millis)?,
        };
        if generation.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "AI_MAX_ATTEMPTS",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            ai: AiConfig {
                api_key: SecretString::from(api_key),
                base_url: get("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                app_url: get("APP_URL").unwrap_or_else(|| DEFAULT_APP_URL.to_string()),
                app_title: APP_TITLE.to_string(),
            },
            generation,
            cron_secret: get("CRON_SECRET").map(SecretString::from),
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            host: get("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or("PORT", get("PORT"), 3000)?,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}
