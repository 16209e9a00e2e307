//! Provider client configuration.

use std::time::Duration;

use reqwest::Client;

use crate::error::{ProviderError, ProviderResult};
use crate::retry::RetryConfig;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_secs(key: &str, default: u64) -> Duration {
    Duration::from_secs(
        std::env::var(key)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(default),
    )
}

/// Configuration for the OpenAI-compatible image and chat endpoints.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    /// Base URL without trailing slash, e.g. `https://api.openai.com`.
    pub base_url: String,
    pub image_model: String,
    pub chat_model: String,
    /// Request timeout. Image generation is slow, keep this generous.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub retry: RetryConfig,
}

impl OpenAiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> ProviderResult<Self> {
        let api_key = std::env::var("VTHUMB_OPENAI_API_KEY")
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .map_err(|_| {
                ProviderError::config("VTHUMB_OPENAI_API_KEY or OPENAI_API_KEY must be set")
            })?;

        if api_key.trim().is_empty() {
            return Err(ProviderError::config("OpenAI API key cannot be empty"));
        }

        Ok(Self {
            api_key,
            base_url: normalize_base_url(&env_or("VTHUMB_OPENAI_BASE_URL", "https://api.openai.com"))?,
            image_model: env_or("VTHUMB_IMAGE_MODEL", "dall-e-3"),
            chat_model: env_or("VTHUMB_CHAT_MODEL", "gpt-4o-mini"),
            timeout: env_secs("VTHUMB_PROVIDER_TIMEOUT_SECS", 120),
            connect_timeout: env_secs("VTHUMB_PROVIDER_CONNECT_TIMEOUT_SECS", 10),
            retry: RetryConfig::from_env(),
        })
    }
}

/// Configuration for the face detection / swap service.
#[derive(Debug, Clone)]
pub struct FaceApiConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub retry: RetryConfig,
}

impl FaceApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> ProviderResult<Self> {
        let api_key = std::env::var("VTHUMB_FACE_API_KEY")
            .map_err(|_| ProviderError::config("VTHUMB_FACE_API_KEY must be set"))?;

        let base_url = std::env::var("VTHUMB_FACE_BASE_URL")
            .map_err(|_| ProviderError::config("VTHUMB_FACE_BASE_URL must be set"))?;

        Ok(Self {
            api_key,
            base_url: normalize_base_url(&base_url)?,
            // Per-step deadlines are enforced by the caller; this is the transport ceiling.
            timeout: env_secs("VTHUMB_FACE_PROVIDER_TIMEOUT_SECS", 150),
            connect_timeout: env_secs("VTHUMB_PROVIDER_CONNECT_TIMEOUT_SECS", 10),
            retry: RetryConfig::from_env(),
        })
    }
}

/// Validate a base URL and strip any trailing slash.
pub fn normalize_base_url(raw: &str) -> ProviderResult<String> {
    let parsed = url::Url::parse(raw.trim())
        .map_err(|e| ProviderError::config(format!("Invalid base URL '{}': {}", raw, e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed.as_str().trim_end_matches('/').to_string()),
        other => Err(ProviderError::config(format!(
            "Unsupported base URL scheme '{}'",
            other
        ))),
    }
}

/// Build a tuned HTTP client shared by provider handles.
pub fn build_http_client(timeout: Duration, connect_timeout: Duration) -> ProviderResult<Client> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(connect_timeout)
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(10)
        .user_agent(concat!("vthumb-providers/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ProviderError::config(format!("Failed to build HTTP client: {}", e)))
}
