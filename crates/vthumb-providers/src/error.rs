//! Provider error types.

use thiserror::Error;

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors that can occur while calling an inference provider.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// Network failure or 5xx response.
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    /// 429 response; optional Retry-After in milliseconds.
    #[error("Provider rate limited (retry after {0:?}ms)")]
    RateLimited(Option<u64>),

    /// 4xx response or a request the provider refused.
    #[error("Provider rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Provider timed out: {0}")]
    Timeout(String),

    /// Successful response that carried no usable output.
    #[error("Provider returned an empty response: {0}")]
    EmptyResponse(String),

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("Provider configuration error: {0}")]
    Config(String),
}

impl ProviderError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    pub fn empty_response(msg: impl Into<String>) -> Self {
        Self::EmptyResponse(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Map an HTTP error status to the matching error kind.
    pub fn from_http_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            429 => Self::RateLimited(None),
            408 => Self::Timeout(message),
            400..=499 => Self::Rejected { status, message },
            _ => Self::Unavailable(format!("HTTP {}: {}", status, message)),
        }
    }

    /// Check if error is retryable. See [`crate::retry`] for the policy.
    pub fn is_retryable(&self) -> bool {
        crate::retry::is_transient(self)
    }

    /// Status label used for metrics.
    pub fn status_label(&self) -> &'static str {
        match self {
            ProviderError::Unavailable(_) => "unavailable",
            ProviderError::RateLimited(_) => "rate_limited",
            ProviderError::Rejected { .. } => "rejected",
            ProviderError::Timeout(_) => "timeout",
            ProviderError::EmptyResponse(_) => "empty",
            ProviderError::InvalidResponse(_) => "invalid",
            ProviderError::Config(_) => "config",
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else if let Some(status) = err.status() {
            Self::from_http_status(status.as_u16(), err.to_string())
        } else {
            Self::Unavailable(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}
