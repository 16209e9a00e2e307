//! Analysis error types.

use thiserror::Error;
use vthumb_providers::ProviderError;

/// Result type for channel analysis.
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Errors that can occur during channel analysis.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Too few thumbnails to estimate patterns reliably.
    #[error("Insufficient sample size: need at least {required} images, got {found}")]
    InsufficientSampleSize { required: usize, found: usize },

    #[error("Failed to load image {url}: {source}")]
    ImageLoad {
        url: String,
        #[source]
        source: ProviderError,
    },

    #[error("Failed to decode image {url}: {message}")]
    ImageDecode { url: String, message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AnalysisError {
    pub fn insufficient(required: usize, found: usize) -> Self {
        Self::InsufficientSampleSize { required, found }
    }

    pub fn image_load(url: impl Into<String>, source: ProviderError) -> Self {
        Self::ImageLoad {
            url: url.into(),
            source,
        }
    }

    pub fn image_decode(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ImageDecode {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            AnalysisError::ImageLoad { source, .. } => source.is_retryable(),
            _ => false,
        }
    }
}
