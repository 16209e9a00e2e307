//! Engine error types.

use thiserror::Error;
use vthumb_models::TaskFailure;
use vthumb_providers::ProviderError;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The request cannot be processed as given.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Every task of a batch failed; `cause` is the first failure.
    #[error("All {attempted} variations failed: {cause}")]
    AllVariationsFailed {
        attempted: usize,
        cause: String,
        failures: Vec<TaskFailure>,
    },

    #[error("Generation cancelled")]
    Cancelled,

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

impl EngineError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Build the total-failure error from the failures of a batch.
    pub fn all_failed(failures: Vec<TaskFailure>) -> Self {
        let cause = failures
            .iter()
            .min_by_key(|f| f.index)
            .map(|f| f.error.clone())
            .unwrap_or_else(|| "no tasks were attempted".to_string());
        Self::AllVariationsFailed {
            attempted: failures.len(),
            cause,
            failures,
        }
    }

    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::Provider(e) => e.is_retryable(),
            EngineError::AllVariationsFailed { .. } => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(index: usize, error: &str) -> TaskFailure {
        TaskFailure {
            index,
            label: "Dynamic".to_string(),
            language: "en".to_string(),
            error: error.to_string(),
        }
    }

    #[test]
    fn test_all_failed_names_first_cause() {
        let err = EngineError::all_failed(vec![failure(1, "second"), failure(0, "first")]);
        match &err {
            EngineError::AllVariationsFailed { attempted, cause, .. } => {
                assert_eq!(*attempted, 2);
                assert_eq!(cause, "first");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.to_string(), "All 2 variations failed: first");
    }

    #[test]
    fn test_retryable() {
        assert!(!EngineError::invalid_input("empty title").is_retryable());
        assert!(!EngineError::Cancelled.is_retryable());
        assert!(EngineError::from(ProviderError::timeout("slow")).is_retryable());
    }
}
