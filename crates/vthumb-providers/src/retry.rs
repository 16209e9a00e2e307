//! Provider retry policy.
//!
//! Which failures are worth another attempt, how long to wait, and how the
//! providers' rate-limit hints are read all live here:
//! - 5xx and network failures back off exponentially with equal jitter
//! - 429 waits for the provider's hint (`retry-after-ms`, then `Retry-After`
//!   as seconds or an HTTP date); a hint longer than the delay cap gives up
//!   at once rather than burning an attempt into another 429
//! - a timeout is retried once, since it already cost a full client timeout
//! - rejections, empty or malformed responses and config errors never retry

use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hasher};
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use tracing::{info_span, warn, Instrument};

use crate::error::{ProviderError, ProviderResult};
use crate::metrics::record_retry;

/// Millisecond-precision variant sent by OpenAI-compatible APIs.
const RETRY_AFTER_MS: &str = "retry-after-ms";

/// Timeouts get at most this many retries regardless of `max_retries`.
const MAX_TIMEOUT_RETRIES: u32 = 1;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub base_delay_ms: u64,
    /// Upper bound for backoff, and the longest rate-limit hint honoured.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 250,
            max_delay_ms: 5000,
        }
    }
}

impl RetryConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_retries: std::env::var("VTHUMB_RETRY_MAX_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_retries),
            base_delay_ms: std::env::var("VTHUMB_RETRY_BASE_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.base_delay_ms),
            max_delay_ms: std::env::var("VTHUMB_RETRY_MAX_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_delay_ms),
        }
    }

    /// What to do after `err` on zero-based `attempt`.
    pub fn decide(&self, err: &ProviderError, attempt: u32) -> RetryDecision {
        if attempt >= self.max_retries {
            return RetryDecision::GiveUp;
        }

        match err {
            ProviderError::RateLimited(Some(after_ms)) if *after_ms > self.max_delay_ms => {
                RetryDecision::GiveUp
            }
            ProviderError::RateLimited(Some(after_ms)) => {
                RetryDecision::Retry(Duration::from_millis(*after_ms))
            }
            ProviderError::RateLimited(None) | ProviderError::Unavailable(_) => {
                RetryDecision::Retry(self.backoff(attempt))
            }
            ProviderError::Timeout(_) if attempt < MAX_TIMEOUT_RETRIES => {
                RetryDecision::Retry(self.backoff(attempt))
            }
            _ => RetryDecision::GiveUp,
        }
    }

    /// Equal jitter: half the capped exponential delay, plus up to the other
    /// half at random.
    fn backoff(&self, attempt: u32) -> Duration {
        let exp = self
            .base_delay_ms
            .saturating_mul(2u64.saturating_pow(attempt))
            .min(self.max_delay_ms);
        let half = exp / 2;

        let mut hasher = RandomState::new().build_hasher();
        hasher.write_u32(attempt);
        let jitter = hasher.finish() % (exp - half + 1);

        Duration::from_millis(half + jitter)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry(Duration),
    GiveUp,
}

/// Failures that may succeed on a later attempt.
pub fn is_transient(err: &ProviderError) -> bool {
    matches!(
        err,
        ProviderError::Unavailable(_) | ProviderError::RateLimited(_) | ProviderError::Timeout(_)
    )
}

/// Read a rate-limit hint from response headers, in milliseconds.
pub fn retry_after_from_headers(headers: &HeaderMap, now: DateTime<Utc>) -> Option<u64> {
    if let Some(ms) = header_str(headers, RETRY_AFTER_MS).and_then(|v| v.parse::<f64>().ok()) {
        return (ms.is_finite() && ms >= 0.0).then(|| ms.ceil() as u64);
    }

    let value = header_str(headers, RETRY_AFTER.as_str())?;
    if let Ok(secs) = value.parse::<u64>() {
        return Some(secs.saturating_mul(1000));
    }

    let at = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
    Some((at - now).num_milliseconds().max(0) as u64)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::trim)
}

/// Run `op` until it succeeds or [`RetryConfig::decide`] gives up.
pub async fn with_retry<T, F, Fut>(
    config: &RetryConfig,
    provider: &str,
    operation: &str,
    op: F,
) -> ProviderResult<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = ProviderResult<T>>,
{
    let mut attempt = 0;

    loop {
        let span = info_span!(
            "provider_attempt",
            provider = %provider,
            operation = %operation,
            attempt = attempt + 1
        );

        let err = match op().instrument(span).await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        let delay = match config.decide(&err, attempt) {
            RetryDecision::Retry(delay) => delay,
            RetryDecision::GiveUp => return Err(err),
        };

        warn!(
            provider = %provider,
            operation = %operation,
            attempt = attempt + 1,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "Provider call failed, retrying"
        );
        record_retry(provider, operation);
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
