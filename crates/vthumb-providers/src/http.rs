//! Shared HTTP plumbing for provider clients.

use std::time::Instant;

use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info_span, Instrument};

use crate::error::{ProviderError, ProviderResult};
use crate::metrics::record_request;
use crate::retry::retry_after_from_headers;

const ERROR_BODY_LOG_LIMIT: usize = 800;

pub(crate) fn truncate_for_log(value: &str, limit: usize) -> String {
    if value.chars().count() <= limit {
        return value.to_string();
    }
    let truncated: String = value.chars().take(limit).collect();
    format!("{truncated}... (truncated)")
}

/// Map a non-success response to a provider error.
pub(crate) async fn error_from_response(url: &str, response: reqwest::Response) -> ProviderError {
    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return ProviderError::RateLimited(retry_after_from_headers(response.headers(), Utc::now()));
    }
    let body = response.text().await.unwrap_or_default();
    ProviderError::from_http_status(
        status.as_u16(),
        format!("{} failed: {}", url, truncate_for_log(&body, ERROR_BODY_LOG_LIMIT)),
    )
}

/// POST a JSON body with bearer auth and decode a JSON response.
pub(crate) async fn post_json<B, R>(
    http: &Client,
    provider: &str,
    operation: &str,
    url: &str,
    api_key: &str,
    body: &B,
) -> ProviderResult<R>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let span = info_span!("provider_request", provider = %provider, operation = %operation);
    let start = Instant::now();

    let result = async {
        let response = http.post(url).bearer_auth(api_key).json(body).send().await?;
        if !response.status().is_success() {
            return Err(error_from_response(url, response).await);
        }
        let bytes = response.bytes().await?;
        debug!(bytes = bytes.len(), "Provider response received");
        serde_json::from_slice::<R>(&bytes).map_err(ProviderError::from)
    }
    .instrument(span)
    .await;

    let status = match &result {
        Ok(_) => "ok",
        Err(e) => e.status_label(),
    };
    record_request(provider, operation, status, start.elapsed().as_millis() as f64);

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_log() {
        assert_eq!(truncate_for_log("short", 10), "short");
        assert_eq!(truncate_for_log("abcdef", 3), "abc... (truncated)");
    }
}
