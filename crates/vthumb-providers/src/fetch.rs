//! Raw image download for channel analysis.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use futures::{Stream, StreamExt};
use reqwest::Client;
use tracing::{debug, info_span, Instrument};
use url::Url;

use crate::config::build_http_client;
use crate::error::{ProviderError, ProviderResult};
use crate::http::error_from_response;
use crate::metrics::record_request;
use crate::retry::{with_retry, RetryConfig};
use crate::traits::ImageFetcher;

const PROVIDER: &str = "image_fetch";

/// Thumbnails are small; anything larger is not a thumbnail.
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;

/// Fetches images over HTTP(S). `data:` URIs are decoded in place.
#[derive(Clone)]
pub struct HttpImageFetcher {
    http: Client,
    retry: RetryConfig,
    max_bytes: usize,
}

impl HttpImageFetcher {
    pub fn new(timeout: Duration, retry: RetryConfig) -> ProviderResult<Self> {
        let http = build_http_client(timeout, Duration::from_secs(10))?;
        Ok(Self::with_http(http, retry))
    }

    pub fn with_http(http: Client, retry: RetryConfig) -> Self {
        Self {
            http,
            retry,
            max_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Create from environment variables.
    pub fn from_env() -> ProviderResult<Self> {
        let timeout = std::env::var("VTHUMB_FETCH_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);
        Self::new(Duration::from_secs(timeout), RetryConfig::from_env())
    }

    async fn get_bytes(&self, url: &str) -> ProviderResult<Vec<u8>> {
        let span = info_span!("image_fetch", url = %url);
        let start = Instant::now();

        let result = async {
            let response = self.http.get(url).send().await?;
            if !response.status().is_success() {
                return Err(error_from_response(url, response).await);
            }
            if let Some(len) = response.content_length() {
                if len as usize > self.max_bytes {
                    return Err(too_large(len as usize, self.max_bytes));
                }
            }
            let bytes = read_capped(response.bytes_stream(), self.max_bytes).await?;
            if bytes.is_empty() {
                return Err(ProviderError::empty_response("image body is empty"));
            }
            debug!(bytes = bytes.len(), "Image downloaded");
            Ok(bytes)
        }
        .instrument(span)
        .await;

        let status = match &result {
            Ok(_) => "ok",
            Err(e) => e.status_label(),
        };
        record_request(PROVIDER, "fetch", status, start.elapsed().as_millis() as f64);

        result
    }
}

fn too_large(len: usize, limit: usize) -> ProviderError {
    ProviderError::invalid_response(format!("image exceeds {} bytes (at least {})", limit, len))
}

/// Collect a body stream, stopping as soon as it grows past `max_bytes`.
/// Bodies without a content length are only bounded here.
async fn read_capped<S, B, E>(mut stream: S, max_bytes: usize) -> ProviderResult<Vec<u8>>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: Into<ProviderError>,
{
    let mut body = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(Into::into)?;
        let chunk = chunk.as_ref();
        if body.len() + chunk.len() > max_bytes {
            return Err(too_large(body.len() + chunk.len(), max_bytes));
        }
        body.extend_from_slice(chunk);
    }
    Ok(body)
}

/// Decode a `data:<mime>;base64,<payload>` URI.
pub fn decode_data_uri(uri: &str) -> ProviderResult<Vec<u8>> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| ProviderError::invalid_response("not a data URI"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| ProviderError::invalid_response("data URI has no payload"))?;

    if !header.ends_with(";base64") {
        return Err(ProviderError::invalid_response("only base64 data URIs are supported"));
    }

    let bytes = general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| ProviderError::invalid_response(format!("bad data URI payload: {}", e)))?;

    if bytes.is_empty() {
        return Err(ProviderError::empty_response("data URI payload is empty"));
    }
    Ok(bytes)
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> ProviderResult<Vec<u8>> {
        let url = url.trim();
        if url.starts_with("data:") {
            return decode_data_uri(url);
        }

        let parsed = Url::parse(url).map_err(|e| {
            ProviderError::Rejected {
                status: 400,
                message: format!("invalid image URL '{}': {}", url, e),
            }
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ProviderError::Rejected {
                status: 400,
                message: format!("unsupported image URL scheme '{}'", parsed.scheme()),
            });
        }

        let url = parsed.as_str();
        with_retry(&self.retry, PROVIDER, "fetch", || self.get_bytes(url)).await
    }
}
