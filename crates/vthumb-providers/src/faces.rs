//! Face detection and face swap service client.
//!
//! The service exposes two JSON endpoints:
//! - `POST /v1/faces/detect` `{image_url, confidence_threshold}` → `{faces: [...]}`
//! - `POST /v1/faces/swap` `{source_image, target_image, face_index}` →
//!   `{image_url}` or `{image_base64, mime_type}`

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use vthumb_models::ImageRef;

use crate::config::{build_http_client, FaceApiConfig};
use crate::error::{ProviderError, ProviderResult};
use crate::http::post_json;
use crate::retry::with_retry;
use crate::traits::{DetectedFace, FaceDetectionRequest, FaceDetector, FaceSwapRequest, FaceSwapper};

const PROVIDER: &str = "faces";

#[derive(Debug, Serialize)]
struct DetectBody<'a> {
    image_url: &'a str,
    confidence_threshold: f32,
}

#[derive(Debug, Deserialize)]
struct DetectResponse {
    #[serde(default)]
    faces: Vec<DetectedFace>,
}

#[derive(Debug, Serialize)]
struct SwapBody<'a> {
    source_image: &'a str,
    target_image: &'a str,
    face_index: usize,
}

#[derive(Debug, Deserialize)]
struct SwapResponse {
    image_url: Option<String>,
    image_base64: Option<String>,
    mime_type: Option<String>,
}

/// Client for the face detection / swap service.
#[derive(Clone)]
pub struct FaceApiClient {
    http: Client,
    config: FaceApiConfig,
}

impl FaceApiClient {
    pub fn new(config: FaceApiConfig) -> ProviderResult<Self> {
        let http = build_http_client(config.timeout, config.connect_timeout)?;
        Ok(Self::with_http(http, config))
    }

    pub fn with_http(http: Client, config: FaceApiConfig) -> Self {
        Self { http, config }
    }

    /// Create from environment variables.
    pub fn from_env() -> ProviderResult<Self> {
        Self::new(FaceApiConfig::from_env()?)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }
}

#[async_trait]
impl FaceDetector for FaceApiClient {
    async fn detect(&self, request: &FaceDetectionRequest) -> ProviderResult<Vec<DetectedFace>> {
        let url = self.endpoint("/v1/faces/detect");
        let body = DetectBody {
            image_url: &request.image_url,
            confidence_threshold: request.confidence_threshold,
        };

        let (http, api_key, url, body) = (&self.http, self.config.api_key.as_str(), url.as_str(), &body);
        let response: DetectResponse = with_retry(&self.config.retry, PROVIDER, "detect", move || {
            post_json(http, PROVIDER, "detect", url, api_key, body)
        })
        .await?;

        // Indices into this list are what the swap endpoint expects, so no filtering here
        debug!(faces = response.faces.len(), "Face detection completed");
        Ok(response.faces)
    }
}

#[async_trait]
impl FaceSwapper for FaceApiClient {
    async fn swap(&self, request: &FaceSwapRequest) -> ProviderResult<ImageRef> {
        let url = self.endpoint("/v1/faces/swap");
        let body = SwapBody {
            source_image: &request.source_image,
            target_image: &request.target_image,
            face_index: request.face_index,
        };

        let (http, api_key, url, body) = (&self.http, self.config.api_key.as_str(), url.as_str(), &body);
        let response: SwapResponse = with_retry(&self.config.retry, PROVIDER, "swap", move || {
            post_json(http, PROVIDER, "swap", url, api_key, body)
        })
        .await?;

        if let Some(url) = response.image_url.filter(|u| !u.trim().is_empty()) {
            return Ok(ImageRef::url(url));
        }

        if let Some(encoded) = response.image_base64.filter(|b| !b.trim().is_empty()) {
            let data = general_purpose::STANDARD
                .decode(encoded.trim())
                .map_err(|e| ProviderError::invalid_response(format!("bad image_base64: {}", e)))?;
            let mime = response.mime_type.unwrap_or_else(|| "image/png".to_string());
            return Ok(ImageRef::inline(mime, data));
        }

        Err(ProviderError::empty_response("face swap returned no image"))
    }
}
