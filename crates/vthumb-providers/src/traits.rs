//! Provider capability traits and their request/response types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use vthumb_models::{ImageQuality, ImageRef};

use crate::error::ProviderResult;

/// 16:9 output size requested from the image provider.
pub const DEFAULT_IMAGE_SIZE: &str = "1792x1024";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageGenerationRequest {
    pub prompt: String,
    pub size: String,
    pub quality: ImageQuality,
}

impl ImageGenerationRequest {
    pub fn new(prompt: impl Into<String>, quality: ImageQuality) -> Self {
        Self {
            prompt: prompt.into(),
            size: DEFAULT_IMAGE_SIZE.to_string(),
            quality,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl ChatRequest {
    pub fn new(system_prompt: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            max_tokens: 100,
            temperature: 0.7,
        }
    }
}

/// Free-text completion. Treated as untrusted, best-effort output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatCompletion {
    pub text: String,
    /// The provider stopped because it hit the token limit.
    pub truncated: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FaceDetectionRequest {
    pub image_url: String,
    pub confidence_threshold: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedFace {
    pub bbox: BoundingBox,
    pub confidence: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landmarks: Option<Vec<[f32; 2]>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceSwapRequest {
    /// Image the face is taken from.
    pub source_image: String,
    /// Image the face is placed into.
    pub target_image: String,
    /// Index into the faces detected in `source_image`.
    pub face_index: usize,
}

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate one image. An absent image is an `EmptyResponse` error.
    async fn generate(&self, request: &ImageGenerationRequest) -> ProviderResult<ImageRef>;
}

#[async_trait]
pub trait ChatCompleter: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> ProviderResult<ChatCompletion>;
}

#[async_trait]
pub trait FaceDetector: Send + Sync {
    async fn detect(&self, request: &FaceDetectionRequest) -> ProviderResult<Vec<DetectedFace>>;
}

#[async_trait]
pub trait FaceSwapper: Send + Sync {
    async fn swap(&self, request: &FaceSwapRequest) -> ProviderResult<ImageRef>;
}

#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Download raw image bytes.
    async fn fetch(&self, url: &str) -> ProviderResult<Vec<u8>>;
}
