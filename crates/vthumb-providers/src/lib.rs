//! Inference provider clients.
//!
//! Every provider capability is a trait so the engine receives explicit
//! client handles and tests can substitute fakes:
//! - [`ImageGenerator`]: text-to-image generation
//! - [`ChatCompleter`]: chat/completion used for scene reasoning
//! - [`FaceDetector`] / [`FaceSwapper`]: face detection and swapping
//! - [`ImageFetcher`]: raw image download for channel analysis
//!
//! HTTP implementations share retry, metrics and error mapping.

pub mod config;
pub mod error;
pub mod faces;
pub mod fetch;
mod http;
pub mod metrics;
pub mod openai;
pub mod retry;
pub mod traits;

pub use config::{build_http_client, FaceApiConfig, OpenAiConfig};
pub use error::{ProviderError, ProviderResult};
pub use faces::FaceApiClient;
pub use fetch::HttpImageFetcher;
pub use openai::OpenAiClient;
pub use retry::RetryConfig;
pub use traits::{
    BoundingBox, ChatCompleter, ChatCompletion, ChatRequest, DetectedFace, FaceDetectionRequest,
    FaceDetector, FaceSwapRequest, FaceSwapper, ImageFetcher, ImageGenerationRequest,
    ImageGenerator, DEFAULT_IMAGE_SIZE,
};
