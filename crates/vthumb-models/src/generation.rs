//! Generation tasks, results and reports.

use base64::{engine::general_purpose, Engine as _};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::style::StyleVariation;
use crate::video::Language;

/// Label suffix for results whose face swap succeeded.
pub const FACE_SWAP_LABEL_SUFFIX: &str = " (with face swap)";

/// Unique identifier for a generation request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct RequestId(pub String);

impl RequestId {
    /// Generate a new random request ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to a produced image: either a provider URL or inline bytes.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImageRef {
    Url { url: String },
    Inline {
        #[serde(rename = "mimeType")]
        mime_type: String,
        #[serde(with = "base64_bytes")]
        #[schemars(with = "String")]
        data: Vec<u8>,
    },
}

impl ImageRef {
    pub fn url(url: impl Into<String>) -> Self {
        Self::Url { url: url.into() }
    }

    pub fn inline(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self::Inline {
            mime_type: mime_type.into(),
            data,
        }
    }

    /// URI usable by providers that only accept URLs (`data:` URI for inline bytes).
    pub fn to_uri(&self) -> String {
        match self {
            ImageRef::Url { url } => url.clone(),
            ImageRef::Inline { mime_type, data } => format!(
                "data:{};base64,{}",
                mime_type,
                general_purpose::STANDARD.encode(data)
            ),
        }
    }
}

impl fmt::Debug for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageRef::Url { url } => f.debug_struct("Url").field("url", url).finish(),
            ImageRef::Inline { mime_type, data } => f
                .debug_struct("Inline")
                .field("mime_type", mime_type)
                .field("len", &data.len())
                .finish(),
        }
    }
}

mod base64_bytes {
    use base64::{engine::general_purpose, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&general_purpose::STANDARD.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        general_purpose::STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

/// One (style variation, language) unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationTask {
    /// Position in the request; results are returned in this order.
    pub index: usize,
    pub variation: StyleVariation,
    pub language: Language,
}

/// A finished preview image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub image_ref: ImageRef,
    pub label: String,
    pub language: String,
    pub prompt_used: String,
    /// Confidence in [0, 1].
    pub confidence: f64,
    pub face_swap_applied: bool,
    /// False when scene reasoning failed and the raw summary was used.
    pub scene_refined: bool,
    pub variation_index: usize,
}

/// A task that produced no image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskFailure {
    pub index: usize,
    pub label: String,
    pub language: String,
    pub error: String,
}

/// Output of a generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerationReport {
    pub request_id: RequestId,
    /// Sorted by confidence, highest first.
    pub results: Vec<GenerationResult>,
    pub failures: Vec<TaskFailure>,
}

impl GenerationReport {
    pub fn results_for_language<'a>(
        &'a self,
        code: &'a str,
    ) -> impl Iterator<Item = &'a GenerationResult> + 'a {
        self.results.iter().filter(move |r| r.language == code)
    }

    /// True if any result used a degraded fallback.
    pub fn has_degraded_results(&self) -> bool {
        self.results.iter().any(|r| !r.scene_refined)
    }
}
