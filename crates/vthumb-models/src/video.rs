//! Video brief models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// Languages written right-to-left.
const RTL_LANGUAGES: &[&str] = &["ar", "he", "fa", "ur"];

/// Writing direction of a language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum TextDirection {
    #[default]
    Ltr,
    Rtl,
}

impl TextDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextDirection::Ltr => "ltr",
            TextDirection::Rtl => "rtl",
        }
    }
}

/// Language of a video or of a generation target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Language {
    /// Primary language subtag, lowercased (e.g. "en", "es").
    pub code: String,
    #[serde(default)]
    pub direction: TextDirection,
}

impl Language {
    /// Build a language from a BCP-47-ish code.
    ///
    /// Only the primary subtag is kept (`pt-BR` becomes `pt`). An empty code
    /// falls back to English.
    pub fn from_code(code: &str) -> Self {
        let primary = code
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_lowercase();
        let code = if primary.is_empty() {
            "en".to_string()
        } else {
            primary
        };
        let direction = if RTL_LANGUAGES.contains(&code.as_str()) {
            TextDirection::Rtl
        } else {
            TextDirection::Ltr
        };
        Self { code, direction }
    }

    pub fn is_rtl(&self) -> bool {
        self.direction == TextDirection::Rtl
    }
}

impl Default for Language {
    fn default() -> Self {
        Self::from_code("en")
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)
    }
}

/// Textual brief of the video a preview image is generated for.
///
/// Immutable input created per generation request.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VideoContext {
    #[validate(length(min = 1, max = 500))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    /// Image whose face is swapped into generated previews.
    #[validate(url)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_image_url: Option<String>,
}

impl VideoContext {
    /// Create a context with only a title, in English.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            language: Language::default(),
            tags: Vec::new(),
            channel_id: None,
            reference_image_url: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_language(mut self, code: &str) -> Self {
        self.language = Language::from_code(code);
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_channel(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = Some(channel_id.into());
        self
    }

    pub fn with_reference_image(mut self, url: impl Into<String>) -> Self {
        self.reference_image_url = Some(url.into());
        self
    }

    /// Reference image URL if one is set and non-blank.
    pub fn reference_image(&self) -> Option<&str> {
        self.reference_image_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}
