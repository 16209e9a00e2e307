//! Channel history models: dictionaries, thumbnails and visual patterns.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum keywords retained in a channel dictionary.
pub const MAX_KEYWORDS: usize = 100;

/// Title and description of one historical video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ChannelDocument {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl ChannelDocument {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct KeywordWeight {
    pub word: String,
    /// Always non-negative.
    pub weight: f64,
}

/// Weighted vocabulary of a channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChannelDictionary {
    pub channel_id: String,
    pub niche: String,
    pub primary_category: String,
    /// At most [`MAX_KEYWORDS`], sorted by weight descending.
    pub keywords: Vec<KeywordWeight>,
    pub categories: BTreeMap<String, f64>,
    pub last_updated: DateTime<Utc>,
}

impl ChannelDictionary {
    pub fn top_keywords(&self, n: usize) -> impl Iterator<Item = &str> {
        self.keywords.iter().take(n).map(|k| k.word.as_str())
    }
}

/// Historical thumbnail used for pattern analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceThumbnail {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

impl ReferenceThumbnail {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
            published_at: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn published(mut self, at: DateTime<Utc>) -> Self {
        self.published_at = Some(at);
        self
    }
}

/// How often a catalog pattern was observed across analyzed thumbnails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PatternStat {
    pub name: String,
    pub occurrences: usize,
    /// `occurrences / sample_size`, in [0, 1].
    pub frequency: f64,
}

/// A recurring dominant colour family with its representative colours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PalettePattern {
    pub name: String,
    /// Hex colours, most frequent first.
    pub colors: Vec<String>,
    pub occurrences: usize,
    pub frequency: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TemporalTrend {
    pub kind: String,
    pub description: String,
}

/// Aggregated visual patterns of a channel's thumbnails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChannelPattern {
    pub channel_id: String,
    pub text_styles: Vec<PatternStat>,
    pub color_palettes: Vec<PalettePattern>,
    pub layouts: Vec<PatternStat>,
    pub series_patterns: Vec<PatternStat>,
    pub temporal_trends: Vec<TemporalTrend>,
    /// Thumbnails successfully analyzed.
    pub sample_size: usize,
    /// In [0, 1].
    pub confidence: f64,
    pub analyzed_at: DateTime<Utc>,
}

impl ChannelPattern {
    pub fn dominant_layout(&self) -> Option<&PatternStat> {
        self.layouts.first()
    }

    pub fn dominant_text_style(&self) -> Option<&PatternStat> {
        self.text_styles.first()
    }
}
