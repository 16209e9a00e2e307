//! Style variations and derived channel style profiles.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A named creative treatment with the directive text that steers prompt tone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StyleVariation {
    /// Human-facing label, e.g. "Dynamic".
    pub label: String,
    /// Short description of what the variation emphasises.
    pub emphasis: String,
    /// Directive folded into scene reasoning and prompt assembly.
    pub style_directive: String,
}

impl StyleVariation {
    pub fn new(
        label: impl Into<String>,
        emphasis: impl Into<String>,
        style_directive: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            emphasis: emphasis.into(),
            style_directive: style_directive.into(),
        }
    }
}

/// Compact summary of a channel's visual identity.
///
/// Derived from channel analysis, never hand-authored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StyleProfile {
    pub style_id: String,
    /// Three hex colours, most frequent first.
    pub palette: [String; 3],
    pub layout: String,
    pub font_hint: String,
    pub tone: String,
}
