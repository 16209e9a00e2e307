//! Generation options, cost tiers and creative directions.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::video::Language;

pub const MIN_INTENSITY: i32 = 1;
pub const MAX_INTENSITY: i32 = 10;
pub const MIN_VARIATIONS: i32 = 1;
pub const MAX_VARIATIONS: i32 = 3;
pub const MAX_STYLE_CONSISTENCY: i32 = 100;

#[derive(Debug, Error)]
#[error("Unknown {kind}: {value}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Deserialize an optional enum, mapping unknown values to `None`.
fn lenient_option<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()))
}

// =============================================================================
// Cost tier
// =============================================================================

/// Coarse quality/cost dial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum CostTier {
    Economy,
    #[default]
    Standard,
    Premium,
}

impl CostTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            CostTier::Economy => "economy",
            CostTier::Standard => "standard",
            CostTier::Premium => "premium",
        }
    }

    /// Provider-side quality flag for this tier.
    pub fn quality(&self) -> ImageQuality {
        match self {
            CostTier::Economy => ImageQuality::Standard,
            CostTier::Standard | CostTier::Premium => ImageQuality::Hd,
        }
    }
}

impl fmt::Display for CostTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CostTier {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "economy" | "low" => Ok(CostTier::Economy),
            "standard" => Ok(CostTier::Standard),
            "premium" | "high" => Ok(CostTier::Premium),
            _ => Err(ParseEnumError::new("cost tier", s)),
        }
    }
}

/// Quality flag sent to the image-generation provider.
///
/// `Standard` is the low-cost setting, `Hd` the high-quality one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ImageQuality {
    Standard,
    Hd,
}

impl ImageQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageQuality::Standard => "standard",
            ImageQuality::Hd => "hd",
        }
    }
}

impl fmt::Display for ImageQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Creative direction
// =============================================================================

/// Creative treatment requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CreativeDirection {
    Dynamic,
    Minimal,
    Dramatic,
    Playful,
    Business,
    Gaming,
    Educational,
}

impl CreativeDirection {
    pub const ALL: &'static [CreativeDirection] = &[
        CreativeDirection::Dynamic,
        CreativeDirection::Minimal,
        CreativeDirection::Dramatic,
        CreativeDirection::Playful,
        CreativeDirection::Business,
        CreativeDirection::Gaming,
        CreativeDirection::Educational,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CreativeDirection::Dynamic => "dynamic",
            CreativeDirection::Minimal => "minimal",
            CreativeDirection::Dramatic => "dramatic",
            CreativeDirection::Playful => "playful",
            CreativeDirection::Business => "business",
            CreativeDirection::Gaming => "gaming",
            CreativeDirection::Educational => "educational",
        }
    }
}

impl fmt::Display for CreativeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CreativeDirection {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|d| d.as_str() == lower)
            .ok_or_else(|| ParseEnumError::new("creative direction", s))
    }
}

// =============================================================================
// Creator type
// =============================================================================

/// Kind of channel the video belongs to; steers scene guidance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CreatorType {
    Gaming,
    Education,
    Tech,
    Cooking,
    Fitness,
    Vlog,
    Business,
    Music,
    Entertainment,
}

impl CreatorType {
    pub const ALL: &'static [CreatorType] = &[
        CreatorType::Gaming,
        CreatorType::Education,
        CreatorType::Tech,
        CreatorType::Cooking,
        CreatorType::Fitness,
        CreatorType::Vlog,
        CreatorType::Business,
        CreatorType::Music,
        CreatorType::Entertainment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CreatorType::Gaming => "gaming",
            CreatorType::Education => "education",
            CreatorType::Tech => "tech",
            CreatorType::Cooking => "cooking",
            CreatorType::Fitness => "fitness",
            CreatorType::Vlog => "vlog",
            CreatorType::Business => "business",
            CreatorType::Music => "music",
            CreatorType::Entertainment => "entertainment",
        }
    }
}

impl fmt::Display for CreatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CreatorType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == lower)
            .ok_or_else(|| ParseEnumError::new("creator type", s))
    }
}

// =============================================================================
// Participants
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantPosition {
    Left,
    #[default]
    Center,
    Right,
}

impl ParticipantPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantPosition::Left => "left",
            ParticipantPosition::Center => "center",
            ParticipantPosition::Right => "right",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantEmphasis {
    #[default]
    Primary,
    Secondary,
    Background,
}

impl ParticipantEmphasis {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantEmphasis::Primary => "primary",
            ParticipantEmphasis::Secondary => "secondary",
            ParticipantEmphasis::Background => "background",
        }
    }
}

/// Person to be placed in the preview. Only used to generate placement text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Participant {
    pub name: String,
    #[serde(default)]
    pub position: ParticipantPosition,
    #[serde(default)]
    pub emphasis: ParticipantEmphasis,
}

impl Participant {
    pub fn new(
        name: impl Into<String>,
        position: ParticipantPosition,
        emphasis: ParticipantEmphasis,
    ) -> Self {
        Self {
            name: name.into(),
            position,
            emphasis,
        }
    }
}

// =============================================================================
// Generation options
// =============================================================================

/// Caller-supplied generation options.
///
/// Out-of-range values are clamped by [`GenerationOptions::normalized`], never
/// rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOptions {
    /// 1 (subtle) ..= 10 (maximum impact).
    #[serde(default = "default_intensity")]
    pub clickbait_intensity: i32,
    /// 1 ..= 3 renditions per language.
    #[serde(default = "default_variation_count")]
    pub variation_count: i32,
    #[serde(default, deserialize_with = "lenient_option")]
    #[schemars(with = "Option<CreativeDirection>")]
    pub creative_direction: Option<CreativeDirection>,
    #[serde(default)]
    pub cost_tier: CostTier,
    /// How closely to follow the channel style, 0 ..= 100 percent.
    #[serde(default = "default_style_consistency")]
    pub style_consistency: i32,
    /// Empty means the video's detected language.
    #[serde(default)]
    pub target_languages: Vec<String>,
    #[serde(default)]
    pub face_swap_enabled: bool,
    #[serde(default, deserialize_with = "lenient_option")]
    #[schemars(with = "Option<CreatorType>")]
    pub creator_type: Option<CreatorType>,
    #[serde(default)]
    pub participants: Vec<Participant>,
}

fn default_intensity() -> i32 {
    5
}

fn default_variation_count() -> i32 {
    1
}

fn default_style_consistency() -> i32 {
    50
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            clickbait_intensity: default_intensity(),
            variation_count: default_variation_count(),
            creative_direction: None,
            cost_tier: CostTier::default(),
            style_consistency: default_style_consistency(),
            target_languages: Vec::new(),
            face_swap_enabled: false,
            creator_type: None,
            participants: Vec::new(),
        }
    }
}

impl GenerationOptions {
    /// Clamp every ranged field and deduplicate target languages.
    pub fn normalized(mut self) -> Self {
        self.clickbait_intensity = self.clickbait_intensity.clamp(MIN_INTENSITY, MAX_INTENSITY);
        self.variation_count = self.variation_count.clamp(MIN_VARIATIONS, MAX_VARIATIONS);
        self.style_consistency = self.style_consistency.clamp(0, MAX_STYLE_CONSISTENCY);

        let mut seen = std::collections::HashSet::new();
        self.target_languages = self
            .target_languages
            .iter()
            .map(|code| Language::from_code(code).code)
            .filter(|code| seen.insert(code.clone()))
            .collect();

        self.participants.retain(|p| !p.name.trim().is_empty());
        self
    }

    pub fn intensity(&self) -> u8 {
        self.clickbait_intensity.clamp(MIN_INTENSITY, MAX_INTENSITY) as u8
    }

    pub fn variation_count(&self) -> usize {
        self.variation_count.clamp(MIN_VARIATIONS, MAX_VARIATIONS) as usize
    }

    pub fn style_consistency(&self) -> u8 {
        self.style_consistency.clamp(0, MAX_STYLE_CONSISTENCY) as u8
    }

    /// Languages to generate for, falling back to the detected language.
    pub fn languages(&self, detected: &Language) -> Vec<Language> {
        if self.target_languages.is_empty() {
            return vec![detected.clone()];
        }
        self.target_languages
            .iter()
            .map(|code| Language::from_code(code))
            .collect()
    }
}
