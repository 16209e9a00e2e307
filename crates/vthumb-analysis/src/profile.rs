//! Style profile derivation.

use vthumb_models::{ChannelDictionary, ChannelPattern, StyleProfile};

use crate::dictionary::DEFAULT_NICHE;

/// Padding used when a channel shows fewer than three distinct colours.
const NEUTRAL_PALETTE: [&str; 3] = ["#FFFFFF", "#111111", "#808080"];
const DEFAULT_LAYOUT: &str = "balanced";

fn font_hint(text_style: Option<&str>) -> &'static str {
    match text_style {
        Some("top-banner") | Some("bottom-banner") => "bold sans-serif caption band",
        Some("top-and-bottom") => "heavy outlined meme-style type",
        Some("bold-center") => "oversized condensed display type",
        _ => "minimal or no typography",
    }
}

fn tone(niche: &str) -> &'static str {
    match niche {
        "gaming" => "energetic and saturated",
        "cooking" => "warm and inviting",
        "tech" => "clean and modern",
        "fitness" => "intense and motivating",
        "education" => "clear and trustworthy",
        "music" => "moody and expressive",
        "business" => "confident and professional",
        "vlog" => "personal and candid",
        "beauty" => "polished and glamorous",
        _ => "neutral and approachable",
    }
}

/// Summarize a channel's dictionary and visual pattern.
pub fn derive_profile(
    dictionary: Option<&ChannelDictionary>,
    pattern: &ChannelPattern,
) -> StyleProfile {
    let mut colors: Vec<String> = Vec::with_capacity(3);
    for color in pattern.color_palettes.iter().flat_map(|p| p.colors.iter()) {
        if colors.len() == 3 {
            break;
        }
        if !colors.contains(color) {
            colors.push(color.clone());
        }
    }
    for fallback in NEUTRAL_PALETTE {
        if colors.len() == 3 {
            break;
        }
        if !colors.iter().any(|c| c == fallback) {
            colors.push(fallback.to_string());
        }
    }
    let palette = [colors[0].clone(), colors[1].clone(), colors[2].clone()];

    let layout = pattern
        .dominant_layout()
        .map(|l| l.name.clone())
        .unwrap_or_else(|| DEFAULT_LAYOUT.to_string());
    let niche = dictionary.map(|d| d.niche.as_str()).unwrap_or(DEFAULT_NICHE);

    StyleProfile {
        style_id: format!("{}:{}:{}", pattern.channel_id, niche, layout),
        palette,
        layout,
        font_hint: font_hint(pattern.dominant_text_style().map(|t| t.name.as_str())).to_string(),
        tone: tone(niche).to_string(),
    }
}
