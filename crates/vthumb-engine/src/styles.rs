//! Style variation catalog and task planning.
//!
//! Selection is a pure table lookup; nothing here is generated at runtime.

use vthumb_models::{CreativeDirection, GenerationTask, Language, StyleVariation};

/// One catalog row.
#[derive(Debug, Clone, Copy)]
pub struct StyleEntry {
    pub direction: CreativeDirection,
    pub label: &'static str,
    pub emphasis: &'static str,
    pub directive: &'static str,
}

impl StyleEntry {
    pub fn to_variation(&self) -> StyleVariation {
        StyleVariation::new(self.label, self.emphasis, self.directive)
    }
}

pub const STYLE_CATALOG: &[StyleEntry] = &[
    StyleEntry {
        direction: CreativeDirection::Dynamic,
        label: "Dynamic",
        emphasis: "energy and motion",
        directive: "high-energy composition with diagonal lines, motion cues and saturated, punchy colors",
    },
    StyleEntry {
        direction: CreativeDirection::Minimal,
        label: "Minimal",
        emphasis: "clarity and negative space",
        directive: "clean minimalist composition with a single focal subject, generous negative space and a restrained palette",
    },
    StyleEntry {
        direction: CreativeDirection::Dramatic,
        label: "Dramatic",
        emphasis: "tension and contrast",
        directive: "cinematic lighting with deep shadows, strong contrast and an emotionally charged moment",
    },
    StyleEntry {
        direction: CreativeDirection::Playful,
        label: "Playful",
        emphasis: "fun and warmth",
        directive: "bright cheerful colors, exaggerated expressions and a lighthearted, whimsical scene",
    },
    StyleEntry {
        direction: CreativeDirection::Business,
        label: "Business",
        emphasis: "trust and professionalism",
        directive: "polished professional setting, confident subject, even lighting and a corporate color palette",
    },
    StyleEntry {
        direction: CreativeDirection::Gaming,
        label: "Gaming",
        emphasis: "action and spectacle",
        directive: "vivid neon accents, in-game action energy, glowing highlights and an epic sense of scale",
    },
    StyleEntry {
        direction: CreativeDirection::Educational,
        label: "Educational",
        emphasis: "curiosity and understanding",
        directive: "clear explanatory visual, an approachable presenter and a well-organized scene that hints at the lesson",
    },
];

/// Catalog order used when no direction is given.
pub const DEFAULT_ORDER: &[CreativeDirection] = &[
    CreativeDirection::Dynamic,
    CreativeDirection::Minimal,
    CreativeDirection::Dramatic,
];

pub fn catalog_entry(direction: CreativeDirection) -> Option<&'static StyleEntry> {
    STYLE_CATALOG.iter().find(|e| e.direction == direction)
}

/// Resolve which styles to render.
///
/// An explicit direction yields exactly that style regardless of
/// `variation_count`. Otherwise the first `variation_count` (clamped to 1..=3)
/// entries of the default order are returned.
pub fn select_variations(
    direction: Option<CreativeDirection>,
    variation_count: usize,
) -> Vec<StyleVariation> {
    if let Some(entry) = direction.and_then(catalog_entry) {
        return vec![entry.to_variation()];
    }

    DEFAULT_ORDER
        .iter()
        .take(variation_count.clamp(1, DEFAULT_ORDER.len()))
        .filter_map(|d| catalog_entry(*d))
        .map(StyleEntry::to_variation)
        .collect()
}

/// Expand styles into `count` indexed tasks for one language, cycling the
/// styles when there are fewer than `count`.
pub fn plan_tasks(
    styles: &[StyleVariation],
    count: usize,
    language: &Language,
) -> Vec<GenerationTask> {
    if styles.is_empty() {
        return Vec::new();
    }

    styles
        .iter()
        .cycle()
        .take(count.max(styles.len()))
        .enumerate()
        .map(|(index, variation)| GenerationTask {
            index,
            variation: variation.clone(),
            language: language.clone(),
        })
        .collect()
}
