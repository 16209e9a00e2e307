//! Deterministic prompt assembly.
//!
//! Everything here is pure string composition: the same inputs always
//! produce a byte-identical prompt.

use std::fmt;

use vthumb_models::{Language, StyleProfile, StyleVariation};

use super::cultural::cultural_hint;

const HARD_CONSTRAINTS: &[&str] = &[
    "No text, letters, numbers or captions anywhere in the image",
    "No user interface elements, play buttons, progress bars or borders",
    "No watermarks, logos or signatures",
    "Landscape 16:9 aspect ratio, subject readable at small sizes",
];

/// Clickbait intensity band, chosen by threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntensityBand {
    /// 1..=3
    Subtle,
    /// 4..=7
    Balanced,
    /// 8..=10
    MaximumImpact,
}

impl IntensityBand {
    pub fn from_intensity(intensity: u8) -> Self {
        match intensity {
            0..=3 => IntensityBand::Subtle,
            4..=7 => IntensityBand::Balanced,
            _ => IntensityBand::MaximumImpact,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IntensityBand::Subtle => "subtle",
            IntensityBand::Balanced => "balanced",
            IntensityBand::MaximumImpact => "maximum-impact",
        }
    }

    fn composition(&self) -> &'static str {
        match self {
            IntensityBand::Subtle => {
                "Natural, honest framing; subject at a comfortable distance; calm rule-of-thirds balance"
            }
            IntensityBand::Balanced => {
                "Clear focal subject filling about half the frame; one supporting element; gentle depth of field"
            }
            IntensityBand::MaximumImpact => {
                "Extreme close-up on the subject's face or key object; exaggerated expression; bold foreground-background separation"
            }
        }
    }

    fn lighting(&self) -> &'static str {
        match self {
            IntensityBand::Subtle => "Soft diffused daylight with realistic color",
            IntensityBand::Balanced => "Bright key light with a subtle rim light and lifted saturation",
            IntensityBand::MaximumImpact => {
                "High-contrast dramatic lighting, strong rim light and vivid saturated colors"
            }
        }
    }

    fn requirements(&self) -> &'static str {
        match self {
            IntensityBand::Subtle => "Understated and trustworthy; avoid sensational elements",
            IntensityBand::Balanced => "Eye-catching yet credible; one clear emotional cue",
            IntensityBand::MaximumImpact => {
                "Maximum curiosity and emotion; instantly stops the scroll"
            }
        }
    }
}

impl fmt::Display for IntensityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Inputs to [`assemble_prompt`].
#[derive(Debug, Clone, Copy)]
pub struct PromptInputs<'a> {
    pub scene: &'a str,
    pub variation: &'a StyleVariation,
    pub intensity: u8,
    pub language: &'a Language,
    pub style_profile: Option<&'a StyleProfile>,
}

/// Assemble the final image-generation prompt.
pub fn assemble_prompt(inputs: &PromptInputs<'_>) -> String {
    let band = IntensityBand::from_intensity(inputs.intensity);
    let variation = inputs.variation;

    let mut prompt = format!(
        r#"Create a video preview image.

SCENE:
{scene}

STYLE ({label}, emphasis on {emphasis}):
{directive}

COMPOSITION ({band}):
{composition}

LIGHTING:
{lighting}

REQUIREMENTS:
{requirements}

CULTURAL CONTEXT:
{cultural}
"#,
        scene = inputs.scene.trim(),
        label = variation.label,
        emphasis = variation.emphasis,
        directive = variation.style_directive,
        band = band,
        composition = band.composition(),
        lighting = band.lighting(),
        requirements = band.requirements(),
        cultural = cultural_hint(inputs.language),
    );

    if let Some(profile) = inputs.style_profile {
        prompt.push_str(&format!(
            r#"
CHANNEL STYLE:
Palette {palette}; {layout} layout; {font} visual weight; {tone} tone
"#,
            palette = profile.palette.join(", "),
            layout = profile.layout,
            font = profile.font_hint,
            tone = profile.tone,
        ));
    }

    prompt.push_str("\nHARD CONSTRAINTS:\n");
    for constraint in HARD_CONSTRAINTS {
        prompt.push_str("- ");
        prompt.push_str(constraint);
        prompt.push('\n');
    }

    prompt
}
