//! Cultural context, creator-type guidance and participant placement text.

use vthumb_models::{CreatorType, Language, Participant};

/// Visual conventions per language, keyed by primary subtag.
const CULTURAL_HINTS: &[(&str, &str)] = &[
    ("en", "Western audience; bold expressive faces and high-contrast focal points perform well"),
    ("es", "Spanish-speaking audience; warm vibrant colors and expressive, emotional people"),
    ("pt", "Portuguese-speaking audience; energetic, colorful and friendly imagery"),
    ("fr", "French audience; elegant composition and refined, natural color grading"),
    ("de", "German audience; clear structure, precise detail and credible realism"),
    ("it", "Italian audience; rich warm tones, lifestyle and craftsmanship cues"),
    ("ja", "Japanese audience; clean bright aesthetics, detailed scenes and cute accents where fitting"),
    ("ko", "Korean audience; polished bright visuals and trendy, stylish subjects"),
    ("zh", "Chinese audience; auspicious red and gold accents and dense, busy compositions"),
    ("hi", "Indian audience; saturated festive colors and strong, expressive faces"),
    ("ar", "Arabic-speaking audience; right-to-left reading flow, modest attire and warm gold tones"),
    ("ru", "Russian-speaking audience; dramatic contrast and bold, direct subjects"),
    ("tr", "Turkish audience; warm colors and lively, social scenes"),
    ("id", "Indonesian audience; bright tropical colors and friendly, approachable subjects"),
];

const RTL_NOTE: &str =
    "Audience reads right-to-left: place the primary subject on the right and lead the eye leftward";

/// Whether the language has a dedicated cultural entry.
pub fn has_cultural_hint(language: &Language) -> bool {
    CULTURAL_HINTS.iter().any(|(code, _)| *code == language.code)
}

/// Cultural-context hint for a language. Unknown languages get a neutral hint.
pub fn cultural_hint(language: &Language) -> String {
    let base = CULTURAL_HINTS
        .iter()
        .find(|(code, _)| *code == language.code)
        .map(|(_, hint)| (*hint).to_string())
        .unwrap_or_else(|| {
            format!(
                "Audience language '{}'; universally readable imagery without culture-specific symbols",
                language.code
            )
        });

    if language.is_rtl() {
        format!("{base}. {RTL_NOTE}")
    } else {
        base
    }
}

pub fn creator_guidance(creator: Option<CreatorType>) -> &'static str {
    match creator {
        Some(CreatorType::Gaming) => "Gaming creator: show gameplay energy, the creator's reaction and in-game elements",
        Some(CreatorType::Education) => "Education creator: make the topic instantly recognizable and spark curiosity",
        Some(CreatorType::Tech) => "Tech creator: feature the device or product crisply with a clean modern backdrop",
        Some(CreatorType::Cooking) => "Cooking creator: appetizing close-up of the finished dish with visible texture and steam",
        Some(CreatorType::Fitness) => "Fitness creator: athletic body in motion, visible effort and an energetic setting",
        Some(CreatorType::Vlog) => "Vlog creator: authentic personal moment in an interesting location",
        Some(CreatorType::Business) => "Business creator: confident presenter with a hint of growth or success",
        Some(CreatorType::Music) => "Music creator: performer with an instrument and atmospheric stage lighting",
        Some(CreatorType::Entertainment) => "Entertainment creator: exaggerated reaction and a surprising visual hook",
        None => "General creator: one clear subject that tells the story at a glance",
    }
}

/// Placement text for participants, empty when there are none.
pub fn participant_placement(participants: &[Participant]) -> String {
    participants
        .iter()
        .map(|p| {
            format!(
                "{} positioned {} as a {} subject",
                p.name.trim(),
                p.position.as_str(),
                p.emphasis.as_str()
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use vthumb_models::{ParticipantEmphasis, ParticipantPosition};

    #[test]
    fn test_known_and_unknown_languages() {
        assert!(has_cultural_hint(&Language::from_code("es-MX")));
        assert!(cultural_hint(&Language::from_code("es")).contains("Spanish"));

        let sw = Language::from_code("sw");
        assert!(!has_cultural_hint(&sw));
        assert!(cultural_hint(&sw).contains("'sw'"));
    }

    #[test]
    fn test_rtl_languages_get_reading_note() {
        assert!(cultural_hint(&Language::from_code("ar")).contains("right-to-left reading flow"));
        assert!(cultural_hint(&Language::from_code("he")).contains(RTL_NOTE));
        assert!(!cultural_hint(&Language::from_code("en")).contains(RTL_NOTE));
    }

    #[test]
    fn test_participant_placement() {
        assert_eq!(participant_placement(&[]), "");

        let text = participant_placement(&[
            Participant::new("Ana", ParticipantPosition::Left, ParticipantEmphasis::Primary),
            Participant::new("Bo", ParticipantPosition::Right, ParticipantEmphasis::Background),
        ]);
        assert_eq!(
            text,
            "Ana positioned left as a primary subject; Bo positioned right as a background subject"
        );
    }

    #[test]
    fn test_creator_guidance_defaults() {
        assert!(creator_guidance(Some(CreatorType::Cooking)).contains("dish"));
        assert!(creator_guidance(None).starts_with("General"));
    }
}
