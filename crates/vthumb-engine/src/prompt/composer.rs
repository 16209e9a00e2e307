//! Scene reasoning via the chat provider.
//!
//! Best effort: any failure falls back to the raw contextual summary so the
//! pipeline never blocks on this call.

use std::sync::Arc;

use tracing::{debug, warn};
use vthumb_models::{CreatorType, Language, Participant, StyleVariation, VideoContext};
use vthumb_providers::{ChatCompleter, ChatRequest};

use super::cultural::{creator_guidance, cultural_hint, participant_placement};
use crate::metrics;

const SCENE_SYSTEM_PROMPT: &str = "You are a visual director for video preview images. \
Describe one concrete, photographable scene in plain prose. \
Describe only what is visible. Never include written text, captions or logos.";

const MAX_DESCRIPTION_CHARS: usize = 300;
const MAX_TAGS: usize = 5;

/// Everything scene reasoning looks at for one task.
#[derive(Debug, Clone, Copy)]
pub struct SceneRequest<'a> {
    pub context: &'a VideoContext,
    pub variation: &'a StyleVariation,
    pub style_consistency: u8,
    pub language: &'a Language,
    pub creator_type: Option<CreatorType>,
    pub participants: &'a [Participant],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scene {
    pub description: String,
    /// False when the contextual summary was used as a fallback.
    pub refined: bool,
}

/// Title, trimmed description and leading tags as one line of text.
pub fn contextual_summary(context: &VideoContext) -> String {
    let mut summary = context.title.trim().to_string();

    let description = context.description.trim();
    if !description.is_empty() {
        let short: String = description.chars().take(MAX_DESCRIPTION_CHARS).collect();
        summary.push_str(". ");
        summary.push_str(&short);
    }

    let tags: Vec<&str> = context
        .tags
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .take(MAX_TAGS)
        .collect();
    if !tags.is_empty() {
        summary.push_str(". Topics: ");
        summary.push_str(&tags.join(", "));
    }

    summary
}

/// Keep at most `max_words` whitespace-separated words.
pub fn limit_words(text: &str, max_words: usize) -> String {
    text.split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Clone)]
pub struct SceneComposer {
    chat: Arc<dyn ChatCompleter>,
    max_words: usize,
}

impl SceneComposer {
    pub fn new(chat: Arc<dyn ChatCompleter>, max_words: usize) -> Self {
        Self {
            chat,
            max_words: max_words.max(1),
        }
    }

    fn user_prompt(&self, request: &SceneRequest<'_>) -> String {
        let participants = participant_placement(request.participants);
        let participants = if participants.is_empty() {
            "none specified".to_string()
        } else {
            participants
        };

        format!(
            r#"Video: {summary}
Style: {label} ({directive})
Follow the channel's established look at {consistency}% strength.
Audience: {cultural}
Creator: {creator}
People: {participants}

Describe the preview image scene in at most {max_words} words."#,
            summary = contextual_summary(request.context),
            label = request.variation.label,
            directive = request.variation.style_directive,
            consistency = request.style_consistency,
            cultural = cultural_hint(request.language),
            creator = creator_guidance(request.creator_type),
            participants = participants,
            max_words = self.max_words,
        )
    }

    /// Ask the chat provider for a scene; fall back to the summary on
    /// failure, empty output or truncation.
    pub async fn compose(&self, request: &SceneRequest<'_>) -> Scene {
        let chat_request = ChatRequest::new(SCENE_SYSTEM_PROMPT, self.user_prompt(request));

        let fallback_reason = match self.chat.complete(&chat_request).await {
            Ok(completion) if completion.truncated => "completion truncated".to_string(),
            Ok(completion) => {
                let description = limit_words(&completion.text, self.max_words);
                if description.is_empty() {
                    "empty completion".to_string()
                } else {
                    debug!(
                        language = %request.language,
                        variation = %request.variation.label,
                        "Scene refined"
                    );
                    metrics::record_scene(true);
                    return Scene {
                        description,
                        refined: true,
                    };
                }
            }
            Err(e) => e.to_string(),
        };

        warn!(
            language = %request.language,
            variation = %request.variation.label,
            reason = %fallback_reason,
            "Scene reasoning failed, using contextual summary"
        );
        metrics::record_scene(false);

        Scene {
            description: contextual_summary(request.context),
            refined: false,
        }
    }
}
