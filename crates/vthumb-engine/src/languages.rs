//! Multi-language fan-out and confidence ranking.
//!
//! Each target language runs its own batch (styles, scenes, prompts,
//! generation, face swap). Batches run concurrently and are isolated: one
//! language failing never aborts the others.

use futures::future::join_all;
use tracing::{info, info_span, warn, Instrument};
use vthumb_models::generation::FACE_SWAP_LABEL_SUFFIX;
use vthumb_models::{
    GenerationOptions, GenerationResult, Language, StyleProfile, TaskFailure, VideoContext,
};

use crate::error::{EngineError, EngineResult};
use crate::face_swap::{FaceReference, FaceSwapPostProcessor, SwapOutcome};
use crate::fanout::{GenerationExecutor, PreparedTask};
use crate::prompt::{assemble_prompt, has_cultural_hint, PromptInputs, SceneComposer, SceneRequest};
use crate::styles::{plan_tasks, select_variations};

const REFINED_BASE: f64 = 0.85;
const FALLBACK_BASE: f64 = 0.70;
const FACE_SWAP_BONUS: f64 = 0.05;
const RANK_PENALTY: f64 = 0.05;

const DETECTED_LANGUAGE_WEIGHT: f64 = 1.0;
const CULTURAL_LANGUAGE_WEIGHT: f64 = 0.95;
const OTHER_LANGUAGE_WEIGHT: f64 = 0.85;

/// How well the pipeline is expected to serve `language`.
pub fn language_weight(language: &Language, detected: &Language) -> f64 {
    if language.code == detected.code {
        DETECTED_LANGUAGE_WEIGHT
    } else if has_cultural_hint(language) {
        CULTURAL_LANGUAGE_WEIGHT
    } else {
        OTHER_LANGUAGE_WEIGHT
    }
}

/// Confidence for one result, in [0, 1].
pub fn result_confidence(
    scene_refined: bool,
    face_swapped: bool,
    rank: usize,
    language_weight: f64,
) -> f64 {
    let mut score = if scene_refined {
        REFINED_BASE
    } else {
        FALLBACK_BASE
    };
    if face_swapped {
        score += FACE_SWAP_BONUS;
    }
    score -= RANK_PENALTY * rank as f64;
    (score * language_weight).clamp(0.0, 1.0)
}

/// Request-wide inputs shared by every language batch.
#[derive(Debug, Clone, Copy)]
pub struct BatchInputs<'a> {
    pub context: &'a VideoContext,
    pub options: &'a GenerationOptions,
    pub style_profile: Option<&'a StyleProfile>,
    pub reference: Option<&'a FaceReference>,
}

#[derive(Debug, Clone, Default)]
pub struct LanguageOutcome {
    pub results: Vec<GenerationResult>,
    pub failures: Vec<TaskFailure>,
}

#[derive(Clone)]
pub struct LanguageFanOut {
    composer: SceneComposer,
    executor: GenerationExecutor,
    face_swap: Option<FaceSwapPostProcessor>,
}

impl LanguageFanOut {
    pub fn new(
        composer: SceneComposer,
        executor: GenerationExecutor,
        face_swap: Option<FaceSwapPostProcessor>,
    ) -> Self {
        Self {
            composer,
            executor,
            face_swap,
        }
    }

    /// Run every language and merge results sorted by confidence descending.
    pub async fn run(
        &self,
        inputs: &BatchInputs<'_>,
        languages: &[Language],
    ) -> EngineResult<LanguageOutcome> {
        let batches = languages.iter().map(|language| {
            let span = info_span!("language_batch", language = %language);
            self.run_language(inputs, language).instrument(span)
        });
        let outcomes = join_all(batches).await;

        let mut merged = LanguageOutcome::default();
        for (language, outcome) in languages.iter().zip(outcomes) {
            match outcome {
                Ok(outcome) => {
                    merged.results.extend(outcome.results);
                    merged.failures.extend(outcome.failures);
                }
                Err(EngineError::AllVariationsFailed { failures, .. }) => {
                    warn!(language = %language, failed = failures.len(), "Language batch failed");
                    merged.failures.extend(failures);
                }
                Err(e) => {
                    warn!(language = %language, error = %e, "Language batch failed");
                    merged.failures.push(TaskFailure {
                        index: 0,
                        label: "batch".to_string(),
                        language: language.code.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        if merged.results.is_empty() {
            return Err(EngineError::all_failed(merged.failures));
        }

        merged
            .results
            .sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        Ok(merged)
    }

    /// Run one language batch end to end.
    pub async fn run_language(
        &self,
        inputs: &BatchInputs<'_>,
        language: &Language,
    ) -> EngineResult<LanguageOutcome> {
        let options = inputs.options;
        let styles = select_variations(options.creative_direction, options.variation_count());
        let tasks = plan_tasks(&styles, options.variation_count(), language);

        let prepared = join_all(tasks.into_iter().map(|task| async move {
            let scene = self
                .composer
                .compose(&SceneRequest {
                    context: inputs.context,
                    variation: &task.variation,
                    style_consistency: options.style_consistency(),
                    language,
                    creator_type: options.creator_type,
                    participants: &options.participants,
                })
                .await;

            let prompt = assemble_prompt(&PromptInputs {
                scene: &scene.description,
                variation: &task.variation,
                intensity: options.intensity(),
                language,
                style_profile: inputs.style_profile,
            });

            PreparedTask {
                task,
                prompt,
                scene_refined: scene.refined,
            }
        }))
        .await;

        let report = self.executor.execute(prepared, options.cost_tier).await?;

        let swap = match (&self.face_swap, inputs.reference) {
            (Some(processor), Some(reference)) if options.face_swap_enabled => {
                Some((processor, reference))
            }
            _ => None,
        };

        let outcomes = join_all(report.images.into_iter().map(|generated| async move {
            let outcome = match swap {
                Some((processor, reference)) => {
                    processor.swap_into(reference, generated.image).await
                }
                None => SwapOutcome {
                    image: generated.image,
                    applied: false,
                },
            };
            (generated.task, outcome)
        }))
        .await;

        let weight = language_weight(language, &inputs.context.language);
        let results: Vec<GenerationResult> = outcomes
            .into_iter()
            .map(|(prepared, outcome)| {
                let index = prepared.task.index;
                let mut label = prepared.task.variation.label.clone();
                if outcome.applied {
                    label.push_str(FACE_SWAP_LABEL_SUFFIX);
                }
                GenerationResult {
                    image_ref: outcome.image,
                    label,
                    language: language.code.clone(),
                    prompt_used: prepared.prompt,
                    confidence: result_confidence(
                        prepared.scene_refined,
                        outcome.applied,
                        index,
                        weight,
                    ),
                    face_swap_applied: outcome.applied,
                    scene_refined: prepared.scene_refined,
                    variation_index: index,
                }
            })
            .collect();

        info!(
            language = %language,
            results = results.len(),
            failed = report.failures.len(),
            face_swapped = results.iter().filter(|r| r.face_swap_applied).count(),
            "Language batch complete"
        );

        Ok(LanguageOutcome {
            results,
            failures: report.failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_weights() {
        let detected = Language::from_code("en");
        assert_eq!(language_weight(&Language::from_code("en-GB"), &detected), 1.0);
        assert_eq!(language_weight(&Language::from_code("es"), &detected), 0.95);
        assert_eq!(language_weight(&Language::from_code("sw"), &detected), 0.85);
    }

    #[test]
    fn test_confidence_model() {
        assert!((result_confidence(true, false, 0, 1.0) - 0.85).abs() < 1e-9);
        assert!((result_confidence(false, false, 0, 1.0) - 0.70).abs() < 1e-9);
        assert!((result_confidence(true, true, 0, 1.0) - 0.90).abs() < 1e-9);
        assert!((result_confidence(true, false, 2, 1.0) - 0.75).abs() < 1e-9);
        assert!((result_confidence(true, false, 0, 0.95) - 0.8075).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_is_clamped() {
        assert_eq!(result_confidence(false, false, 40, 1.0), 0.0);
        assert!(result_confidence(true, true, 0, 2.0) <= 1.0);
    }
}
