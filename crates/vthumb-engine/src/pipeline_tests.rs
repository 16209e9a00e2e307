//! End-to-end tests for the generation pipeline against fake providers.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use vthumb_analysis::{
    AnalysisConfig, ChannelStyleService, InMemoryPatternCache, PatternAnalyzer,
};
use vthumb_models::{
    ChannelDocument, CostTier, CreativeDirection, GenerationOptions, GenerationReport,
    ImageQuality, ReferenceThumbnail, StyleProfile, VideoContext,
};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::pipeline::{ChannelHistory, GenerationPipeline, GenerationRequest, Providers};
use crate::test_support::{
    face, FakeChat, FakeFaceDetector, FakeFaceSwapper, FakeImageGenerator, SolidImageFetcher,
};

// =============================================================================
// Test Helpers
// =============================================================================

const TITLE: &str = "10 Tips for Faster Cooking";
const REFERENCE: &str = "https://cdn.test/me.jpg";

fn test_config() -> EngineConfig {
    EngineConfig {
        generation_rps: 100,
        ..EngineConfig::default()
    }
}

fn pipeline_with(generator: Arc<FakeImageGenerator>, chat: FakeChat) -> GenerationPipeline {
    GenerationPipeline::new(Providers::new(generator, Arc::new(chat)), test_config())
}

fn pipeline_with_faces(
    detector: Arc<FakeFaceDetector>,
    swapper: FakeFaceSwapper,
) -> GenerationPipeline {
    let providers = Providers::new(
        Arc::new(FakeImageGenerator::echo_prompt()),
        Arc::new(FakeChat::replying("A chef dicing onions at lightning speed")),
    )
    .with_faces(detector, Arc::new(swapper));
    GenerationPipeline::new(providers, test_config())
}

fn dynamic_options(count: i32) -> GenerationOptions {
    GenerationOptions {
        variation_count: count,
        creative_direction: Some(CreativeDirection::Dynamic),
        ..GenerationOptions::default()
    }
}

fn assert_sorted_by_confidence(report: &GenerationReport) {
    assert!(report
        .results
        .windows(2)
        .all(|pair| pair[0].confidence >= pair[1].confidence));
}

fn cooking_channel(thumbnails: usize) -> ChannelHistory {
    ChannelHistory {
        channel_id: "chan-cooking".to_string(),
        documents: vec![
            ChannelDocument::new("Easy pasta recipe", "Dinner in the kitchen #cooking"),
            ChannelDocument::new("Bread baking basics", "#cooking #baking"),
        ],
        thumbnails: (0..thumbnails)
            .map(|i| ReferenceThumbnail::new(format!("https://img.test/{i}.png")))
            .collect(),
    }
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn test_single_direction_two_variations() {
    let generator = Arc::new(FakeImageGenerator::echo_prompt());
    let pipeline = pipeline_with(generator.clone(), FakeChat::replying("A chef in motion"));

    let report = pipeline
        .generate(GenerationRequest::new(VideoContext::new(TITLE), dynamic_options(2)))
        .await
        .unwrap();

    assert_eq!(report.results.len(), 2);
    assert!(report.failures.is_empty());
    for result in &report.results {
        assert_eq!(result.label, "Dynamic");
        assert!(!result.face_swap_applied);
        assert!(result.scene_refined);
        assert_eq!(result.language, "en");
    }
    assert_eq!(report.results[0].variation_index, 0);
    assert!((report.results[0].confidence - 0.85).abs() < 1e-9);
    assert!((report.results[1].confidence - 0.80).abs() < 1e-9);
    assert_eq!(generator.requests().len(), 2);
}

#[tokio::test]
async fn test_two_languages_are_merged_and_sorted() {
    let pipeline = pipeline_with(
        Arc::new(FakeImageGenerator::echo_prompt()),
        FakeChat::replying("A chef in motion"),
    );
    let options = GenerationOptions {
        target_languages: vec!["en".into(), "es".into()],
        ..dynamic_options(2)
    };

    let report = pipeline
        .generate(GenerationRequest::new(VideoContext::new(TITLE), options))
        .await
        .unwrap();

    assert_eq!(report.results.len(), 4);
    for code in ["en", "es"] {
        let batch: Vec<_> = report.results_for_language(code).collect();
        assert_eq!(batch.len(), 2, "language {code}");
        assert!(batch.iter().all(|r| r.label == "Dynamic" && !r.face_swap_applied));
    }
    assert_sorted_by_confidence(&report);
    assert_eq!(report.results[0].language, "en");
    assert_eq!(report.results[1].language, "es");
}

#[tokio::test]
async fn test_face_swap_failure_degrades_gracefully() {
    let detector = Arc::new(FakeFaceDetector::with_faces(vec![face(0.93)]));
    let swapper = FakeFaceSwapper::failing();
    let pipeline = pipeline_with_faces(detector, swapper.clone());

    let context = VideoContext::new(TITLE).with_reference_image(REFERENCE);
    let options = GenerationOptions {
        face_swap_enabled: true,
        ..dynamic_options(2)
    };

    let report = pipeline
        .generate(GenerationRequest::new(context, options))
        .await
        .unwrap();

    assert_eq!(report.results.len(), 2);
    assert!(report.results.iter().all(|r| !r.face_swap_applied));
    assert!(report.results.iter().all(|r| r.label == "Dynamic"));
    assert_eq!(swapper.calls(), 2);
}

// =============================================================================
// Face swap
// =============================================================================

#[tokio::test]
async fn test_face_swap_success_labels_results() {
    let detector = Arc::new(FakeFaceDetector::with_faces(vec![face(0.3), face(0.88)]));
    let swapper = FakeFaceSwapper::succeeding();
    let pipeline = pipeline_with_faces(detector.clone(), swapper.clone());

    let context = VideoContext::new(TITLE).with_reference_image(REFERENCE);
    let options = GenerationOptions {
        face_swap_enabled: true,
        ..dynamic_options(2)
    };

    let report = pipeline
        .generate(GenerationRequest::new(context, options))
        .await
        .unwrap();

    assert!(report.results.iter().all(|r| r.face_swap_applied));
    assert!(report
        .results
        .iter()
        .all(|r| r.label == "Dynamic (with face swap)"));
    assert!(report.results[0].image_ref.to_uri().ends_with("#swapped"));
    assert!((report.results[0].confidence - 0.90).abs() < 1e-9);

    // Reference detection happens once per request.
    assert_eq!(detector.calls(), 1);
    assert_eq!(swapper.last_request().unwrap().face_index, 1);
}

#[tokio::test]
async fn test_face_swap_disabled_ignores_reference() {
    let detector = Arc::new(FakeFaceDetector::with_faces(vec![face(0.9)]));
    let swapper = FakeFaceSwapper::succeeding();
    let pipeline = pipeline_with_faces(detector.clone(), swapper.clone());

    let context = VideoContext::new(TITLE).with_reference_image(REFERENCE);
    let report = pipeline
        .generate(GenerationRequest::new(context, dynamic_options(1)))
        .await
        .unwrap();

    assert!(!report.results[0].face_swap_applied);
    assert_eq!(detector.calls(), 0);
    assert_eq!(swapper.calls(), 0);
}

#[tokio::test]
async fn test_reference_seeded_from_screenshots() {
    let detector = Arc::new(
        FakeFaceDetector::with_faces(Vec::new())
            .for_image("data:image/png;base64,AAAA", vec![face(0.7)])
            .for_image("https://cdn.test/shot-2.png", vec![face(0.95)]),
    );
    let swapper = FakeFaceSwapper::succeeding();
    let pipeline = pipeline_with_faces(detector, swapper.clone());

    let options = GenerationOptions {
        face_swap_enabled: true,
        ..dynamic_options(1)
    };
    let request = GenerationRequest::new(VideoContext::new(TITLE), options).with_screenshots(vec![
        "data:image/png;base64,AAAA".to_string(),
        "https://cdn.test/shot-2.png".to_string(),
    ]);

    let report = pipeline.generate(request).await.unwrap();
    assert!(report.results[0].face_swap_applied);
    assert_eq!(
        swapper.last_request().unwrap().source_image,
        "https://cdn.test/shot-2.png"
    );
}

#[tokio::test]
async fn test_face_swap_without_face_provider_is_unswapped() {
    let pipeline = pipeline_with(
        Arc::new(FakeImageGenerator::echo_prompt()),
        FakeChat::replying("A chef"),
    );
    let context = VideoContext::new(TITLE).with_reference_image(REFERENCE);
    let options = GenerationOptions {
        face_swap_enabled: true,
        ..dynamic_options(1)
    };

    let report = pipeline
        .generate(GenerationRequest::new(context, options))
        .await
        .unwrap();
    assert!(!report.results[0].face_swap_applied);
}

// =============================================================================
// Validation
// =============================================================================

#[tokio::test]
async fn test_invalid_title_is_rejected() {
    let pipeline = pipeline_with(
        Arc::new(FakeImageGenerator::echo_prompt()),
        FakeChat::replying("A chef"),
    );

    for title in ["".to_string(), "   ".to_string(), "x".repeat(501)] {
        let err = pipeline
            .generate(GenerationRequest::new(
                VideoContext::new(title),
                GenerationOptions::default(),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)), "got {err:?}");
    }
}

#[tokio::test]
async fn test_invalid_reference_url_is_dropped() {
    let detector = Arc::new(FakeFaceDetector::with_faces(vec![face(0.9)]));
    let pipeline = pipeline_with_faces(detector.clone(), FakeFaceSwapper::succeeding());

    let context = VideoContext::new(TITLE).with_reference_image("not a url");
    let options = GenerationOptions {
        face_swap_enabled: true,
        ..dynamic_options(1)
    };

    let report = pipeline
        .generate(GenerationRequest::new(context, options))
        .await
        .unwrap();
    assert_eq!(report.results.len(), 1);
    assert!(!report.results[0].face_swap_applied);
    assert_eq!(detector.calls(), 0);
}

#[tokio::test]
async fn test_out_of_range_options_are_clamped() {
    let generator = Arc::new(FakeImageGenerator::echo_prompt());
    let pipeline = pipeline_with(generator.clone(), FakeChat::replying("A chef"));
    let options = GenerationOptions {
        variation_count: 12,
        clickbait_intensity: 99,
        creative_direction: None,
        ..GenerationOptions::default()
    };

    let report = pipeline
        .generate(GenerationRequest::new(VideoContext::new(TITLE), options))
        .await
        .unwrap();

    let mut labels: Vec<_> = report.results.iter().map(|r| r.label.as_str()).collect();
    labels.sort_unstable();
    assert_eq!(labels, vec!["Dramatic", "Dynamic", "Minimal"]);
    assert!(report.results[0].prompt_used.contains("COMPOSITION (maximum-impact)"));
}

// =============================================================================
// Failure isolation
// =============================================================================

#[tokio::test]
async fn test_every_variation_failing_is_an_error() {
    let pipeline = pipeline_with(
        Arc::new(FakeImageGenerator::failing_when(|_| true)),
        FakeChat::replying("A chef"),
    );

    let err = pipeline
        .generate(GenerationRequest::new(VideoContext::new(TITLE), dynamic_options(2)))
        .await
        .unwrap_err();

    match err {
        EngineError::AllVariationsFailed { attempted, cause, .. } => {
            assert_eq!(attempted, 2);
            assert!(cause.contains("generation failed"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_failing_language_does_not_abort_others() {
    let generator = Arc::new(FakeImageGenerator::failing_when(|req| {
        req.prompt.contains("Spanish-speaking")
    }));
    let pipeline = pipeline_with(generator, FakeChat::replying("A chef"));
    let options = GenerationOptions {
        target_languages: vec!["en".into(), "es".into()],
        ..dynamic_options(2)
    };

    let report = pipeline
        .generate(GenerationRequest::new(VideoContext::new(TITLE), options))
        .await
        .unwrap();

    assert_eq!(report.results.len(), 2);
    assert!(report.results.iter().all(|r| r.language == "en"));
    assert_eq!(report.failures.len(), 2);
    assert!(report.failures.iter().all(|f| f.language == "es"));
}

#[tokio::test]
async fn test_scene_failure_falls_back_to_summary() {
    let pipeline = pipeline_with(
        Arc::new(FakeImageGenerator::echo_prompt()),
        FakeChat::failing(),
    );

    let report = pipeline
        .generate(GenerationRequest::new(VideoContext::new(TITLE), dynamic_options(1)))
        .await
        .unwrap();

    let result = &report.results[0];
    assert!(!result.scene_refined);
    assert!(report.has_degraded_results());
    assert!((result.confidence - 0.70).abs() < 1e-9);
    assert!(result.prompt_used.contains(TITLE));
}

#[tokio::test]
async fn test_cancel_signal_aborts_generation() {
    let generator = Arc::new(
        FakeImageGenerator::echo_prompt().with_delay(|_| Duration::from_secs(30)),
    );
    let pipeline = pipeline_with(generator, FakeChat::replying("A chef"));
    let (tx, rx) = watch::channel(false);

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        let _ = tx.send(true);
    });

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        pipeline.generate_with_cancel(
            GenerationRequest::new(VideoContext::new(TITLE), dynamic_options(2)),
            Some(rx),
        ),
    )
    .await
    .expect("cancellation should finish promptly");

    assert!(matches!(result, Err(EngineError::Cancelled)));
}

// =============================================================================
// Tiers and style
// =============================================================================

#[tokio::test]
async fn test_economy_tier_requests_standard_quality() {
    let generator = Arc::new(FakeImageGenerator::echo_prompt());
    let pipeline = pipeline_with(generator.clone(), FakeChat::replying("A chef"));
    let options = GenerationOptions {
        cost_tier: CostTier::Economy,
        ..dynamic_options(1)
    };

    pipeline
        .generate(GenerationRequest::new(VideoContext::new(TITLE), options))
        .await
        .unwrap();

    assert_eq!(generator.requests()[0].quality, ImageQuality::Standard);
    assert_eq!(generator.requests()[0].size, "1792x1024");
}

#[tokio::test]
async fn test_explicit_style_profile_is_used() {
    let pipeline = pipeline_with(
        Arc::new(FakeImageGenerator::echo_prompt()),
        FakeChat::replying("A chef"),
    );
    let profile = StyleProfile {
        style_id: "chan:cooking:centered".to_string(),
        palette: ["#AA0000".into(), "#FFFFFF".into(), "#111111".into()],
        layout: "centered".to_string(),
        font_hint: "heavy".to_string(),
        tone: "warm".to_string(),
    };

    let report = pipeline
        .generate(
            GenerationRequest::new(VideoContext::new(TITLE), dynamic_options(1))
                .with_style_profile(profile),
        )
        .await
        .unwrap();

    assert!(report.results[0].prompt_used.contains("Palette #AA0000"));
}

fn pipeline_with_style_service() -> GenerationPipeline {
    let analyzer = PatternAnalyzer::new(
        Arc::new(SolidImageFetcher::new([240, 140, 20])),
        Arc::new(InMemoryPatternCache::new(Duration::from_secs(3600))),
        AnalysisConfig::default(),
    );
    pipeline_with(
        Arc::new(FakeImageGenerator::echo_prompt()),
        FakeChat::replying("A chef"),
    )
    .with_style_service(ChannelStyleService::new(analyzer))
}

#[tokio::test]
async fn test_channel_history_derives_style_profile() {
    let request = GenerationRequest::new(VideoContext::new(TITLE), dynamic_options(1))
        .with_channel(cooking_channel(3));

    let report = pipeline_with_style_service().generate(request).await.unwrap();

    let prompt = &report.results[0].prompt_used;
    assert!(prompt.contains("CHANNEL STYLE"));
    assert!(prompt.contains("#F08C14"));
}

#[tokio::test]
async fn test_channel_analysis_failure_is_not_fatal() {
    let request = GenerationRequest::new(VideoContext::new(TITLE), dynamic_options(1))
        .with_channel(cooking_channel(1));

    let report = pipeline_with_style_service().generate(request).await.unwrap();
    assert_eq!(report.results.len(), 1);
    assert!(!report.results[0].prompt_used.contains("CHANNEL STYLE"));
}
