//! Generation pipeline entry point.
//!
//! Validates the request, clamps options once, resolves the face reference
//! and channel style, then hands off to the multi-language fan-out.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::watch;
use tracing::{warn, Instrument};
use validator::Validate;
use vthumb_analysis::{AnalysisConfig, ChannelStyleService, InMemoryPatternCache, PatternAnalyzer};
use vthumb_models::{
    ChannelDocument, GenerationOptions, GenerationReport, ReferenceThumbnail, RequestId,
    StyleProfile, VideoContext,
};
use vthumb_providers::{
    ChatCompleter, FaceApiClient, FaceDetector, FaceSwapper, HttpImageFetcher, ImageGenerator,
    OpenAiClient, ProviderResult,
};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::face_swap::{FaceReference, FaceSwapPostProcessor};
use crate::fanout::GenerationExecutor;
use crate::languages::{BatchInputs, LanguageFanOut};
use crate::logging::{RequestLogger, RequestShape};
use crate::metrics;
use crate::prompt::SceneComposer;

/// Provider handles the pipeline calls into.
#[derive(Clone)]
pub struct Providers {
    pub image: Arc<dyn ImageGenerator>,
    pub chat: Arc<dyn ChatCompleter>,
    pub face_detector: Option<Arc<dyn FaceDetector>>,
    pub face_swapper: Option<Arc<dyn FaceSwapper>>,
}

impl Providers {
    pub fn new(image: Arc<dyn ImageGenerator>, chat: Arc<dyn ChatCompleter>) -> Self {
        Self {
            image,
            chat,
            face_detector: None,
            face_swapper: None,
        }
    }

    pub fn with_faces(
        mut self,
        detector: Arc<dyn FaceDetector>,
        swapper: Arc<dyn FaceSwapper>,
    ) -> Self {
        self.face_detector = Some(detector);
        self.face_swapper = Some(swapper);
        self
    }

    /// Build HTTP clients from environment variables. The face provider is
    /// optional; without it face swap requests are served unswapped.
    pub fn from_env() -> ProviderResult<Self> {
        let openai = Arc::new(OpenAiClient::from_env()?);
        let providers = Self::new(openai.clone(), openai);

        match FaceApiClient::from_env() {
            Ok(faces) => {
                let faces = Arc::new(faces);
                Ok(providers.with_faces(faces.clone(), faces))
            }
            Err(e) => {
                warn!(error = %e, "Face provider not configured, face swap disabled");
                Ok(providers)
            }
        }
    }
}

/// A channel's history, analyzed into a style profile when no profile is given.
#[derive(Debug, Clone, Default)]
pub struct ChannelHistory {
    pub channel_id: String,
    pub documents: Vec<ChannelDocument>,
    pub thumbnails: Vec<ReferenceThumbnail>,
}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub context: VideoContext,
    pub options: GenerationOptions,
    pub style_profile: Option<StyleProfile>,
    pub channel: Option<ChannelHistory>,
    /// Candidate reference images (URLs or data URIs) used when the context
    /// carries no explicit reference image.
    pub screenshots: Vec<String>,
}

impl GenerationRequest {
    pub fn new(context: VideoContext, options: GenerationOptions) -> Self {
        Self {
            context,
            options,
            style_profile: None,
            channel: None,
            screenshots: Vec::new(),
        }
    }

    pub fn with_style_profile(mut self, profile: StyleProfile) -> Self {
        self.style_profile = Some(profile);
        self
    }

    pub fn with_channel(mut self, channel: ChannelHistory) -> Self {
        self.channel = Some(channel);
        self
    }

    pub fn with_screenshots(mut self, screenshots: Vec<String>) -> Self {
        self.screenshots = screenshots;
        self
    }
}

/// Validate the context. A bad title is fatal; a bad reference URL is dropped.
pub fn validate_context(mut context: VideoContext) -> EngineResult<VideoContext> {
    if context.title.trim().is_empty() {
        return Err(EngineError::invalid_input("title must not be empty"));
    }

    if let Err(errors) = context.validate() {
        let fields = errors.field_errors();
        if fields.contains_key("title") {
            return Err(EngineError::invalid_input(format!(
                "title must be between 1 and 500 characters (got {})",
                context.title.chars().count()
            )));
        }
        if fields.contains_key("reference_image_url") {
            warn!(
                reference_image_url = ?context.reference_image_url,
                "Ignoring invalid reference image URL"
            );
            context.reference_image_url = None;
        }
    }

    Ok(context)
}

async fn cancelled(mut cancel: watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            // Sender gone: cancellation can no longer be requested.
            std::future::pending::<()>().await;
        }
    }
}

#[derive(Clone)]
pub struct GenerationPipeline {
    fan_out: LanguageFanOut,
    face_swap: Option<FaceSwapPostProcessor>,
    style_service: Option<ChannelStyleService>,
}

impl GenerationPipeline {
    pub fn new(providers: Providers, config: EngineConfig) -> Self {
        let face_swap = match (providers.face_detector, providers.face_swapper) {
            (Some(detector), Some(swapper)) => {
                Some(FaceSwapPostProcessor::new(detector, swapper, &config))
            }
            _ => None,
        };

        let composer = SceneComposer::new(providers.chat, config.scene_max_words);
        let executor = GenerationExecutor::new(
            providers.image,
            config.max_concurrent_generations,
            config.generation_rps,
        );

        Self {
            fan_out: LanguageFanOut::new(composer, executor, face_swap.clone()),
            face_swap,
            style_service: None,
        }
    }

    pub fn with_style_service(mut self, service: ChannelStyleService) -> Self {
        self.style_service = Some(service);
        self
    }

    /// Build the pipeline, providers and channel analyzer from environment
    /// variables.
    pub fn from_env() -> EngineResult<Self> {
        let providers = Providers::from_env()?;
        let analysis = AnalysisConfig::from_env();
        let cache = Arc::new(InMemoryPatternCache::new(analysis.cache_ttl));
        let fetcher = Arc::new(HttpImageFetcher::from_env()?);
        let analyzer = PatternAnalyzer::new(fetcher, cache, analysis);

        Ok(Self::new(providers, EngineConfig::from_env())
            .with_style_service(ChannelStyleService::new(analyzer)))
    }

    pub async fn generate(&self, request: GenerationRequest) -> EngineResult<GenerationReport> {
        self.generate_with_cancel(request, None).await
    }

    /// Like [`generate`](Self::generate), aborting with `Cancelled` once
    /// `cancel` turns true. In-flight provider calls are dropped.
    pub async fn generate_with_cancel(
        &self,
        request: GenerationRequest,
        cancel: Option<watch::Receiver<bool>>,
    ) -> EngineResult<GenerationReport> {
        let request_id = RequestId::new();
        let logger = RequestLogger::new(&request_id);
        let span = logger.create_span();
        let start = Instant::now();

        let work = self.run(request_id, &logger, request).instrument(span);
        let result = match cancel {
            Some(cancel) => {
                tokio::select! {
                    biased;
                    _ = cancelled(cancel) => Err(EngineError::Cancelled),
                    result = work => result,
                }
            }
            None => work.await,
        };

        let latency_ms = start.elapsed().as_millis() as f64;
        match &result {
            Ok(report) => {
                metrics::record_request("ok", latency_ms);
                logger.finished(report, latency_ms);
            }
            Err(e) => {
                let status = match e {
                    EngineError::Cancelled => "cancelled",
                    _ => "failed",
                };
                metrics::record_request(status, latency_ms);
                logger.failed(e, latency_ms);
            }
        }

        result
    }

    async fn run(
        &self,
        request_id: RequestId,
        logger: &RequestLogger,
        request: GenerationRequest,
    ) -> EngineResult<GenerationReport> {
        let context = validate_context(request.context)?;
        let options = request.options.normalized();
        let languages = options.languages(&context.language);

        logger.started(RequestShape::new(&options, languages.len()), &context.title);

        let style_profile = match request.style_profile {
            Some(profile) => Some(profile),
            None => self.channel_profile(request.channel.as_ref(), logger).await,
        };

        let reference = if options.face_swap_enabled {
            self.resolve_reference(&context, &request.screenshots, logger)
                .await
        } else {
            None
        };

        let outcome = self
            .fan_out
            .run(
                &BatchInputs {
                    context: &context,
                    options: &options,
                    style_profile: style_profile.as_ref(),
                    reference: reference.as_ref(),
                },
                &languages,
            )
            .await?;

        Ok(GenerationReport {
            request_id,
            results: outcome.results,
            failures: outcome.failures,
        })
    }

    async fn channel_profile(
        &self,
        channel: Option<&ChannelHistory>,
        logger: &RequestLogger,
    ) -> Option<StyleProfile> {
        let (service, channel) = match (&self.style_service, channel) {
            (Some(service), Some(channel)) => (service, channel),
            _ => return None,
        };

        match service
            .analyze(&channel.channel_id, &channel.documents, &channel.thumbnails)
            .await
        {
            Ok(style) => Some(style.profile),
            Err(e) => {
                logger.warning(&format!("channel style unavailable: {}", e));
                None
            }
        }
    }

    async fn resolve_reference(
        &self,
        context: &VideoContext,
        screenshots: &[String],
        logger: &RequestLogger,
    ) -> Option<FaceReference> {
        let Some(processor) = &self.face_swap else {
            logger.warning("face swap requested but no face provider is configured");
            return None;
        };

        if let Some(url) = context.reference_image() {
            return processor.detect_reference(url).await;
        }

        if screenshots.is_empty() {
            logger.progress("face swap skipped: no reference image");
            return None;
        }

        let reference = processor.best_face_reference(screenshots).await;
        if let Some(found) = &reference {
            logger.progress(&format!(
                "reference face seeded from screenshot (confidence {:.2})",
                found.confidence
            ));
        }
        reference
    }
}
