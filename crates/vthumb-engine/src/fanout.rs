//! Generation fan-out executor.
//!
//! Issues every task of a batch concurrently, bounded by a semaphore and a
//! rate limiter, waits for all of them to settle and returns images in input
//! order. Individual failures are recorded; only a batch where every task
//! failed is an error.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use vthumb_models::{CostTier, GenerationTask, ImageRef, TaskFailure};
use vthumb_providers::{ImageGenerationRequest, ImageGenerator, ProviderError, ProviderResult};

use crate::error::{EngineError, EngineResult};
use crate::metrics;

pub type GenerationRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// A task with its assembled prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedTask {
    pub task: GenerationTask,
    pub prompt: String,
    pub scene_refined: bool,
}

/// A successfully generated image and the task it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedImage {
    pub task: PreparedTask,
    pub image: ImageRef,
}

#[derive(Debug, Clone, Default)]
pub struct FanOutReport {
    /// Successful images, in input order.
    pub images: Vec<GeneratedImage>,
    pub failures: Vec<TaskFailure>,
}

#[derive(Clone)]
pub struct GenerationExecutor {
    generator: Arc<dyn ImageGenerator>,
    semaphore: Arc<Semaphore>,
    limiter: Arc<GenerationRateLimiter>,
}

impl GenerationExecutor {
    pub fn new(
        generator: Arc<dyn ImageGenerator>,
        max_concurrent: usize,
        requests_per_second: u32,
    ) -> Self {
        let rps = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::per_second(rps);
        Self {
            generator,
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// Run all tasks at the quality mapped from `tier`.
    ///
    /// Dropping the returned future aborts every in-flight call.
    pub async fn execute(
        &self,
        tasks: Vec<PreparedTask>,
        tier: CostTier,
    ) -> EngineResult<FanOutReport> {
        if tasks.is_empty() {
            return Ok(FanOutReport::default());
        }

        let quality = tier.quality();
        let start = Instant::now();
        let total = tasks.len();

        let outcomes = join_all(tasks.iter().map(|task| {
            let request = ImageGenerationRequest::new(task.prompt.clone(), quality);
            async move { self.generate_one(&request).await }
        }))
        .await;

        let mut report = FanOutReport::default();
        for (task, outcome) in tasks.into_iter().zip(outcomes) {
            match outcome {
                Ok(image) => {
                    metrics::record_task(true);
                    debug!(
                        index = task.task.index,
                        variation = %task.task.variation.label,
                        language = %task.task.language,
                        "Variation generated"
                    );
                    report.images.push(GeneratedImage { task, image });
                }
                Err(e) => {
                    metrics::record_task(false);
                    warn!(
                        index = task.task.index,
                        variation = %task.task.variation.label,
                        language = %task.task.language,
                        error = %e,
                        "Variation failed"
                    );
                    report.failures.push(TaskFailure {
                        index: task.task.index,
                        label: task.task.variation.label.clone(),
                        language: task.task.language.code.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            total = total,
            succeeded = report.images.len(),
            failed = report.failures.len(),
            quality = %quality,
            duration_ms = start.elapsed().as_millis() as u64,
            "Generation fan-out complete"
        );

        if report.images.is_empty() {
            return Err(EngineError::all_failed(report.failures));
        }

        Ok(report)
    }

    async fn generate_one(&self, request: &ImageGenerationRequest) -> ProviderResult<ImageRef> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| ProviderError::unavailable("generation semaphore closed"))?;
        self.limiter.until_ready().await;
        self.generator.generate(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeImageGenerator;
    use std::time::Duration;
    use vthumb_models::{ImageQuality, Language, StyleVariation};

    fn prepared(index: usize, label: &str) -> PreparedTask {
        PreparedTask {
            task: GenerationTask {
                index,
                variation: StyleVariation::new(label, "e", "d"),
                language: Language::from_code("en"),
            },
            prompt: format!("prompt for {label}"),
            scene_refined: true,
        }
    }

    #[tokio::test]
    async fn test_preserves_input_order_under_varying_latency() {
        let generator = Arc::new(
            FakeImageGenerator::echo_prompt().with_delay(|req| {
                if req.prompt.ends_with("A") {
                    Duration::from_millis(60)
                } else if req.prompt.ends_with("B") {
                    Duration::from_millis(20)
                } else {
                    Duration::ZERO
                }
            }),
        );
        let executor = GenerationExecutor::new(generator, 3, 100);

        let report = executor
            .execute(
                vec![prepared(0, "A"), prepared(1, "B"), prepared(2, "C")],
                CostTier::Standard,
            )
            .await
            .unwrap();

        let labels: Vec<_> = report
            .images
            .iter()
            .map(|g| g.task.task.variation.label.as_str())
            .collect();
        assert_eq!(labels, vec!["A", "B", "C"]);
        for generated in &report.images {
            assert_eq!(generated.image.to_uri(), format!("gen://{}", generated.task.prompt));
        }
    }

    #[tokio::test]
    async fn test_tier_maps_to_quality() {
        let generator = Arc::new(FakeImageGenerator::echo_prompt());
        let executor = GenerationExecutor::new(generator.clone(), 3, 100);

        executor.execute(vec![prepared(0, "A")], CostTier::Economy).await.unwrap();
        executor.execute(vec![prepared(0, "A")], CostTier::Premium).await.unwrap();

        let qualities: Vec<_> = generator.requests().iter().map(|r| r.quality).collect();
        assert_eq!(qualities, vec![ImageQuality::Standard, ImageQuality::Hd]);
    }

    #[tokio::test]
    async fn test_partial_failure_is_recorded() {
        let generator = Arc::new(FakeImageGenerator::failing_when(|req| req.prompt.ends_with("B")));
        let executor = GenerationExecutor::new(generator, 3, 100);

        let report = executor
            .execute(
                vec![prepared(0, "A"), prepared(1, "B"), prepared(2, "C")],
                CostTier::Standard,
            )
            .await
            .unwrap();

        assert_eq!(report.images.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].index, 1);
        assert_eq!(report.failures[0].label, "B");
    }

    #[tokio::test]
    async fn test_all_failed_carries_first_cause() {
        let generator = Arc::new(FakeImageGenerator::failing_when(|_| true));
        let executor = GenerationExecutor::new(generator, 3, 100);

        let err = executor
            .execute(vec![prepared(0, "A"), prepared(1, "B")], CostTier::Standard)
            .await
            .unwrap_err();

        match err {
            EngineError::AllVariationsFailed { attempted, cause, failures } => {
                assert_eq!(attempted, 2);
                assert_eq!(failures.len(), 2);
                assert!(cause.contains("prompt for A"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let generator = Arc::new(
            FakeImageGenerator::echo_prompt().with_delay(|_| Duration::from_millis(20)),
        );
        let executor = GenerationExecutor::new(generator.clone(), 2, 100);

        let tasks = (0..5).map(|i| prepared(i, &format!("T{i}"))).collect();
        let report = executor.execute(tasks, CostTier::Standard).await.unwrap();

        assert_eq!(report.images.len(), 5);
        assert!(generator.max_in_flight() <= 2);
    }

    #[tokio::test]
    async fn test_empty_batch_is_ok() {
        let executor = GenerationExecutor::new(Arc::new(FakeImageGenerator::echo_prompt()), 3, 5);
        let report = executor.execute(Vec::new(), CostTier::Standard).await.unwrap();
        assert!(report.images.is_empty());
        assert!(report.failures.is_empty());
    }
}
