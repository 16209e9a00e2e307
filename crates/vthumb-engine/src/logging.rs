//! Request lifecycle logging and subscriber setup.
//!
//! Every generation request gets a span carrying its id, tier, variation
//! count and language count, and start/finish events with the planned task
//! total next to the actual result and failure counts.

use std::sync::OnceLock;

use tracing::field::Empty;
use tracing::{error, info, warn, Span};
use tracing_subscriber::{filter::Directive, fmt, prelude::*, EnvFilter};
use vthumb_models::{CostTier, GenerationOptions, GenerationReport, RequestId};

use crate::error::EngineError;

/// What a validated request will do: tier, renditions and languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RequestShape {
    pub tier: CostTier,
    pub variations: usize,
    pub languages: usize,
    pub face_swap: bool,
}

impl RequestShape {
    /// `options` must already be normalized.
    pub fn new(options: &GenerationOptions, languages: usize) -> Self {
        Self {
            tier: options.cost_tier,
            variations: options.variation_count(),
            languages,
            face_swap: options.face_swap_enabled,
        }
    }

    /// Generation tasks issued across all language batches.
    pub fn planned_tasks(&self) -> usize {
        self.variations * self.languages
    }
}

/// Lifecycle logging for one generation request.
///
/// The request shape is unknown until validation passes; once recorded it
/// is attached to every later event and to the request span.
#[derive(Debug, Clone)]
pub struct RequestLogger {
    request_id: String,
    shape: OnceLock<RequestShape>,
}

impl RequestLogger {
    pub fn new(request_id: &RequestId) -> Self {
        Self {
            request_id: request_id.to_string(),
            shape: OnceLock::new(),
        }
    }

    /// Span for the whole request. Shape fields are filled in by
    /// [`started`](Self::started).
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "generation_request",
            request_id = %self.request_id,
            tier = Empty,
            variations = Empty,
            languages = Empty,
        )
    }

    /// Record the shape and log the start. Must run inside the request span.
    pub fn started(&self, shape: RequestShape, title: &str) {
        if self.shape.set(shape).is_err() {
            warn!(request_id = %self.request_id, "Request shape recorded twice");
            return;
        }

        let span = Span::current();
        span.record("tier", shape.tier.as_str());
        span.record("variations", shape.variations);
        span.record("languages", shape.languages);

        info!(
            request_id = %self.request_id,
            tier = shape.tier.as_str(),
            variations = shape.variations,
            languages = shape.languages,
            face_swap = shape.face_swap,
            planned_tasks = shape.planned_tasks(),
            "Generation started: \"{}\"", title
        );
    }

    pub fn progress(&self, message: &str) {
        info!(request_id = %self.request_id, "Generation progress: {}", message);
    }

    pub fn warning(&self, message: &str) {
        warn!(request_id = %self.request_id, "Generation warning: {}", message);
    }

    pub fn finished(&self, report: &GenerationReport, latency_ms: f64) {
        let shape = self.shape();
        if !report.failures.is_empty() {
            warn!(
                request_id = %self.request_id,
                tier = shape.tier.as_str(),
                planned_tasks = shape.planned_tasks(),
                results = report.results.len(),
                failures = report.failures.len(),
                latency_ms = latency_ms,
                "Generation finished with failures"
            );
        } else {
            info!(
                request_id = %self.request_id,
                tier = shape.tier.as_str(),
                planned_tasks = shape.planned_tasks(),
                results = report.results.len(),
                latency_ms = latency_ms,
                "Generation finished"
            );
        }
    }

    pub fn failed(&self, err: &EngineError, latency_ms: f64) {
        let validated = self.shape.get().is_some();
        let shape = self.shape();

        match err {
            EngineError::Cancelled => warn!(
                request_id = %self.request_id,
                planned_tasks = shape.planned_tasks(),
                latency_ms = latency_ms,
                "Generation cancelled"
            ),
            _ => error!(
                request_id = %self.request_id,
                validated = validated,
                tier = shape.tier.as_str(),
                planned_tasks = shape.planned_tasks(),
                latency_ms = latency_ms,
                error = %err,
                "Generation failed"
            ),
        }
    }

    /// Recorded shape, or an empty one before validation.
    fn shape(&self) -> RequestShape {
        self.shape.get().copied().unwrap_or_default()
    }
}

/// Install the global tracing subscriber.
///
/// Loads `.env` first. `LOG_FORMAT=json` selects JSON output for production,
/// otherwise colored human-readable output. `RUST_LOG` extends the default
/// `vthumb=info` filter. Calling this twice is a no-op.
pub fn init_tracing() {
    dotenvy::dotenv().ok();

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let mut env_filter = EnvFilter::from_default_env();
    for directive in ["vthumb=info", "hyper=warn", "reqwest=warn"] {
        if let Ok(directive) = directive.parse::<Directive>() {
            env_filter = env_filter.add_directive(directive);
        }
    }

    let result = if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .try_init()
    };

    if result.is_ok() {
        info!(json = use_json, "Tracing initialized");
    }
}
