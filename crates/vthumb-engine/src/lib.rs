//! Preview image generation engine.
//!
//! This crate provides:
//! - Table-driven style variation selection
//! - Scene reasoning and deterministic prompt assembly
//! - Bounded, rate-limited generation fan-out with ordered fan-in
//! - Best-effort face swap post-processing
//! - Multi-language batches ranked by confidence
//! - The [`GenerationPipeline`] tying it together

pub mod config;
pub mod error;
pub mod face_swap;
pub mod fanout;
pub mod languages;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod prompt;
pub mod styles;

#[cfg(test)]
mod pipeline_tests;
#[cfg(test)]
mod test_support;

pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use face_swap::{FaceReference, FaceSwapPostProcessor, SwapOutcome};
pub use fanout::{FanOutReport, GeneratedImage, GenerationExecutor, PreparedTask};
pub use languages::{BatchInputs, LanguageFanOut, LanguageOutcome};
pub use logging::{init_tracing, RequestLogger, RequestShape};
pub use pipeline::{ChannelHistory, GenerationPipeline, GenerationRequest, Providers};
pub use styles::{plan_tasks, select_variations, STYLE_CATALOG};
