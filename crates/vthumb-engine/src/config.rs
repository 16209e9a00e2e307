//! Engine configuration.

use std::time::Duration;

/// Generation engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Image generation calls in flight at once
    pub max_concurrent_generations: usize,
    /// Image generation calls started per second
    pub generation_rps: u32,
    /// Deadline for detecting faces in the reference image
    pub face_detect_timeout: Duration,
    /// Deadline for one face swap (slower than detection)
    pub face_swap_timeout: Duration,
    /// Minimum detection confidence for a usable face
    pub face_confidence_threshold: f32,
    /// Upper bound on the scene description length
    pub scene_max_words: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_generations: 3,
            generation_rps: 5,
            face_detect_timeout: Duration::from_secs(60),
            face_swap_timeout: Duration::from_secs(120),
            face_confidence_threshold: 0.5,
            scene_max_words: 50,
        }
    }
}

impl EngineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_concurrent_generations: std::env::var("VTHUMB_MAX_CONCURRENT_GENERATIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.max_concurrent_generations),
            generation_rps: std::env::var("VTHUMB_GENERATION_RPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &u32| *n > 0)
                .unwrap_or(defaults.generation_rps),
            face_detect_timeout: std::env::var("VTHUMB_FACE_DETECT_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.face_detect_timeout),
            face_swap_timeout: std::env::var("VTHUMB_FACE_SWAP_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.face_swap_timeout),
            face_confidence_threshold: std::env::var("VTHUMB_FACE_CONFIDENCE_THRESHOLD")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|t: &f32| (0.0..=1.0).contains(t))
                .unwrap_or(defaults.face_confidence_threshold),
            scene_max_words: defaults.scene_max_words,
        }
    }
}
