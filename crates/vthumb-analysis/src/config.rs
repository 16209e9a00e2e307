//! Analyzer configuration.

use std::time::Duration;

/// Fewest thumbnails a pattern analysis accepts.
pub const MIN_SAMPLE_SIZE: usize = 3;

/// Default cache lifetime for channel patterns.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Pattern analyzer configuration.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// How long a cached channel pattern is trusted.
    pub cache_ttl: Duration,
    pub min_sample_size: usize,
    /// Concurrent thumbnail downloads per analysis.
    pub max_concurrent_loads: usize,
    /// Width in pixels thumbnails are downsampled to before analysis.
    pub sample_width: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL,
            min_sample_size: MIN_SAMPLE_SIZE,
            max_concurrent_loads: 4,
            sample_width: 96,
        }
    }
}

impl AnalysisConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_ttl: std::env::var("VTHUMB_PATTERN_CACHE_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.cache_ttl),
            max_concurrent_loads: std::env::var("VTHUMB_PATTERN_MAX_CONCURRENT_LOADS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.max_concurrent_loads),
            ..defaults
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnalysisConfig::default();
        assert_eq!(config.cache_ttl, Duration::from_secs(86_400));
        assert_eq!(config.min_sample_size, 3);
    }
}
