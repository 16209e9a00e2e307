//! Channel analysis metrics.

use metrics::{counter, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Pattern cache lookups by result (hit/miss).
    pub const CACHE_LOOKUPS_TOTAL: &str = "vthumb_pattern_cache_lookups_total";

    /// Thumbnails processed by status (ok/failed).
    pub const IMAGES_TOTAL: &str = "vthumb_pattern_images_total";

    /// Wall time of an uncached pattern analysis.
    pub const ANALYSIS_SECONDS: &str = "vthumb_pattern_analysis_seconds";
}

pub fn record_cache_lookup(hit: bool) {
    counter!(
        names::CACHE_LOOKUPS_TOTAL,
        "result" => if hit { "hit" } else { "miss" }
    )
    .increment(1);
}

pub fn record_image(ok: bool) {
    counter!(
        names::IMAGES_TOTAL,
        "status" => if ok { "ok" } else { "failed" }
    )
    .increment(1);
}

pub fn record_analysis(duration_ms: f64) {
    histogram!(names::ANALYSIS_SECONDS).record(duration_ms / 1000.0);
}
