//! Generation metrics.
//!
//! - Task outcomes by status
//! - Face swap outcomes
//! - Scene reasoning fallbacks
//! - End-to-end request latency

use metrics::{counter, histogram};

// =============================================================================
// Metric Names
// =============================================================================

pub mod names {
    /// Generation tasks by status (ok/failed).
    pub const TASKS_TOTAL: &str = "vthumb_generation_tasks_total";

    /// Face swap attempts by outcome (applied/no_face/failed/timeout).
    pub const FACE_SWAP_TOTAL: &str = "vthumb_face_swap_total";

    /// Scene reasoning calls by outcome (refined/fallback).
    pub const SCENE_TOTAL: &str = "vthumb_scene_reasoning_total";

    /// Generation request latency in seconds.
    pub const REQUEST_SECONDS: &str = "vthumb_generation_request_seconds";
}

// =============================================================================
// Recording Functions
// =============================================================================

pub fn record_task(ok: bool) {
    counter!(
        names::TASKS_TOTAL,
        "status" => if ok { "ok" } else { "failed" }
    )
    .increment(1);
}

pub fn record_face_swap(outcome: &'static str) {
    counter!(names::FACE_SWAP_TOTAL, "outcome" => outcome).increment(1);
}

pub fn record_scene(refined: bool) {
    counter!(
        names::SCENE_TOTAL,
        "outcome" => if refined { "refined" } else { "fallback" }
    )
    .increment(1);
}

pub fn record_request(status: &'static str, latency_ms: f64) {
    histogram!(names::REQUEST_SECONDS, "status" => status).record(latency_ms / 1000.0);
}
