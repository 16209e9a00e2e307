//! Face swap post-processing.
//!
//! Detects faces in a reference image once, then swaps the best face into
//! generated images. Every failure path (timeout, provider error, no usable
//! face) leaves the generated image untouched.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use vthumb_models::ImageRef;
use vthumb_providers::{
    DetectedFace, FaceDetectionRequest, FaceDetector, FaceSwapRequest, FaceSwapper,
};

use crate::config::EngineConfig;
use crate::metrics;

/// The face chosen from a reference image.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceReference {
    pub image: String,
    /// Index into the provider's detection list for `image`.
    pub face_index: usize,
    pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwapOutcome {
    pub image: ImageRef,
    pub applied: bool,
}

impl SwapOutcome {
    fn unchanged(image: ImageRef) -> Self {
        Self {
            image,
            applied: false,
        }
    }
}

/// Highest-confidence face at or above `threshold`; the earliest wins ties.
pub fn best_face(faces: &[DetectedFace], threshold: f32) -> Option<(usize, f32)> {
    faces
        .iter()
        .enumerate()
        .filter(|(_, f)| f.confidence >= threshold)
        .fold(None, |best: Option<(usize, f32)>, (index, face)| match best {
            Some((_, conf)) if conf >= face.confidence => best,
            _ => Some((index, face.confidence)),
        })
}

#[derive(Clone)]
pub struct FaceSwapPostProcessor {
    detector: Arc<dyn FaceDetector>,
    swapper: Arc<dyn FaceSwapper>,
    detect_timeout: Duration,
    swap_timeout: Duration,
    confidence_threshold: f32,
}

impl FaceSwapPostProcessor {
    pub fn new(
        detector: Arc<dyn FaceDetector>,
        swapper: Arc<dyn FaceSwapper>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            detector,
            swapper,
            detect_timeout: config.face_detect_timeout,
            swap_timeout: config.face_swap_timeout,
            confidence_threshold: config.face_confidence_threshold,
        }
    }

    /// Detect the best face in `image_url`. `None` when nothing usable is found
    /// or detection fails.
    pub async fn detect_reference(&self, image_url: &str) -> Option<FaceReference> {
        let request = FaceDetectionRequest {
            image_url: image_url.to_string(),
            confidence_threshold: self.confidence_threshold,
        };

        let faces = match timeout(self.detect_timeout, self.detector.detect(&request)).await {
            Ok(Ok(faces)) => faces,
            Ok(Err(e)) => {
                warn!(error = %e, "Face detection failed");
                metrics::record_face_swap("detect_failed");
                return None;
            }
            Err(_) => {
                warn!(
                    timeout_secs = self.detect_timeout.as_secs(),
                    "Face detection timed out"
                );
                metrics::record_face_swap("detect_timeout");
                return None;
            }
        };

        match best_face(&faces, self.confidence_threshold) {
            Some((face_index, confidence)) => {
                debug!(
                    detected = faces.len(),
                    face_index = face_index,
                    confidence = confidence,
                    "Reference face selected"
                );
                Some(FaceReference {
                    image: image_url.to_string(),
                    face_index,
                    confidence,
                })
            }
            None => {
                info!(detected = faces.len(), "No usable face in reference image");
                metrics::record_face_swap("no_face");
                None
            }
        }
    }

    /// Pick the candidate whose best face has the highest confidence.
    pub async fn best_face_reference(&self, candidates: &[String]) -> Option<FaceReference> {
        let detections = join_all(candidates.iter().map(|url| self.detect_reference(url))).await;

        detections
            .into_iter()
            .flatten()
            .fold(None, |best: Option<FaceReference>, candidate| match best {
                Some(current) if current.confidence >= candidate.confidence => Some(current),
                _ => Some(candidate),
            })
    }

    /// Swap the reference face into `image`, or return it unchanged on failure.
    pub async fn swap_into(&self, reference: &FaceReference, image: ImageRef) -> SwapOutcome {
        let request = FaceSwapRequest {
            source_image: reference.image.clone(),
            target_image: image.to_uri(),
            face_index: reference.face_index,
        };

        match timeout(self.swap_timeout, self.swapper.swap(&request)).await {
            Ok(Ok(swapped)) => {
                metrics::record_face_swap("applied");
                SwapOutcome {
                    image: swapped,
                    applied: true,
                }
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Face swap failed, keeping original image");
                metrics::record_face_swap("failed");
                SwapOutcome::unchanged(image)
            }
            Err(_) => {
                warn!(
                    timeout_secs = self.swap_timeout.as_secs(),
                    "Face swap timed out, keeping original image"
                );
                metrics::record_face_swap("timeout");
                SwapOutcome::unchanged(image)
            }
        }
    }
}
