//! In-process fake providers for engine tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use vthumb_models::ImageRef;
use vthumb_providers::{
    BoundingBox, ChatCompleter, ChatCompletion, ChatRequest, DetectedFace, FaceDetectionRequest,
    FaceDetector, FaceSwapRequest, FaceSwapper, ImageFetcher, ImageGenerationRequest,
    ImageGenerator, ProviderError, ProviderResult,
};

pub fn face(confidence: f32) -> DetectedFace {
    DetectedFace {
        bbox: BoundingBox {
            x: 10.0,
            y: 10.0,
            width: 100.0,
            height: 120.0,
        },
        confidence,
        landmarks: None,
    }
}

// =============================================================================
// Chat
// =============================================================================

pub struct FakeChat {
    reply: ProviderResult<ChatCompletion>,
    last_user_prompt: Mutex<Option<String>>,
    calls: AtomicUsize,
}

impl FakeChat {
    fn new(reply: ProviderResult<ChatCompletion>) -> Self {
        Self {
            reply,
            last_user_prompt: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::new(Ok(ChatCompletion {
            text: text.to_string(),
            truncated: false,
        }))
    }

    pub fn truncated(text: &str) -> Self {
        Self::new(Ok(ChatCompletion {
            text: text.to_string(),
            truncated: true,
        }))
    }

    pub fn failing() -> Self {
        Self::new(Err(ProviderError::unavailable("chat provider down")))
    }

    pub fn last_user_prompt(&self) -> Option<String> {
        self.last_user_prompt.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatCompleter for FakeChat {
    async fn complete(&self, request: &ChatRequest) -> ProviderResult<ChatCompletion> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_user_prompt.lock().unwrap() = Some(request.user_prompt.clone());
        self.reply.clone()
    }
}

// =============================================================================
// Image generation
// =============================================================================

type Responder = Box<dyn Fn(&ImageGenerationRequest) -> ProviderResult<ImageRef> + Send + Sync>;
type DelayFn = Box<dyn Fn(&ImageGenerationRequest) -> Duration + Send + Sync>;

pub struct FakeImageGenerator {
    respond: Responder,
    delay: DelayFn,
    requests: Mutex<Vec<ImageGenerationRequest>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeImageGenerator {
    fn new(respond: Responder) -> Self {
        Self {
            respond,
            delay: Box::new(|_| Duration::ZERO),
            requests: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Returns `gen://{prompt}` so results can be traced back to prompts.
    pub fn echo_prompt() -> Self {
        Self::new(Box::new(|req| Ok(ImageRef::url(format!("gen://{}", req.prompt)))))
    }

    pub fn failing_when(
        fail: impl Fn(&ImageGenerationRequest) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self::new(Box::new(move |req| {
            if fail(req) {
                Err(ProviderError::unavailable(format!("generation failed for {}", req.prompt)))
            } else {
                Ok(ImageRef::url(format!("gen://{}", req.prompt)))
            }
        }))
    }

    pub fn with_delay(
        mut self,
        delay: impl Fn(&ImageGenerationRequest) -> Duration + Send + Sync + 'static,
    ) -> Self {
        self.delay = Box::new(delay);
        self
    }

    pub fn requests(&self) -> Vec<ImageGenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageGenerator for FakeImageGenerator {
    async fn generate(&self, request: &ImageGenerationRequest) -> ProviderResult<ImageRef> {
        self.requests.lock().unwrap().push(request.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = (self.delay)(request);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        (self.respond)(request)
    }
}

// =============================================================================
// Faces
// =============================================================================

pub struct FakeFaceDetector {
    default_faces: Vec<DetectedFace>,
    per_image: HashMap<String, Vec<DetectedFace>>,
    fail: bool,
    calls: AtomicUsize,
}

impl FakeFaceDetector {
    pub fn with_faces(faces: Vec<DetectedFace>) -> Self {
        Self {
            default_faces: faces,
            per_image: HashMap::new(),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::with_faces(Vec::new())
        }
    }

    pub fn for_image(mut self, url: &str, faces: Vec<DetectedFace>) -> Self {
        self.per_image.insert(url.to_string(), faces);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FaceDetector for FakeFaceDetector {
    async fn detect(&self, request: &FaceDetectionRequest) -> ProviderResult<Vec<DetectedFace>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProviderError::unavailable("face detector down"));
        }
        Ok(self
            .per_image
            .get(&request.image_url)
            .cloned()
            .unwrap_or_else(|| self.default_faces.clone()))
    }
}

#[derive(Default)]
struct SwapperState {
    calls: AtomicUsize,
    last_request: Mutex<Option<FaceSwapRequest>>,
}

/// Cloneable so tests can keep a handle after moving one into the engine.
#[derive(Clone)]
pub struct FakeFaceSwapper {
    state: Arc<SwapperState>,
    fail: bool,
    delay: Duration,
}

impl FakeFaceSwapper {
    /// Returns the target image with `#swapped` appended.
    pub fn succeeding() -> Self {
        Self {
            state: Arc::new(SwapperState::default()),
            fail: false,
            delay: Duration::ZERO,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::succeeding()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<FaceSwapRequest> {
        self.state.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl FaceSwapper for FakeFaceSwapper {
    async fn swap(&self, request: &FaceSwapRequest) -> ProviderResult<ImageRef> {
        self.state.calls.fetch_add(1, Ordering::SeqCst);
        *self.state.last_request.lock().unwrap() = Some(request.clone());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(ProviderError::from_http_status(500, "swap model crashed"));
        }
        Ok(ImageRef::url(format!("{}#swapped", request.target_image)))
    }
}

// =============================================================================
// Image fetch
// =============================================================================

/// Serves the same solid-color PNG for every URL.
pub struct SolidImageFetcher {
    png: Vec<u8>,
}

impl SolidImageFetcher {
    pub fn new(rgb: [u8; 3]) -> Self {
        let img = image::RgbImage::from_pixel(64, 36, image::Rgb(rgb));
        let mut bytes = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut bytes, image::ImageOutputFormat::Png)
            .unwrap();
        Self {
            png: bytes.into_inner(),
        }
    }
}

#[async_trait]
impl ImageFetcher for SolidImageFetcher {
    async fn fetch(&self, _url: &str) -> ProviderResult<Vec<u8>> {
        Ok(self.png.clone())
    }
}
