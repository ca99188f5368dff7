//! Mock provider for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use examforge_core::error::ProviderError;
use examforge_core::traits::{
    Capability, GeneratedMedia, ImageRequest, ModelInfo, ModelProvider, SpeechRequest,
    TextRequest, TextResponse,
};

/// A 1×1 transparent PNG.
pub const PLACEHOLDER_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// Samples of silence returned for every speech request (0.1 s at 24 kHz).
const SILENCE_SAMPLES: usize = 2400;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A mock model provider for exercising the content flows without real API
/// calls.
///
/// Text responses are chosen by prompt substring (longest key wins); images
/// are a placeholder PNG and speech is silence.
pub struct MockProvider {
    /// Map of prompt substring → response text.
    responses: HashMap<String, String>,
    /// Default response if no prompt matches.
    default_response: String,
    /// Prompts containing this substring fail with an API error.
    fail_on: Option<String>,
    call_count: AtomicU32,
    last_text_request: Mutex<Option<TextRequest>>,
    image_requests: Mutex<Vec<ImageRequest>>,
    speech_requests: Mutex<Vec<SpeechRequest>>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new(HashMap::new())
    }
}

impl MockProvider {
    /// Create a new mock provider with the given prompt→response mappings.
    pub fn new(responses: HashMap<String, String>) -> Self {
        Self {
            responses,
            default_response: "{}".to_string(),
            fail_on: None,
            call_count: AtomicU32::new(0),
            last_text_request: Mutex::new(None),
            image_requests: Mutex::new(Vec::new()),
            speech_requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock that always returns the same text.
    pub fn with_fixed_response(response: &str) -> Self {
        Self {
            default_response: response.to_string(),
            ..Self::default()
        }
    }

    /// Fail every request whose prompt or script contains `needle`.
    pub fn failing_on(mut self, needle: impl Into<String>) -> Self {
        self.fail_on = Some(needle.into());
        self
    }

    /// Total number of calls across all capabilities.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn last_text_request(&self) -> Option<TextRequest> {
        lock(&self.last_text_request).clone()
    }

    /// Image requests received so far, in call order.
    pub fn image_requests(&self) -> Vec<ImageRequest> {
        lock(&self.image_requests).clone()
    }

    pub fn speech_requests(&self) -> Vec<SpeechRequest> {
        lock(&self.speech_requests).clone()
    }

    fn check_failure(&self, input: &str) -> Result<(), ProviderError> {
        match &self.fail_on {
            Some(needle) if input.contains(needle.as_str()) => Err(ProviderError::ApiError {
                status: 500,
                message: format!("mock failure for {needle:?}"),
            }),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl ModelProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate_text(&self, request: &TextRequest) -> anyhow::Result<TextResponse> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *lock(&self.last_text_request) = Some(request.clone());
        self.check_failure(&request.prompt)?;

        let content = self
            .responses
            .iter()
            .filter(|(key, _)| request.prompt.contains(key.as_str()))
            .max_by_key(|(key, _)| key.len())
            .map(|(_, v)| v.clone())
            .unwrap_or_else(|| self.default_response.clone());

        Ok(TextResponse {
            content,
            model: request.model.clone(),
            latency_ms: 1,
        })
    }

    async fn generate_image(&self, request: &ImageRequest) -> anyhow::Result<GeneratedMedia> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        lock(&self.image_requests).push(request.clone());
        self.check_failure(&request.prompt)?;

        Ok(GeneratedMedia {
            media_type: "image/png".to_string(),
            data: PLACEHOLDER_PNG.to_vec(),
        })
    }

    async fn synthesize_speech(&self, request: &SpeechRequest) -> anyhow::Result<GeneratedMedia> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        lock(&self.speech_requests).push(request.clone());
        self.check_failure(&request.script)?;

        Ok(GeneratedMedia {
            media_type: "audio/pcm".to_string(),
            data: vec![0; SILENCE_SAMPLES * 2],
        })
    }

    fn available_models(&self) -> Vec<ModelInfo> {
        vec![ModelInfo {
            id: "mock-model".into(),
            name: "Mock Model".into(),
            provider: "mock".into(),
            capabilities: vec![
                Capability::Text,
                Capability::Image,
                Capability::ImageEdit,
                Capability::Speech,
                Capability::Transcription,
            ],
        }]
    }
}
