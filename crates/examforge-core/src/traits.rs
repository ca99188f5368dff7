//! Core trait definition for hosted generative-model providers.
//!
//! Implemented by the `examforge-providers` crate; the content flows are
//! written against this trait only.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::flows::SpeakerConfig;
use crate::model::AssetRef;

// ---------------------------------------------------------------------------
// Model Provider trait
// ---------------------------------------------------------------------------

/// Trait for hosted model backends that produce text, images, and speech.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Human-readable provider name (e.g. "openai").
    fn name(&self) -> &str;

    /// Generate text (optionally JSON) from a prompt and attachments.
    async fn generate_text(&self, request: &TextRequest) -> anyhow::Result<TextResponse>;

    /// Generate an image from a prompt, optionally conditioned on a reference image.
    async fn generate_image(&self, request: &ImageRequest) -> anyhow::Result<GeneratedMedia>;

    /// Synthesize speech. Returns raw 16-bit little-endian mono PCM at 24 kHz.
    async fn synthesize_speech(&self, request: &SpeechRequest) -> anyhow::Result<GeneratedMedia>;

    /// List available models for this provider.
    fn available_models(&self) -> Vec<ModelInfo>;
}

/// Request to generate text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextRequest {
    /// Model identifier.
    pub model: String,
    /// The main prompt.
    pub prompt: String,
    /// Optional system prompt override.
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Inline media sent alongside the prompt (audio to transcribe, images).
    #[serde(default)]
    pub attachments: Vec<AssetRef>,
    /// Ask the model for a JSON object.
    #[serde(default)]
    pub json_output: bool,
    /// Sampling temperature.
    pub temperature: f64,
}

impl TextRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system_prompt: None,
            attachments: Vec::new(),
            json_output: false,
            temperature: 0.7,
        }
    }
}

/// Response from a text generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextResponse {
    /// The raw response content.
    pub content: String,
    /// Model that actually generated the response.
    pub model: String,
    /// Latency in milliseconds.
    pub latency_ms: u64,
}

/// Request to generate or edit an image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRequest {
    pub model: String,
    pub prompt: String,
    /// Things the image must not contain.
    #[serde(default)]
    pub negative_prompt: Option<String>,
    /// Inline image to transform (image-to-image or edit).
    #[serde(default)]
    pub reference_image: Option<AssetRef>,
}

/// Voice selection for speech synthesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum VoiceConfig {
    Single { voice: String },
    MultiSpeaker { speakers: Vec<SpeakerConfig> },
}

/// Request to synthesize speech from a script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechRequest {
    pub model: String,
    pub script: String,
    pub voice: VoiceConfig,
}

/// Binary output of an image or speech request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedMedia {
    /// Media type, e.g. "image/png" or "audio/pcm".
    pub media_type: String,
    pub data: Vec<u8>,
}

/// What a model can be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Text,
    Image,
    ImageEdit,
    Speech,
    Transcription,
}

/// Information about an available model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model identifier.
    pub id: String,
    /// Human-readable model name.
    pub name: String,
    /// Provider name.
    pub provider: String,
    pub capabilities: Vec<Capability>,
}

// ---------------------------------------------------------------------------
// Markdown JSON extraction
// ---------------------------------------------------------------------------

/// Extract a JSON payload from a model response that may be wrapped in
/// markdown fences.
///
/// Prefers the first ```json block, then the first bare ``` block, then the
/// trimmed raw response. An unclosed fence (truncated output) still yields
/// its accumulated content.
pub fn extract_json_from_markdown(response: &str) -> String {
    let mut json_block: Option<String> = None;
    let mut generic_block: Option<String> = None;
    let mut in_block = false;
    let mut is_json_block = false;
    let mut is_generic_block = false;
    let mut current_block = String::new();

    for line in response.lines() {
        let trimmed = line.trim();

        if !in_block && trimmed.starts_with("```") {
            in_block = true;
            let lang = trimmed.trim_start_matches('`').trim().to_lowercase();
            is_json_block = lang == "json";
            is_generic_block = lang.is_empty();
            current_block.clear();
            continue;
        }

        if in_block && trimmed == "```" {
            in_block = false;
            if is_json_block && json_block.is_none() {
                json_block = Some(current_block.clone());
            } else if is_generic_block && generic_block.is_none() {
                generic_block = Some(current_block.clone());
            }
            current_block.clear();
            continue;
        }

        if in_block {
            if !current_block.is_empty() {
                current_block.push('\n');
            }
            current_block.push_str(line);
        }
    }

    if in_block && !current_block.is_empty() {
        if is_json_block && json_block.is_none() {
            json_block = Some(current_block);
        } else if is_generic_block && generic_block.is_none() {
            generic_block = Some(current_block);
        }
    }

    json_block
        .or(generic_block)
        .unwrap_or_else(|| response.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_json_block() {
        let input = "Here you go:\n\n```json\n{\"passage\": \"Hi\"}\n```\n\nEnjoy!";
        assert_eq!(extract_json_from_markdown(input), "{\"passage\": \"Hi\"}");
    }

    #[test]
    fn extract_raw_json_unchanged() {
        let input = "  {\"text\": \"hello\"}\n";
        assert_eq!(extract_json_from_markdown(input), "{\"text\": \"hello\"}");
    }

    #[test]
    fn extract_generic_block_fallback() {
        let input = "```\n[1, 2]\n```";
        assert_eq!(extract_json_from_markdown(input), "[1, 2]");
    }

    #[test]
    fn extract_prefers_json_over_generic() {
        let input = "```\nnot this\n```\n\n```json\n{\"a\": 1}\n```\n";
        assert_eq!(extract_json_from_markdown(input), "{\"a\": 1}");
    }

    #[test]
    fn extract_truncated_unclosed_block() {
        let input = "```json\n{\"questions\": [\n  {\"type\": \"fib\"}";
        let json = extract_json_from_markdown(input);
        assert!(json.starts_with("{\"questions\""), "got: {json}");
    }

    #[test]
    fn voice_config_json_shape() {
        let voice = VoiceConfig::Single {
            voice: "Algenib".into(),
        };
        let json = serde_json::to_value(&voice).unwrap();
        assert_eq!(json["mode"], "single");
        assert_eq!(json["voice"], "Algenib");
    }
}
