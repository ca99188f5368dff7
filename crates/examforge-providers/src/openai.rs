//! OpenAI API provider implementation.

use std::time::Instant;

use anyhow::Context;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use examforge_core::error::ProviderError;
use examforge_core::model::AssetRef;
use examforge_core::traits::{
    Capability, GeneratedMedia, ImageRequest, ModelInfo, ModelProvider, SpeechRequest,
    TextRequest, TextResponse, VoiceConfig,
};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const SYSTEM_PROMPT: &str = "You are an assistant that writes English learning material for primary school students. Follow the output format requested in the prompt exactly.";
const FALLBACK_VOICE: &str = "alloy";
const VOICES: &[&str] = &[
    "alloy", "ash", "ballad", "coral", "echo", "fable", "nova", "onyx", "sage", "shimmer",
    "verse",
];

/// OpenAI-compatible API provider.
pub struct OpenAiProvider {
    api_key: String,
    base_url: String,
    org_id: Option<String>,
    client: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(
        api_key: &str,
        base_url: Option<String>,
        org_id: Option<String>,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            api_key: api_key.to_string(),
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            org_id,
            client,
        })
    }

    fn post(&self, endpoint: &str) -> reqwest::RequestBuilder {
        let mut req = self
            .client
            .post(format!("{}{endpoint}", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json");
        if let Some(org) = &self.org_id {
            req = req.header("OpenAI-Organization", org);
        }
        req
    }

    /// Send a request and map transport and HTTP failures to [`ProviderError`].
    async fn send<T: Serialize>(
        &self,
        endpoint: &str,
        body: &T,
        model: &str,
    ) -> Result<reqwest::Response, ProviderError> {
        let response = self.post(endpoint).json(body).send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(DEFAULT_TIMEOUT_SECS)
            } else {
                ProviderError::NetworkError(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(5)
                * 1000;
            return Err(ProviderError::RateLimited {
                retry_after_ms: retry_after,
            });
        }
        if status == 401 {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::AuthenticationFailed(body));
        }
        if status == 404 {
            return Err(ProviderError::ModelNotFound(model.to_string()));
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status,
                message: body,
            });
        }
        Ok(response)
    }

    async fn fetch_image_url(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ProviderError::ApiError {
                status: response.status().as_u16(),
                message: format!("failed to download generated image from {url}"),
            });
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

// ---------------------------------------------------------------------------
// Chat completions
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    temperature: f64,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: MessageContent,
}

#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: UrlRef },
    InputAudio { input_audio: InputAudio },
}

#[derive(Serialize)]
struct UrlRef {
    url: String,
}

#[derive(Serialize)]
struct InputAudio {
    data: String,
    format: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    model: String,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Build the content part for one attachment.
fn attachment_part(asset: &AssetRef) -> Result<ContentPart, ProviderError> {
    match asset.split_inline() {
        Some((media_type, payload)) if media_type.starts_with("audio/") => {
            let subtype = &media_type["audio/".len()..];
            let format = match subtype {
                "wav" | "x-wav" | "wave" | "vnd.wave" => "wav",
                "mpeg" | "mp3" => "mp3",
                other => other,
            };
            Ok(ContentPart::InputAudio {
                input_audio: InputAudio {
                    data: payload.to_string(),
                    format: format.to_string(),
                },
            })
        }
        Some(_) => Ok(ContentPart::ImageUrl {
            image_url: UrlRef {
                url: asset.as_str().to_string(),
            },
        }),
        None if asset.as_str().starts_with("http") => Ok(ContentPart::ImageUrl {
            image_url: UrlRef {
                url: asset.as_str().to_string(),
            },
        }),
        None => Err(ProviderError::ApiError {
            status: 0,
            message: format!("unsupported attachment: {asset}"),
        }),
    }
}

// ---------------------------------------------------------------------------
// Images and speech
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ImageGenerationRequest {
    model: String,
    prompt: String,
    n: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<&'static str>,
}

#[derive(Serialize)]
struct ImageEditRequest {
    model: String,
    prompt: String,
    images: Vec<ImageInput>,
}

#[derive(Serialize)]
struct ImageInput {
    image_url: String,
}

#[derive(Deserialize)]
struct ImageResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Deserialize)]
struct ImageData {
    #[serde(default)]
    b64_json: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Serialize)]
struct SpeechBody {
    model: String,
    input: String,
    voice: String,
    response_format: &'static str,
}

/// Full image prompt, with the negative prompt spelled out.
fn image_prompt(request: &ImageRequest) -> String {
    match &request.negative_prompt {
        Some(negative) if !negative.is_empty() => {
            format!("{}\nAvoid: {negative}", request.prompt.trim_end())
        }
        _ => request.prompt.clone(),
    }
}

/// Map a configured voice to one this API knows.
fn api_voice(voice: &VoiceConfig) -> String {
    let requested = match voice {
        VoiceConfig::Single { voice } => Some(voice.as_str()),
        VoiceConfig::MultiSpeaker { speakers } => {
            tracing::debug!(
                speakers = speakers.len(),
                "multi-speaker synthesis not supported, using the first speaker's voice"
            );
            speakers.first().map(|s| s.voice.as_str())
        }
    };
    let requested = requested.unwrap_or(FALLBACK_VOICE).to_lowercase();
    if VOICES.contains(&requested.as_str()) {
        requested
    } else {
        tracing::debug!(voice = %requested, "unknown voice, using {FALLBACK_VOICE}");
        FALLBACK_VOICE.to_string()
    }
}

#[async_trait]
impl ModelProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn generate_text(&self, request: &TextRequest) -> anyhow::Result<TextResponse> {
        let start = Instant::now();

        let system_prompt = request
            .system_prompt
            .clone()
            .unwrap_or_else(|| SYSTEM_PROMPT.to_string());

        let content = if request.attachments.is_empty() {
            MessageContent::Text(request.prompt.clone())
        } else {
            let mut parts = request
                .attachments
                .iter()
                .map(attachment_part)
                .collect::<Result<Vec<_>, _>>()?;
            parts.push(ContentPart::Text {
                text: request.prompt.clone(),
            });
            MessageContent::Parts(parts)
        };

        let body = ChatRequest {
            model: request.model.clone(),
            temperature: request.temperature,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: MessageContent::Text(system_prompt),
                },
                ChatMessage {
                    role: "user",
                    content,
                },
            ],
            response_format: request.json_output.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        let response = self
            .send("/v1/chat/completions", &body, &request.model)
            .await?;
        let api_response: ChatResponse = response.json().await.map_err(|e| {
            ProviderError::ApiError {
                status: 0,
                message: format!("failed to parse response: {e}"),
            }
        })?;

        let content = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        if content.trim().is_empty() {
            return Err(ProviderError::EmptyOutput("empty completion".into()).into());
        }

        Ok(TextResponse {
            content,
            model: api_response.model,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }

    #[instrument(skip(self, request), fields(model = %request.model, edit = request.reference_image.is_some()))]
    async fn generate_image(&self, request: &ImageRequest) -> anyhow::Result<GeneratedMedia> {
        let prompt = image_prompt(request);
        let response = match &request.reference_image {
            Some(reference) => {
                let body = ImageEditRequest {
                    model: request.model.clone(),
                    prompt,
                    images: vec![ImageInput {
                        image_url: reference.as_str().to_string(),
                    }],
                };
                self.send("/v1/images/edits", &body, &request.model).await?
            }
            None => {
                // gpt-image models always answer with base64 and reject the parameter.
                let response_format =
                    (!request.model.starts_with("gpt-image")).then_some("b64_json");
                let body = ImageGenerationRequest {
                    model: request.model.clone(),
                    prompt,
                    n: 1,
                    response_format,
                };
                self.send("/v1/images/generations", &body, &request.model)
                    .await?
            }
        };

        let api_response: ImageResponse = response.json().await.map_err(|e| {
            ProviderError::ApiError {
                status: 0,
                message: format!("failed to parse response: {e}"),
            }
        })?;
        let image = api_response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::EmptyOutput("no image in response".into()))?;

        let data = match (image.b64_json, image.url) {
            (Some(b64), _) => STANDARD.decode(b64.trim()).map_err(|e| ProviderError::ApiError {
                status: 0,
                message: format!("invalid base64 image: {e}"),
            })?,
            (None, Some(url)) => self.fetch_image_url(&url).await?,
            (None, None) => {
                return Err(ProviderError::EmptyOutput("image has no data".into()).into())
            }
        };

        Ok(GeneratedMedia {
            media_type: "image/png".to_string(),
            data,
        })
    }

    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn synthesize_speech(&self, request: &SpeechRequest) -> anyhow::Result<GeneratedMedia> {
        let body = SpeechBody {
            model: request.model.clone(),
            input: request.script.clone(),
            voice: api_voice(&request.voice),
            response_format: "pcm",
        };
        let response = self.send("/v1/audio/speech", &body, &request.model).await?;
        let data = response
            .bytes()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;
        if data.is_empty() {
            return Err(ProviderError::EmptyOutput("no audio in response".into()).into());
        }
        Ok(GeneratedMedia {
            media_type: "audio/pcm".to_string(),
            data: data.to_vec(),
        })
    }

    fn available_models(&self) -> Vec<ModelInfo> {
        vec![
            ModelInfo {
                id: "gpt-4.1-mini".into(),
                name: "GPT-4.1 Mini".into(),
                provider: "openai".into(),
                capabilities: vec![Capability::Text],
            },
            ModelInfo {
                id: "gpt-4o-audio-preview".into(),
                name: "GPT-4o Audio".into(),
                provider: "openai".into(),
                capabilities: vec![Capability::Text, Capability::Transcription],
            },
            ModelInfo {
                id: "gpt-image-1".into(),
                name: "GPT Image 1".into(),
                provider: "openai".into(),
                capabilities: vec![Capability::Image, Capability::ImageEdit],
            },
            ModelInfo {
                id: "gpt-4o-mini-tts".into(),
                name: "GPT-4o Mini TTS".into(),
                provider: "openai".into(),
                capabilities: vec![Capability::Speech],
            },
        ]
    }
}
