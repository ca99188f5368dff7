//! Provider configuration and factory.

use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use examforge_core::traits::ModelProvider;

use crate::mock::MockProvider;
use crate::openai::OpenAiProvider;

/// Configuration for a single model provider.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    OpenAI {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        org_id: Option<String>,
    },
    /// Offline provider returning canned output. Useful for demos and tests.
    Mock {
        #[serde(default)]
        response: Option<String>,
    },
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::OpenAI {
                api_key: _,
                base_url,
                org_id,
            } => f
                .debug_struct("OpenAI")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .field("org_id", org_id)
                .finish(),
            ProviderConfig::Mock { response } => f
                .debug_struct("Mock")
                .field("response", response)
                .finish(),
        }
    }
}

impl ProviderConfig {
    /// Copy of this config with `${VAR}` references resolved.
    pub fn resolved(&self) -> ProviderConfig {
        match self {
            ProviderConfig::OpenAI {
                api_key,
                base_url,
                org_id,
            } => ProviderConfig::OpenAI {
                api_key: resolve_env_vars(api_key),
                base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
                org_id: org_id.as_ref().map(|o| resolve_env_vars(o)),
            },
            ProviderConfig::Mock { response } => ProviderConfig::Mock {
                response: response.clone(),
            },
        }
    }
}

/// Model names per capability, plus the default speech voice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelsConfig {
    #[serde(default = "default_text_model")]
    pub text: String,
    #[serde(default = "default_image_model")]
    pub image: String,
    #[serde(default = "default_image_model")]
    pub image_edit: String,
    #[serde(default = "default_speech_model")]
    pub speech: String,
    #[serde(default = "default_transcription_model")]
    pub transcription: String,
    /// Voice used when a script has no speakers.
    #[serde(default = "default_voice")]
    pub voice: String,
}

fn default_text_model() -> String {
    "gpt-4.1-mini".to_string()
}
fn default_image_model() -> String {
    "gpt-image-1".to_string()
}
fn default_speech_model() -> String {
    "gpt-4o-mini-tts".to_string()
}
fn default_transcription_model() -> String {
    "gpt-4o-audio-preview".to_string()
}
fn default_voice() -> String {
    "Algenib".to_string()
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            text: default_text_model(),
            image: default_image_model(),
            image_edit: default_image_model(),
            speech: default_speech_model(),
            transcription: default_transcription_model(),
            voice: default_voice(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
pub fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Create a provider instance from its configuration.
pub fn create_provider(config: &ProviderConfig) -> Result<Arc<dyn ModelProvider>> {
    match config {
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            org_id,
        } => Ok(Arc::new(OpenAiProvider::new(
            api_key,
            base_url.clone(),
            org_id.clone(),
        )?)),
        ProviderConfig::Mock { response } => Ok(Arc::new(match response {
            Some(response) => MockProvider::with_fixed_response(response),
            None => MockProvider::default(),
        })),
    }
}
