//! AI content flows: passages, questions, images, word shuffles, speech.
//!
//! Every flow is a single request/response exchange with the configured
//! [`ModelProvider`]. Nothing is retried here; a failed call surfaces as one
//! error to the caller.

mod images;
mod passage;
mod questions;
mod speech;
mod words;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::DeserializeOwned;

use examforge_core::error::ProviderError;
use examforge_core::model::AssetRef;
use examforge_core::traits::{
    extract_json_from_markdown, GeneratedMedia, ModelProvider, TextRequest,
};

use crate::config::ModelsConfig;

pub use images::NEGATIVE_PROMPT;
pub use speech::{voice_config, TRANSCRIBE_INSTRUCTION};

const FETCH_TIMEOUT_SECS: u64 = 60;

/// Entry point for all content flows.
pub struct ContentFlows {
    provider: Arc<dyn ModelProvider>,
    models: ModelsConfig,
    http: reqwest::Client,
}

impl std::fmt::Debug for ContentFlows {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentFlows")
            .field("provider", &self.provider.name())
            .field("models", &self.models)
            .finish_non_exhaustive()
    }
}

impl ContentFlows {
    pub fn new(provider: Arc<dyn ModelProvider>, models: ModelsConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            provider,
            models,
            http,
        })
    }

    pub fn provider(&self) -> &dyn ModelProvider {
        self.provider.as_ref()
    }

    pub fn models(&self) -> &ModelsConfig {
        &self.models
    }

    /// Ask the text model for a JSON object and parse it as `T`.
    async fn complete_json<T: DeserializeOwned>(&self, prompt: String, what: &str) -> Result<T> {
        let mut request = TextRequest::new(&self.models.text, prompt);
        request.json_output = true;
        let response = self.provider.generate_text(&request).await?;
        let json = extract_json_from_markdown(&response.content);
        serde_json::from_str(&json).map_err(|e| {
            tracing::debug!(content = %response.content, "unparseable {what} output");
            ProviderError::EmptyOutput(format!("{what}: {e}")).into()
        })
    }

    /// Resolve an asset to an inline payload, downloading `http(s)` URLs.
    async fn inline_asset(&self, asset: &AssetRef, default_media_type: &str) -> Result<AssetRef> {
        if asset.is_inline() {
            return Ok(asset.clone());
        }
        let url = asset.as_str();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            bail!("cannot fetch asset {asset}: not an http(s) URL");
        }

        tracing::debug!(%url, "fetching asset");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .with_context(|| format!("failed to fetch {url}"))?;
        let media_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| default_media_type.to_string());
        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("failed to read {url}"))?;
        Ok(AssetRef::new(format!(
            "data:{media_type};base64,{}",
            STANDARD.encode(bytes)
        )))
    }
}

/// Encode generated media as an inline payload.
fn media_to_asset(media: &GeneratedMedia) -> AssetRef {
    AssetRef::new(format!(
        "data:{};base64,{}",
        media.media_type,
        STANDARD.encode(&media.data)
    ))
}

/// Render a list for a prompt, or a placeholder when it is empty.
fn prompt_list(items: &[String], separator: &str) -> String {
    if items.is_empty() {
        "(none)".to_string()
    } else {
        items.join(separator)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::HashMap;
    use std::sync::Arc;

    use crate::config::ModelsConfig;
    use crate::mock::MockProvider;

    use super::ContentFlows;

    pub fn flows_with(responses: &[(&str, &str)]) -> (ContentFlows, Arc<MockProvider>) {
        let responses: HashMap<String, String> = responses
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        flows_for(MockProvider::new(responses))
    }

    pub fn flows_for(provider: MockProvider) -> (ContentFlows, Arc<MockProvider>) {
        let provider = Arc::new(provider);
        let flows = ContentFlows::new(provider.clone(), ModelsConfig::default()).unwrap();
        (flows, provider)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::flows_with;
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn inline_assets_pass_through() {
        let (flows, _) = flows_with(&[]);
        let asset = AssetRef::new("data:image/png;base64,AAAA");
        assert_eq!(flows.inline_asset(&asset, "image/png").await.unwrap(), asset);
        assert!(flows
            .inline_asset(&AssetRef::new("file:///tmp/x.png"), "image/png")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn http_assets_are_downloaded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cat.jpg"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/jpeg")
                    .set_body_bytes(vec![1u8, 2, 3]),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/missing.png"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let (flows, _) = flows_with(&[]);
        let asset = flows
            .inline_asset(&AssetRef::new(format!("{}/cat.jpg", server.uri())), "image/png")
            .await
            .unwrap();
        assert_eq!(asset.as_str(), "data:image/jpeg;base64,AQID");

        assert!(flows
            .inline_asset(&AssetRef::new(format!("{}/missing.png", server.uri())), "image/png")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn unparseable_json_is_empty_output() {
        let (flows, _) = flows_with(&[("anything", "not json at all")]);
        let err = flows
            .complete_json::<serde_json::Value>("anything".into(), "test")
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ProviderError>(),
            Some(ProviderError::EmptyOutput(_))
        ));
    }
}
