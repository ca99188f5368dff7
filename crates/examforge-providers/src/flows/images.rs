use anyhow::Result;
use futures::future::try_join_all;
use tracing::instrument;

use examforge_core::error::ProviderError;
use examforge_core::flows::{
    CharacterImageRequest, ConcretizeRequest, ConcretizeResponse, EditImageRequest,
    EditImageResponse, ImageResponse, SingleImageRequest, StoryboardRequest, StoryboardResponse,
};
use examforge_core::model::AssetRef;
use examforge_core::traits::ImageRequest;

use super::{media_to_asset, ContentFlows};

/// Things worksheet illustrations must not contain.
pub const NEGATIVE_PROMPT: &str = "text, labels, words, numbers, watermarks, logos, UI elements, borders, frames, multiple subjects, multiple characters, photorealistic, 3D, complex lighting, gradients, textures, pencils, crayons, watercolor, messy, cluttered";

const ILLUSTRATION_STYLE: &str = "A clean, vibrant clipart-style illustration with bold black outlines and simple, flat coloring, isolated on a clean white background.";

const CHARACTER_STYLE: &str = "Vibrant clipart-style character for a children's storybook. A single character standing still and looking forward, full body shot. Bold black outlines, simple flat colors, and a clean, simple background that keeps the focus on the character.";

const CONCRETIZE_CONTEXT: &str = "\
You improve prompts for an image model that draws educational clipart for children: \
clean, vibrant illustrations with bold black outlines and flat colors on a white background.
Turn each short prompt into a simple, concrete English scene description with a single \
clear subject.

Examples:
- [\"butter\"] -> [\"a piece of yellow butter on a white plate\"]
- [\"rain\"] -> [\"a gray sky with cartoon rain drops falling\"]
- [\"a girl\", \"a boy\"] -> [\"a young girl with a red dress and pigtails\", \"a playful boy with curly hair and a green shirt\"]

Return exactly one description per input prompt, in the same order.";

/// Image flows that need inline input fall back to this type for downloads
/// without a content type.
const DEFAULT_IMAGE_TYPE: &str = "image/png";

impl ContentFlows {
    /// Generate one image per frame, all frames concurrently.
    ///
    /// A single failed frame fails the whole storyboard.
    #[instrument(skip(self, request), fields(frames = request.frames.len(), character = request.character_image.is_some()))]
    pub async fn generate_storyboard(&self, request: &StoryboardRequest) -> Result<StoryboardResponse> {
        let character = match &request.character_image {
            Some(image) => Some(self.inline_asset(image, DEFAULT_IMAGE_TYPE).await?),
            None => None,
        };
        let images = try_join_all(
            request
                .frames
                .iter()
                .map(|frame| self.frame_image(frame, character.as_ref())),
        )
        .await?;
        Ok(StoryboardResponse { images })
    }

    /// Regenerate a single frame.
    #[instrument(skip(self, request))]
    pub async fn generate_single_image(&self, request: &SingleImageRequest) -> Result<ImageResponse> {
        let character = match &request.character_image {
            Some(image) => Some(self.inline_asset(image, DEFAULT_IMAGE_TYPE).await?),
            None => None,
        };
        let image = self
            .frame_image(&request.frame_prompt, character.as_ref())
            .await?;
        Ok(ImageResponse { image })
    }

    /// Generate a reference image of a story character.
    #[instrument(skip(self, request))]
    pub async fn generate_character_image(&self, request: &CharacterImageRequest) -> Result<ImageResponse> {
        let media = self
            .provider
            .generate_image(&ImageRequest {
                model: self.models.image.clone(),
                prompt: format!(
                    "{CHARACTER_STYLE}\nThe character is: {}.",
                    request.character_prompt.trim().trim_end_matches('.')
                ),
                negative_prompt: Some(NEGATIVE_PROMPT.to_string()),
                reference_image: None,
            })
            .await?;
        Ok(ImageResponse {
            image: media_to_asset(&media),
        })
    }

    /// Edit an existing image. URL images are downloaded first.
    #[instrument(skip(self, request))]
    pub async fn edit_image(&self, request: &EditImageRequest) -> Result<EditImageResponse> {
        let source = self.inline_asset(&request.image, DEFAULT_IMAGE_TYPE).await?;
        let media = self
            .provider
            .generate_image(&ImageRequest {
                model: self.models.image_edit.clone(),
                prompt: request.prompt.clone(),
                negative_prompt: None,
                reference_image: Some(source),
            })
            .await?;
        Ok(EditImageResponse {
            edited_image: media_to_asset(&media),
        })
    }

    /// Expand short image prompts into concrete scene descriptions.
    #[instrument(skip(self, request), fields(prompts = request.prompts.len()))]
    pub async fn concretize_image_prompts(&self, request: &ConcretizeRequest) -> Result<ConcretizeResponse> {
        if request.prompts.is_empty() {
            return Ok(ConcretizeResponse {
                concretized_prompts: Vec::new(),
            });
        }

        let prompts = serde_json::to_string(&request.prompts)?;
        let prompt = format!(
            "{CONCRETIZE_CONTEXT}\n\nPrompts:\n---\n{prompts}\n---\n\n\
             Reply with a JSON object of the form {{\"concretizedPrompts\": [\"...\"]}}."
        );
        let response: ConcretizeResponse = self.complete_json(prompt, "concretized prompts").await?;
        if response.concretized_prompts.len() != request.prompts.len() {
            return Err(ProviderError::EmptyOutput(format!(
                "expected {} concretized prompts, got {}",
                request.prompts.len(),
                response.concretized_prompts.len()
            ))
            .into());
        }
        Ok(response)
    }

    /// One frame: image-to-image placement of the character when given,
    /// otherwise a clipart illustration of the frame prompt.
    async fn frame_image(&self, frame: &str, character: Option<&AssetRef>) -> Result<AssetRef> {
        let request = match character {
            Some(character) => ImageRequest {
                model: self.models.image_edit.clone(),
                prompt: format!(
                    "Place this character in the following scene, keeping the same style: {frame}. Keep the background simple."
                ),
                negative_prompt: Some(NEGATIVE_PROMPT.to_string()),
                reference_image: Some(character.clone()),
            },
            None => ImageRequest {
                model: self.models.image.clone(),
                prompt: format!("{ILLUSTRATION_STYLE}\nSubject: a single, clear image of {frame}."),
                negative_prompt: Some(NEGATIVE_PROMPT.to_string()),
                reference_image: None,
            },
        };
        let media = self.provider.generate_image(&request).await.map_err(|e| {
            tracing::warn!(%frame, "image generation failed: {e:#}");
            e
        })?;
        if media.data.is_empty() {
            return Err(ProviderError::EmptyOutput(format!("no image for {frame:?}")).into());
        }
        Ok(media_to_asset(&media))
    }
}

#[cfg(test)]
mod tests {
    use crate::mock::MockProvider;

    use super::super::test_support::{flows_for, flows_with};
    use super::*;

    #[tokio::test]
    async fn storyboard_keeps_frame_order() {
        let (flows, provider) = flows_with(&[]);
        let response = flows
            .generate_storyboard(&StoryboardRequest {
                character_image: None,
                frames: vec!["a cat".into(), "a dog".into(), "a bird".into()],
            })
            .await
            .unwrap();
        assert_eq!(response.images.len(), 3);
        assert!(response
            .images
            .iter()
            .all(|i| i.as_str().starts_with("data:image/png;base64,")));

        let requests = provider.image_requests();
        assert_eq!(requests.len(), 3);
        assert!(requests.iter().all(|r| r.reference_image.is_none()
            && r.model == "gpt-image-1"
            && r.negative_prompt.as_deref() == Some(NEGATIVE_PROMPT)));
        assert!(requests.iter().any(|r| r.prompt.contains("image of a dog.")));
    }

    #[tokio::test]
    async fn storyboard_with_character_uses_reference_image() {
        let (flows, provider) = flows_with(&[]);
        let character = AssetRef::new("data:image/png;base64,AAAA");
        flows
            .generate_storyboard(&StoryboardRequest {
                character_image: Some(character.clone()),
                frames: vec!["at the beach".into()],
            })
            .await
            .unwrap();

        let request = &provider.image_requests()[0];
        assert_eq!(request.reference_image.as_ref(), Some(&character));
        assert!(request.prompt.starts_with("Place this character"));
    }

    #[tokio::test]
    async fn one_failed_frame_fails_the_storyboard() {
        let (flows, _) = flows_for(MockProvider::default().failing_on("volcano"));
        let err = flows
            .generate_storyboard(&StoryboardRequest {
                character_image: None,
                frames: vec!["a tree".into(), "a volcano".into()],
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("volcano"));
    }

    #[tokio::test]
    async fn character_and_edit_requests() {
        let (flows, provider) = flows_with(&[]);
        flows
            .generate_character_image(&CharacterImageRequest {
                character_prompt: "a girl with a red hat.".into(),
            })
            .await
            .unwrap();
        let edited = flows
            .edit_image(&EditImageRequest {
                image: AssetRef::new("data:image/png;base64,AAAA"),
                prompt: "make the hat blue".into(),
            })
            .await
            .unwrap();
        assert!(edited.edited_image.is_inline());

        let requests = provider.image_requests();
        assert!(requests[0].prompt.ends_with("The character is: a girl with a red hat."));
        assert_eq!(requests[1].prompt, "make the hat blue");
        assert!(requests[1].negative_prompt.is_none());
        assert!(requests[1].reference_image.is_some());
    }

    #[tokio::test]
    async fn concretize_checks_length() {
        let (flows, provider) = flows_with(&[]);
        let empty = flows
            .concretize_image_prompts(&ConcretizeRequest { prompts: vec![] })
            .await
            .unwrap();
        assert!(empty.concretized_prompts.is_empty());
        assert_eq!(provider.call_count(), 0);

        let (flows, _) = flows_with(&[(
            "\"rice\"",
            r#"{"concretizedPrompts": ["a bowl of white rice with chopsticks"]}"#,
        )]);
        let response = flows
            .concretize_image_prompts(&ConcretizeRequest {
                prompts: vec!["rice".into()],
            })
            .await
            .unwrap();
        assert_eq!(response.concretized_prompts, vec!["a bowl of white rice with chopsticks"]);

        let err = flows
            .concretize_image_prompts(&ConcretizeRequest {
                prompts: vec!["rice".into(), "fish".into()],
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("expected 2"));
    }
}
