use anyhow::Result;
use tracing::instrument;

use examforge_core::error::ProviderError;
use examforge_core::flows::{
    SpeakerConfig, SpeechToTextRequest, SpeechToTextResponse, TextToSpeechRequest,
    TextToSpeechResponse,
};
use examforge_core::traits::{SpeechRequest, TextRequest, VoiceConfig};

use crate::audio::speech_pcm_to_data_uri;

use super::ContentFlows;

/// Instruction sent with audio to transcribe.
pub const TRANSCRIBE_INSTRUCTION: &str = "Transcribe this audio. Only return the transcribed text.";

/// Voice configuration for a script: several speakers get a multi-speaker
/// config in the given order, one speaker gets that voice, none gets
/// `default_voice`.
pub fn voice_config(speakers: &[SpeakerConfig], default_voice: &str) -> VoiceConfig {
    match speakers {
        [] => VoiceConfig::Single {
            voice: default_voice.to_string(),
        },
        [speaker] => VoiceConfig::Single {
            voice: speaker.voice.clone(),
        },
        _ => VoiceConfig::MultiSpeaker {
            speakers: speakers.to_vec(),
        },
    }
}

impl ContentFlows {
    /// Synthesize a listening script as WAV (24 kHz, mono, 16-bit).
    #[instrument(skip(self, request), fields(speakers = request.speakers.len()))]
    pub async fn text_to_speech(&self, request: &TextToSpeechRequest) -> Result<TextToSpeechResponse> {
        let speech = SpeechRequest {
            model: self.models.speech.clone(),
            script: request.script.clone(),
            voice: voice_config(&request.speakers, &self.models.voice),
        };
        let media = self.provider.synthesize_speech(&speech).await?;
        if media.data.is_empty() {
            return Err(ProviderError::EmptyOutput("no audio data".into()).into());
        }
        let audio = speech_pcm_to_data_uri(&media.data)?;
        Ok(TextToSpeechResponse { audio })
    }

    /// Transcribe recorded audio. URL audio is downloaded first.
    #[instrument(skip(self, request))]
    pub async fn speech_to_text(&self, request: &SpeechToTextRequest) -> Result<SpeechToTextResponse> {
        let audio = self.inline_asset(&request.audio, "audio/wav").await?;
        let mut text_request = TextRequest::new(&self.models.transcription, TRANSCRIBE_INSTRUCTION);
        text_request.attachments.push(audio);
        text_request.temperature = 0.0;

        let response = self.provider.generate_text(&text_request).await?;
        Ok(SpeechToTextResponse {
            text: response.content.trim().to_string(),
        })
    }
}
