//! PCM to WAV wrapping for synthesized speech.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

use examforge_core::model::AssetRef;

/// Sample rate of synthesized speech.
pub const SPEECH_SAMPLE_RATE: u32 = 24_000;
/// Synthesized speech is mono.
pub const SPEECH_CHANNELS: u16 = 1;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("WAV encoding failed: {0}")]
    Wav(#[from] hound::Error),

    #[error("PCM16 data has an odd number of bytes ({0})")]
    OddLength(usize),
}

/// Wrap raw 16-bit little-endian PCM in a WAV container.
pub fn pcm16_to_wav(pcm: &[u8], channels: u16, sample_rate: u32) -> Result<Vec<u8>, AudioError> {
    if pcm.len() % 2 != 0 {
        return Err(AudioError::OddLength(pcm.len()));
    }

    let mut buffer = Cursor::new(Vec::new());
    let mut writer = hound::WavWriter::new(
        &mut buffer,
        hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        },
    )?;

    for sample in pcm
        .chunks_exact(2)
        .map(|chunk| i16::from_le_bytes([chunk[0], chunk[1]]))
    {
        writer.write_sample(sample)?;
    }

    writer.finalize()?;
    Ok(buffer.into_inner())
}

/// Wrap speech PCM (24 kHz mono) as an inline `audio/wav` payload.
pub fn speech_pcm_to_data_uri(pcm: &[u8]) -> Result<AssetRef, AudioError> {
    let wav = pcm16_to_wav(pcm, SPEECH_CHANNELS, SPEECH_SAMPLE_RATE)?;
    Ok(AssetRef::new(format!(
        "data:audio/wav;base64,{}",
        STANDARD.encode(wav)
    )))
}
