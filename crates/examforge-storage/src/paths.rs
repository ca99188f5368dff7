//! Blob path convention.
//!
//! Delete relies on URLs recorded in the document, but uploads must land at
//! these paths so that re-saves overwrite the same objects.

use examforge_core::model::AssetLocation;

use crate::data_uri::InlinePayload;

/// Extension used for images whose payload declares no subtype.
pub const DEFAULT_IMAGE_EXTENSION: &str = "png";

/// Blob path for an asset of test `test_id` at `location`.
///
/// - part audio: `tests/{test}/{part}/audio.wav`
/// - question image: `tests/{test}/{part}/{question}/image.{ext}`
/// - option image: `tests/{test}/{part}/{question}/{option}.{ext}`
/// - fill-in-word slot image: `tests/{test}/{part}/{question}/{image}.{ext}`
pub fn blob_path(test_id: &str, location: AssetLocation, payload: &InlinePayload) -> String {
    let ext = payload.extension_or(DEFAULT_IMAGE_EXTENSION);
    match location {
        AssetLocation::PartAudio { part_id } => format!("tests/{test_id}/{part_id}/audio.wav"),
        AssetLocation::QuestionImage {
            part_id,
            question_id,
        } => format!("tests/{test_id}/{part_id}/{question_id}/image.{ext}"),
        AssetLocation::OptionImage {
            part_id,
            question_id,
            option_id,
        } => format!("tests/{test_id}/{part_id}/{question_id}/{option_id}.{ext}"),
        AssetLocation::SlotImage {
            part_id,
            question_id,
            image_id,
        } => format!("tests/{test_id}/{part_id}/{question_id}/{image_id}.{ext}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(media_type: &str) -> InlinePayload {
        InlinePayload::new(media_type, vec![1, 2, 3])
    }

    #[test]
    fn audio_is_always_wav() {
        let path = blob_path(
            "abc",
            AssetLocation::PartAudio { part_id: 7 },
            &payload("audio/mpeg"),
        );
        assert_eq!(path, "tests/abc/7/audio.wav");
    }

    #[test]
    fn image_paths_use_subtype() {
        assert_eq!(
            blob_path(
                "abc",
                AssetLocation::QuestionImage {
                    part_id: 1,
                    question_id: 2
                },
                &payload("image/jpeg"),
            ),
            "tests/abc/1/2/image.jpeg"
        );
        assert_eq!(
            blob_path(
                "abc",
                AssetLocation::OptionImage {
                    part_id: 1,
                    question_id: 2,
                    option_id: 3
                },
                &payload(""),
            ),
            "tests/abc/1/2/3.png"
        );
        assert_eq!(
            blob_path(
                "abc",
                AssetLocation::SlotImage {
                    part_id: 1,
                    question_id: 2,
                    image_id: 99
                },
                &payload("image/webp"),
            ),
            "tests/abc/1/2/99.webp"
        );
    }
}
