//! Inline payload (`data:` URI) codec.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use examforge_core::model::AssetRef;

use crate::error::StorageError;

/// A decoded inline payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlinePayload {
    /// Declared media type, e.g. "image/png". Empty if the URI declared none.
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl InlinePayload {
    pub fn new(media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            media_type: media_type.into(),
            bytes,
        }
    }

    /// Decode a `data:<media type>;base64,<payload>` reference.
    pub fn decode(asset: &AssetRef) -> Result<Self, StorageError> {
        let rest = asset
            .as_str()
            .strip_prefix("data:")
            .ok_or_else(|| StorageError::InvalidPayload("missing data: prefix".into()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| StorageError::InvalidPayload("missing ',' separator".into()))?;
        let mut params = header.split(';');
        let media_type = params.next().unwrap_or_default().to_string();
        if !params.any(|p| p.eq_ignore_ascii_case("base64")) {
            return Err(StorageError::InvalidPayload(format!(
                "only base64 payloads are supported ({media_type})"
            )));
        }
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| StorageError::InvalidPayload(e.to_string()))?;
        Ok(Self { media_type, bytes })
    }

    /// Encode back into an inline reference.
    pub fn encode(&self) -> AssetRef {
        AssetRef::new(format!(
            "data:{};base64,{}",
            self.media_type,
            STANDARD.encode(&self.bytes)
        ))
    }

    /// File extension for the declared subtype, or `default` when none is
    /// declared. Structured-syntax suffixes are dropped ("svg+xml" → "svg").
    pub fn extension_or(&self, default: &str) -> String {
        let subtype = self
            .media_type
            .split_once('/')
            .map(|(_, sub)| sub)
            .unwrap_or_default();
        let ext: String = subtype
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric())
            .collect();
        if ext.is_empty() {
            default.to_string()
        } else {
            ext.to_ascii_lowercase()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_base64_image() {
        let asset = AssetRef::new("data:image/jpeg;base64,aGVsbG8=");
        let payload = InlinePayload::decode(&asset).unwrap();
        assert_eq!(payload.media_type, "image/jpeg");
        assert_eq!(payload.bytes, b"hello");
        assert_eq!(payload.extension_or("png"), "jpeg");
        assert_eq!(payload.encode(), asset);
    }

    #[test]
    fn extension_defaults_and_suffixes() {
        assert_eq!(InlinePayload::new("", vec![]).extension_or("png"), "png");
        assert_eq!(InlinePayload::new("image/", vec![]).extension_or("png"), "png");
        assert_eq!(
            InlinePayload::new("image/svg+xml", vec![]).extension_or("png"),
            "svg"
        );
    }

    #[test]
    fn rejects_malformed_payloads() {
        for bad in [
            "https://cdn.example/a.png",
            "data:image/png;base64",
            "data:text/plain,hello",
            "data:image/png;base64,@@@",
        ] {
            let err = InlinePayload::decode(&AssetRef::new(bad)).unwrap_err();
            assert!(matches!(err, StorageError::InvalidPayload(_)), "{bad}");
        }
    }
}
