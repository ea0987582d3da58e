//! Per-entry decoding.

use async_trait::async_trait;

use crate::error::EntryError;

/// Turns raw entry bytes into artifact payloads.
///
/// Implementations may suspend; the extractor runs all entries' decodes
/// concurrently and waits for every one of them to settle.
#[async_trait]
pub trait EntryDecoder: Send + Sync {
    /// Decode a text entry.
    async fn decode_text(&self, name: &str, data: Vec<u8>) -> Result<String, EntryError>;

    /// Decode an image entry.
    async fn decode_image(&self, name: &str, data: Vec<u8>) -> Result<Vec<u8>, EntryError>;
}

/// Strict UTF-8 for text, pass-through for images.
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8Decoder;

#[async_trait]
impl EntryDecoder for Utf8Decoder {
    async fn decode_text(&self, name: &str, data: Vec<u8>) -> Result<String, EntryError> {
        String::from_utf8(data).map_err(|e| EntryError::InvalidText {
            name: name.to_string(),
            reason: e.utf8_error().to_string(),
        })
    }

    async fn decode_image(&self, _name: &str, data: Vec<u8>) -> Result<Vec<u8>, EntryError> {
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_utf8_text() {
        let text = Utf8Decoder
            .decode_text("forecast_summary_report.txt", "Wachstum über 5%".as_bytes().to_vec())
            .await
            .unwrap();
        assert_eq!(text, "Wachstum über 5%");
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_rejected() {
        let err = Utf8Decoder
            .decode_text("full_forecast_data.csv", vec![b'd', b's', 0xff, 0xfe])
            .await
            .unwrap_err();
        assert!(matches!(err, EntryError::InvalidText { .. }));
        assert_eq!(err.name(), "full_forecast_data.csv");
    }

    #[tokio::test]
    async fn test_images_pass_through() {
        let bytes = vec![0x89, b'P', b'N', b'G', 0x00, 0xff];
        let out = Utf8Decoder.decode_image("a.png", bytes.clone()).await.unwrap();
        assert_eq!(out, bytes);
    }
}
