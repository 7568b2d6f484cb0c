//! Core types for sourced images.

use base64::Engine;
use serde::{Deserialize, Serialize};

/// Image formats the analyzer knows how to label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format.
    Png,
    /// JPEG format.
    #[default]
    Jpeg,
    /// WebP format.
    WebP,
    /// GIF format.
    Gif,
}

impl ImageFormat {
    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
            Self::Gif => "image/gif",
        }
    }

    /// Maps a MIME type (parameters allowed) back to a format.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            "image/gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }
        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some(Self::Gif);
        }
        if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }
        None
    }
}

/// Image bytes encoded for transmission to the model.
///
/// `data` is plain base64 with no `data:` URL prefix.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// Base64 payload.
    pub data: String,
    /// MIME type declared to the model.
    pub mime_type: String,
}

impl EncodedImage {
    /// Encodes raw bytes.
    ///
    /// The MIME type is taken from the magic bytes when recognised, else from
    /// `content_type` when it is an `image/*` type, else `image/jpeg`. Known
    /// aliases such as `image/jpg` are canonicalised.
    pub fn from_bytes(bytes: &[u8], content_type: Option<&str>) -> Self {
        let mime_type = ImageFormat::from_magic_bytes(bytes)
            .or_else(|| content_type.and_then(ImageFormat::from_mime_type))
            .map(|f| f.mime_type().to_string())
            .or_else(|| {
                content_type
                    .map(|ct| ct.split(';').next().unwrap_or_default().trim())
                    .filter(|ct| ct.starts_with("image/"))
                    .map(str::to_string)
            })
            .unwrap_or_else(|| ImageFormat::default().mime_type().to_string());

        Self {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            mime_type,
        }
    }

    /// Length of the base64 payload.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

// Payloads are megabytes of base64; keep them out of debug output.
impl std::fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncodedImage")
            .field("mime_type", &self.mime_type)
            .field("len", &self.data.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    const JPEG_MAGIC: [u8; 12] = [0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0, 0, 0, 0, 0];
    const WEBP_MAGIC: [u8; 12] = *b"RIFF\x00\x00\x00\x00WEBP";

    #[test]
    fn test_format_from_magic_bytes() {
        assert_eq!(
            ImageFormat::from_magic_bytes(&PNG_MAGIC),
            Some(ImageFormat::Png)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&JPEG_MAGIC),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&WEBP_MAGIC),
            Some(ImageFormat::WebP)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(b"GIF89a\x01\x00"),
            Some(ImageFormat::Gif)
        );
        assert_eq!(ImageFormat::from_magic_bytes(b"<html>"), None);
    }

    #[test]
    fn test_format_from_mime_type() {
        assert_eq!(
            ImageFormat::from_mime_type("image/png"),
            Some(ImageFormat::Png)
        );
        assert_eq!(
            ImageFormat::from_mime_type("image/jpeg; charset=binary"),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(ImageFormat::from_mime_type("text/html"), None);
    }

    #[test]
    fn test_encoded_image_has_no_data_url_prefix() {
        let encoded = EncodedImage::from_bytes(&PNG_MAGIC, Some("image/png"));
        assert!(!encoded.data.starts_with("data:"));
        assert_eq!(encoded.data, "iVBORw0KGgoAAAAA");
        assert_eq!(encoded.mime_type, "image/png");
    }

    #[test]
    fn test_encoded_image_mime_fallbacks() {
        let svg = EncodedImage::from_bytes(b"<svg/>", Some("image/svg+xml; charset=utf-8"));
        assert_eq!(svg.mime_type, "image/svg+xml");

        let alias = EncodedImage::from_bytes(b"????", Some("image/jpg"));
        assert_eq!(alias.mime_type, "image/jpeg");

        let unknown = EncodedImage::from_bytes(b"????", None);
        assert_eq!(unknown.mime_type, "image/jpeg");
    }

    #[test]
    fn test_debug_hides_payload() {
        let encoded = EncodedImage::from_bytes(&JPEG_MAGIC, None);
        let debug = format!("{:?}", encoded);
        assert!(!debug.contains(&encoded.data));
        assert!(debug.contains("image/jpeg"));
    }
}
