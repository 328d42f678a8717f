//! Image format detection and data URI helpers.

use crate::error::{GenBridgeError, Result};
use base64::Engine;
use std::path::{Path, PathBuf};

/// Image formats recognized in provider payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    /// PNG format (lossless).
    #[default]
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format.
    WebP,
    /// GIF format.
    Gif,
}

impl ImageFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
            Self::Gif => "gif",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
            Self::Gif => "image/gif",
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some(Self::Gif);
        }

        None
    }

    /// Detects image format from the leading characters of its base64 encoding.
    pub fn from_base64_prefix(b64: &str) -> Option<Self> {
        if b64.starts_with("iVBOR") {
            Some(Self::Png)
        } else if b64.starts_with("/9j/") {
            Some(Self::Jpeg)
        } else if b64.starts_with("UklGR") {
            Some(Self::WebP)
        } else if b64.starts_with("R0lGOD") {
            Some(Self::Gif)
        } else {
            None
        }
    }

    /// Maps an `image/*` content type to a format.
    pub fn from_mime_type(content_type: &str) -> Option<Self> {
        let mime = content_type.split(';').next().unwrap_or_default().trim();
        match mime.to_ascii_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            "image/gif" => Some(Self::Gif),
            _ => None,
        }
    }
}

/// Wraps raw image bytes in a data URI.
///
/// The format comes from the magic bytes, then the response content type,
/// and falls back to PNG.
pub fn to_data_uri(bytes: &[u8], content_type: Option<&str>) -> String {
    let format = ImageFormat::from_magic_bytes(bytes)
        .or_else(|| content_type.and_then(ImageFormat::from_mime_type))
        .unwrap_or_default();
    format!(
        "data:{};base64,{}",
        format.mime_type(),
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

/// Wraps an already-encoded base64 image in a data URI.
pub fn base64_data_uri(b64: &str) -> String {
    let format = ImageFormat::from_base64_prefix(b64).unwrap_or_default();
    format!("data:{};base64,{}", format.mime_type(), b64)
}

/// Gives `path` the extension of the image in `bytes` when it has none.
///
/// A path that already carries an extension is returned unchanged.
pub fn with_image_extension(path: &Path, bytes: &[u8]) -> PathBuf {
    if path.extension().is_some() {
        return path.to_path_buf();
    }
    let format = ImageFormat::from_magic_bytes(bytes).unwrap_or_default();
    path.with_extension(format.extension())
}

/// Decodes a data URI or bare base64 string to bytes.
///
/// Tolerates a `data:...;base64,` prefix, embedded whitespace and missing
/// padding.
pub fn decode_data_uri(input: &str) -> Result<Vec<u8>> {
    let b64 = match input.find(";base64,") {
        Some(pos) => &input[pos + 8..],
        None => input,
    };

    let cleaned: String = b64.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    if let Ok(data) = base64::engine::general_purpose::STANDARD.decode(&cleaned) {
        return Ok(data);
    }

    base64::engine::general_purpose::STANDARD_NO_PAD
        .decode(cleaned.trim_end_matches('='))
        .map_err(|e| GenBridgeError::Decode(e.to_string()))
}
