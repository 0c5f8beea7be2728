//! Embedded raster image data.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors when importing image data.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Unsupported image format")]
    UnsupportedFormat,
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Invalid base64 data: {0}")]
    Base64(String),
}

/// Image format for stored image data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
    WebP,
}

impl ImageFormat {
    /// MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::WebP => "image/webp",
        }
    }

    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "webp" => Some(ImageFormat::WebP),
            _ => None,
        }
    }

    /// Detect format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(ImageFormat::Png);
        }
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }
        None
    }
}

/// Source of an image shape: encoded bytes stored as base64.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSource {
    pub format: ImageFormat,
    /// Intrinsic width in pixels.
    pub source_width: u32,
    /// Intrinsic height in pixels.
    pub source_height: u32,
    /// Base64-encoded file contents.
    pub data: String,
}

impl ImageSource {
    /// Decode `bytes` to learn the intrinsic size and keep the encoded data.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ImageError> {
        let format = ImageFormat::from_magic_bytes(bytes).ok_or(ImageError::UnsupportedFormat)?;
        let decoded =
            image::load_from_memory(bytes).map_err(|e| ImageError::Decode(e.to_string()))?;
        Ok(Self {
            format,
            source_width: decoded.width(),
            source_height: decoded.height(),
            data: BASE64.encode(bytes),
        })
    }

    /// Decode the stored base64 back to bytes.
    pub fn bytes(&self) -> Result<Vec<u8>, ImageError> {
        BASE64
            .decode(&self.data)
            .map_err(|e| ImageError::Base64(e.to_string()))
    }

    /// Size of the encoded file in bytes (without decoding). Truncated or
    /// malformed data yields an estimate, never a panic.
    pub fn encoded_len(&self) -> usize {
        let padding = self.data.bytes().rev().take_while(|&b| b == b'=').count();
        ((self.data.len() / 4) * 3).saturating_sub(padding.min(2))
    }

    /// `data:` URL suitable for SVG/HTML embedding.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.format.mime_type(), self.data)
    }

    /// Display size that fits within `max` on both axes, keeping aspect ratio.
    pub fn fitted_size(&self, max: f64) -> (f64, f64) {
        let (w, h) = (self.source_width as f64, self.source_height as f64);
        if w <= max && h <= max {
            return (w, h);
        }
        let scale = (max / w).min(max / h);
        (w * scale, h * scale)
    }
}
