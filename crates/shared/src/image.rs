//! Story and profile image payloads.
//!
//! The client sends either a remote URL or an inline
//! `data:image/<type>;base64,<payload>` URI. Inline payloads are decoded once
//! here to check their size and encoding; the original string is what gets
//! stored.

use base64::{engine::general_purpose::STANDARD, Engine};
use thiserror::Error;

const ALLOWED_MIME_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/webp", "image/gif", "image/heic"];
const MAX_URL_LEN: usize = 2048;

/// Error type for image payload parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageError {
    #[error("Image is required")]
    Empty,

    #[error("Image must be an http(s) URL or a base64 data URI")]
    UnsupportedScheme,

    #[error("Image URL is too long")]
    UrlTooLong,

    #[error("Unsupported image type: {0}")]
    UnsupportedType(String),

    #[error("Image data is not valid base64")]
    InvalidEncoding,

    #[error("Image exceeds the maximum size of {max} bytes")]
    TooLarge { max: usize },
}

/// A validated image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImagePayload {
    Url(String),
    Inline { mime_type: String, size_bytes: usize },
}

impl ImagePayload {
    /// Parses and validates a raw image string.
    pub fn parse(raw: &str, max_bytes: usize) -> Result<Self, ImageError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ImageError::Empty);
        }

        if let Some(rest) = raw.strip_prefix("data:") {
            return Self::parse_data_uri(rest, max_bytes);
        }

        let lower = raw.to_ascii_lowercase();
        if lower.starts_with("https://") || lower.starts_with("http://") {
            if raw.len() > MAX_URL_LEN {
                return Err(ImageError::UrlTooLong);
            }
            return Ok(ImagePayload::Url(raw.to_string()));
        }

        Err(ImageError::UnsupportedScheme)
    }

    fn parse_data_uri(rest: &str, max_bytes: usize) -> Result<Self, ImageError> {
        let (header, data) = rest
            .split_once(',')
            .ok_or(ImageError::UnsupportedScheme)?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or(ImageError::UnsupportedScheme)?
            .to_ascii_lowercase();

        if !ALLOWED_MIME_TYPES.contains(&mime_type.as_str()) {
            return Err(ImageError::UnsupportedType(mime_type));
        }

        // Reject before decoding when the encoded form is already too big.
        if data.len() / 4 * 3 > max_bytes + 2 {
            return Err(ImageError::TooLarge { max: max_bytes });
        }

        let decoded = STANDARD
            .decode(data.as_bytes())
            .map_err(|_| ImageError::InvalidEncoding)?;
        if decoded.is_empty() {
            return Err(ImageError::Empty);
        }
        if decoded.len() > max_bytes {
            return Err(ImageError::TooLarge { max: max_bytes });
        }

        Ok(ImagePayload::Inline {
            mime_type,
            size_bytes: decoded.len(),
        })
    }
}
