// SPDX-License-Identifier: GPL-3.0-only

//! `/api/generate` and `/api/health` reply bodies

use crate::constants::messages;
use crate::errors::GenerationError;
use crate::image_source::EncodedImage;
use reqwest::Url;
use serde::Deserialize;

/// Body of a generate reply, success or failure
#[derive(Debug, Default, Deserialize)]
pub struct GenerateBody {
    pub image: Option<String>,
    #[serde(rename = "qrCode")]
    pub qr_code: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    #[serde(rename = "hasApiKey", default)]
    pub has_api_key: bool,
}

/// Displayable image reference returned by the backend
#[derive(Debug, Clone, PartialEq)]
pub enum ImageRef {
    /// `data:` URL, already decoded
    Inline(EncodedImage),
    /// Absolute URL to fetch
    Remote(Url),
}

/// Failure message for a non-success status: the body's `error` field, else generic
pub fn failure_message(body: &[u8]) -> String {
    serde_json::from_slice::<GenerateBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| messages::GENERATION_FAILED.to_string())
}

pub fn parse_success(body: &[u8]) -> Result<GenerateBody, GenerationError> {
    let parsed: GenerateBody = serde_json::from_slice(body)
        .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;
    if parsed.image.as_deref().is_none_or(str::is_empty) {
        return Err(GenerationError::InvalidResponse(
            "reply carries no image".to_string(),
        ));
    }
    Ok(parsed)
}

/// Resolve an image reference: data URLs decode in place, anything else is
/// a URL relative to `base`
pub fn parse_image_ref(raw: &str, base: &Url) -> Result<ImageRef, GenerationError> {
    let raw = raw.trim();
    if raw.starts_with("data:") {
        return EncodedImage::from_data_url(raw)
            .map(ImageRef::Inline)
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()));
    }
    base.join(raw)
        .map(ImageRef::Remote)
        .map_err(|e| GenerationError::InvalidResponse(format!("bad image URL {:?}: {}", raw, e)))
}
