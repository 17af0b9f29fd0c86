// SPDX-License-Identifier: GPL-3.0-only

//! Client for the image-generation server
//!
//! One multipart `POST /api/generate` per user action, carrying the source
//! image (`image`) and the rendered prompt (`prompt`). No retries; a failed
//! attempt is final and the caller decides whether to try again.

pub mod prompt;
pub mod response;

pub use prompt::{GenerationContext, PromptTemplate, Track};
pub use response::{HealthStatus, ImageRef};

use crate::config::Config;
use crate::constants::endpoints;
use crate::errors::GenerationError;
use crate::image_source::{CapturedImage, EncodedImage};
use reqwest::Url;
use reqwest::multipart::{Form, Part};
use std::time::Duration;
use tracing::{debug, info, warn};

/// What the server produced for one request
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResult {
    pub image: EncodedImage,
    /// Where the image was fetched from, when it was not inline
    pub image_url: Option<Url>,
    pub qr_code: Option<EncodedImage>,
    /// Prompt that was sent
    pub prompt: String,
}

/// HTTP client for `/api/generate` and `/api/health`
#[derive(Debug, Clone)]
pub struct GenerationClient {
    http: reqwest::Client,
    base: Url,
    template: PromptTemplate,
}

impl GenerationClient {
    pub fn new(
        server_url: &str,
        template: PromptTemplate,
        timeout: Option<Duration>,
    ) -> Result<Self, GenerationError> {
        let base = Url::parse(server_url)
            .map_err(|e| GenerationError::Network(format!("bad server URL {}: {}", server_url, e)))?;

        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("photobooth/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            base,
            template,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, GenerationError> {
        Self::new(
            &config.server_url,
            PromptTemplate::from_config(config),
            config.request_timeout_secs.map(Duration::from_secs),
        )
    }

    pub fn server(&self) -> &Url {
        &self.base
    }

    pub fn render_prompt(&self, context: &GenerationContext) -> String {
        self.template.render(context)
    }

    fn endpoint(&self, path: &str) -> Result<Url, GenerationError> {
        self.base
            .join(path)
            .map_err(|e| GenerationError::Network(e.to_string()))
    }

    /// Submit `image` with the prompt for `context` and wait for the result
    pub async fn generate(
        &self,
        image: &CapturedImage,
        context: &GenerationContext,
    ) -> Result<GenerationResult, GenerationError> {
        let prompt = self.render_prompt(context);
        let url = self.endpoint(endpoints::GENERATE)?;

        let part = Part::bytes(image.image.bytes().to_vec())
            .file_name(endpoints::UPLOAD_FILE_NAME)
            .mime_str(image.image.mime())?;
        let form = Form::new()
            .part(endpoints::IMAGE_FIELD, part)
            .text(endpoints::PROMPT_FIELD, prompt.clone());

        info!(
            url = %url,
            bytes = image.image.bytes().len(),
            track = context.track.as_ref().map(|t| t.name.as_str()),
            "Sending generation request"
        );

        let response = self.http.post(url).multipart(form).send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "Generation response");

        if !status.is_success() {
            let message = response::failure_message(&body);
            warn!(status = status.as_u16(), %message, "Generation failed");
            return Err(GenerationError::Failed(message));
        }

        let parsed = response::parse_success(&body)?;
        let raw_image = parsed.image.unwrap_or_default();
        let (image, image_url) = match response::parse_image_ref(&raw_image, &self.base)? {
            ImageRef::Inline(image) => (image, None),
            ImageRef::Remote(url) => (self.fetch_image(&url).await?, Some(url)),
        };

        let qr_code = match parsed.qr_code.as_deref().filter(|q| !q.is_empty()) {
            None => None,
            Some(raw) => match self.resolve_optional(raw).await {
                Ok(qr) => Some(qr),
                Err(e) => {
                    warn!(error = %e, "Ignoring unusable QR code");
                    None
                }
            },
        };

        info!(
            image = ?image,
            qr = qr_code.is_some(),
            "Generation succeeded"
        );
        Ok(GenerationResult {
            image,
            image_url,
            qr_code,
            prompt,
        })
    }

    async fn resolve_optional(&self, raw: &str) -> Result<EncodedImage, GenerationError> {
        match response::parse_image_ref(raw, &self.base)? {
            ImageRef::Inline(image) => Ok(image),
            ImageRef::Remote(url) => self.fetch_image(&url).await,
        }
    }

    async fn fetch_image(&self, url: &Url) -> Result<EncodedImage, GenerationError> {
        debug!(url = %url, "Fetching generated image");
        let response = self.http.get(url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(GenerationError::Network(format!(
                "HTTP status: {} for {}",
                response.status(),
                url
            )));
        }
        let bytes = response.bytes().await?;
        EncodedImage::from_bytes(bytes.to_vec())
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))
    }

    /// Ask the server whether it is configured with an API key
    pub async fn check_health(&self) -> Result<HealthStatus, GenerationError> {
        let url = self.endpoint(endpoints::HEALTH)?;
        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(GenerationError::Network(format!(
                "HTTP status: {}",
                response.status()
            )));
        }
        let body = response.bytes().await?;
        let status: HealthStatus = serde_json::from_slice(&body)
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;
        info!(has_api_key = status.has_api_key, "Health check");
        Ok(status)
    }
}
