// SPDX-License-Identifier: GPL-3.0-only

//! Source image for a generation: camera capture or file upload
//!
//! Both paths end in a [`CapturedImage`], an encoded raster image that knows
//! its own MIME type. At most one is active at a time; a new capture or
//! upload replaces the previous one.

use crate::backends::camera::CameraFrame;
use crate::errors::{AppError, AppResult, ImageSourceError};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Encoded raster image (mime type + bytes)
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedImage {
    mime: String,
    bytes: Arc<[u8]>,
    width: u32,
    height: u32,
}

impl EncodedImage {
    /// Wrap encoded bytes, sniffing the format from the content
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, ImageSourceError> {
        let bytes = bytes.into();
        let reader = ImageReader::new(Cursor::new(&bytes))
            .with_guessed_format()
            .map_err(|e| ImageSourceError::Read(e.to_string()))?;
        let format = reader.format().ok_or_else(|| {
            ImageSourceError::UnsupportedFormat("unrecognised image data".to_string())
        })?;
        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| ImageSourceError::UnsupportedFormat(e.to_string()))?;

        Ok(Self {
            mime: format.to_mime_type().to_string(),
            bytes: Arc::from(bytes.into_boxed_slice()),
            width,
            height,
        })
    }

    /// Encode an RGBA camera frame as PNG at its native resolution
    pub fn from_frame(frame: &CameraFrame) -> Result<Self, ImageSourceError> {
        let rgba = frame.to_rgba_image().ok_or_else(|| {
            ImageSourceError::UnsupportedFormat("frame data does not match its size".to_string())
        })?;
        let mut png = Vec::new();
        rgba.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| ImageSourceError::UnsupportedFormat(e.to_string()))?;
        Ok(Self {
            mime: "image/png".to_string(),
            bytes: Arc::from(png.into_boxed_slice()),
            width: frame.width,
            height: frame.height,
        })
    }

    /// Parse a base64 `data:<mime>;base64,<payload>` URL
    pub fn from_data_url(url: &str) -> Result<Self, ImageSourceError> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| ImageSourceError::InvalidDataUrl("missing data: scheme".to_string()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| ImageSourceError::InvalidDataUrl("missing payload".to_string()))?;
        let Some(declared_mime) = header.strip_suffix(";base64") else {
            return Err(ImageSourceError::InvalidDataUrl(
                "only base64 payloads are supported".to_string(),
            ));
        };
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| ImageSourceError::InvalidDataUrl(e.to_string()))?;

        let image = Self::from_bytes(bytes)?;
        if !declared_mime.is_empty() && declared_mime != image.mime {
            debug!(declared = declared_mime, sniffed = %image.mime, "data URL mime differs from content");
        }
        Ok(image)
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// File extension matching the MIME type
    pub fn extension(&self) -> &'static str {
        ImageFormat::from_mime_type(&self.mime)
            .and_then(|f| f.extensions_str().first().copied())
            .unwrap_or("png")
    }

    /// Decode for display
    pub fn decode(&self) -> Option<image::DynamicImage> {
        image::load_from_memory(&self.bytes).ok()
    }
}

impl std::fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "EncodedImage({}, {}x{}, {} bytes)",
            self.mime,
            self.width,
            self.height,
            self.bytes.len()
        )
    }
}

/// Where the active image came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageOrigin {
    Camera,
    Upload(PathBuf),
}

/// The image that will be submitted for generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    pub image: EncodedImage,
    pub origin: ImageOrigin,
}

impl CapturedImage {
    pub fn from_frame(frame: &CameraFrame) -> Result<Self, ImageSourceError> {
        Ok(Self {
            image: EncodedImage::from_frame(frame)?,
            origin: ImageOrigin::Camera,
        })
    }

    /// Read a user-selected file without blocking the UI thread
    pub async fn read_upload(path: PathBuf) -> Result<Self, ImageSourceError> {
        let bytes = tokio::fs::read(&path).await?;
        let image = EncodedImage::from_bytes(bytes)?;
        info!(path = %path.display(), mime = image.mime(), "Upload read");
        Ok(Self {
            image,
            origin: ImageOrigin::Upload(path),
        })
    }
}

/// Holder of the single active source image
#[derive(Debug, Default)]
pub struct ImageSource {
    active: Option<CapturedImage>,
    /// Bumped on every change so views can cache decoded previews
    revision: u64,
}

impl ImageSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `path` and make it the active image
    pub async fn from_upload(&mut self, path: &Path) -> Result<(), ImageSourceError> {
        let image = CapturedImage::read_upload(path.to_path_buf()).await?;
        self.set(image);
        Ok(())
    }

    /// Accept a camera capture as the active image
    pub fn from_capture(&mut self, image: CapturedImage) {
        self.set(image);
    }

    /// Replace the active image
    pub fn set(&mut self, image: CapturedImage) {
        debug!(origin = ?image.origin, image = ?image.image, "Active image replaced");
        self.active = Some(image);
        self.revision += 1;
    }

    pub fn clear(&mut self) {
        if self.active.take().is_some() {
            self.revision += 1;
        }
    }

    /// True iff an active image is present
    pub fn is_valid(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<&CapturedImage> {
        self.active.as_ref()
    }

    /// The active image, or [`AppError::ValidationFailed`] when there is none
    pub fn require(&self) -> AppResult<&CapturedImage> {
        self.active.as_ref().ok_or(AppError::ValidationFailed)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}
