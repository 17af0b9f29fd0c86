// SPDX-License-Identifier: MPL-2.0

//! Error types for the photo booth

use crate::constants::messages;
use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Camera-related errors
    Camera(CameraError),
    /// Generation backend errors
    Generation(GenerationError),
    /// Upload / capture image errors
    ImageSource(ImageSourceError),
    /// Generate was requested without an active image
    ValidationFailed,
    /// Configuration errors
    Config(String),
    /// Storage/filesystem errors
    Storage(String),
    /// Generic error with message
    Other(String),
}

/// Camera-specific errors
///
/// Every variant maps to its own user-facing message, see [`CameraError::user_message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    /// No capture API on this system (no V4L2 support, sandbox without device access)
    Unsupported(String),
    /// The device exists but we are not allowed to open it
    PermissionDenied(String),
    /// No camera devices found
    DeviceNotFound(String),
    /// Camera is in use by another application
    DeviceBusy(String),
    /// Capture requested before the stream produced a frame
    NoFrameAvailable,
    /// Any other backend failure
    Backend(String),
}

/// Generation backend errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// Backend answered with a non-success status
    Failed(String),
    /// Request could not be sent or the reply could not be read
    Network(String),
    /// Reply was not the expected JSON document
    InvalidResponse(String),
}

/// Errors while turning a capture or upload into a [`crate::image_source::CapturedImage`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSourceError {
    /// Reading the file failed
    Read(String),
    /// Bytes are not a raster image we recognise
    UnsupportedFormat(String),
    /// Malformed `data:` URL
    InvalidDataUrl(String),
}

impl CameraError {
    /// Message shown in the blocking camera alert
    pub fn user_message(&self) -> &'static str {
        match self {
            CameraError::Unsupported(_) => {
                "This system does not allow camera access. Make sure a V4L2 camera is available to this session."
            }
            CameraError::PermissionDenied(_) => {
                "Permission denied. Allow access to the camera device (video group or portal) and try again."
            }
            CameraError::DeviceNotFound(_) => {
                "No camera was detected. If you are on a PC, connect a webcam."
            }
            CameraError::DeviceBusy(_) => {
                "The camera is being used by another application (Zoom, Meet, etc)."
            }
            CameraError::NoFrameAvailable => "The camera has not delivered an image yet.",
            CameraError::Backend(_) => "Could not access the camera.",
        }
    }

    /// Full alert text: user message plus the technical detail
    pub fn alert_text(&self) -> String {
        format!("{}\n\nTechnical detail: {}", self.user_message(), self)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Generation(e) => write!(f, "{}", e),
            AppError::ImageSource(e) => write!(f, "Image error: {}", e),
            AppError::ValidationFailed => write!(f, "{}", messages::IMAGE_REQUIRED),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::Unsupported(msg) => write!(f, "Camera capture unsupported: {}", msg),
            CameraError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            CameraError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            CameraError::DeviceBusy(msg) => write!(f, "Device busy: {}", msg),
            CameraError::NoFrameAvailable => write!(f, "No frame available for capture"),
            CameraError::Backend(msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // The backend message is shown to the user verbatim
            GenerationError::Failed(msg) => write!(f, "{}", msg),
            GenerationError::Network(msg) => write!(f, "Network error: {}", msg),
            GenerationError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
        }
    }
}

impl fmt::Display for ImageSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSourceError::Read(msg) => write!(f, "Failed to read image: {}", msg),
            ImageSourceError::UnsupportedFormat(msg) => write!(f, "Unsupported image: {}", msg),
            ImageSourceError::InvalidDataUrl(msg) => write!(f, "Invalid data URL: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for CameraError {}
impl std::error::Error for GenerationError {}
impl std::error::Error for ImageSourceError {}

impl From<CameraError> for AppError {
    fn from(err: CameraError) -> Self {
        AppError::Camera(err)
    }
}

impl From<GenerationError> for AppError {
    fn from(err: GenerationError) -> Self {
        AppError::Generation(err)
    }
}

impl From<ImageSourceError> for AppError {
    fn from(err: ImageSourceError) -> Self {
        AppError::ImageSource(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<std::io::Error> for ImageSourceError {
    fn from(err: std::io::Error) -> Self {
        ImageSourceError::Read(err.to_string())
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        GenerationError::Network(err.to_string())
    }
}
