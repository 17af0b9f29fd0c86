// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use crate::errors::CameraError;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Device information from V4L2 capability
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Name of the device (V4L2 card)
    pub card: String,
    /// Driver name (V4L2 driver)
    pub driver: String,
    /// Bus the device hangs off (e.g. `usb-0000:00:14.0-5`, `platform:...`)
    pub bus_info: String,
}

/// A camera that can be opened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    /// Human-readable name
    pub name: String,
    /// Device path, e.g. `/dev/video0`
    pub path: String,
    pub device_info: Option<DeviceInfo>,
}

impl CameraDevice {
    /// Heuristic for "user-facing" cameras (laptop bezels, phone front sensors)
    pub fn is_front_facing(&self) -> bool {
        let name = self.name.to_lowercase();
        const HINTS: [&str; 5] = ["front", "user", "integrated", "facetime", "webcam"];
        HINTS.iter().any(|h| name.contains(h))
    }
}

/// Negotiated capture format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraFormat {
    pub width: u32,
    pub height: u32,
    pub framerate: Option<u32>,
    /// FourCC (e.g. "MJPG", "YUYV")
    pub pixel_format: String,
}

impl std::fmt::Display for CameraFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.framerate {
            Some(fps) => write!(f, "{}x{}@{} {}", self.width, self.height, fps, self.pixel_format),
            None => write!(f, "{}x{} {}", self.width, self.height, self.pixel_format),
        }
    }
}

/// What the booth asks for when opening a camera
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamRequest {
    /// Explicit device path; overrides facing preference
    pub device_path: Option<String>,
    /// Prefer a front-facing device when several exist
    pub prefer_front: bool,
}

impl StreamRequest {
    pub fn front_facing() -> Self {
        Self {
            device_path: None,
            prefer_front: true,
        }
    }

    /// Pick a device out of `devices` according to this request
    pub fn select<'a>(&self, devices: &'a [CameraDevice]) -> Option<&'a CameraDevice> {
        if let Some(path) = &self.device_path {
            return devices.iter().find(|d| &d.path == path);
        }
        if self.prefer_front
            && let Some(front) = devices.iter().find(|d| d.is_front_facing())
        {
            return Some(front);
        }
        devices.first()
    }
}

/// A single RGBA frame at the stream's native resolution
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// RGBA8 pixel data, `stride` bytes per row
    pub data: Arc<[u8]>,
    pub stride: u32,
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Wrap tightly packed RGBA data
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data: Arc::from(data.into_boxed_slice()),
            stride: width * 4,
            captured_at: Instant::now(),
        }
    }

    /// RGB of the pixel at (x, y), clamped to the frame
    pub fn rgb_at(&self, x: u32, y: u32) -> (u8, u8, u8) {
        if self.width == 0 || self.height == 0 {
            return (0, 0, 0);
        }
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        let idx = (y * self.stride + x * 4) as usize;
        if idx + 2 < self.data.len() {
            (self.data[idx], self.data[idx + 1], self.data[idx + 2])
        } else {
            (0, 0, 0)
        }
    }

    /// Copy into an `image` buffer, dropping any stride padding
    pub fn to_rgba_image(&self) -> Option<image::RgbaImage> {
        let row_bytes = (self.width * 4) as usize;
        let mut packed = Vec::with_capacity(row_bytes * self.height as usize);
        for row in 0..self.height as usize {
            let start = row * self.stride as usize;
            packed.extend_from_slice(self.data.get(start..start + row_bytes)?);
        }
        image::RgbaImage::from_raw(self.width, self.height, packed)
    }
}

/// Latest frame slot shared between a capture thread and its consumers
pub type FrameSlot = Arc<Mutex<Option<CameraFrame>>>;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Backend is not available on this system
    NotAvailable(String),
    /// Opening the device was refused
    PermissionDenied(String),
    /// Camera device not found
    DeviceNotFound(String),
    /// Device is held by someone else
    DeviceBusy(String),
    /// Format not supported
    FormatNotSupported(String),
    /// General I/O error
    IoError(String),
    /// Other errors
    Other(String),
}

impl BackendError {
    /// Classify an I/O error from opening or streaming `context`
    pub fn from_io(err: &io::Error, context: &str) -> Self {
        let msg = format!("{}: {}", context, err);
        match err.kind() {
            io::ErrorKind::PermissionDenied => BackendError::PermissionDenied(msg),
            io::ErrorKind::NotFound => BackendError::DeviceNotFound(msg),
            io::ErrorKind::ResourceBusy => BackendError::DeviceBusy(msg),
            io::ErrorKind::Unsupported => BackendError::NotAvailable(msg),
            _ => BackendError::IoError(msg),
        }
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::NotAvailable(msg) => write!(f, "Backend not available: {}", msg),
            BackendError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            BackendError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            BackendError::DeviceBusy(msg) => write!(f, "Device busy: {}", msg),
            BackendError::FormatNotSupported(msg) => write!(f, "Format not supported: {}", msg),
            BackendError::IoError(msg) => write!(f, "I/O error: {}", msg),
            BackendError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<BackendError> for CameraError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::NotAvailable(msg) => CameraError::Unsupported(msg),
            BackendError::PermissionDenied(msg) => CameraError::PermissionDenied(msg),
            BackendError::DeviceNotFound(msg) => CameraError::DeviceNotFound(msg),
            BackendError::DeviceBusy(msg) => CameraError::DeviceBusy(msg),
            other => CameraError::Backend(other.to_string()),
        }
    }
}
