// SPDX-License-Identifier: GPL-3.0-only

//! Still-image virtual camera
//!
//! Serves a picture from disk as if it were a live camera. Used for kiosk
//! rehearsals on machines without a webcam and by the integration tests.

use crate::backends::camera::{
    BackendError, BackendResult, CameraBackend, CameraDevice, CameraFormat, CameraFrame,
    CameraStream, DeviceInfo, StreamRequest,
};
use crate::constants::file_formats;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

/// Path prefix distinguishing virtual devices from `/dev/video*`
pub const VIRTUAL_PREFIX: &str = "virtual:";

/// Load an image file as an RGBA camera frame
pub fn load_image_as_frame(path: &Path) -> BackendResult<CameraFrame> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    if !file_formats::is_image_extension(&extension) {
        return Err(BackendError::FormatNotSupported(format!(
            "Unsupported file format: {}",
            extension
        )));
    }

    let img = image::open(path).map_err(|e| match e {
        image::ImageError::IoError(io) => BackendError::from_io(&io, &path.display().to_string()),
        other => BackendError::FormatNotSupported(other.to_string()),
    })?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(CameraFrame::from_rgba(width, height, rgba.into_raw()))
}

/// Backend exposing one still image as a camera
pub struct VirtualCameraBackend {
    source: PathBuf,
    opened: Arc<AtomicUsize>,
}

impl VirtualCameraBackend {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            opened: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Streams currently open against this backend
    pub fn open_streams(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    fn device(&self) -> CameraDevice {
        let name = self
            .source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "image".to_string());
        CameraDevice {
            name: format!("Virtual camera ({})", name),
            path: format!("{}{}", VIRTUAL_PREFIX, self.source.display()),
            device_info: Some(DeviceInfo {
                card: "Virtual camera".to_string(),
                driver: "file".to_string(),
                bus_info: String::new(),
            }),
        }
    }
}

impl CameraBackend for VirtualCameraBackend {
    fn is_available(&self) -> bool {
        true
    }

    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        vec![self.device()]
    }

    fn open_stream(&self, _request: &StreamRequest) -> BackendResult<Box<dyn CameraStream>> {
        let frame = load_image_as_frame(&self.source)?;
        let device = self.device();
        info!(device = %device.name, width = frame.width, height = frame.height, "Virtual camera opened");

        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StillStream {
            format: CameraFormat {
                width: frame.width,
                height: frame.height,
                framerate: None,
                pixel_format: "RGBA".to_string(),
            },
            device,
            frame: Some(frame),
            opened: self.opened.clone(),
        }))
    }
}

struct StillStream {
    device: CameraDevice,
    format: CameraFormat,
    frame: Option<CameraFrame>,
    opened: Arc<AtomicUsize>,
}

impl CameraStream for StillStream {
    fn device(&self) -> &CameraDevice {
        &self.device
    }

    fn format(&self) -> &CameraFormat {
        &self.format
    }

    fn latest_frame(&self) -> Option<CameraFrame> {
        self.frame.as_ref().map(|f| CameraFrame {
            captured_at: std::time::Instant::now(),
            ..f.clone()
        })
    }

    fn active_tracks(&self) -> usize {
        usize::from(self.frame.is_some())
    }

    fn stop(&mut self) {
        if self.frame.take().is_some() {
            self.opened.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Drop for StillStream {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn still_stream_serves_native_resolution_until_stopped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("portrait.png");
        image::RgbaImage::from_pixel(8, 6, image::Rgba([1, 2, 3, 255]))
            .save(&path)
            .unwrap();

        let backend = VirtualCameraBackend::new(&path);
        let mut stream = backend.open_stream(&StreamRequest::front_facing()).unwrap();
        assert_eq!(backend.open_streams(), 1);

        let frame = stream.latest_frame().unwrap();
        assert_eq!((frame.width, frame.height), (8, 6));
        assert_eq!(frame.rgb_at(3, 3), (1, 2, 3));

        stream.stop();
        stream.stop();
        assert_eq!(stream.active_tracks(), 0);
        assert_eq!(backend.open_streams(), 0);
        assert!(stream.latest_frame().is_none());
    }

    #[test]
    fn missing_file_is_device_not_found() {
        let backend = VirtualCameraBackend::new("/nonexistent/booth.png");
        let err = backend
            .open_stream(&StreamRequest::default())
            .err()
            .unwrap();
        assert!(matches!(err, BackendError::DeviceNotFound(_)));
    }
}
