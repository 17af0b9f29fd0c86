// SPDX-License-Identifier: GPL-3.0-only

//! Live camera handle

use crate::backends::camera::{CameraDevice, CameraFormat, CameraFrame, CameraStream};
use std::time::Instant;
use tracing::info;

/// One open camera stream
///
/// Owning the session owns the device: dropping it stops every track.
pub struct CameraSession {
    stream: Box<dyn CameraStream>,
    opened_at: Instant,
}

impl CameraSession {
    pub fn new(stream: Box<dyn CameraStream>) -> Self {
        Self {
            stream,
            opened_at: Instant::now(),
        }
    }

    pub fn device(&self) -> &CameraDevice {
        self.stream.device()
    }

    pub fn format(&self) -> &CameraFormat {
        self.stream.format()
    }

    pub fn latest_frame(&self) -> Option<CameraFrame> {
        self.stream.latest_frame()
    }

    pub fn active_tracks(&self) -> usize {
        self.stream.active_tracks()
    }

    /// Stop all tracks and release the device
    pub fn release(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if self.stream.active_tracks() == 0 {
            return;
        }
        self.stream.stop();
        info!(
            device = %self.stream.device().name,
            open_for_ms = self.opened_at.elapsed().as_millis() as u64,
            "Camera session released"
        );
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for CameraSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraSession")
            .field("device", &self.stream.device().path)
            .field("format", &self.stream.format().to_string())
            .field("tracks", &self.stream.active_tracks())
            .finish()
    }
}
