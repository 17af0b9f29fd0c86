// SPDX-License-Identifier: MPL-2.0

//! Camera backend abstraction
//!
//! ```text
//! ┌─────────────────────┐
//! │   MediaCapture      │  ← camera modal state, countdown, still capture
//! └──────────┬──────────┘
//!            │ open_stream()
//!            ▼
//! ┌─────────────────────┐
//! │  CameraBackend      │  ← enumeration, device selection
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │  CameraStream       │  ← one live capture, latest frame, stop
//! └─────────────────────┘
//!       ┌──────┴──────┐
//!     V4L2     Virtual (still image)
//! ```

pub mod format_converters;
pub mod types;
pub mod v4l2;

pub use types::*;

use std::sync::Arc;

/// A source of camera streams
///
/// Opening may block (device negotiation, first frame), so callers run it off
/// the UI thread.
pub trait CameraBackend: Send + Sync {
    /// Whether any capture API exists on this system
    fn is_available(&self) -> bool;

    /// Enumerate available cameras on this backend
    fn enumerate_cameras(&self) -> Vec<CameraDevice>;

    /// Open the device chosen by `request` and start streaming
    ///
    /// # Returns
    /// * `Ok(stream)` - The stream has produced at least one frame
    /// * `Err(BackendError)` - Classified failure (permission, busy, missing, ...)
    fn open_stream(&self, request: &StreamRequest) -> BackendResult<Box<dyn CameraStream>>;
}

/// One live camera stream ("tracks" in browser terms)
pub trait CameraStream: Send {
    fn device(&self) -> &CameraDevice;

    fn format(&self) -> &CameraFormat;

    /// Most recent frame at the stream's native resolution
    fn latest_frame(&self) -> Option<CameraFrame>;

    /// Number of live tracks; zero once stopped
    fn active_tracks(&self) -> usize;

    /// Stop all tracks and release the device. Idempotent.
    fn stop(&mut self);
}

/// Default backend for this system
pub fn get_backend() -> Arc<dyn CameraBackend> {
    Arc::new(v4l2::V4l2Backend::new())
}
