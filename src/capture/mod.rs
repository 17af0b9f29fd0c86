// SPDX-License-Identifier: GPL-3.0-only

//! Camera modal: open a session, count down, capture a still
//!
//! ```text
//! Closed ──open()──▶ Requesting ──ok──▶ Streaming ──start_countdown()──▶ Countdown(n)
//!   ▲                    │                  │                                 │
//!   │                  error              close()                       tick() → 0
//!   └────────────────────┴──────────────────┴───────── capture_frame() ◀──────┘
//! ```
//!
//! Opening blocks on the device, so it is split in two halves: [`MediaCapture::begin_open`]
//! hands out an [`OpenRequest`] that runs off the UI thread, and
//! [`MediaCapture::finish_open`] accepts the result. Requests and countdown
//! ticks carry epochs; anything that completes after the modal moved on is
//! discarded, and a session that arrives late is released on the spot.

pub mod countdown;
pub mod session;

pub use countdown::{CountdownState, CountdownStep};
pub use session::CameraSession;

use crate::backends::camera::{CameraBackend, CameraFrame, StreamRequest};
use crate::constants::timing;
use crate::errors::CameraError;
use crate::image_source::CapturedImage;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Visible state of the camera modal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CameraModalState {
    #[default]
    Closed,
    /// Waiting for the device to open
    Requesting,
    Streaming,
    /// Countdown running; seconds left on screen
    Countdown(u32),
}

impl CameraModalState {
    pub fn is_open(&self) -> bool {
        !matches!(self, CameraModalState::Closed)
    }
}

/// Pending camera open, run with [`OpenRequest::run`] off the UI thread
pub struct OpenRequest {
    pub epoch: u64,
    backend: Arc<dyn CameraBackend>,
    request: StreamRequest,
}

impl OpenRequest {
    pub async fn run(self) -> (u64, Result<CameraSession, CameraError>) {
        let epoch = self.epoch;
        let backend = self.backend;
        let request = self.request;
        let result = tokio::task::spawn_blocking(move || backend.open_stream(&request))
            .await
            .map_err(|e| CameraError::Backend(format!("camera open task failed: {}", e)))
            .and_then(|opened| opened.map_err(CameraError::from))
            .map(CameraSession::new);
        (epoch, result)
    }
}

/// Result of a countdown tick
#[derive(Debug, PartialEq)]
pub enum TickOutcome {
    /// Tick belonged to a countdown that no longer runs
    Stale,
    Remaining(u32),
    Captured(CapturedImage),
}

/// Camera acquisition and still capture
pub struct MediaCapture {
    backend: Arc<dyn CameraBackend>,
    request: StreamRequest,
    state: CameraModalState,
    session: Option<CameraSession>,
    countdown: Option<CountdownState>,
    countdown_seconds: u32,
    open_epoch: u64,
    countdown_epoch: u64,
}

impl MediaCapture {
    pub fn new(backend: Arc<dyn CameraBackend>, request: StreamRequest) -> Self {
        Self {
            backend,
            request,
            state: CameraModalState::Closed,
            session: None,
            countdown: None,
            countdown_seconds: timing::COUNTDOWN_SECONDS,
            open_epoch: 0,
            countdown_epoch: 0,
        }
    }

    pub fn with_countdown_seconds(mut self, seconds: u32) -> Self {
        self.countdown_seconds = seconds;
        self
    }

    pub fn state(&self) -> CameraModalState {
        self.state
    }

    pub fn session(&self) -> Option<&CameraSession> {
        self.session.as_ref()
    }

    /// Live tracks across the (at most one) open session
    pub fn active_tracks(&self) -> usize {
        self.session.as_ref().map_or(0, CameraSession::active_tracks)
    }

    /// Latest frame for the live preview
    pub fn preview_frame(&self) -> Option<CameraFrame> {
        self.session.as_ref().and_then(CameraSession::latest_frame)
    }

    pub fn countdown(&self) -> Option<&CountdownState> {
        self.countdown.as_ref()
    }

    /// Enter `Requesting`, releasing any session that is still open
    pub fn begin_open(&mut self) -> OpenRequest {
        self.release_session();
        self.countdown = None;
        self.open_epoch += 1;
        self.state = CameraModalState::Requesting;
        info!(epoch = self.open_epoch, "Requesting camera");
        OpenRequest {
            epoch: self.open_epoch,
            backend: self.backend.clone(),
            request: self.request.clone(),
        }
    }

    /// Accept the outcome of an [`OpenRequest`]
    ///
    /// Returns the camera error for the caller to surface. Outcomes of
    /// superseded requests are dropped silently.
    pub fn finish_open(
        &mut self,
        epoch: u64,
        result: Result<CameraSession, CameraError>,
    ) -> Result<(), CameraError> {
        if epoch != self.open_epoch || self.state != CameraModalState::Requesting {
            match result {
                Ok(session) => {
                    info!(epoch, "Camera opened after the modal moved on, releasing");
                    session.release();
                }
                Err(e) => debug!(epoch, error = %e, "Ignoring stale camera error"),
            }
            return Ok(());
        }

        match result {
            Ok(session) => {
                info!(
                    device = %session.device().name,
                    format = %session.format(),
                    "Camera streaming"
                );
                self.session = Some(session);
                self.state = CameraModalState::Streaming;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Camera open failed");
                self.state = CameraModalState::Closed;
                Err(e)
            }
        }
    }

    /// Open the camera and wait until it streams
    pub async fn open(&mut self) -> Result<(), CameraError> {
        let (epoch, result) = self.begin_open().run().await;
        self.finish_open(epoch, result)
    }

    /// Start (or restart) the countdown, returning its epoch
    pub fn start_countdown(&mut self) -> Result<u64, CameraError> {
        if self.session.is_none() {
            return Err(CameraError::NoFrameAvailable);
        }
        self.countdown_epoch += 1;
        let countdown = CountdownState::new(self.countdown_seconds, self.countdown_epoch);
        if self.countdown.is_some() {
            info!(seconds = self.countdown_seconds, "Restarting countdown");
        } else {
            info!(seconds = self.countdown_seconds, "Starting countdown");
        }
        self.state = CameraModalState::Countdown(countdown.remaining());
        self.countdown = Some(countdown);
        Ok(self.countdown_epoch)
    }

    /// Advance the countdown identified by `epoch`
    pub fn tick(&mut self, epoch: u64) -> Result<TickOutcome, CameraError> {
        let Some(countdown) = self.countdown.as_mut().filter(|c| c.epoch() == epoch) else {
            debug!(epoch, "Stale countdown tick");
            return Ok(TickOutcome::Stale);
        };

        match countdown.tick() {
            CountdownStep::Continue(remaining) => {
                debug!(remaining, "Countdown tick");
                self.state = CameraModalState::Countdown(remaining);
                Ok(TickOutcome::Remaining(remaining))
            }
            CountdownStep::Fire => {
                info!("Countdown complete, capturing");
                self.countdown = None;
                self.capture_frame().map(TickOutcome::Captured)
            }
        }
    }

    /// Snapshot the latest frame at native resolution and close the session
    ///
    /// The session is released whether or not a frame was available.
    pub fn capture_frame(&mut self) -> Result<CapturedImage, CameraError> {
        let frame = self.preview_frame();
        self.close();

        let frame = frame.ok_or(CameraError::NoFrameAvailable)?;
        let image = CapturedImage::from_frame(&frame)
            .map_err(|e| CameraError::Backend(e.to_string()))?;
        info!(width = frame.width, height = frame.height, "Frame captured");
        Ok(image)
    }

    /// Stop all tracks and close the modal; no-op when already closed
    pub fn close(&mut self) {
        if self.state == CameraModalState::Requesting {
            // Invalidate the in-flight open so its session is released on arrival
            self.open_epoch += 1;
        }
        self.countdown = None;
        self.release_session();
        if self.state != CameraModalState::Closed {
            debug!("Camera modal closed");
        }
        self.state = CameraModalState::Closed;
    }

    fn release_session(&mut self) {
        if let Some(session) = self.session.take() {
            session.release();
        }
    }
}

impl Drop for MediaCapture {
    fn drop(&mut self) {
        self.release_session();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::virtual_camera::VirtualCameraBackend;
    use crate::image_source::ImageOrigin;
    use tempfile::TempDir;

    fn virtual_backend() -> (TempDir, Arc<VirtualCameraBackend>) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("still.png");
        image::RgbaImage::from_pixel(6, 4, image::Rgba([200, 100, 50, 255]))
            .save(&path)
            .unwrap();
        (dir, Arc::new(VirtualCameraBackend::new(path)))
    }

    #[tokio::test]
    async fn open_then_close_releases_every_track() {
        let (_dir, backend) = virtual_backend();
        let mut capture = MediaCapture::new(backend.clone(), StreamRequest::front_facing());

        capture.open().await.unwrap();
        assert_eq!(capture.state(), CameraModalState::Streaming);
        assert_eq!(capture.active_tracks(), 1);

        capture.close();
        capture.close();
        assert_eq!(capture.state(), CameraModalState::Closed);
        assert_eq!(capture.active_tracks(), 0);
        assert_eq!(backend.open_streams(), 0);
    }

    #[tokio::test]
    async fn reopening_releases_previous_session() {
        let (_dir, backend) = virtual_backend();
        let mut capture = MediaCapture::new(backend.clone(), StreamRequest::default());

        capture.open().await.unwrap();
        capture.open().await.unwrap();
        assert_eq!(backend.open_streams(), 1);
    }

    #[tokio::test]
    async fn session_arriving_after_close_is_released() {
        let (_dir, backend) = virtual_backend();
        let mut capture = MediaCapture::new(backend.clone(), StreamRequest::default());

        let request = capture.begin_open();
        capture.close();
        let (epoch, result) = request.run().await;
        assert!(result.is_ok());
        capture.finish_open(epoch, result).unwrap();

        assert_eq!(capture.state(), CameraModalState::Closed);
        assert_eq!(backend.open_streams(), 0);
    }

    #[tokio::test]
    async fn capture_frame_keeps_native_resolution_and_closes() {
        let (_dir, backend) = virtual_backend();
        let mut capture = MediaCapture::new(backend.clone(), StreamRequest::default());
        capture.open().await.unwrap();

        let image = capture.capture_frame().unwrap();
        assert_eq!(image.origin, ImageOrigin::Camera);
        assert_eq!(image.image.dimensions(), (6, 4));
        assert_eq!(capture.state(), CameraModalState::Closed);
        assert_eq!(backend.open_streams(), 0);
    }

    #[test]
    fn capture_without_session_reports_no_frame() {
        let (_dir, backend) = virtual_backend();
        let mut capture = MediaCapture::new(backend, StreamRequest::default());
        assert_eq!(
            capture.capture_frame().unwrap_err(),
            CameraError::NoFrameAvailable
        );
    }

    #[tokio::test]
    async fn restarted_countdown_ignores_old_ticks() {
        let (_dir, backend) = virtual_backend();
        let mut capture = MediaCapture::new(backend, StreamRequest::default());
        capture.open().await.unwrap();

        let first = capture.start_countdown().unwrap();
        let second = capture.start_countdown().unwrap();
        assert!(matches!(capture.tick(first), Ok(TickOutcome::Stale)));
        assert!(matches!(capture.tick(second), Ok(TickOutcome::Remaining(2))));
        assert_eq!(capture.state(), CameraModalState::Countdown(2));
    }
}
