// SPDX-License-Identifier: GPL-3.0-only

//! Booth state and messages

use crate::backends::camera::{CameraBackend, StreamRequest};
use crate::capture::{CameraModalState, CameraSession, MediaCapture};
use crate::config::Config;
use crate::errors::{AppResult, CameraError, GenerationError, ImageSourceError};
use crate::generation::{GenerationClient, GenerationContext, GenerationResult, HealthStatus};
use crate::image_source::{CapturedImage, ImageSource};
use crate::notifications::NotificationService;
use crate::presenter::{Celebration, ResultPresenter};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Everything that can happen to the booth
#[derive(Debug)]
pub enum Message {
    // ===== Camera modal =====
    OpenCamera,
    /// Open attempt finished (epoch, outcome)
    CameraOpened(u64, Result<CameraSession, CameraError>),
    StartCountdown,
    /// Countdown tick for the countdown with this epoch
    CountdownTick(u64),
    CloseCamera,
    DismissAlert,

    // ===== Image source =====
    PickUpload,
    UploadSelected(Option<PathBuf>),
    UploadLoaded(Result<CapturedImage, ImageSourceError>),
    RemoveImage,

    // ===== Generation =====
    Generate,
    GenerationFinished(Result<GenerationResult, GenerationError>),
    HealthChecked(Result<HealthStatus, GenerationError>),

    // ===== Result =====
    Download,
    DownloadFinished(AppResult<PathBuf>),
    OpenDownload,
    Reset,
}

/// The photo booth: one camera modal, one source image, one result
pub struct Booth {
    pub(crate) config: Config,
    pub(crate) capture: MediaCapture,
    pub(crate) source: ImageSource,
    pub(crate) generation: GenerationClient,
    pub(crate) presenter: ResultPresenter,
    pub(crate) notifications: NotificationService,
    pub(crate) context: GenerationContext,
    /// A generation request is in flight
    pub(crate) generating: bool,
    /// Blocking camera alert text
    pub(crate) alert: Option<String>,
    /// Preview highlighted until this instant after a missing-image attempt
    pub(crate) highlight_until: Option<Instant>,
    pub(crate) health: Option<HealthStatus>,
}

impl Booth {
    pub fn new(
        config: Config,
        backend: Arc<dyn CameraBackend>,
        celebration: Option<Arc<dyn Celebration>>,
    ) -> Result<Self, GenerationError> {
        let request = StreamRequest {
            device_path: config.camera_device.clone(),
            prefer_front: true,
        };
        let capture =
            MediaCapture::new(backend, request).with_countdown_seconds(config.countdown_seconds);
        let generation = GenerationClient::from_config(&config)?;

        let mut presenter =
            ResultPresenter::new(&config.filename_prefix, config.download_directory());
        if config.celebrations
            && let Some(celebration) = celebration
        {
            presenter = presenter.with_celebration(celebration);
        }

        Ok(Self {
            context: GenerationContext::from_config(&config),
            notifications: NotificationService::new(config.notification_duration()),
            config,
            capture,
            source: ImageSource::new(),
            generation,
            presenter,
            generating: false,
            alert: None,
            highlight_until: None,
            health: None,
        })
    }

    /// Override who the photo is for
    pub fn set_context(&mut self, context: GenerationContext) {
        self.context = context;
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn context(&self) -> &GenerationContext {
        &self.context
    }

    pub fn capture(&self) -> &MediaCapture {
        &self.capture
    }

    pub fn camera_state(&self) -> CameraModalState {
        self.capture.state()
    }

    pub fn source(&self) -> &ImageSource {
        &self.source
    }

    pub fn presenter(&self) -> &ResultPresenter {
        &self.presenter
    }

    pub fn notifications(&self) -> &NotificationService {
        &self.notifications
    }

    pub fn is_generating(&self) -> bool {
        self.generating
    }

    /// Generate is offered only with an image and no request in flight
    pub fn can_generate(&self) -> bool {
        self.source.is_valid() && !self.generating
    }

    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    pub fn is_highlighted(&self, now: Instant) -> bool {
        self.highlight_until.is_some_and(|until| now < until)
    }

    pub fn health(&self) -> Option<HealthStatus> {
        self.health
    }

    /// Advance time-based state (notification expiry, highlight)
    pub fn tick(&mut self, now: Instant) {
        self.notifications.tick(now);
        if self.highlight_until.is_some_and(|until| now >= until) {
            self.highlight_until = None;
        }
    }
}

/// Current instant on the tokio clock, so paused test time applies
pub(crate) fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}
