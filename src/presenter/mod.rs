// SPDX-License-Identifier: GPL-3.0-only

//! Result display, QR panel and download

pub mod celebration;
pub mod qr;

pub use celebration::{Burst, Celebration, TerminalConfetti};
pub use qr::{QrNode, QrPanel};

use crate::constants::messages;
use crate::errors::AppResult;
use crate::generation::GenerationResult;
use crate::image_source::EncodedImage;
use crate::notifications::NotificationService;
use crate::storage;
use chrono::{DateTime, Local};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Which part of the screen has focus
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum View {
    #[default]
    Form,
    Result,
}

/// A pending save of the current result, run off the UI thread
#[derive(Debug, Clone)]
pub struct DownloadJob {
    pub image: EncodedImage,
    pub output_dir: PathBuf,
    pub filename: String,
}

impl DownloadJob {
    pub async fn run(self) -> AppResult<PathBuf> {
        storage::save_download(&self.image, &self.output_dir, &self.filename).await
    }
}

pub struct ResultPresenter {
    result: Option<GenerationResult>,
    qr: QrPanel,
    celebration: Option<Arc<dyn Celebration>>,
    view: View,
    prompt_text: String,
    filename_prefix: String,
    output_dir: PathBuf,
    last_download: Option<PathBuf>,
    /// Bumped whenever the shown result changes
    revision: u64,
}

impl ResultPresenter {
    pub fn new(filename_prefix: impl Into<String>, output_dir: PathBuf) -> Self {
        Self {
            result: None,
            qr: QrPanel::new(),
            celebration: None,
            view: View::Form,
            prompt_text: String::new(),
            filename_prefix: filename_prefix.into(),
            output_dir,
            last_download: None,
            revision: 0,
        }
    }

    pub fn with_celebration(mut self, celebration: Arc<dyn Celebration>) -> Self {
        self.celebration = Some(celebration);
        self
    }

    pub fn result(&self) -> Option<&GenerationResult> {
        self.result.as_ref()
    }

    pub fn qr_panel(&self) -> &QrPanel {
        &self.qr
    }

    pub fn view(&self) -> View {
        self.view
    }

    /// Prompt shown in the form; filled when a generation starts
    pub fn prompt_text(&self) -> &str {
        &self.prompt_text
    }

    pub fn set_prompt_text(&mut self, prompt: impl Into<String>) {
        self.prompt_text = prompt.into();
    }

    pub fn last_download(&self) -> Option<&PathBuf> {
        self.last_download.as_ref()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Show `result`, celebrate, and render its QR code when present
    pub fn present(
        &mut self,
        result: GenerationResult,
        notifications: &mut NotificationService,
        now: Instant,
    ) {
        info!(image = ?result.image, qr = result.qr_code.is_some(), "Presenting result");
        self.view = View::Result;
        notifications.success(messages::GENERATION_SUCCEEDED, now);

        if let Some(celebration) = &self.celebration {
            for burst in Burst::presentation() {
                if let Err(e) = celebration.celebrate(&burst) {
                    debug!(error = %e, "Celebration skipped");
                }
            }
        }

        if let Some(qr) = &result.qr_code {
            self.qr.render(qr);
        }
        self.result = Some(result);
        self.revision += 1;
    }

    /// Build the save job for the current result, named after `display_name`
    pub fn download(&self, display_name: &str, at: DateTime<Local>) -> Option<DownloadJob> {
        let result = self.result.as_ref()?;
        Some(DownloadJob {
            image: result.image.clone(),
            output_dir: self.output_dir.clone(),
            filename: storage::download_filename(&self.filename_prefix, display_name, at),
        })
    }

    /// Record the outcome of a [`DownloadJob`]
    pub fn finish_download(
        &mut self,
        outcome: AppResult<PathBuf>,
        notifications: &mut NotificationService,
        now: Instant,
    ) {
        match outcome {
            Ok(path) => {
                info!(path = %path.display(), "Result downloaded");
                self.last_download = Some(path);
                notifications.success(messages::DOWNLOADED, now);
            }
            Err(e) => {
                warn!(error = %e, "Download failed");
                notifications.error(e.to_string(), now);
            }
        }
    }

    /// Back to an empty form. Idempotent.
    pub fn reset(&mut self) {
        self.result = None;
        self.last_download = None;
        self.prompt_text.clear();
        self.qr.clear();
        self.view = View::Form;
        self.revision += 1;
    }
}
