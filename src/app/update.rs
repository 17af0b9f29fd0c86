// SPDX-License-Identifier: GPL-3.0-only

//! Message update handling
//!
//! `update()` routes every message to a focused handler. Handlers mutate the
//! booth synchronously and return a [`Task`] for anything that has to wait
//! (camera open, file dialog, upload read, network, timers).

use crate::app::state::{Booth, Message, now};
use crate::app::task::Task;
use crate::capture::TickOutcome;
use crate::constants::{file_formats, messages, timing};
use crate::errors::CameraError;
use crate::image_source::CapturedImage;
use tracing::{debug, info, warn};

impl Booth {
    /// Work to run once when the booth starts
    pub fn init(&self) -> Task {
        let client = self.generation.clone();
        Task::perform(
            async move { client.check_health().await },
            Message::HealthChecked,
        )
    }

    /// Main message handler
    pub fn update(&mut self, message: Message) -> Task {
        match message {
            // ===== Camera modal =====
            Message::OpenCamera => self.handle_open_camera(),
            Message::CameraOpened(epoch, result) => {
                if let Err(e) = self.capture.finish_open(epoch, result) {
                    self.show_camera_alert(&e);
                }
                Task::none()
            }
            Message::StartCountdown => self.handle_start_countdown(),
            Message::CountdownTick(epoch) => self.handle_countdown_tick(epoch),
            Message::CloseCamera => {
                self.capture.close();
                Task::none()
            }
            Message::DismissAlert => {
                self.alert = None;
                Task::none()
            }

            // ===== Image source =====
            Message::PickUpload => Task::perform(
                async move {
                    rfd::AsyncFileDialog::new()
                        .set_title("Choose a photo")
                        .add_filter("Images", file_formats::IMAGE_EXTENSIONS)
                        .pick_file()
                        .await
                        .map(|h| h.path().to_path_buf())
                },
                Message::UploadSelected,
            ),
            Message::UploadSelected(Some(path)) => {
                debug!(path = %path.display(), "Reading upload");
                Task::perform(CapturedImage::read_upload(path), Message::UploadLoaded)
            }
            Message::UploadSelected(None) => Task::none(),
            Message::UploadLoaded(Ok(image)) => {
                self.source.set(image);
                Task::none()
            }
            Message::UploadLoaded(Err(e)) => {
                warn!(error = %e, "Upload rejected");
                self.notifications.error(e.to_string(), now());
                Task::none()
            }
            Message::RemoveImage => {
                info!("Active image removed");
                self.source.clear();
                Task::none()
            }

            // ===== Generation =====
            Message::Generate => self.handle_generate(),
            Message::GenerationFinished(result) => {
                self.generating = false;
                match result {
                    Ok(result) => self.presenter.present(result, &mut self.notifications, now()),
                    Err(e) => {
                        // Image stays so the user can retry
                        warn!(error = %e, "Generation failed");
                        self.notifications.error(e.to_string(), now());
                    }
                }
                Task::none()
            }
            Message::HealthChecked(result) => {
                match result {
                    Ok(status) => {
                        if !status.has_api_key {
                            warn!("Generation server reports no API key");
                            self.notifications.error(messages::MISSING_API_KEY, now());
                        }
                        self.health = Some(status);
                    }
                    Err(e) => warn!(error = %e, "Health check failed"),
                }
                Task::none()
            }

            // ===== Result =====
            Message::Download => {
                let at = chrono::Local::now();
                match self.presenter.download(&self.context.display_name, at) {
                    Some(job) => Task::perform(job.run(), Message::DownloadFinished),
                    None => Task::none(),
                }
            }
            Message::DownloadFinished(outcome) => {
                self.presenter
                    .finish_download(outcome, &mut self.notifications, now());
                Task::none()
            }
            Message::OpenDownload => {
                if let Some(path) = self.presenter.last_download()
                    && let Err(e) = open::that_detached(path)
                {
                    warn!(path = %path.display(), error = %e, "Failed to open download");
                }
                Task::none()
            }
            Message::Reset => {
                self.reset();
                Task::none()
            }
        }
    }

    fn handle_open_camera(&mut self) -> Task {
        let request = self.capture.begin_open();
        Task::perform(request.run(), |(epoch, result)| {
            Message::CameraOpened(epoch, result)
        })
    }

    fn handle_start_countdown(&mut self) -> Task {
        match self.capture.start_countdown() {
            Ok(epoch) => Task::delay(timing::COUNTDOWN_TICK, Message::CountdownTick(epoch)),
            Err(e) => {
                debug!(error = %e, "Countdown requested without a live camera");
                Task::none()
            }
        }
    }

    fn handle_countdown_tick(&mut self, epoch: u64) -> Task {
        match self.capture.tick(epoch) {
            Ok(TickOutcome::Stale) => Task::none(),
            Ok(TickOutcome::Remaining(_)) => {
                Task::delay(timing::COUNTDOWN_TICK, Message::CountdownTick(epoch))
            }
            Ok(TickOutcome::Captured(image)) => {
                self.source.from_capture(image);
                Task::none()
            }
            Err(e) => {
                self.show_camera_alert(&e);
                Task::none()
            }
        }
    }

    fn handle_generate(&mut self) -> Task {
        if self.generating {
            debug!("Generation already in flight, ignoring");
            return Task::none();
        }
        let image = match self.source.require() {
            Ok(image) => image.clone(),
            Err(e) => {
                debug!(error = %e, "Generate rejected");
                let at = now();
                self.notifications.error(e.to_string(), at);
                self.highlight_until = Some(at + timing::REQUIRED_HIGHLIGHT);
                return Task::none();
            }
        };

        let context = self.context.clone();
        self.presenter
            .set_prompt_text(self.generation.render_prompt(&context));
        self.generating = true;

        let client = self.generation.clone();
        Task::perform(
            async move { client.generate(&image, &context).await },
            Message::GenerationFinished,
        )
    }

    /// Camera errors end the open attempt with a blocking alert
    fn show_camera_alert(&mut self, error: &CameraError) {
        warn!(error = %error, "Camera error");
        self.capture.close();
        self.alert = Some(error.alert_text());
    }

    /// Clear image, result and prompt. Idempotent.
    pub fn reset(&mut self) {
        self.source.clear();
        self.presenter.reset();
        self.highlight_until = None;
    }

    /// Feed `task` and everything it leads to through `update` until no work is left
    pub async fn run_until_idle(&mut self, task: Task) {
        let mut pending = task;
        while !pending.is_none() {
            let messages = pending.resolve().await;
            pending = Task::batch(messages.into_iter().map(|m| self.update(m)));
        }
    }
}
