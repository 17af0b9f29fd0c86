// SPDX-License-Identifier: GPL-3.0-only

//! Transient status messages
//!
//! A message stays visible for a fixed window. Every `show` schedules its own
//! hide deadline and the first deadline to expire hides whatever is on
//! screen, so a message shown while another one is up only stays until the
//! earlier deadline runs out.

use crate::constants::timing;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
    pub shown_at: Instant,
}

#[derive(Debug)]
pub struct NotificationService {
    visible: Option<Notification>,
    hide_deadlines: Vec<Instant>,
    duration: Duration,
}

impl Default for NotificationService {
    fn default() -> Self {
        Self::new(timing::NOTIFICATION_DURATION)
    }
}

impl NotificationService {
    pub fn new(duration: Duration) -> Self {
        Self {
            visible: None,
            hide_deadlines: Vec::new(),
            duration,
        }
    }

    /// Display `message`, replacing whatever is visible
    pub fn show(&mut self, message: impl Into<String>, kind: NotificationKind, now: Instant) {
        let message = message.into();
        debug!(?kind, %message, "Notification");
        self.visible = Some(Notification {
            message,
            kind,
            shown_at: now,
        });
        self.hide_deadlines.push(now + self.duration);
    }

    pub fn success(&mut self, message: impl Into<String>, now: Instant) {
        self.show(message, NotificationKind::Success, now);
    }

    pub fn error(&mut self, message: impl Into<String>, now: Instant) {
        self.show(message, NotificationKind::Error, now);
    }

    /// Expire deadlines up to `now`; returns true if the message was hidden
    pub fn tick(&mut self, now: Instant) -> bool {
        let before = self.hide_deadlines.len();
        self.hide_deadlines.retain(|deadline| *deadline > now);
        if self.hide_deadlines.len() == before {
            return false;
        }
        self.visible.take().is_some()
    }

    pub fn visible(&self) -> Option<&Notification> {
        self.visible.as_ref()
    }

    /// Next instant at which `tick` may change something
    pub fn next_deadline(&self) -> Option<Instant> {
        self.hide_deadlines.iter().min().copied()
    }
}
