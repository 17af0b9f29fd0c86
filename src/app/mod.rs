// SPDX-License-Identifier: GPL-3.0-only

//! Booth application model
//!
//! The booth owns the whole workflow state and is driven by [`Message`]s:
//!
//! ```text
//!  camera modal ─┐
//!                ├─▶ ImageSource ──Generate──▶ GenerationClient ──▶ ResultPresenter
//!  upload ───────┘                                                    │
//!                    NotificationService ◀────────────────────────────┘
//! ```
//!
//! Handlers run one at a time on the UI thread; anything that suspends comes
//! back as a new message through a [`Task`].

mod state;
mod task;
mod update;

pub use state::{Booth, Message};
pub use task::Task;
