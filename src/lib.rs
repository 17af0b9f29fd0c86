// SPDX-License-Identifier: GPL-3.0-only

pub mod app;
pub mod backends;
pub mod capture;
pub mod config;
pub mod constants;
pub mod errors;
pub mod generation;
pub mod image_source;
pub mod notifications;
pub mod presenter;
pub mod storage;
pub mod terminal;

pub use app::{Booth, Message, Task};
pub use config::Config;
pub use errors::{AppError, AppResult};
