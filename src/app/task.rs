// SPDX-License-Identifier: GPL-3.0-only

//! Deferred effects returned by [`crate::app::Booth::update`]
//!
//! A task is a set of futures, each resolving to exactly one [`Message`]
//! that is fed back into `update`. The UI loop spawns them on the tokio
//! runtime and receives the messages over a channel; tests resolve them
//! in place.

use crate::app::state::Message;
use futures::future::{BoxFuture, FutureExt, join_all};
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

#[must_use = "a task does nothing until it is spawned or resolved"]
pub enum Task {
    None,
    Perform(BoxFuture<'static, Message>),
    Batch(Vec<Task>),
}

impl Task {
    pub fn none() -> Self {
        Task::None
    }

    /// Run `future` and map its output into a message
    pub fn perform<F, T>(future: F, map: impl FnOnce(T) -> Message + Send + 'static) -> Self
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        Task::Perform(future.map(map).boxed())
    }

    /// Deliver `message` after `after`
    pub fn delay(after: Duration, message: Message) -> Self {
        Task::Perform(
            async move {
                tokio::time::sleep(after).await;
                message
            }
            .boxed(),
        )
    }

    pub fn batch(tasks: impl IntoIterator<Item = Task>) -> Self {
        let tasks: Vec<Task> = tasks.into_iter().filter(|t| !t.is_none()).collect();
        if tasks.is_empty() {
            Task::None
        } else {
            Task::Batch(tasks)
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Task::None)
    }

    fn into_futures(self, out: &mut Vec<BoxFuture<'static, Message>>) {
        match self {
            Task::None => {}
            Task::Perform(future) => out.push(future),
            Task::Batch(tasks) => tasks.into_iter().for_each(|t| t.into_futures(out)),
        }
    }

    /// Spawn every future; results are sent to `sender`
    pub fn spawn(self, handle: &tokio::runtime::Handle, sender: &UnboundedSender<Message>) {
        let mut futures = Vec::new();
        self.into_futures(&mut futures);
        for future in futures {
            let sender = sender.clone();
            handle.spawn(async move {
                let message = future.await;
                if sender.send(message).is_err() {
                    debug!("UI loop gone, dropping task result");
                }
            });
        }
    }

    /// Await every future concurrently
    pub async fn resolve(self) -> Vec<Message> {
        let mut futures = Vec::new();
        self.into_futures(&mut futures);
        join_all(futures).await
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Task::None => write!(f, "Task::None"),
            Task::Perform(_) => write!(f, "Task::Perform(..)"),
            Task::Batch(tasks) => f.debug_tuple("Task::Batch").field(tasks).finish(),
        }
    }
}
