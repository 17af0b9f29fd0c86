// SPDX-License-Identifier: GPL-3.0-only

//! Countdown before the shutter fires

use std::time::Instant;

/// What a countdown tick resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownStep {
    /// Keep going; this many seconds are left on screen
    Continue(u32),
    /// Countdown finished, capture now
    Fire,
}

/// Remaining seconds of a running countdown
///
/// Each countdown carries an epoch. Ticks scheduled for an older countdown
/// (before a restart or a close) carry a stale epoch and are discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountdownState {
    remaining: u32,
    epoch: u64,
    tick_started: Instant,
}

impl CountdownState {
    pub fn new(seconds: u32, epoch: u64) -> Self {
        Self {
            remaining: seconds,
            epoch,
            tick_started: Instant::now(),
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// When the currently displayed second started
    pub fn tick_started(&self) -> Instant {
        self.tick_started
    }

    /// Advance by one second
    pub fn tick(&mut self) -> CountdownStep {
        if self.remaining <= 1 {
            self.remaining = 0;
            return CountdownStep::Fire;
        }
        self.remaining -= 1;
        self.tick_started = Instant::now();
        CountdownStep::Continue(self.remaining)
    }
}
