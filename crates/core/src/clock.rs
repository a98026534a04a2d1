// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction for testable gazing and timestamps

use crate::cancel::CancelCheck;
use crate::sync::{checkpoint, SyncError};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Longest a sleeping thread stays parked before re-checking cancellation
const SLEEP_TICK: Duration = Duration::from_millis(10);

/// A clock that provides the current time and cancellable sleeps
pub trait Clock: Clone + Send + Sync + 'static {
    fn now(&self) -> Instant;

    /// Sleep for `duration`, returning early if `cancel` fires
    fn sleep(&self, duration: Duration, cancel: &dyn CancelCheck) -> Result<(), SyncError>;
}

/// Real system clock
#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration, cancel: &dyn CancelCheck) -> Result<(), SyncError> {
        let deadline = Instant::now() + duration;
        loop {
            checkpoint(cancel)?;
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            std::thread::park_timeout((deadline - now).min(SLEEP_TICK));
        }
    }
}

/// Fake clock for testing with controllable time
///
/// Sleeping advances the shared time instead of blocking.
#[derive(Clone)]
pub struct FakeClock {
    current: Arc<Mutex<Instant>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            current: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Advance the clock by the given duration
    pub fn advance(&self, duration: Duration) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current += duration;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn sleep(&self, duration: Duration, cancel: &dyn CancelCheck) -> Result<(), SyncError> {
        checkpoint(cancel)?;
        self.advance(duration);
        Ok(())
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
