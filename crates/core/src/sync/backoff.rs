// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded exponential backoff for spin loops

use std::hint;
use std::thread;
use std::time::Duration;

/// Steps spent busy-spinning before yielding to the scheduler
const SPIN_LIMIT: u32 = 6;
/// Steps spent yielding before falling back to short sleeps
const YIELD_LIMIT: u32 = 10;
/// Sleep used once contention outlasts spinning and yielding
const PARK_INTERVAL: Duration = Duration::from_micros(50);

/// Backoff state for one acquire attempt
#[derive(Debug, Default)]
pub struct Backoff {
    step: u32,
}

impl Backoff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait a little longer than last time
    pub fn snooze(&mut self) {
        if self.step <= SPIN_LIMIT {
            for _ in 0..(1u32 << self.step) {
                hint::spin_loop();
            }
        } else if self.step <= YIELD_LIMIT {
            thread::yield_now();
        } else {
            thread::sleep(PARK_INTERVAL);
        }

        if self.step <= YIELD_LIMIT {
            self.step += 1;
        }
    }
}
