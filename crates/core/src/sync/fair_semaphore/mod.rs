// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fair counting semaphores using the specific-notification pattern
//!
//! Each blocked caller owns a private waiter with its own wakeup signal and
//! sits in a FIFO queue. `release` hands its permit straight to the head of
//! the queue instead of bumping the shared count, so permits are granted in
//! arrival order and no broadcast wakeups happen.
//!
//! Two implementations share the [`FairSemaphore`] interface:
//! - [`FairSemaphoreCo`] - one `parking_lot` mutex plus a condition variable per waiter
//! - [`FairSemaphoreMo`] - std mutex for the queue, each waiter its own monitor

mod co;
mod mo;

pub use co::FairSemaphoreCo;
pub use mo::FairSemaphoreMo;

use super::SyncError;
use crate::cancel::{CancelCheck, NeverCancel};
use std::time::Duration;

/// Longest a waiter blocks before re-checking cancellation
pub(crate) const WAIT_TICK: Duration = Duration::from_millis(5);

/// A counting semaphore that grants permits in FIFO order
pub trait FairSemaphore: Send + Sync {
    /// Block until a permit is granted or `cancel` fires
    ///
    /// A cancelled caller never keeps a permit: if one was handed over while
    /// it was giving up, the permit is passed on to the next waiter.
    fn acquire(&self, cancel: &dyn CancelCheck) -> Result<(), SyncError>;

    /// Take a permit only if one is free and nobody is queued ahead
    fn try_acquire(&self) -> bool;

    /// Return a permit, waking the longest waiter if there is one
    fn release(&self);

    fn available_permits(&self) -> usize;

    /// Number of callers currently blocked in `acquire`
    fn queue_len(&self) -> usize;

    /// Acquire a permit, ignoring cancellation and interrupts
    ///
    /// Stray wakeups of the calling thread leave it queued in place.
    fn acquire_uninterruptibly(&self) {
        // NeverCancel cannot abort the wait
        let _ = self.acquire(&NeverCancel);
    }
}

#[cfg(test)]
#[path = "fair_semaphore_tests.rs"]
mod tests;
