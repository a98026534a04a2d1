// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reentrant spin lock
//!
//! Ownership is an atomic thread token swapped in with compare-and-swap.
//! The owner may re-acquire freely; each acquire must be matched by a
//! release before the lock becomes free again.

use super::{checkpoint, current_thread_token, Backoff, Lock, SyncError, UNOWNED};
use crate::cancel::CancelCheck;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct ReentrantSpinLock {
    owner: AtomicU64,
    /// Only touched by the owning thread
    holds: AtomicUsize,
}

impl ReentrantSpinLock {
    pub const fn new() -> Self {
        Self {
            owner: AtomicU64::new(UNOWNED),
            holds: AtomicUsize::new(0),
        }
    }

    pub fn is_held_by_current_thread(&self) -> bool {
        self.owner.load(Ordering::Relaxed) == current_thread_token()
    }

    /// Recursion depth as seen by the calling thread
    pub fn hold_count(&self) -> usize {
        if self.is_held_by_current_thread() {
            self.holds.load(Ordering::Relaxed)
        } else {
            0
        }
    }

    fn try_claim(&self, me: u64) -> bool {
        let claimed = self
            .owner
            .compare_exchange(UNOWNED, me, Ordering::Acquire, Ordering::Relaxed)
            .is_ok();
        if claimed {
            self.holds.store(1, Ordering::Relaxed);
        }
        claimed
    }
}

impl Lock for ReentrantSpinLock {
    fn acquire(&self, cancel: &dyn CancelCheck) -> Result<(), SyncError> {
        let me = current_thread_token();
        if self.owner.load(Ordering::Relaxed) == me {
            self.holds.fetch_add(1, Ordering::Relaxed);
            return Ok(());
        }

        let mut backoff = Backoff::new();
        loop {
            checkpoint(cancel)?;
            if self.try_claim(me) {
                return Ok(());
            }
            backoff.snooze();
        }
    }

    fn try_acquire(&self) -> bool {
        let me = current_thread_token();
        if self.owner.load(Ordering::Relaxed) == me {
            self.holds.fetch_add(1, Ordering::Relaxed);
            return true;
        }
        self.try_claim(me)
    }

    fn release(&self) -> Result<(), SyncError> {
        if !self.is_held_by_current_thread() {
            return Err(SyncError::NotOwner);
        }
        let remaining = self.holds.load(Ordering::Relaxed).saturating_sub(1);
        self.holds.store(remaining, Ordering::Relaxed);
        if remaining == 0 {
            self.owner.store(UNOWNED, Ordering::Release);
        }
        Ok(())
    }

    fn is_locked(&self) -> bool {
        self.owner.load(Ordering::Relaxed) != UNOWNED
    }

    fn is_reentrant(&self) -> bool {
        true
    }
}

#[cfg(test)]
#[path = "reentrant_tests.rs"]
mod tests;
