// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Non-reentrant spin lock
//!
//! A single atomic owner word claimed with compare-and-swap. A thread that
//! calls `acquire` while it already holds the lock spins until it is
//! cancelled. Only the holder may release.

use super::{checkpoint, current_thread_token, Backoff, Lock, SyncError, UNOWNED};
use crate::cancel::CancelCheck;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct SpinLock {
    owner: AtomicU64,
}

impl SpinLock {
    pub const fn new() -> Self {
        Self {
            owner: AtomicU64::new(UNOWNED),
        }
    }
}

impl Lock for SpinLock {
    fn acquire(&self, cancel: &dyn CancelCheck) -> Result<(), SyncError> {
        let mut backoff = Backoff::new();
        loop {
            checkpoint(cancel)?;
            if self.try_acquire() {
                return Ok(());
            }
            // Spin on a plain load so waiters don't hammer the cache line with CAS
            while self.is_locked() {
                checkpoint(cancel)?;
                backoff.snooze();
            }
        }
    }

    fn try_acquire(&self) -> bool {
        self.owner
            .compare_exchange(
                UNOWNED,
                current_thread_token(),
                Ordering::Acquire,
                Ordering::Relaxed,
            )
            .is_ok()
    }

    fn release(&self) -> Result<(), SyncError> {
        match self.owner.compare_exchange(
            current_thread_token(),
            UNOWNED,
            Ordering::Release,
            Ordering::Relaxed,
        ) {
            Ok(_) => Ok(()),
            Err(UNOWNED) => Err(SyncError::NotLocked),
            Err(_) => Err(SyncError::NotOwner),
        }
    }

    fn is_locked(&self) -> bool {
        self.owner.load(Ordering::Relaxed) != UNOWNED
    }
}

#[cfg(test)]
#[path = "spin_lock_tests.rs"]
mod tests;
