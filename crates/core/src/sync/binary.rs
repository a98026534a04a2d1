// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A fair semaphore with one permit used as a FIFO lock

use super::{current_thread_token, FairSemaphore, Lock, SyncError, UNOWNED};
use crate::cancel::CancelCheck;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug)]
pub struct BinarySemaphoreLock<S> {
    semaphore: S,
    /// Thread token of the permit holder
    owner: AtomicU64,
}

impl<S: FairSemaphore> BinarySemaphoreLock<S> {
    /// Wrap a semaphore that must start with exactly one permit
    pub fn new(semaphore: S) -> Self {
        Self {
            semaphore,
            owner: AtomicU64::new(UNOWNED),
        }
    }
}

impl<S: FairSemaphore> Lock for BinarySemaphoreLock<S> {
    fn acquire(&self, cancel: &dyn CancelCheck) -> Result<(), SyncError> {
        self.semaphore.acquire(cancel)?;
        self.owner.store(current_thread_token(), Ordering::Relaxed);
        Ok(())
    }

    fn try_acquire(&self) -> bool {
        let acquired = self.semaphore.try_acquire();
        if acquired {
            self.owner.store(current_thread_token(), Ordering::Relaxed);
        }
        acquired
    }

    fn release(&self) -> Result<(), SyncError> {
        match self.owner.compare_exchange(
            current_thread_token(),
            UNOWNED,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => {
                self.semaphore.release();
                Ok(())
            }
            Err(UNOWNED) => Err(SyncError::NotLocked),
            Err(_) => Err(SyncError::NotOwner),
        }
    }

    fn is_locked(&self) -> bool {
        self.owner.load(Ordering::Relaxed) != UNOWNED
    }
}
