// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mutual exclusion primitives built from atomics and condition variables
//!
//! This module provides:
//! - **SpinLock** - Non-reentrant CAS lock that polls for cancellation
//! - **ReentrantSpinLock** - Owner-tracking spin lock with a recursion count
//! - **FairSemaphore** - FIFO counting semaphores using specific notification
//! - **StampedLock** - Optimistic reads with write conversion
//!
//! Every blocking acquire takes a [`CancelCheck`] and gives up with
//! [`SyncError::Cancelled`] or [`SyncError::Interrupted`] without ever having
//! been granted the lock.

mod backoff;
mod binary;
pub mod fair_semaphore;
mod reentrant;
mod spin_lock;
mod stamped;

pub use backoff::Backoff;
pub use binary::BinarySemaphoreLock;
pub use fair_semaphore::{FairSemaphore, FairSemaphoreCo, FairSemaphoreMo};
pub use reentrant::ReentrantSpinLock;
pub use spin_lock::SpinLock;
pub use stamped::{Stamp, StampMode, StampedLock};

use crate::cancel::CancelCheck;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// Owner token meaning "not held"
pub(crate) const UNOWNED: u64 = 0;

static NEXT_THREAD_TOKEN: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_TOKEN: u64 = NEXT_THREAD_TOKEN.fetch_add(1, Ordering::Relaxed);
}

/// Nonzero token unique to the calling thread
pub(crate) fn current_thread_token() -> u64 {
    THREAD_TOKEN.with(|token| *token)
}

/// Errors raised by synchronization primitives
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("acquire cancelled")]
    Cancelled,
    #[error("acquire interrupted")]
    Interrupted,
    #[error("lock released by a thread that does not own it")]
    NotOwner,
    #[error("lock released while not held")]
    NotLocked,
    #[error("stamp {0:#x} does not match the lock state")]
    InvalidStamp(u64),
}

impl SyncError {
    /// Whether this error is a cancellation outcome rather than a fault
    pub fn is_abort(&self) -> bool {
        matches!(self, SyncError::Cancelled | SyncError::Interrupted)
    }
}

/// Fail with the matching error if `cancel` has fired
pub fn checkpoint(cancel: &dyn CancelCheck) -> Result<(), SyncError> {
    if cancel.is_interrupted() {
        Err(SyncError::Interrupted)
    } else if cancel.is_cancelled() {
        Err(SyncError::Cancelled)
    } else {
        Ok(())
    }
}

/// A mutual exclusion lock guarding a critical section
pub trait Lock: Send + Sync {
    /// Block until the lock is held or `cancel` fires
    fn acquire(&self, cancel: &dyn CancelCheck) -> Result<(), SyncError>;

    /// Take the lock only if it is free right now
    fn try_acquire(&self) -> bool;

    /// Release the lock held by the caller
    fn release(&self) -> Result<(), SyncError>;

    fn is_locked(&self) -> bool;

    /// Whether the holder may acquire the lock again without releasing it
    fn is_reentrant(&self) -> bool {
        false
    }
}
