// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stamped lock with optimistic reads
//!
//! The state word packs a reader count (low 7 bits), a write bit and a
//! version that advances on every write unlock. An optimistic read records
//! the version and later validates that no writer intervened; it can be
//! upgraded in place to a write lock when the state is still untouched.
//!
//! Every stamp remembers the mode it was issued in so [`StampedLock::unlock`]
//! always runs the matching release exactly once.

use super::{checkpoint, Backoff, SyncError};
use crate::cancel::CancelCheck;
use std::sync::atomic::{fence, AtomicU64, Ordering};

const READER_BITS: u64 = 0x7f;
const WRITE_BIT: u64 = 0x80;
const VERSION_BITS: u64 = !READER_BITS;
/// Initial state; also used when the version wraps to zero
const ORIGIN: u64 = WRITE_BIT << 1;

/// How a stamp was obtained
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StampMode {
    Optimistic,
    Read,
    Write,
}

/// Proof of a lock mode obtained from a [`StampedLock`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Stamp {
    value: u64,
    mode: StampMode,
}

impl Stamp {
    pub fn mode(&self) -> StampMode {
        self.mode
    }

    pub fn value(&self) -> u64 {
        self.value
    }
}

#[derive(Debug)]
pub struct StampedLock {
    state: AtomicU64,
}

impl Default for StampedLock {
    fn default() -> Self {
        Self::new()
    }
}

impl StampedLock {
    pub const fn new() -> Self {
        Self {
            state: AtomicU64::new(ORIGIN),
        }
    }

    pub fn is_write_locked(&self) -> bool {
        self.state.load(Ordering::Relaxed) & WRITE_BIT != 0
    }

    pub fn reader_count(&self) -> u64 {
        self.state.load(Ordering::Relaxed) & READER_BITS
    }

    /// Record the current version if no writer holds the lock
    pub fn try_optimistic_read(&self) -> Option<Stamp> {
        let s = self.state.load(Ordering::Acquire);
        (s & WRITE_BIT == 0).then_some(Stamp {
            value: s & VERSION_BITS,
            mode: StampMode::Optimistic,
        })
    }

    /// True if no write lock was taken since `stamp` was issued
    pub fn validate(&self, stamp: Stamp) -> bool {
        fence(Ordering::Acquire);
        (self.state.load(Ordering::Relaxed) & VERSION_BITS) == (stamp.value & VERSION_BITS)
    }

    pub fn try_write_lock(&self) -> Option<Stamp> {
        let s = self.state.load(Ordering::Relaxed);
        if s & (WRITE_BIT | READER_BITS) != 0 {
            return None;
        }
        let next = s | WRITE_BIT;
        self.state
            .compare_exchange(s, next, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| Stamp {
                value: next,
                mode: StampMode::Write,
            })
    }

    /// Block until exclusively held or `cancel` fires
    pub fn write_lock(&self, cancel: &dyn CancelCheck) -> Result<Stamp, SyncError> {
        let mut backoff = Backoff::new();
        loop {
            checkpoint(cancel)?;
            if let Some(stamp) = self.try_write_lock() {
                return Ok(stamp);
            }
            backoff.snooze();
        }
    }

    pub fn try_read_lock(&self) -> Option<Stamp> {
        loop {
            let s = self.state.load(Ordering::Relaxed);
            if s & WRITE_BIT != 0 || s & READER_BITS == READER_BITS {
                return None;
            }
            if self
                .state
                .compare_exchange_weak(s, s + 1, Ordering::Acquire, Ordering::Relaxed)
                .is_ok()
            {
                return Some(Stamp {
                    value: s + 1,
                    mode: StampMode::Read,
                });
            }
        }
    }

    /// Block until shared access is held or `cancel` fires
    pub fn read_lock(&self, cancel: &dyn CancelCheck) -> Result<Stamp, SyncError> {
        let mut backoff = Backoff::new();
        loop {
            checkpoint(cancel)?;
            if let Some(stamp) = self.try_read_lock() {
                return Ok(stamp);
            }
            backoff.snooze();
        }
    }

    /// Upgrade `stamp` to a write lock without blocking
    ///
    /// An optimistic stamp converts only if the lock is untouched since it
    /// was issued; a read stamp converts only if it is the sole reader.
    pub fn try_convert_to_write_lock(&self, stamp: Stamp) -> Option<Stamp> {
        let s = self.state.load(Ordering::Relaxed);
        if (s & VERSION_BITS) != (stamp.value & VERSION_BITS) {
            return None;
        }
        let (expected, next) = match stamp.mode {
            StampMode::Write => {
                return (s == stamp.value).then_some(stamp);
            }
            StampMode::Read if s & READER_BITS == 1 => (s, (s - 1) | WRITE_BIT),
            StampMode::Optimistic if s & (WRITE_BIT | READER_BITS) == 0 => (s, s | WRITE_BIT),
            _ => return None,
        };
        self.state
            .compare_exchange(expected, next, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| Stamp {
                value: next,
                mode: StampMode::Write,
            })
    }

    /// Release whatever `stamp` holds
    pub fn unlock(&self, stamp: Stamp) -> Result<(), SyncError> {
        match stamp.mode {
            StampMode::Write => self.unlock_write(stamp),
            StampMode::Read => self.unlock_read(stamp),
            // Nothing is held by an optimistic read
            StampMode::Optimistic => Ok(()),
        }
    }

    fn unlock_write(&self, stamp: Stamp) -> Result<(), SyncError> {
        let s = self.state.load(Ordering::Relaxed);
        if s != stamp.value || s & WRITE_BIT == 0 {
            return Err(SyncError::InvalidStamp(stamp.value));
        }
        // Adding the write bit clears it and carries into the version
        let next = s.wrapping_add(WRITE_BIT);
        self.state
            .store(if next == 0 { ORIGIN } else { next }, Ordering::Release);
        Ok(())
    }

    fn unlock_read(&self, stamp: Stamp) -> Result<(), SyncError> {
        loop {
            let s = self.state.load(Ordering::Relaxed);
            if (s & VERSION_BITS) != (stamp.value & VERSION_BITS) || s & READER_BITS == 0 {
                return Err(SyncError::InvalidStamp(stamp.value));
            }
            if self
                .state
                .compare_exchange_weak(s, s - 1, Ordering::Release, Ordering::Relaxed)
                .is_ok()
            {
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
#[path = "stamped_tests.rs"]
mod tests;
