// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Palantiri manager over a held-bitmap guarded by a [`StampedLock`]
//!
//! Scans run optimistically and upgrade to a write lock only to claim.
//! Reads of the whole pool retry optimistically before falling back to a
//! shared read lock.

use super::{
    decode_owner, encode_owner, exhausted, overflowed, PalantiriManager, PalantiriStrategy,
    PoolError, NO_OWNER,
};
use crate::cancel::{CancelCheck, NeverCancel};
use crate::component::PalantirState;
use crate::id::BeingId;
use crate::palantir::{Palantir, PalantirRecord};
use crate::sync::{checkpoint, FairSemaphore, FairSemaphoreCo, Stamp, StampedLock, SyncError};
use std::sync::atomic::{AtomicU64, Ordering};

const WORD_BITS: usize = u64::BITS as usize;

/// Optimistic attempts before a read falls back to a read lock
const OPTIMISTIC_ATTEMPTS: usize = 3;

#[derive(Debug)]
pub struct StampedPalantiriManager {
    lock: StampedLock,
    permits: FairSemaphoreCo,
    palantiri: Vec<Palantir>,
    /// One bit per palantir, set while held
    held: Vec<AtomicU64>,
    owners: Vec<AtomicU64>,
    uses: Vec<AtomicU64>,
}

impl StampedPalantiriManager {
    pub fn new(palantiri: Vec<Palantir>) -> Self {
        let n = palantiri.len();
        Self {
            lock: StampedLock::new(),
            permits: FairSemaphoreCo::new(n),
            held: (0..n.div_ceil(WORD_BITS)).map(|_| AtomicU64::new(0)).collect(),
            owners: (0..n).map(|_| AtomicU64::new(NO_OWNER)).collect(),
            uses: (0..n).map(|_| AtomicU64::new(0)).collect(),
            palantiri,
        }
    }

    fn is_held(&self, index: usize) -> bool {
        let word = self.held[index / WORD_BITS].load(Ordering::Relaxed);
        word & (1 << (index % WORD_BITS)) != 0
    }

    fn set_held(&self, index: usize, held: bool) {
        let bit = 1 << (index % WORD_BITS);
        let word = &self.held[index / WORD_BITS];
        if held {
            word.fetch_or(bit, Ordering::Relaxed);
        } else {
            word.fetch_and(!bit, Ordering::Relaxed);
        }
    }

    fn first_free(&self) -> Option<usize> {
        self.held.iter().enumerate().find_map(|(w, word)| {
            let free = !word.load(Ordering::Relaxed);
            let index = w * WORD_BITS + free.trailing_zeros() as usize;
            (free != 0 && index < self.palantiri.len()).then_some(index)
        })
    }

    fn count_available(&self) -> usize {
        (0..self.palantiri.len()).filter(|&i| !self.is_held(i)).count()
    }

    fn index_of(&self, palantir: Palantir) -> Option<usize> {
        self.palantiri.iter().position(|p| *p == palantir)
    }

    /// Take the write lock, upgrading an optimistic scan when nothing raced it
    fn write_stamp(&self, cancel: &dyn CancelCheck) -> Result<Stamp, SyncError> {
        if let Some(optimistic) = self.lock.try_optimistic_read() {
            if self.first_free().is_some() && self.lock.validate(optimistic) {
                if let Some(stamp) = self.lock.try_convert_to_write_lock(optimistic) {
                    return Ok(stamp);
                }
            }
        }
        self.lock.write_lock(cancel)
    }

    /// Claim the first free palantir; the write lock must be held
    fn claim_locked(&self, being: BeingId) -> Result<Palantir, PoolError> {
        let index = self.first_free().ok_or_else(|| exhausted(being))?;
        self.set_held(index, true);
        self.owners[index].store(encode_owner(being), Ordering::Relaxed);
        self.uses[index].fetch_add(1, Ordering::Relaxed);
        Ok(self.palantiri[index])
    }

    /// Consistent read of the pool state
    fn read<T>(&self, f: impl Fn() -> T) -> T {
        for _ in 0..OPTIMISTIC_ATTEMPTS {
            if let Some(stamp) = self.lock.try_optimistic_read() {
                let value = f();
                if self.lock.validate(stamp) {
                    return value;
                }
            }
        }

        match self.lock.read_lock(&NeverCancel) {
            Ok(stamp) => {
                let value = f();
                if let Err(e) = self.lock.unlock(stamp) {
                    tracing::error!(error = %e, "stamped read unlock failed");
                }
                value
            }
            Err(e) => {
                tracing::error!(error = %e, "stamped read lock failed");
                f()
            }
        }
    }

    fn record(&self, index: usize) -> PalantirRecord {
        PalantirRecord {
            id: self.palantiri[index].id(),
            state: if self.is_held(index) {
                PalantirState::Held
            } else {
                PalantirState::Available
            },
            owner: decode_owner(self.owners[index].load(Ordering::Relaxed)),
            uses: self.uses[index].load(Ordering::Relaxed),
        }
    }
}

impl PalantiriManager for StampedPalantiriManager {
    fn acquire(&self, being: BeingId, cancel: &dyn CancelCheck) -> Result<Palantir, PoolError> {
        checkpoint(cancel)?;
        self.permits.acquire(cancel)?;

        let claimed = self.write_stamp(cancel).map_err(PoolError::from).and_then(|stamp| {
            let claimed = self.claim_locked(being);
            self.lock.unlock(stamp)?;
            claimed
        });

        match claimed {
            Ok(palantir) => {
                tracing::debug!(
                    strategy = %self.strategy(),
                    %being,
                    %palantir,
                    "palantir acquired"
                );
                Ok(palantir)
            }
            Err(e) => {
                self.permits.release();
                Err(e)
            }
        }
    }

    fn release(&self, being: BeingId, palantir: Option<Palantir>) -> Result<(), PoolError> {
        let Some(palantir) = palantir else {
            tracing::debug!(%being, "ignoring release of no palantir");
            return Ok(());
        };
        let Some(index) = self.index_of(palantir) else {
            tracing::warn!(%being, %palantir, "ignoring release of unknown palantir");
            return Ok(());
        };

        let stamp = self.lock.write_lock(&NeverCancel)?;
        let owned = self.is_held(index)
            && self.owners[index].load(Ordering::Relaxed) == encode_owner(being);
        if owned {
            self.set_held(index, false);
            self.owners[index].store(NO_OWNER, Ordering::Relaxed);
        }
        self.lock.unlock(stamp)?;

        if !owned {
            tracing::warn!(%being, %palantir, "ignoring release of palantir not held by caller");
            return Ok(());
        }

        self.permits.release();
        tracing::debug!(strategy = %self.strategy(), %being, %palantir, "palantir released");

        let permits = self.permits.available_permits();
        if permits > self.capacity() {
            return Err(overflowed(permits, self.capacity()));
        }
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.palantiri.len()
    }

    fn available(&self) -> usize {
        self.read(|| self.count_available())
    }

    fn records(&self) -> Vec<PalantirRecord> {
        self.read(|| (0..self.palantiri.len()).map(|i| self.record(i)).collect())
    }

    fn strategy(&self) -> PalantiriStrategy {
        PalantiriStrategy::StampedLock
    }
}
