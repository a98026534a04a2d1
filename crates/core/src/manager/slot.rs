// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Palantiri manager over a vector of availability slots
//!
//! Generic over the guard primitive and the counting semaphore, which is
//! how the spin lock, reentrant spin lock and fair semaphore strategies
//! share one implementation.

use super::{
    decode_owner, encode_owner, exhausted, overflowed, PalantiriManager, PalantiriStrategy,
    PoolError, NO_OWNER,
};
use crate::cancel::{CancelCheck, NeverCancel};
use crate::component::PalantirState;
use crate::id::BeingId;
use crate::palantir::{Palantir, PalantirRecord};
use crate::sync::{checkpoint, FairSemaphore, Lock};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Bookkeeping for one palantir
///
/// The atomics are only written while the guard is held; relaxed ordering
/// is enough because the guard's acquire/release orders them.
#[derive(Debug)]
struct Slot {
    palantir: Palantir,
    held: AtomicBool,
    owner: AtomicU64,
    uses: AtomicU64,
}

impl Slot {
    fn new(palantir: Palantir) -> Self {
        Self {
            palantir,
            held: AtomicBool::new(false),
            owner: AtomicU64::new(NO_OWNER),
            uses: AtomicU64::new(0),
        }
    }

    fn record(&self) -> PalantirRecord {
        let held = self.held.load(Ordering::Relaxed);
        PalantirRecord {
            id: self.palantir.id(),
            state: if held {
                PalantirState::Held
            } else {
                PalantirState::Available
            },
            owner: decode_owner(self.owner.load(Ordering::Relaxed)),
            uses: self.uses.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug)]
pub struct SlotPalantiriManager<L, S> {
    strategy: PalantiriStrategy,
    guard: L,
    permits: S,
    slots: Vec<Slot>,
}

impl<L: Lock, S: FairSemaphore> SlotPalantiriManager<L, S> {
    /// `permits` must start with one permit per palantir
    pub fn new(
        strategy: PalantiriStrategy,
        guard: L,
        permits: S,
        palantiri: Vec<Palantir>,
    ) -> Self {
        Self {
            strategy,
            guard,
            permits,
            slots: palantiri.into_iter().map(Slot::new).collect(),
        }
    }

    /// Run `f` inside the guard's critical section
    fn guarded<T>(
        &self,
        cancel: &dyn CancelCheck,
        f: impl FnOnce() -> Result<T, PoolError>,
    ) -> Result<T, PoolError> {
        self.guard.acquire(cancel)?;
        let result = f();
        self.guard.release()?;
        result
    }

    /// Read under the guard, falling back to a racy read if the guard fails
    fn observe<T>(&self, f: impl Fn() -> T) -> T {
        match self.guarded(&NeverCancel, || Ok(f())) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(strategy = %self.strategy, error = %e, "guard failed during read");
                f()
            }
        }
    }

    fn count_available(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| !s.held.load(Ordering::Relaxed))
            .count()
    }

    fn slot(&self, palantir: Palantir) -> Option<&Slot> {
        self.slots.iter().find(|s| s.palantir == palantir)
    }

    /// Claim the first available slot; the guard must be held
    fn claim(&self, being: BeingId) -> Result<Palantir, PoolError> {
        let slot = self
            .slots
            .iter()
            .find(|s| !s.held.load(Ordering::Relaxed))
            .ok_or_else(|| exhausted(being))?;

        slot.held.store(true, Ordering::Relaxed);
        slot.owner.store(encode_owner(being), Ordering::Relaxed);
        slot.uses.fetch_add(1, Ordering::Relaxed);

        // A reentrant guard can take the public, guarded path while still held
        let available = if self.guard.is_reentrant() {
            self.available()
        } else {
            self.count_available()
        };
        let held = self.capacity() - available;
        let granted = self.capacity().saturating_sub(self.permits.available_permits());
        if held > granted {
            return Err(PoolError::Invariant(format!(
                "{} palantiri held but only {} permits granted",
                held, granted
            )));
        }

        Ok(slot.palantir)
    }
}

impl<L: Lock, S: FairSemaphore> PalantiriManager for SlotPalantiriManager<L, S> {
    fn acquire(&self, being: BeingId, cancel: &dyn CancelCheck) -> Result<Palantir, PoolError> {
        checkpoint(cancel)?;
        self.permits.acquire(cancel)?;

        match self.guarded(cancel, || self.claim(being)) {
            Ok(palantir) => {
                tracing::debug!(strategy = %self.strategy, %being, %palantir, "palantir acquired");
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
        let Some(slot) = self.slot(palantir) else {
            tracing::warn!(%being, %palantir, "ignoring release of unknown palantir");
            return Ok(());
        };

        let released = self.guarded(&NeverCancel, || {
            let owned = slot.held.load(Ordering::Relaxed)
                && slot.owner.load(Ordering::Relaxed) == encode_owner(being);
            if owned {
                slot.held.store(false, Ordering::Relaxed);
                slot.owner.store(NO_OWNER, Ordering::Relaxed);
            }
            Ok(owned)
        })?;

        if !released {
            tracing::warn!(%being, %palantir, "ignoring release of palantir not held by caller");
            return Ok(());
        }

        self.permits.release();
        tracing::debug!(strategy = %self.strategy, %being, %palantir, "palantir released");

        let permits = self.permits.available_permits();
        if permits > self.capacity() {
            return Err(overflowed(permits, self.capacity()));
        }
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn available(&self) -> usize {
        self.observe(|| self.count_available())
    }

    fn records(&self) -> Vec<PalantirRecord> {
        self.observe(|| self.slots.iter().map(Slot::record).collect())
    }

    fn strategy(&self) -> PalantiriStrategy {
        self.strategy
    }
}
