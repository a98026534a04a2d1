// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Palantiri managers: bounded pools of palantiri
//!
//! Every manager follows the same acquire protocol:
//! 1. take a permit from a fair counting semaphore sized to the pool
//! 2. under the guard primitive, claim the first available palantir
//! 3. hand the palantir back to the caller
//!
//! Managers differ only in the guard primitive and in how availability is
//! stored and scanned. See [`PalantiriStrategy`] for the registry.

mod registry;
mod slot;
mod stamped;
mod traced;

pub use registry::{PalantiriStrategy, UnknownStrategy};
pub use slot::SlotPalantiriManager;
pub use stamped::StampedPalantiriManager;
pub use traced::TracedPalantiriManager;

use crate::cancel::CancelCheck;
use crate::id::BeingId;
use crate::palantir::{Palantir, PalantirRecord};
use crate::sync::SyncError;
use std::sync::Arc;
use thiserror::Error;

/// Errors from palantir acquisition and release
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PoolError {
    /// The caller was cancelled or interrupted while waiting
    #[error("palantir acquire aborted: {0}")]
    Aborted(SyncError),
    /// A guard primitive misbehaved
    #[error("palantir pool lock error: {0}")]
    Lock(SyncError),
    /// Pool bookkeeping is inconsistent
    #[error("palantir pool invariant violated: {0}")]
    Invariant(String),
}

impl PoolError {
    /// Cancellation is normal early termination, everything else is fatal
    pub fn is_abort(&self) -> bool {
        matches!(self, PoolError::Aborted(_))
    }
}

impl From<SyncError> for PoolError {
    fn from(err: SyncError) -> Self {
        if err.is_abort() {
            PoolError::Aborted(err)
        } else {
            PoolError::Lock(err)
        }
    }
}

/// A fixed pool of palantiri shared by concurrent beings
pub trait PalantiriManager: Send + Sync {
    /// Block until a palantir is free, then record `being` as its owner
    ///
    /// A cancelled call returns [`PoolError::Aborted`] and leaves the pool
    /// exactly as it found it.
    fn acquire(&self, being: BeingId, cancel: &dyn CancelCheck) -> Result<Palantir, PoolError>;

    /// Return a palantir held by `being`
    ///
    /// `None`, unknown palantiri and palantiri not held by `being` are
    /// ignored. Only broken pool bookkeeping is reported as an error.
    fn release(&self, being: BeingId, palantir: Option<Palantir>) -> Result<(), PoolError>;

    /// Total number of palantiri
    fn capacity(&self) -> usize;

    /// Number of palantiri currently available
    fn available(&self) -> usize;

    /// Audit view of every palantir
    fn records(&self) -> Vec<PalantirRecord>;

    fn strategy(&self) -> PalantiriStrategy;
}

impl<M: PalantiriManager + ?Sized> PalantiriManager for Box<M> {
    fn acquire(&self, being: BeingId, cancel: &dyn CancelCheck) -> Result<Palantir, PoolError> {
        (**self).acquire(being, cancel)
    }

    fn release(&self, being: BeingId, palantir: Option<Palantir>) -> Result<(), PoolError> {
        (**self).release(being, palantir)
    }

    fn capacity(&self) -> usize {
        (**self).capacity()
    }

    fn available(&self) -> usize {
        (**self).available()
    }

    fn records(&self) -> Vec<PalantirRecord> {
        (**self).records()
    }

    fn strategy(&self) -> PalantiriStrategy {
        (**self).strategy()
    }
}

impl<M: PalantiriManager + ?Sized> PalantiriManager for Arc<M> {
    fn acquire(&self, being: BeingId, cancel: &dyn CancelCheck) -> Result<Palantir, PoolError> {
        (**self).acquire(being, cancel)
    }

    fn release(&self, being: BeingId, palantir: Option<Palantir>) -> Result<(), PoolError> {
        (**self).release(being, palantir)
    }

    fn capacity(&self) -> usize {
        (**self).capacity()
    }

    fn available(&self) -> usize {
        (**self).available()
    }

    fn records(&self) -> Vec<PalantirRecord> {
        (**self).records()
    }

    fn strategy(&self) -> PalantiriStrategy {
        (**self).strategy()
    }
}

/// Owner slot value meaning "not held"
const NO_OWNER: u64 = 0;

fn encode_owner(being: BeingId) -> u64 {
    u64::from(being.0) + 1
}

fn decode_owner(raw: u64) -> Option<BeingId> {
    raw.checked_sub(1).map(|id| BeingId(id as u32))
}

/// A permit was granted but every palantir is held
fn exhausted(being: BeingId) -> PoolError {
    PoolError::Invariant(format!(
        "{} was granted a permit but no palantir is available",
        being
    ))
}

/// The counting semaphore holds more permits than there are palantiri
fn overflowed(permits: usize, capacity: usize) -> PoolError {
    PoolError::Invariant(format!(
        "{} permits available for {} palantiri",
        permits, capacity
    ))
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
