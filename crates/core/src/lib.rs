// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! palantir-core: synchronization primitives and palantir pools
//!
//! This crate provides:
//! - Hand-built mutual exclusion primitives (spin locks, fair semaphores, stamped lock)
//! - Palantiri managers that hand out a fixed set of palantiri to beings
//! - A generic component state machine and the snapshots it publishes
//! - Cancellation, clock and id arena plumbing shared by the engine

pub mod cancel;
pub mod clock;
pub mod id;

pub mod sync;

pub mod component;
pub mod palantir;
pub mod snapshot;

pub mod manager;

// Re-exports
pub use cancel::{CancelCheck, CancelToken, NeverCancel};
pub use clock::{Clock, FakeClock, SystemClock};
pub use component::{
    BeingState, Component, ComponentKind, ComponentState, PalantirState, SimulatorState,
    Transition, TransitionError,
};
pub use id::{BeingId, IdArena, PalantirId};
pub use manager::{
    PalantiriManager, PalantiriStrategy, PoolError, TracedPalantiriManager, UnknownStrategy,
};
pub use palantir::{Palantir, PalantirRecord};
pub use snapshot::{Snapshot, StateTag};
pub use sync::{
    FairSemaphore, FairSemaphoreCo, FairSemaphoreMo, Lock, ReentrantSpinLock, SpinLock, Stamp,
    StampMode, StampedLock, SyncError,
};
