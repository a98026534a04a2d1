// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry of palantiri manager strategies

use super::{PalantiriManager, SlotPalantiriManager, StampedPalantiriManager};
use crate::palantir::Palantir;
use crate::sync::{
    BinarySemaphoreLock, FairSemaphoreCo, FairSemaphoreMo, ReentrantSpinLock, SpinLock,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Which mutual-exclusion mechanism guards the palantiri pool
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PalantiriStrategy {
    SpinLock,
    ReentrantSpinLock,
    FairSemaphoreMo,
    #[default]
    FairSemaphoreCo,
    StampedLock,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "unknown palantiri strategy '{0}' (expected one of: {names})",
    names = PalantiriStrategy::names()
)]
pub struct UnknownStrategy(pub String);

impl PalantiriStrategy {
    pub const ALL: [PalantiriStrategy; 5] = [
        PalantiriStrategy::SpinLock,
        PalantiriStrategy::ReentrantSpinLock,
        PalantiriStrategy::FairSemaphoreMo,
        PalantiriStrategy::FairSemaphoreCo,
        PalantiriStrategy::StampedLock,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PalantiriStrategy::SpinLock => "spin-lock",
            PalantiriStrategy::ReentrantSpinLock => "reentrant-spin-lock",
            PalantiriStrategy::FairSemaphoreMo => "fair-semaphore-mo",
            PalantiriStrategy::FairSemaphoreCo => "fair-semaphore-co",
            PalantiriStrategy::StampedLock => "stamped-lock",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            PalantiriStrategy::SpinLock => "test-and-set spin lock guarding a slot vector",
            PalantiriStrategy::ReentrantSpinLock => {
                "owner-counted spin lock, re-entered while auditing a claim"
            }
            PalantiriStrategy::FairSemaphoreMo => {
                "FIFO semaphore, each waiter blocks on its own monitor"
            }
            PalantiriStrategy::FairSemaphoreCo => {
                "FIFO semaphore, waiters share one lock with per-waiter conditions"
            }
            PalantiriStrategy::StampedLock => {
                "optimistic reads over a bitmap, upgraded to a write lock to claim"
            }
        }
    }

    fn names() -> String {
        Self::ALL
            .iter()
            .map(|s| s.name())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Build a manager of this strategy over `palantiri`
    pub fn build(self, palantiri: Vec<Palantir>) -> Box<dyn PalantiriManager> {
        let n = palantiri.len();
        match self {
            PalantiriStrategy::SpinLock => Box::new(SlotPalantiriManager::new(
                self,
                SpinLock::new(),
                FairSemaphoreMo::new(n),
                palantiri,
            )),
            PalantiriStrategy::ReentrantSpinLock => Box::new(SlotPalantiriManager::new(
                self,
                ReentrantSpinLock::new(),
                FairSemaphoreCo::new(n),
                palantiri,
            )),
            PalantiriStrategy::FairSemaphoreMo => Box::new(SlotPalantiriManager::new(
                self,
                BinarySemaphoreLock::new(FairSemaphoreMo::new(1)),
                FairSemaphoreMo::new(n),
                palantiri,
            )),
            PalantiriStrategy::FairSemaphoreCo => Box::new(SlotPalantiriManager::new(
                self,
                BinarySemaphoreLock::new(FairSemaphoreCo::new(1)),
                FairSemaphoreCo::new(n),
                palantiri,
            )),
            PalantiriStrategy::StampedLock => Box::new(StampedPalantiriManager::new(palantiri)),
        }
    }
}

impl fmt::Display for PalantiriStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PalantiriStrategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.name() == wanted)
            .ok_or_else(|| UnknownStrategy(s.to_string()))
    }
}
