// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifiers for beings and palantiri
//!
//! Ids are handed out by an [`IdArena`] owned by whoever builds a run, so
//! every run numbers its beings and palantiri from zero.

use serde::{Deserialize, Serialize};

/// Unique identifier for a being within one run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BeingId(pub u32);

impl std::fmt::Display for BeingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "being-{}", self.0)
    }
}

/// Unique identifier for a palantir within one run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PalantirId(pub u32);

impl std::fmt::Display for PalantirId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "palantir-{}", self.0)
    }
}

/// Sequential id source for one run
#[derive(Debug, Default)]
pub struct IdArena {
    next_being: u32,
    next_palantir: u32,
}

impl IdArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn being(&mut self) -> BeingId {
        let id = BeingId(self.next_being);
        self.next_being += 1;
        id
    }

    pub fn palantir(&mut self) -> PalantirId {
        let id = PalantirId(self.next_palantir);
        self.next_palantir += 1;
        id
    }

    /// Allocate `count` consecutive being ids
    pub fn beings(&mut self, count: usize) -> Vec<BeingId> {
        (0..count).map(|_| self.being()).collect()
    }

    /// Allocate `count` consecutive palantir ids
    pub fn palantiri(&mut self, count: usize) -> Vec<PalantirId> {
        (0..count).map(|_| self.palantir()).collect()
    }
}
