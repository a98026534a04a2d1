// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Palantiri: the pooled resources handed out to beings

use crate::component::PalantirState;
use crate::id::{BeingId, PalantirId};
use serde::Serialize;

/// Handle to one palantir
///
/// Handles are plain values; who holds which palantir is tracked by the
/// manager that issued it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Palantir {
    id: PalantirId,
}

impl Palantir {
    pub fn new(id: PalantirId) -> Self {
        Self { id }
    }

    pub fn id(&self) -> PalantirId {
        self.id
    }
}

impl std::fmt::Display for Palantir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Point-in-time view of a palantir inside its manager
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PalantirRecord {
    pub id: PalantirId,
    pub state: PalantirState,
    pub owner: Option<BeingId>,
    /// Number of times this palantir has been acquired
    pub uses: u64,
}

impl PalantirRecord {
    pub fn is_available(&self) -> bool {
        self.state == PalantirState::Available
    }
}
