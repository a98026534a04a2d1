// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-of-run summary

use crate::being_manager::{BeingStrategy, ShutdownOutcome};
use crate::error::Fault;
use palantir_core::{BeingId, BeingState, PalantirRecord, PalantiriStrategy};
use serde::Serialize;

/// Final (or last known) state of one being
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BeingReport {
    pub id: BeingId,
    pub state: BeingState,
    /// Full acquire/gaze/release cycles finished
    pub completed: usize,
    pub error: Option<String>,
}

impl BeingReport {
    pub fn new(id: BeingId) -> Self {
        Self {
            id,
            state: BeingState::Idle,
            completed: 0,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub palantiri_strategy: PalantiriStrategy,
    pub being_strategy: BeingStrategy,
    pub elapsed_ms: u64,
    pub beings: Vec<BeingReport>,
    pub palantiri: Vec<PalantirRecord>,
    /// Set when the run was shut down rather than finishing on its own
    pub shutdown: Option<ShutdownOutcome>,
    /// Beings that misbehaved during shutdown or panicked
    pub anomalies: Vec<String>,
    pub fault: Option<Fault>,
}

impl RunReport {
    pub fn total_completed(&self) -> usize {
        self.beings.iter().map(|b| b.completed).sum()
    }

    pub fn total_uses(&self) -> u64 {
        self.palantiri.iter().map(|p| p.uses).sum()
    }

    /// Every being finished, nothing faulted and every palantir is back
    pub fn is_clean(&self) -> bool {
        self.fault.is_none()
            && self.anomalies.is_empty()
            && self.beings.iter().all(|b| b.state == BeingState::Done)
            && self.palantiri.iter().all(PalantirRecord::is_available)
    }
}
