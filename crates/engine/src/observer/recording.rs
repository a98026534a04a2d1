// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recording observer for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::Observer;
use crate::error::ErrorReporter;
use palantir_core::{BeingId, BeingState, ComponentKind, PalantirId, PalantirState, Snapshot};
use std::sync::{Arc, Mutex};

/// Observer that keeps every snapshot it sees
#[derive(Clone, Default)]
pub struct RecordingObserver {
    snapshots: Arc<Mutex<Vec<Snapshot>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded snapshots in delivery order
    pub fn snapshots(&self) -> Vec<Snapshot> {
        self.snapshots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn of_kind(&self, kind: ComponentKind) -> Vec<Snapshot> {
        self.snapshots()
            .into_iter()
            .filter(|s| s.kind == kind)
            .collect()
    }

    /// States one being passed through, starting with its first target
    pub fn being_states(&self, being: BeingId) -> Vec<BeingState> {
        self.of_kind(ComponentKind::Being)
            .iter()
            .filter(|s| s.id == being.0)
            .filter_map(Snapshot::being_state)
            .collect()
    }

    pub fn palantir_states(&self, palantir: PalantirId) -> Vec<PalantirState> {
        self.of_kind(ComponentKind::Palantir)
            .iter()
            .filter(|s| s.id == palantir.0)
            .filter_map(Snapshot::palantir_state)
            .collect()
    }

    pub fn clear(&self) {
        self.snapshots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

impl Observer for RecordingObserver {
    fn on_snapshot(&self, snapshot: &Snapshot, _errors: &dyn ErrorReporter) {
        self.snapshots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(snapshot.clone());
    }
}
