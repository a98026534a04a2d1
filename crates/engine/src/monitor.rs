// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Invariant monitoring for simulation runs.
//!
//! Audits every snapshot against the pool invariants:
//! - a palantir is held by at most one being at a time
//! - a being that is acquiring, gazing or releasing holds the palantir it
//!   names, and the palantir names it back
//! - an idle, waiting or finished being holds nothing
//!
//! Violations are escalated through the error channel.

use crate::error::{ErrorReporter, Fault};
use crate::observer::Observer;
use palantir_core::{
    BeingId, BeingState, ComponentKind, PalantirId, PalantirState, SimulatorState, Snapshot,
    StateTag,
};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Debug, Default)]
struct Ledger {
    holders: HashMap<PalantirId, BeingId>,
    gazing: HashSet<BeingId>,
    peak_holders: usize,
    peak_gazing: usize,
    violations: Vec<String>,
}

impl Ledger {
    fn holding(&self, being: BeingId) -> Option<PalantirId> {
        self.holders
            .iter()
            .find_map(|(palantir, holder)| (*holder == being).then_some(*palantir))
    }

    fn on_palantir(&mut self, snapshot: &Snapshot, state: PalantirState) -> Vec<Fault> {
        let palantir = PalantirId(snapshot.id);
        let mut faults = Vec::new();

        match state {
            PalantirState::Held => {
                let Some(being) = snapshot.being else {
                    let message = format!("{} held without an owner", palantir);
                    faults.push(palantir_fault(palantir, message));
                    return faults;
                };
                if let Some(other) = self.holding(being) {
                    faults.push(palantir_fault(
                        palantir,
                        format!("{} took {} while holding {}", being, palantir, other),
                    ));
                }
                if let Some(previous) = self.holders.insert(palantir, being) {
                    faults.push(palantir_fault(
                        palantir,
                        format!("{} held by {} and {} at once", palantir, previous, being),
                    ));
                }
                self.peak_holders = self.peak_holders.max(self.holders.len());
            }
            PalantirState::Available => {
                self.holders.remove(&palantir);
            }
        }
        faults
    }

    fn on_being(
        &mut self,
        snapshot: &Snapshot,
        previous: BeingState,
        state: BeingState,
    ) -> Vec<Fault> {
        let being = BeingId(snapshot.id);
        let mut faults = Vec::new();

        if state == BeingState::Gazing {
            self.gazing.insert(being);
            self.peak_gazing = self.peak_gazing.max(self.gazing.len());
        } else {
            self.gazing.remove(&being);
        }

        // A failed being may legitimately keep its palantir
        if previous == BeingState::Error {
            return faults;
        }

        if state.holds_palantir() {
            match snapshot.palantir {
                None => faults.push(Fault::being(
                    being,
                    format!("{} is {} without a palantir", being, state),
                )),
                Some(palantir) => {
                    let holder = self.holders.get(&palantir).copied();
                    if holder != Some(being) {
                        let owner = holder.map_or_else(|| "nobody".to_string(), |b| b.to_string());
                        let message = format!(
                            "{} is {} with {} but it is held by {}",
                            being, state, palantir, owner
                        );
                        faults.push(Fault::being(being, message));
                    }
                }
            }
        } else if matches!(state, BeingState::Idle | BeingState::Waiting | BeingState::Done) {
            if let Some(palantir) = self.holding(being) {
                faults.push(Fault::being(
                    being,
                    format!("{} is {} while holding {}", being, state, palantir),
                ));
            }
        }
        faults
    }
}

fn palantir_fault(palantir: PalantirId, message: String) -> Fault {
    Fault::new(ComponentKind::Palantir, palantir.0, message)
}

/// Observer that checks mutual exclusion and the being/palantir bijection
#[derive(Debug, Default)]
pub struct InvariantMonitor {
    ledger: Mutex<Ledger>,
}

impl InvariantMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every violation seen since the current run started
    pub fn violations(&self) -> Vec<String> {
        self.ledger
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .violations
            .clone()
    }

    /// Most palantiri held at once
    pub fn peak_holders(&self) -> usize {
        self.ledger.lock().unwrap_or_else(|e| e.into_inner()).peak_holders
    }

    /// Most beings gazing at once
    pub fn peak_gazing(&self) -> usize {
        self.ledger.lock().unwrap_or_else(|e| e.into_inner()).peak_gazing
    }

    fn audit(&self, snapshot: &Snapshot) -> Vec<Fault> {
        let mut ledger = self.ledger.lock().unwrap_or_else(|e| e.into_inner());
        let faults = match (snapshot.previous, snapshot.current) {
            (_, StateTag::Simulator(SimulatorState::Running)) => {
                *ledger = Ledger::default();
                Vec::new()
            }
            (_, StateTag::Palantir(state)) => ledger.on_palantir(snapshot, state),
            (StateTag::Being(previous), StateTag::Being(state)) => {
                ledger.on_being(snapshot, previous, state)
            }
            _ => Vec::new(),
        };
        ledger
            .violations
            .extend(faults.iter().map(|f| f.message.clone()));
        faults
    }
}

impl Observer for InvariantMonitor {
    fn on_snapshot(&self, snapshot: &Snapshot, errors: &dyn ErrorReporter) {
        // Report outside the ledger lock: reporting publishes a snapshot
        // that comes straight back here
        for fault in self.audit(snapshot) {
            tracing::error!(%fault, "invariant violated");
            errors.report_error(fault);
        }
    }
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
