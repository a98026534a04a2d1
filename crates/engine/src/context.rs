// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-run shared state: snapshot delivery, palantir components and the
//! error channel

use crate::error::{ErrorReporter, Fault};
use crate::observer::Observer;
use palantir_core::{
    BeingId, Clock, Component, ComponentKind, ComponentState, Palantir, PalantirId, PalantirState,
    SimulatorState, Snapshot,
};
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use uuid::Uuid;

pub(crate) struct RunContext<C> {
    run_id: Uuid,
    clock: C,
    started: Instant,
    observers: Vec<Arc<dyn Observer>>,
    palantiri: Mutex<BTreeMap<PalantirId, Component<PalantirState>>>,
    simulator: Arc<Mutex<Component<SimulatorState>>>,
    fault: Mutex<Option<Fault>>,
}

impl<C: Clock> RunContext<C> {
    pub(crate) fn new(
        clock: C,
        observers: Vec<Arc<dyn Observer>>,
        simulator: Arc<Mutex<Component<SimulatorState>>>,
        palantiri: impl IntoIterator<Item = PalantirId>,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started: clock.now(),
            clock,
            observers,
            palantiri: Mutex::new(
                palantiri
                    .into_iter()
                    .map(|id| (id, Component::new(id.0, PalantirState::Available)))
                    .collect(),
            ),
            simulator,
            fault: Mutex::new(None),
        }
    }

    pub(crate) fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub(crate) fn clock(&self) -> &C {
        &self.clock
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.clock.now().saturating_duration_since(self.started)
    }

    /// Deliver a snapshot to every observer, isolating observer panics
    pub(crate) fn publish(&self, snapshot: &Snapshot) {
        for observer in &self.observers {
            let delivered = catch_unwind(AssertUnwindSafe(|| observer.on_snapshot(snapshot, self)));
            if delivered.is_err() {
                tracing::error!(
                    kind = %snapshot.kind,
                    id = snapshot.id,
                    "observer panicked while handling snapshot"
                );
            }
        }
    }

    /// Move a palantir component and publish the change
    ///
    /// Delivery happens under the palantir table lock so observers see
    /// palantir changes in the order the pool made them.
    pub(crate) fn publish_palantir(
        &self,
        palantir: Palantir,
        to: PalantirState,
        owner: Option<BeingId>,
    ) {
        let mut table = self.palantiri.lock().unwrap_or_else(|e| e.into_inner());
        let Some(component) = table.get_mut(&palantir.id()) else {
            drop(table);
            self.report_error(Fault::new(
                ComponentKind::Palantir,
                palantir.id().0,
                "pool handed out a palantir it was not built with",
            ));
            return;
        };

        match component.transition(to) {
            Ok(transition) => {
                let snapshot = Snapshot::of(
                    component,
                    transition,
                    Some(palantir.id()),
                    owner,
                    None,
                    self.elapsed(),
                );
                self.publish(&snapshot);
            }
            Err(e) => {
                drop(table);
                self.report_error(e.into());
            }
        }
    }

    /// Move the simulator if the transition is legal, publishing it
    pub(crate) fn transition_simulator(&self, to: SimulatorState, error: Option<String>) -> bool {
        let snapshot = {
            let mut simulator = self.simulator.lock().unwrap_or_else(|e| e.into_inner());
            if !simulator.state().can_transition(to) {
                return false;
            }
            match simulator.transition(to) {
                Ok(transition) => {
                    Snapshot::of(&*simulator, transition, None, None, error, self.elapsed())
                }
                Err(_) => return false,
            }
        };
        self.publish(&snapshot);
        true
    }

    pub(crate) fn fault(&self) -> Option<Fault> {
        self.fault.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub(crate) fn has_fault(&self) -> bool {
        self.fault.lock().unwrap_or_else(|e| e.into_inner()).is_some()
    }
}

impl<C: Clock> ErrorReporter for RunContext<C> {
    /// Record the first fault and move the simulator to `Error`
    ///
    /// Later faults are logged only. The driver thread notices the fault
    /// and performs the shutdown.
    fn report_error(&self, fault: Fault) {
        {
            let mut slot = self.fault.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(first) = slot.as_ref() {
                tracing::warn!(%fault, %first, "additional fault after the first");
                return;
            }
            tracing::error!(run_id = %self.run_id, %fault, "simulation fault");
            *slot = Some(fault.clone());
        }
        self.transition_simulator(SimulatorState::Error, Some(fault.to_string()));
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
