// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Simulator: wires a being strategy to a palantiri strategy and drives a run

use crate::being_manager::{BeingManager, ShutdownOutcome};
use crate::config::SimulationConfig;
use crate::context::RunContext;
use crate::error::SimulatorError;
use crate::observer::Observer;
use crate::report::RunReport;
use palantir_core::{
    Clock, Component, IdArena, Palantir, PalantiriManager, SimulatorState, SystemClock,
    TracedPalantiriManager,
};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

/// How often a waiting shutdown re-checks whether the run has ended
const INSTALL_TICK: Duration = Duration::from_millis(10);

/// The run currently between start and finish
struct ActiveRun<C> {
    manager: Arc<BeingManager<C>>,
    context: Arc<RunContext<C>>,
}

pub struct Simulator<C = SystemClock> {
    clock: C,
    observers: Vec<Arc<dyn Observer>>,
    state: Arc<Mutex<Component<SimulatorState>>>,
    active: Mutex<Option<ActiveRun<C>>>,
    installed: Condvar,
}

impl Default for Simulator<SystemClock> {
    fn default() -> Self {
        Self::new(SystemClock)
    }
}

impl<C: Clock> Simulator<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            observers: Vec::new(),
            state: Arc::new(Mutex::new(Component::new(0, SimulatorState::Idle))),
            active: Mutex::new(None),
            installed: Condvar::new(),
        }
    }

    /// Register an observer for every snapshot of every later run
    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn state(&self) -> SimulatorState {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).state()
    }

    /// Run a simulation to completion with a pool built from the config
    pub fn run(&self, config: &SimulationConfig) -> Result<RunReport, SimulatorError> {
        config.validate()?;
        let mut ids = IdArena::new();
        let palantiri = ids
            .palantiri(config.palantiri)
            .into_iter()
            .map(Palantir::new)
            .collect();
        let pool = TracedPalantiriManager::new(config.palantiri_strategy.build(palantiri));
        self.execute(config, ids, Arc::new(pool))
    }

    /// Run a simulation against a caller-supplied pool
    ///
    /// The pool's own capacity replaces `config.palantiri`.
    pub fn run_with_pool(
        &self,
        config: &SimulationConfig,
        pool: Arc<dyn PalantiriManager>,
    ) -> Result<RunReport, SimulatorError> {
        config.validate()?;
        self.execute(config, IdArena::new(), pool)
    }

    /// Stop the active run, escalating from cancel to interrupt
    ///
    /// A request that lands while the run is still being built waits for
    /// its beings and then stops them. Blocks, so never call it from an
    /// observer.
    pub fn shutdown(&self) -> ShutdownOutcome {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        let (manager, context) = loop {
            if let Some(run) = active.as_ref() {
                break (Arc::clone(&run.manager), Arc::clone(&run.context));
            }
            if self.state() != SimulatorState::Running {
                return ShutdownOutcome::NotRunning;
            }
            active = match self.installed.wait_timeout(active, INSTALL_TICK) {
                Ok((guard, _)) => guard,
                Err(e) => e.into_inner().0,
            };
        };
        drop(active);

        context.transition_simulator(SimulatorState::Cancelling, None);
        manager.shutdown()
    }

    fn execute(
        &self,
        config: &SimulationConfig,
        mut ids: IdArena,
        pool: Arc<dyn PalantiriManager>,
    ) -> Result<RunReport, SimulatorError> {
        let context = Arc::new(RunContext::new(
            self.clock.clone(),
            self.observers.clone(),
            Arc::clone(&self.state),
            pool.records().into_iter().map(|record| record.id),
        ));
        if !context.transition_simulator(SimulatorState::Running, None) {
            return Err(SimulatorError::AlreadyRunning);
        }

        let span = tracing::info_span!(
            "simulation.run",
            run_id = %context.run_id(),
            palantiri_strategy = %pool.strategy(),
            being_strategy = %config.being_strategy,
        );
        let _guard = span.enter();
        tracing::info!(
            palantiri = pool.capacity(),
            beings = config.beings,
            iterations = config.iterations,
            "simulation started"
        );

        let manager = Arc::new(BeingManager::build(
            config,
            ids.beings(config.beings),
            Arc::clone(&pool),
            Arc::clone(&context),
        ));
        *self.active.lock().unwrap_or_else(|e| e.into_inner()) = Some(ActiveRun {
            manager: Arc::clone(&manager),
            context: Arc::clone(&context),
        });
        self.installed.notify_all();

        let started = manager.start();
        let outcome = manager.wait();
        *self.active.lock().unwrap_or_else(|e| e.into_inner()) = None;

        let fault = context.fault();
        if fault.is_none() {
            context.transition_simulator(SimulatorState::Done, None);
        }

        let report = RunReport {
            run_id: context.run_id().to_string(),
            palantiri_strategy: pool.strategy(),
            being_strategy: config.being_strategy,
            elapsed_ms: context.elapsed().as_millis() as u64,
            beings: outcome.beings,
            palantiri: pool.records(),
            shutdown: outcome.shutdown,
            anomalies: outcome.anomalies,
            fault: fault.clone(),
        };
        tracing::info!(
            elapsed_ms = report.elapsed_ms,
            completed = report.total_completed(),
            anomalies = report.anomalies.len(),
            "simulation finished"
        );

        started?;
        match fault {
            Some(fault) => Err(SimulatorError::Fault {
                fault,
                report: Box::new(report),
            }),
            None => Ok(report),
        }
    }
}

#[cfg(test)]
#[path = "simulator_tests.rs"]
mod tests;
