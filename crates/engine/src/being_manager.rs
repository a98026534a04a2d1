// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Being manager: owns the being threads and their two-phase shutdown
//!
//! Shutdown escalates in two phases, each bounded by the shutdown window:
//! 1. cancel every being and wait for them to wind down
//! 2. interrupt the beings still running and wait again
//!
//! Beings alive after phase 2 are reported as anomalies and left detached.
//! A shutdown requested before the beings are spawned waits for `start`,
//! which then launches every being already cancelled.

use crate::being::Being;
use crate::config::SimulationConfig;
use crate::context::RunContext;
use crate::error::{ErrorReporter, Fault, SimulatorError};
use crate::report::BeingReport;
use palantir_core::{BeingId, CancelCheck, CancelToken, Clock, NeverCancel, PalantiriManager};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;

/// How often the driver re-checks for faults while beings run
const FAULT_POLL: Duration = Duration::from_millis(20);

/// Longest a gated being waits before re-checking cancellation
const GATE_TICK: Duration = Duration::from_millis(10);

/// How being threads are started
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BeingStrategy {
    /// Each being starts as soon as its thread is spawned
    #[default]
    Threads,
    /// Beings wait at a gate and start together
    StartGate,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown being strategy '{0}' (expected threads or start-gate)")]
pub struct UnknownBeingStrategy(pub String);

impl BeingStrategy {
    pub const ALL: [BeingStrategy; 2] = [BeingStrategy::Threads, BeingStrategy::StartGate];

    pub fn name(self) -> &'static str {
        match self {
            BeingStrategy::Threads => "threads",
            BeingStrategy::StartGate => "start-gate",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            BeingStrategy::Threads => "one thread per being, started immediately",
            BeingStrategy::StartGate => "one thread per being, released together for contention",
        }
    }
}

impl fmt::Display for BeingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BeingStrategy {
    type Err = UnknownBeingStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.name() == wanted)
            .ok_or_else(|| UnknownBeingStrategy(s.to_string()))
    }
}

/// How a shutdown request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ShutdownOutcome {
    /// Every being stopped after cancellation
    Cooperative,
    /// Some beings only stopped once interrupted
    Forced { interrupted: usize },
    /// Some beings were still alive after interruption
    Anomalous { stuck: usize },
    /// Another caller already shut the run down
    AlreadyRequested,
    /// No run is active
    NotRunning,
}

impl fmt::Display for ShutdownOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownOutcome::Cooperative => write!(f, "cooperative"),
            ShutdownOutcome::Forced { interrupted } => {
                write!(f, "forced ({} interrupted)", interrupted)
            }
            ShutdownOutcome::Anomalous { stuck } => write!(f, "anomalous ({} stuck)", stuck),
            ShutdownOutcome::AlreadyRequested => write!(f, "already requested"),
            ShutdownOutcome::NotRunning => write!(f, "not running"),
        }
    }
}

/// Count of being threads that have not exited
struct Liveness {
    running: Mutex<usize>,
    changed: Condvar,
}

impl Liveness {
    fn new(running: usize) -> Self {
        Self {
            running: Mutex::new(running),
            changed: Condvar::new(),
        }
    }

    fn finish(&self) {
        let mut running = self.running.lock().unwrap_or_else(|e| e.into_inner());
        *running = running.saturating_sub(1);
        self.changed.notify_all();
    }

    /// Wait up to `timeout` for every thread to exit, returning how many remain
    fn wait_idle(&self, timeout: Duration) -> usize {
        let running = self.running.lock().unwrap_or_else(|e| e.into_inner());
        let (running, _) = self
            .changed
            .wait_timeout_while(running, timeout, |n| *n > 0)
            .unwrap_or_else(|e| e.into_inner());
        *running
    }
}

/// A one-way latch that waiters poll alongside their cancel check
#[derive(Default)]
struct Gate {
    open: Mutex<bool>,
    opened: Condvar,
}

impl Gate {
    fn open(&self) {
        *self.open.lock().unwrap_or_else(|e| e.into_inner()) = true;
        self.opened.notify_all();
    }

    fn is_open(&self) -> bool {
        *self.open.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn wait(&self, cancel: &dyn CancelCheck) {
        let mut open = self.open.lock().unwrap_or_else(|e| e.into_inner());
        while !*open && !cancel.is_cancelled() {
            open = match self.opened.wait_timeout(open, GATE_TICK) {
                Ok((guard, _)) => guard,
                Err(e) => e.into_inner().0,
            };
        }
    }
}

/// Marks a being thread as exited, including when it unwinds
struct ExitGuard {
    liveness: Arc<Liveness>,
    finished: Arc<AtomicBool>,
}

impl Drop for ExitGuard {
    fn drop(&mut self) {
        self.finished.store(true, Ordering::Release);
        self.liveness.finish();
    }
}

struct Handle {
    id: BeingId,
    token: CancelToken,
    status: Arc<Mutex<BeingReport>>,
    finished: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

/// What the manager knows once its beings are gone
#[derive(Debug)]
pub(crate) struct ManagerReport {
    pub(crate) beings: Vec<BeingReport>,
    pub(crate) shutdown: Option<ShutdownOutcome>,
    pub(crate) anomalies: Vec<String>,
}

pub(crate) struct BeingManager<C> {
    strategy: BeingStrategy,
    window: Duration,
    context: Arc<RunContext<C>>,
    pending: Mutex<Vec<Being<C>>>,
    handles: Mutex<Vec<Handle>>,
    liveness: Arc<Liveness>,
    /// Holds start-gate beings until every thread is spawned
    gate: Arc<Gate>,
    /// Opens once `start` has taken the beings
    launched: Gate,
    shutdown_requested: AtomicBool,
    shutdown_settled: AtomicBool,
    outcome: Mutex<Option<ShutdownOutcome>>,
}

impl<C: Clock> BeingManager<C> {
    /// Create one being per id, all sharing `pool`
    pub(crate) fn build(
        config: &SimulationConfig,
        ids: Vec<BeingId>,
        pool: Arc<dyn PalantiriManager>,
        context: Arc<RunContext<C>>,
    ) -> Self {
        let beings: Vec<Being<C>> = ids
            .into_iter()
            .map(|id| {
                Being::new(
                    id,
                    config.iterations,
                    config.gaze_min..=config.gaze_max,
                    Arc::clone(&pool),
                    Arc::clone(&context),
                )
            })
            .collect();
        let handles = beings
            .iter()
            .map(|being| Handle {
                id: being.id(),
                token: being.token().clone(),
                status: being.status(),
                finished: Arc::new(AtomicBool::new(false)),
                thread: None,
            })
            .collect();

        Self {
            strategy: config.being_strategy,
            window: config.shutdown_window,
            context,
            liveness: Arc::new(Liveness::new(beings.len())),
            pending: Mutex::new(beings),
            handles: Mutex::new(handles),
            gate: Arc::new(Gate::default()),
            launched: Gate::default(),
            shutdown_requested: AtomicBool::new(false),
            shutdown_settled: AtomicBool::new(false),
            outcome: Mutex::new(None),
        }
    }

    /// Spawn one thread per being
    ///
    /// On a spawn failure the beings already started are shut down before
    /// the error is returned.
    pub(crate) fn start(&self) -> Result<(), SimulatorError> {
        let beings = std::mem::take(&mut *self.pending.lock().unwrap_or_else(|e| e.into_inner()));

        let mut failure = None;
        {
            let mut handles = self.handles.lock().unwrap_or_else(|e| e.into_inner());
            self.launched.open();
            for (handle, being) in handles.iter_mut().zip(beings) {
                if self.shutdown_requested.load(Ordering::Acquire) {
                    handle.token.cancel();
                }
                if failure.is_some() {
                    // Never started
                    handle.finished.store(true, Ordering::Release);
                    self.liveness.finish();
                    continue;
                }
                match self.spawn(being, Arc::clone(&handle.finished)) {
                    Ok(thread) => handle.thread = Some(thread),
                    Err(source) => {
                        handle.finished.store(true, Ordering::Release);
                        self.liveness.finish();
                        failure = Some((handle.id, source));
                    }
                }
            }
        }
        self.gate.open();

        let Some((being, source)) = failure else {
            tracing::info!(strategy = %self.strategy, "beings started");
            return Ok(());
        };
        let err = SimulatorError::Spawn { being, source };
        self.context.report_error(Fault::being(being, err.to_string()));
        self.shutdown();
        Err(err)
    }

    fn spawn(&self, being: Being<C>, finished: Arc<AtomicBool>) -> std::io::Result<JoinHandle<()>> {
        let liveness = Arc::clone(&self.liveness);
        let gate = (self.strategy == BeingStrategy::StartGate).then(|| Arc::clone(&self.gate));

        thread::Builder::new()
            .name(being.id().to_string())
            .spawn(move || {
                let _exit = ExitGuard { liveness, finished };
                being.token().bind_current_thread();
                if let Some(gate) = gate {
                    gate.wait(being.token());
                }
                being.run();
            })
    }

    /// Block until every being exits or a shutdown settles
    ///
    /// A fault reported during the run triggers the shutdown from here, so
    /// being threads never have to wait on each other.
    pub(crate) fn wait(&self) -> ManagerReport {
        loop {
            if self.liveness.wait_idle(FAULT_POLL) == 0 {
                break;
            }
            if self.context.has_fault() && !self.shutdown_requested.load(Ordering::Acquire) {
                tracing::warn!("fault reported, shutting down beings");
                self.shutdown();
            }
            if self.shutdown_settled.load(Ordering::Acquire) {
                break;
            }
        }
        self.collect()
    }

    /// Two-phase shutdown; idempotent
    ///
    /// Called before `start`, this blocks until the beings are launched.
    pub(crate) fn shutdown(&self) -> ShutdownOutcome {
        if self.shutdown_requested.swap(true, Ordering::AcqRel) {
            return ShutdownOutcome::AlreadyRequested;
        }
        if !self.launched.is_open() {
            tracing::info!("shutdown requested before beings started, waiting for launch");
            self.launched.wait(&NeverCancel);
        }

        let outcome = self.escalate();
        *self.outcome.lock().unwrap_or_else(|e| e.into_inner()) = Some(outcome);
        self.shutdown_settled.store(true, Ordering::Release);
        outcome
    }

    fn escalate(&self) -> ShutdownOutcome {
        let beings: Vec<(BeingId, CancelToken, Arc<AtomicBool>)> = self
            .handles
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|h| (h.id, h.token.clone(), Arc::clone(&h.finished)))
            .collect();
        let window_ms = self.window.as_millis() as u64;

        tracing::info!(beings = beings.len(), window_ms, "shutdown: cancelling beings");
        for (_, token, _) in &beings {
            token.cancel();
        }
        if self.liveness.wait_idle(self.window) == 0 {
            tracing::info!("shutdown: all beings stopped");
            return ShutdownOutcome::Cooperative;
        }

        let stragglers: Vec<_> = beings
            .iter()
            .filter(|(_, _, finished)| !finished.load(Ordering::Acquire))
            .collect();
        tracing::warn!(
            remaining = stragglers.len(),
            window_ms,
            "shutdown: beings ignored cancellation, interrupting"
        );
        for (_, token, _) in &stragglers {
            token.interrupt();
        }
        if self.liveness.wait_idle(self.window) == 0 {
            return ShutdownOutcome::Forced {
                interrupted: stragglers.len(),
            };
        }

        let stuck: Vec<String> = beings
            .iter()
            .filter(|(_, _, finished)| !finished.load(Ordering::Acquire))
            .map(|(id, _, _)| id.to_string())
            .collect();
        tracing::error!(?stuck, "shutdown: beings still alive after interrupt");
        ShutdownOutcome::Anomalous { stuck: stuck.len() }
    }

    /// Join exited threads and gather every being's last known state
    fn collect(&self) -> ManagerReport {
        let mut anomalies = Vec::new();
        let mut handles = self.handles.lock().unwrap_or_else(|e| e.into_inner());

        for handle in handles.iter_mut() {
            let Some(thread) = handle.thread.take() else {
                continue;
            };
            if !handle.finished.load(Ordering::Acquire) {
                anomalies.push(format!("{} still running after shutdown", handle.id));
                continue;
            }
            if thread.join().is_err() {
                tracing::error!(being = %handle.id, "being thread panicked");
                anomalies.push(format!("{} panicked", handle.id));
            }
        }

        ManagerReport {
            beings: handles
                .iter()
                .map(|h| h.status.lock().unwrap_or_else(|e| e.into_inner()).clone())
                .collect(),
            shutdown: *self.outcome.lock().unwrap_or_else(|e| e.into_inner()),
            anomalies,
        }
    }
}

#[cfg(test)]
#[path = "being_manager_tests.rs"]
mod tests;
