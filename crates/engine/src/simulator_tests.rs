// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::config::ConfigError;
use crate::monitor::InvariantMonitor;
use crate::observer::RecordingObserver;
use palantir_core::{
    BeingId, BeingState, CancelCheck, ComponentKind, FakeClock, PalantirId, PalantirRecord,
    PalantiriStrategy, PoolError, StateTag,
};
use std::thread;
use std::time::Duration;
use yare::parameterized;

/// Real pool that refuses one being
struct RefusesOne {
    inner: Box<dyn PalantiriManager>,
    refused: BeingId,
}

impl PalantiriManager for RefusesOne {
    fn acquire(&self, being: BeingId, cancel: &dyn CancelCheck) -> Result<Palantir, PoolError> {
        if being == self.refused {
            return Err(PoolError::Invariant(format!("{} is not welcome", being)));
        }
        self.inner.acquire(being, cancel)
    }

    fn release(&self, being: BeingId, palantir: Option<Palantir>) -> Result<(), PoolError> {
        self.inner.release(being, palantir)
    }

    fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    fn available(&self) -> usize {
        self.inner.available()
    }

    fn records(&self) -> Vec<PalantirRecord> {
        self.inner.records()
    }

    fn strategy(&self) -> PalantiriStrategy {
        self.inner.strategy()
    }
}

fn quick(palantiri: usize, beings: usize, iterations: usize) -> SimulationConfig {
    SimulationConfig {
        palantiri,
        beings,
        iterations,
        gaze_min: Duration::ZERO,
        gaze_max: Duration::from_millis(10),
        ..SimulationConfig::default()
    }
}

#[test]
fn run_completes_and_reports() {
    let simulator = Simulator::new(FakeClock::new());
    let report = simulator.run(&quick(3, 5, 2)).unwrap();

    assert!(report.is_clean(), "{report:?}");
    assert_eq!(report.beings.len(), 5);
    assert_eq!(report.palantiri.len(), 3);
    assert_eq!(report.total_completed(), 10);
    assert_eq!(report.total_uses(), 10);
    assert_eq!(report.shutdown, None);
    assert_eq!(report.palantiri_strategy, PalantiriStrategy::FairSemaphoreCo);
    assert_eq!(simulator.state(), SimulatorState::Done);
}

#[test]
fn observers_see_the_whole_run() {
    let recorder = RecordingObserver::new();
    let simulator = Simulator::new(FakeClock::new()).with_observer(Arc::new(recorder.clone()));
    simulator.run(&quick(2, 3, 1)).unwrap();

    let simulator_states: Vec<_> = recorder
        .of_kind(ComponentKind::Simulator)
        .iter()
        .map(|s| s.current)
        .collect();
    assert_eq!(
        simulator_states,
        vec![
            StateTag::Simulator(SimulatorState::Running),
            StateTag::Simulator(SimulatorState::Done)
        ]
    );
    for id in 0..3 {
        assert_eq!(
            recorder.being_states(BeingId(id)).last(),
            Some(&BeingState::Done)
        );
    }
    for id in 0..2 {
        let states = recorder.palantir_states(PalantirId(id));
        assert_eq!(states.len() % 2, 0);
    }
    assert_eq!(recorder.of_kind(ComponentKind::Palantir).len(), 6);
}

#[parameterized(
    spin_lock = { PalantiriStrategy::SpinLock },
    reentrant_spin_lock = { PalantiriStrategy::ReentrantSpinLock },
    fair_semaphore_mo = { PalantiriStrategy::FairSemaphoreMo },
    fair_semaphore_co = { PalantiriStrategy::FairSemaphoreCo },
    stamped_lock = { PalantiriStrategy::StampedLock },
)]
fn every_strategy_keeps_the_invariants(strategy: PalantiriStrategy) {
    let monitor = Arc::new(InvariantMonitor::new());
    let simulator = Simulator::new(FakeClock::new()).with_observer(monitor.clone());
    let config = SimulationConfig {
        palantiri_strategy: strategy,
        ..quick(2, 6, 5)
    };

    let report = simulator.run(&config).unwrap();

    assert!(report.is_clean(), "{report:?}");
    assert_eq!(report.palantiri_strategy, strategy);
    assert!(monitor.violations().is_empty(), "{:?}", monitor.violations());
    assert!(monitor.peak_holders() <= 2);
}

#[test]
fn invalid_config_is_rejected_before_running() {
    let recorder = RecordingObserver::new();
    let simulator = Simulator::new(FakeClock::new()).with_observer(Arc::new(recorder.clone()));
    let err = simulator.run(&quick(0, 1, 1)).unwrap_err();

    assert!(matches!(err, SimulatorError::Config(ConfigError::Invalid(_))));
    assert!(recorder.snapshots().is_empty());
    assert_eq!(simulator.state(), SimulatorState::Idle);
}

#[test]
fn shutdown_without_a_run_is_not_running() {
    let simulator = Simulator::new(FakeClock::new());
    assert_eq!(simulator.shutdown(), ShutdownOutcome::NotRunning);
}

#[test]
fn pool_fault_fails_the_run_and_allows_another() {
    let config = quick(2, 3, 2);
    let simulator = Simulator::new(FakeClock::new());
    let pool = RefusesOne {
        inner: config
            .palantiri_strategy
            .build(vec![Palantir::new(PalantirId(0)), Palantir::new(PalantirId(1))]),
        refused: BeingId(1),
    };

    let err = simulator.run_with_pool(&config, Arc::new(pool)).unwrap_err();

    let (fault, report) = match err {
        SimulatorError::Fault { fault, report } => (fault, report),
        other => panic!("expected a fault, got {other:?}"),
    };
    assert_eq!(fault.kind, ComponentKind::Being);
    assert_eq!(fault.id, 1);
    assert!(fault.message.contains("being-1 is not welcome"), "{fault}");
    assert_eq!(report.fault.as_ref(), Some(&fault));
    assert!(report.beings.iter().all(|b| b.state == BeingState::Done));
    assert!(report.palantiri.iter().all(PalantirRecord::is_available));
    assert_eq!(simulator.state(), SimulatorState::Error);

    let report = simulator.run(&config).unwrap();
    assert!(report.is_clean());
    assert_eq!(simulator.state(), SimulatorState::Done);
}

#[test]
fn concurrent_run_is_rejected_and_shutdown_stops_the_first() {
    let simulator = Arc::new(Simulator::default());
    let config = SimulationConfig {
        palantiri: 2,
        beings: 3,
        iterations: 10,
        gaze_min: Duration::from_secs(30),
        gaze_max: Duration::from_secs(30),
        shutdown_window: Duration::from_secs(5),
        ..SimulationConfig::default()
    };

    let running = {
        let simulator = Arc::clone(&simulator);
        let config = config.clone();
        thread::spawn(move || simulator.run(&config))
    };
    while simulator.state() != SimulatorState::Running {
        thread::sleep(Duration::from_millis(5));
    }

    assert!(matches!(
        simulator.run(&config),
        Err(SimulatorError::AlreadyRunning)
    ));

    assert_eq!(simulator.shutdown(), ShutdownOutcome::Cooperative);

    let report = running.join().unwrap().unwrap();
    assert_eq!(report.shutdown, Some(ShutdownOutcome::Cooperative));
    assert_eq!(report.total_completed(), 0);
    assert!(report.beings.iter().all(|b| b.state == BeingState::Done));
    assert!(report.palantiri.iter().all(PalantirRecord::is_available));
    assert_eq!(simulator.state(), SimulatorState::Done);
    assert_eq!(simulator.shutdown(), ShutdownOutcome::NotRunning);
}

#[test]
fn shutdown_as_soon_as_running_is_honoured() {
    let simulator = Arc::new(Simulator::default());
    let config = SimulationConfig {
        palantiri: 4,
        beings: 200,
        iterations: 1_000,
        gaze_min: Duration::from_millis(1),
        gaze_max: Duration::from_millis(5),
        shutdown_window: Duration::from_secs(5),
        ..SimulationConfig::default()
    };

    let running = {
        let simulator = Arc::clone(&simulator);
        thread::spawn(move || simulator.run(&config))
    };
    while simulator.state() == SimulatorState::Idle {
        thread::yield_now();
    }

    // One call, however early, stops the run
    let outcome = simulator.shutdown();
    assert!(
        matches!(
            outcome,
            ShutdownOutcome::Cooperative | ShutdownOutcome::Forced { .. }
        ),
        "{outcome}"
    );

    let report = running.join().unwrap().unwrap();
    assert_eq!(report.shutdown, Some(outcome));
    assert!(report.total_completed() < 200 * 1_000);
    assert!(report.beings.iter().all(|b| b.state == BeingState::Done));
    assert_eq!(simulator.state(), SimulatorState::Done);
}
