// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::observer::{Observer, RecordingObserver};
use palantir_core::{
    ComponentKind, FakeClock, PalantirId, PalantirRecord, PalantiriStrategy, PoolError,
    SimulatorState,
};

/// Pool that refuses every acquire with a bookkeeping error
struct BrokenPool;

impl PalantiriManager for BrokenPool {
    fn acquire(&self, being: BeingId, _cancel: &dyn CancelCheck) -> Result<Palantir, PoolError> {
        Err(PoolError::Invariant(format!("no bookkeeping for {}", being)))
    }

    fn release(&self, _being: BeingId, _palantir: Option<Palantir>) -> Result<(), PoolError> {
        Ok(())
    }

    fn capacity(&self) -> usize {
        1
    }

    fn available(&self) -> usize {
        1
    }

    fn records(&self) -> Vec<PalantirRecord> {
        Vec::new()
    }

    fn strategy(&self) -> PalantiriStrategy {
        PalantiriStrategy::SpinLock
    }
}

fn pool(n: u32) -> Arc<dyn PalantiriManager> {
    let palantiri = (0..n).map(|i| Palantir::new(PalantirId(i))).collect();
    Arc::from(PalantiriStrategy::FairSemaphoreCo.build(palantiri))
}

fn context(
    n: u32,
    observers: Vec<Arc<dyn Observer>>,
) -> Arc<RunContext<FakeClock>> {
    let mut simulator = Component::new(0, SimulatorState::Idle);
    simulator.transition(SimulatorState::Running).unwrap();
    Arc::new(RunContext::new(
        FakeClock::new(),
        observers,
        Arc::new(Mutex::new(simulator)),
        (0..n).map(PalantirId),
    ))
}

fn gaze(ms: u64) -> RangeInclusive<Duration> {
    Duration::from_millis(ms)..=Duration::from_millis(ms)
}

#[test]
fn being_cycles_through_every_state() {
    let recorder = RecordingObserver::new();
    let context = context(1, vec![Arc::new(recorder.clone()) as Arc<dyn Observer>]);
    let pool = pool(1);
    let being = Being::new(BeingId(0), 2, gaze(40), Arc::clone(&pool), Arc::clone(&context));
    let status = being.status();

    being.run();

    use BeingState::*;
    assert_eq!(
        recorder.being_states(BeingId(0)),
        vec![
            Waiting, Acquiring, Gazing, Releasing, Idle, Waiting, Acquiring, Gazing, Releasing,
            Idle, Done
        ]
    );
    assert_eq!(
        recorder.palantir_states(PalantirId(0)),
        vec![
            PalantirState::Held,
            PalantirState::Available,
            PalantirState::Held,
            PalantirState::Available
        ]
    );

    let status = status.lock().unwrap().clone();
    assert_eq!(status.state, Done);
    assert_eq!(status.completed, 2);
    assert_eq!(pool.records()[0].uses, 2);
    assert_eq!(pool.available(), 1);
    assert_eq!(context.elapsed(), Duration::from_millis(80));
    assert!(!context.has_fault());
}

#[test]
fn gazing_snapshot_names_the_held_palantir() {
    let recorder = RecordingObserver::new();
    let context = context(1, vec![Arc::new(recorder.clone()) as Arc<dyn Observer>]);
    Being::new(BeingId(3), 1, gaze(0), pool(1), context).run();

    let gazing: Vec<_> = recorder
        .of_kind(ComponentKind::Being)
        .into_iter()
        .filter(|s| s.being_state() == Some(BeingState::Gazing))
        .collect();
    assert_eq!(gazing.len(), 1);
    assert_eq!(gazing[0].palantir, Some(PalantirId(0)));
    assert_eq!(gazing[0].being, Some(BeingId(3)));

    let held = &recorder.of_kind(ComponentKind::Palantir)[0];
    assert_eq!(held.being, Some(BeingId(3)));
}

#[test]
fn cancelled_before_start_never_touches_the_pool() {
    let recorder = RecordingObserver::new();
    let context = context(1, vec![Arc::new(recorder.clone()) as Arc<dyn Observer>]);
    let pool = pool(1);
    let being = Being::new(BeingId(0), 3, gaze(0), Arc::clone(&pool), context);
    being.token().cancel();

    being.run();

    assert_eq!(
        recorder.being_states(BeingId(0)),
        vec![BeingState::Cancelled, BeingState::Done]
    );
    assert_eq!(pool.records()[0].uses, 0);
    assert!(recorder.of_kind(ComponentKind::Palantir).is_empty());
}

#[test]
fn cancel_while_gazing_returns_the_palantir() {
    let token_slot: Arc<Mutex<Option<CancelToken>>> = Arc::default();
    let slot = Arc::clone(&token_slot);
    let canceller = move |snapshot: &Snapshot| {
        if snapshot.being_state() == Some(BeingState::Gazing) {
            if let Some(token) = slot.lock().unwrap().as_ref() {
                token.cancel();
            }
        }
    };
    let recorder = RecordingObserver::new();
    let observers: Vec<Arc<dyn Observer>> = vec![Arc::new(canceller), Arc::new(recorder.clone())];
    let context = context(1, observers);
    let pool = pool(1);
    let being = Being::new(BeingId(0), 5, gaze(10), Arc::clone(&pool), context);
    *token_slot.lock().unwrap() = Some(being.token().clone());
    let status = being.status();

    being.run();

    assert_eq!(
        recorder.being_states(BeingId(0)),
        vec![
            BeingState::Waiting,
            BeingState::Acquiring,
            BeingState::Gazing,
            BeingState::Cancelled,
            BeingState::Done
        ]
    );
    assert_eq!(
        recorder.palantir_states(PalantirId(0)),
        vec![PalantirState::Held, PalantirState::Available]
    );
    assert_eq!(pool.available(), 1);
    assert_eq!(status.lock().unwrap().completed, 0);
}

#[test]
fn pool_fault_ends_in_error_and_is_reported() {
    let recorder = RecordingObserver::new();
    let context = context(1, vec![Arc::new(recorder.clone()) as Arc<dyn Observer>]);
    let being = Being::new(BeingId(4), 2, gaze(0), Arc::new(BrokenPool), Arc::clone(&context));
    let status = being.status();

    being.run();

    assert_eq!(
        recorder.being_states(BeingId(4)),
        vec![BeingState::Waiting, BeingState::Error, BeingState::Done]
    );
    let fault = context.fault().unwrap();
    assert_eq!(fault.kind, ComponentKind::Being);
    assert_eq!(fault.id, 4);
    assert!(fault.message.contains("no bookkeeping for being-4"), "{fault}");

    let status = status.lock().unwrap().clone();
    assert_eq!(status.state, BeingState::Done);
    assert!(status.error.unwrap().contains("no bookkeeping"));
}

#[test]
fn zero_iterations_finish_immediately() {
    let recorder = RecordingObserver::new();
    let context = context(1, vec![Arc::new(recorder.clone()) as Arc<dyn Observer>]);
    Being::new(BeingId(0), 0, gaze(0), pool(1), context).run();
    assert_eq!(recorder.being_states(BeingId(0)), vec![BeingState::Done]);
}

#[test]
fn gaze_duration_stays_in_range() {
    let context = context(1, Vec::new());
    let range = Duration::from_millis(5)..=Duration::from_millis(15);
    let being = Being::new(BeingId(0), 1, range.clone(), pool(1), context);
    for _ in 0..200 {
        assert!(range.contains(&being.gaze_duration()));
    }
}
