// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use palantir_core::{
    BeingId, BeingState, PalantirId, PalantirRecord, PalantirState, PalantiriStrategy, StateTag,
};
use palantir_engine::{BeingReport, BeingStrategy, ShutdownOutcome};
use yare::parameterized;

fn snapshot(kind: ComponentKind, previous: StateTag, current: StateTag) -> Snapshot {
    Snapshot {
        kind,
        id: 2,
        previous,
        current,
        palantir: Some(PalantirId(1)),
        being: Some(BeingId(2)),
        error: None,
        elapsed: Duration::from_millis(42),
    }
}

#[parameterized(
    being = {
        snapshot(
            ComponentKind::Being,
            BeingState::Acquiring.into(),
            BeingState::Gazing.into(),
        ),
        "[    42ms] being 2: acquiring -> gazing (palantir-1)"
    },
    palantir = {
        snapshot(
            ComponentKind::Palantir,
            PalantirState::Available.into(),
            PalantirState::Held.into(),
        ),
        "[    42ms] palantir 2: available -> held (being-2)"
    },
)]
fn snapshot_line_names_the_counterpart(snapshot: Snapshot, expected: &str) {
    assert_eq!(snapshot_line(&snapshot), expected);
}

#[test]
fn snapshot_line_appends_errors() {
    use palantir_core::SimulatorState;
    let mut snapshot = snapshot(
        ComponentKind::Simulator,
        SimulatorState::Running.into(),
        SimulatorState::Error.into(),
    );
    snapshot.error = Some("being 1: boom".to_string());
    assert_eq!(
        snapshot_line(&snapshot),
        "[    42ms] simulator 2: running -> error error: being 1: boom"
    );
}

fn report() -> RunReport {
    let mut being = BeingReport::new(BeingId(0));
    being.state = BeingState::Done;
    being.completed = 3;
    RunReport {
        run_id: "4a7c".to_string(),
        palantiri_strategy: PalantiriStrategy::StampedLock,
        being_strategy: BeingStrategy::StartGate,
        elapsed_ms: 1500,
        beings: vec![being],
        palantiri: vec![PalantirRecord {
            id: PalantirId(0),
            state: PalantirState::Available,
            owner: None,
            uses: 3,
        }],
        shutdown: Some(ShutdownOutcome::Cooperative),
        anomalies: Vec::new(),
        fault: None,
    }
}

#[test]
fn summary_text_has_both_tables() {
    let report = report();
    let summary = Summary {
        report: &report,
        peak_holders: 1,
        peak_gazing: 1,
        violations: Vec::new(),
    };

    let text = summary.to_string();
    assert!(text.contains("Run: 4a7c"));
    assert!(text.contains("Palantiri strategy: stamped-lock"));
    assert!(text.contains("Being strategy: start-gate"));
    assert!(text.contains("Elapsed: 1s 500ms"));
    assert!(text.contains("Shutdown: cooperative"));
    assert!(text.contains("being-0      done           3  -"));
    assert!(text.contains("palantir-0   available      3  -"));
}

#[test]
fn summary_json_flattens_the_report() {
    let report = report();
    let summary = Summary {
        report: &report,
        peak_holders: 1,
        peak_gazing: 1,
        violations: vec!["oops".to_string()],
    };

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["run_id"], "4a7c");
    assert_eq!(json["palantiri_strategy"], "stamped-lock");
    assert_eq!(json["being_strategy"], "start-gate");
    assert_eq!(json["beings"][0]["completed"], 3);
    assert_eq!(json["shutdown"]["outcome"], "cooperative");
    assert_eq!(json["peak_gazing"], 1);
    assert_eq!(json["violations"][0], "oops");
}
