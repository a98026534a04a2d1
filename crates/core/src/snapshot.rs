// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Immutable snapshots published on every component transition

use crate::component::{
    BeingState, Component, ComponentKind, ComponentState, PalantirState, SimulatorState,
    Transition,
};
use crate::id::{BeingId, PalantirId};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// A component state tagged with its kind
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StateTag {
    Being(BeingState),
    Palantir(PalantirState),
    Simulator(SimulatorState),
}

impl fmt::Display for StateTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateTag::Being(state) => fmt::Display::fmt(state, f),
            StateTag::Palantir(state) => fmt::Display::fmt(state, f),
            StateTag::Simulator(state) => fmt::Display::fmt(state, f),
        }
    }
}

impl From<BeingState> for StateTag {
    fn from(state: BeingState) -> Self {
        StateTag::Being(state)
    }
}

impl From<PalantirState> for StateTag {
    fn from(state: PalantirState) -> Self {
        StateTag::Palantir(state)
    }
}

impl From<SimulatorState> for StateTag {
    fn from(state: SimulatorState) -> Self {
        StateTag::Simulator(state)
    }
}

/// What a component looked like right after a transition
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Snapshot {
    pub kind: ComponentKind,
    pub id: u32,
    pub previous: StateTag,
    pub current: StateTag,
    /// Palantir held by a being, or the palantir itself
    pub palantir: Option<PalantirId>,
    /// Owner of a palantir, or the being itself
    pub being: Option<BeingId>,
    pub error: Option<String>,
    /// Time since the run started
    #[serde(rename = "elapsed_ms", serialize_with = "as_millis")]
    pub elapsed: Duration,
}

fn as_millis<S: serde::Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(elapsed.as_millis() as u64)
}

impl Snapshot {
    /// Build the snapshot for a transition a component just took
    pub fn of<S>(
        component: &Component<S>,
        transition: Transition<S>,
        palantir: Option<PalantirId>,
        being: Option<BeingId>,
        error: Option<String>,
        elapsed: Duration,
    ) -> Self
    where
        S: ComponentState + Into<StateTag>,
    {
        Self {
            kind: component.kind(),
            id: component.id(),
            previous: transition.from.into(),
            current: transition.to.into(),
            palantir,
            being,
            error,
            elapsed,
        }
    }

    /// Current state if this is a being snapshot
    pub fn being_state(&self) -> Option<BeingState> {
        match self.current {
            StateTag::Being(state) => Some(state),
            _ => None,
        }
    }

    /// Current state if this is a palantir snapshot
    pub fn palantir_state(&self) -> Option<PalantirState> {
        match self.current {
            StateTag::Palantir(state) => Some(state),
            _ => None,
        }
    }
}
