// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Component state machines
//!
//! Beings, palantiri and the simulator all share one [`Component`] type,
//! parameterized by a state enum that knows its own legal transitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Which kind of component a state machine tracks
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Being,
    Palantir,
    Simulator,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentKind::Being => write!(f, "being"),
            ComponentKind::Palantir => write!(f, "palantir"),
            ComponentKind::Simulator => write!(f, "simulator"),
        }
    }
}

/// A state enum with a fixed transition table
pub trait ComponentState: Copy + Eq + fmt::Debug + fmt::Display + Send + 'static {
    const KIND: ComponentKind;

    fn can_transition(self, to: Self) -> bool;
}

/// Rejected state change
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("invalid {kind} {id} transition: {from} -> {to}")]
pub struct TransitionError {
    pub kind: ComponentKind,
    pub id: u32,
    pub from: String,
    pub to: String,
}

/// An accepted state change
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition<S> {
    pub from: S,
    pub to: S,
}

/// State machine for one component
#[derive(Clone, Debug)]
pub struct Component<S> {
    id: u32,
    state: S,
}

impl<S: ComponentState> Component<S> {
    pub fn new(id: u32, initial: S) -> Self {
        Self { id, state: initial }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn kind(&self) -> ComponentKind {
        S::KIND
    }

    pub fn state(&self) -> S {
        self.state
    }

    /// Move to `to` if the transition table allows it
    pub fn transition(&mut self, to: S) -> Result<Transition<S>, TransitionError> {
        let from = self.state;
        if !from.can_transition(to) {
            return Err(TransitionError {
                kind: S::KIND,
                id: self.id,
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        self.state = to;
        Ok(Transition { from, to })
    }
}

/// Lifecycle of a being
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeingState {
    Idle,
    /// Blocked in the pool's acquire
    Waiting,
    /// Holds a palantir and is recording it
    Acquiring,
    Gazing,
    Releasing,
    Cancelled,
    Error,
    Done,
}

impl BeingState {
    /// States in which the being must hold a palantir
    pub fn holds_palantir(self) -> bool {
        matches!(
            self,
            BeingState::Acquiring | BeingState::Gazing | BeingState::Releasing
        )
    }
}

impl fmt::Display for BeingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BeingState::Idle => "idle",
            BeingState::Waiting => "waiting",
            BeingState::Acquiring => "acquiring",
            BeingState::Gazing => "gazing",
            BeingState::Releasing => "releasing",
            BeingState::Cancelled => "cancelled",
            BeingState::Error => "error",
            BeingState::Done => "done",
        };
        write!(f, "{}", name)
    }
}

impl ComponentState for BeingState {
    const KIND: ComponentKind = ComponentKind::Being;

    fn can_transition(self, to: Self) -> bool {
        use BeingState::*;
        match (self, to) {
            (Idle, Waiting)
            | (Waiting, Acquiring)
            | (Acquiring, Gazing)
            | (Gazing, Releasing)
            | (Releasing, Idle) => true,
            (Idle | Cancelled | Error, Done) => true,
            (from, Cancelled | Error) => !matches!(from, Cancelled | Error | Done),
            _ => false,
        }
    }
}

/// Availability of a palantir
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PalantirState {
    Available,
    Held,
}

impl fmt::Display for PalantirState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PalantirState::Available => write!(f, "available"),
            PalantirState::Held => write!(f, "held"),
        }
    }
}

impl ComponentState for PalantirState {
    const KIND: ComponentKind = ComponentKind::Palantir;

    fn can_transition(self, to: Self) -> bool {
        self != to
    }
}

/// Lifecycle of the simulator across runs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulatorState {
    Idle,
    Running,
    Cancelling,
    Done,
    Error,
}

impl fmt::Display for SimulatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SimulatorState::Idle => "idle",
            SimulatorState::Running => "running",
            SimulatorState::Cancelling => "cancelling",
            SimulatorState::Done => "done",
            SimulatorState::Error => "error",
        };
        write!(f, "{}", name)
    }
}

impl ComponentState for SimulatorState {
    const KIND: ComponentKind = ComponentKind::Simulator;

    fn can_transition(self, to: Self) -> bool {
        use SimulatorState::*;
        matches!(
            (self, to),
            (Idle | Done | Error, Running)
                | (Running, Cancelling | Done | Error)
                | (Cancelling, Done | Error)
        )
    }
}

#[cfg(test)]
#[path = "component_tests.rs"]
mod tests;
