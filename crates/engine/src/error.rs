// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the simulation engine

use crate::config::ConfigError;
use crate::report::RunReport;
use palantir_core::{BeingId, ComponentKind, TransitionError};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// A fatal problem raised by a component during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fault {
    pub kind: ComponentKind,
    pub id: u32,
    pub message: String,
}

impl Fault {
    pub fn new(kind: ComponentKind, id: u32, message: impl Into<String>) -> Self {
        Self {
            kind,
            id,
            message: message.into(),
        }
    }

    pub fn being(id: BeingId, message: impl Into<String>) -> Self {
        Self::new(ComponentKind::Being, id.0, message)
    }
}

impl From<TransitionError> for Fault {
    fn from(err: TransitionError) -> Self {
        Self::new(err.kind, err.id, err.to_string())
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.kind, self.id, self.message)
    }
}

/// Channel through which components escalate fatal faults
pub trait ErrorReporter: Send + Sync {
    fn report_error(&self, fault: Fault);
}

/// Errors returned by [`Simulator::run`](crate::Simulator::run)
#[derive(Debug, Error)]
pub enum SimulatorError {
    #[error("a simulation is already running")]
    AlreadyRunning,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to spawn thread for {being}: {source}")]
    Spawn {
        being: BeingId,
        #[source]
        source: std::io::Error,
    },
    #[error("simulation fault: {fault}")]
    Fault {
        fault: Fault,
        /// What the run managed to do before the fault stopped it
        report: Box<RunReport>,
    },
}
