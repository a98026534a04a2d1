// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Palantiri simulation engine
//!
//! Drives beings through their acquire/gaze/release cycles against a
//! palantiri pool and publishes every state change to observers.

mod being;
mod being_manager;
mod config;
mod context;
mod error;
mod monitor;
mod observer;
mod report;
mod simulator;

pub use being_manager::{BeingStrategy, ShutdownOutcome, UnknownBeingStrategy};
pub use config::{ConfigError, SimulationConfig};
pub use error::{ErrorReporter, Fault, SimulatorError};
pub use monitor::InvariantMonitor;
pub use observer::Observer;
pub use report::{BeingReport, RunReport};
pub use simulator::Simulator;

#[cfg(any(test, feature = "test-support"))]
pub use observer::RecordingObserver;
