// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot observers

#[cfg(any(test, feature = "test-support"))]
mod recording;

#[cfg(any(test, feature = "test-support"))]
pub use recording::RecordingObserver;

use crate::error::ErrorReporter;
use palantir_core::Snapshot;

/// Receives every snapshot published during a run
///
/// Calls are synchronous on the thread that made the transition, so
/// implementations must be quick and thread-safe. A panic inside
/// `on_snapshot` is caught and logged by the publisher.
pub trait Observer: Send + Sync {
    /// `errors` escalates faults the observer detects
    fn on_snapshot(&self, snapshot: &Snapshot, errors: &dyn ErrorReporter);
}

impl<F> Observer for F
where
    F: Fn(&Snapshot) + Send + Sync,
{
    fn on_snapshot(&self, snapshot: &Snapshot, _errors: &dyn ErrorReporter) {
        self(snapshot)
    }
}
