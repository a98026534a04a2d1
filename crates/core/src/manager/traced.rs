// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced manager wrapper for consistent observability

use super::{PalantiriManager, PalantiriStrategy, PoolError};
use crate::cancel::CancelCheck;
use crate::id::BeingId;
use crate::palantir::{Palantir, PalantirRecord};

/// Wrapper that adds tracing to any PalantiriManager
#[derive(Clone, Debug)]
pub struct TracedPalantiriManager<M> {
    inner: M,
}

impl<M> TracedPalantiriManager<M> {
    pub fn new(inner: M) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &M {
        &self.inner
    }
}

impl<M: PalantiriManager> PalantiriManager for TracedPalantiriManager<M> {
    fn acquire(&self, being: BeingId, cancel: &dyn CancelCheck) -> Result<Palantir, PoolError> {
        let span = tracing::info_span!(
            "palantiri.acquire",
            %being,
            strategy = %self.inner.strategy()
        );
        let _guard = span.enter();

        tracing::trace!(available = self.inner.available(), "waiting");

        let start = std::time::Instant::now();
        let result = self.inner.acquire(being, cancel);
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(palantir) => tracing::info!(%palantir, elapsed_ms, "acquired"),
            // Cancellation is the normal shutdown path
            Err(e) if e.is_abort() => tracing::debug!(elapsed_ms, error = %e, "acquire aborted"),
            Err(e) => tracing::error!(elapsed_ms, error = %e, "acquire failed"),
        }

        result
    }

    fn release(&self, being: BeingId, palantir: Option<Palantir>) -> Result<(), PoolError> {
        let span = tracing::info_span!(
            "palantiri.release",
            %being,
            palantir = palantir.map(|p| p.to_string()).as_deref()
        );
        let _guard = span.enter();

        let result = self.inner.release(being, palantir);
        match &result {
            Ok(()) => tracing::info!("released"),
            Err(e) => tracing::error!(error = %e, "release failed"),
        }

        result
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
