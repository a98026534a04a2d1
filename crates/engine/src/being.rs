// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A being: one worker thread cycling through acquire, gaze and release

use crate::context::RunContext;
use crate::error::{ErrorReporter, Fault};
use crate::report::BeingReport;
use palantir_core::{
    BeingId, BeingState, CancelCheck, CancelToken, Clock, Component, Palantir, PalantiriManager,
    PalantirState, Snapshot,
};
use rand::Rng;
use std::ops::RangeInclusive;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Why a being stopped cycling early
enum Stop {
    Cancelled,
    Fault(String),
}

pub(crate) struct Being<C> {
    id: BeingId,
    component: Component<BeingState>,
    palantir: Option<Palantir>,
    completed: usize,
    iterations: usize,
    gaze: RangeInclusive<Duration>,
    token: CancelToken,
    pool: Arc<dyn PalantiriManager>,
    context: Arc<RunContext<C>>,
    status: Arc<Mutex<BeingReport>>,
}

impl<C: Clock> Being<C> {
    pub(crate) fn new(
        id: BeingId,
        iterations: usize,
        gaze: RangeInclusive<Duration>,
        pool: Arc<dyn PalantiriManager>,
        context: Arc<RunContext<C>>,
    ) -> Self {
        Self {
            id,
            component: Component::new(id.0, BeingState::Idle),
            palantir: None,
            completed: 0,
            iterations,
            gaze,
            token: CancelToken::new(),
            pool,
            context,
            status: Arc::new(Mutex::new(BeingReport::new(id))),
        }
    }

    pub(crate) fn id(&self) -> BeingId {
        self.id
    }

    pub(crate) fn token(&self) -> &CancelToken {
        &self.token
    }

    /// Last published state, readable while the thread runs
    pub(crate) fn status(&self) -> Arc<Mutex<BeingReport>> {
        Arc::clone(&self.status)
    }

    /// Live out the being's iterations, ending in `Done`
    pub(crate) fn run(mut self) {
        let span = tracing::info_span!("being", being = %self.id);
        let _guard = span.enter();
        tracing::debug!(iterations = self.iterations, "being started");

        match self.live() {
            Ok(()) => {}
            Err(Stop::Cancelled) => {
                tracing::debug!(completed = self.completed, "being cancelled");
                match self.give_back() {
                    Ok(()) | Err(Stop::Cancelled) => self.settle(BeingState::Cancelled),
                    Err(Stop::Fault(message)) => self.fail(message),
                }
            }
            Err(Stop::Fault(message)) => self.fail(message),
        }

        self.settle(BeingState::Done);
        tracing::debug!(
            completed = self.completed,
            state = %self.component.state(),
            "being finished"
        );
    }

    fn live(&mut self) -> Result<(), Stop> {
        for _ in 0..self.iterations {
            if self.token.is_cancelled() {
                return Err(Stop::Cancelled);
            }

            self.enter(BeingState::Waiting, None)?;
            let palantir = match self.pool.acquire(self.id, &self.token) {
                Ok(palantir) => palantir,
                Err(e) if e.is_abort() => return Err(Stop::Cancelled),
                Err(e) => return Err(Stop::Fault(e.to_string())),
            };
            self.palantir = Some(palantir);
            self.context
                .publish_palantir(palantir, PalantirState::Held, Some(self.id));
            self.enter(BeingState::Acquiring, None)?;

            self.enter(BeingState::Gazing, None)?;
            let gaze = self.gaze_duration();
            tracing::trace!(%palantir, gaze_ms = gaze.as_millis() as u64, "gazing");
            if self.context.clock().sleep(gaze, &self.token).is_err() {
                return Err(Stop::Cancelled);
            }

            self.enter(BeingState::Releasing, None)?;
            self.give_back()?;
            self.enter(BeingState::Idle, None)?;
            self.completed += 1;
        }
        Ok(())
    }

    fn gaze_duration(&self) -> Duration {
        let (min, max) = (*self.gaze.start(), *self.gaze.end());
        if min >= max {
            return min;
        }
        rand::thread_rng().gen_range(min..=max)
    }

    /// Return the held palantir, announcing it before the pool can reissue it
    fn give_back(&mut self) -> Result<(), Stop> {
        let Some(palantir) = self.palantir.take() else {
            return Ok(());
        };
        self.context
            .publish_palantir(palantir, PalantirState::Available, None);
        self.pool
            .release(self.id, Some(palantir))
            .map_err(|e| Stop::Fault(e.to_string()))
    }

    /// Report a fatal fault and end in `Error`, keeping any held palantir
    fn fail(&mut self, message: String) {
        tracing::error!(error = %message, "being failed");
        self.context.report_error(Fault::being(self.id, message.clone()));
        if let Err(Stop::Fault(rejected)) = self.enter(BeingState::Error, Some(message)) {
            tracing::error!(error = %rejected, "could not record being failure");
        }
    }

    /// Enter a wind-down state, reporting a rejected transition
    fn settle(&mut self, to: BeingState) {
        if let Err(Stop::Fault(message)) = self.enter(to, None) {
            self.context.report_error(Fault::being(self.id, message));
        }
    }

    /// Transition, record and publish
    fn enter(&mut self, to: BeingState, error: Option<String>) -> Result<(), Stop> {
        let transition = self
            .component
            .transition(to)
            .map_err(|e| Stop::Fault(e.to_string()))?;

        {
            let mut status = self.status.lock().unwrap_or_else(|e| e.into_inner());
            status.state = to;
            status.completed = self.completed;
            if error.is_some() {
                status.error = error.clone();
            }
        }

        let snapshot = Snapshot::of(
            &self.component,
            transition,
            self.palantir.map(|p| p.id()),
            Some(self.id),
            error,
            self.context.elapsed(),
        );
        self.context.publish(&snapshot);
        Ok(())
    }
}

#[cfg(test)]
#[path = "being_tests.rs"]
mod tests;
