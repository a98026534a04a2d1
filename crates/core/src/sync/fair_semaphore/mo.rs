// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fair semaphore where every waiter is its own monitor
//!
//! The queue lock is only held to inspect or mutate the queue. Blocking
//! happens on the waiter's own mutex and condition variable, so a release
//! never contends with callers that are merely asleep.

use super::{FairSemaphore, WAIT_TICK};
use crate::cancel::CancelCheck;
use crate::sync::{checkpoint, SyncError};
use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};

#[derive(Debug, Default)]
struct Waiter {
    released: Mutex<bool>,
    cond: Condvar,
}

impl Waiter {
    fn wake(&self) {
        let mut released = self.released.lock().unwrap_or_else(|e| e.into_inner());
        *released = true;
        self.cond.notify_one();
    }
}

#[derive(Debug)]
struct State {
    permits: usize,
    waiters: VecDeque<Arc<Waiter>>,
}

#[derive(Debug)]
pub struct FairSemaphoreMo {
    state: Mutex<State>,
}

impl FairSemaphoreMo {
    pub fn new(permits: usize) -> Self {
        Self {
            state: Mutex::new(State {
                permits,
                waiters: VecDeque::new(),
            }),
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Leave the queue after cancellation
    ///
    /// A waiter that is no longer queued was popped by a release, so the
    /// permit already belongs to it and must be forwarded.
    fn abandon(&self, waiter: &Arc<Waiter>, error: SyncError) -> Result<(), SyncError> {
        let mut state = self.lock_state();
        match state.waiters.iter().position(|w| Arc::ptr_eq(w, waiter)) {
            Some(index) => {
                state.waiters.remove(index);
            }
            None => {
                drop(state);
                self.release();
            }
        }
        Err(error)
    }
}

impl FairSemaphore for FairSemaphoreMo {
    fn acquire(&self, cancel: &dyn CancelCheck) -> Result<(), SyncError> {
        checkpoint(cancel)?;

        let waiter = {
            let mut state = self.lock_state();
            if state.permits > 0 && state.waiters.is_empty() {
                state.permits -= 1;
                return Ok(());
            }
            let waiter = Arc::new(Waiter::default());
            state.waiters.push_back(Arc::clone(&waiter));
            waiter
        };

        let mut released = waiter.released.lock().unwrap_or_else(|e| e.into_inner());
        loop {
            if let Err(e) = checkpoint(cancel) {
                drop(released);
                return self.abandon(&waiter, e);
            }
            if *released {
                return Ok(());
            }
            released = waiter
                .cond
                .wait_timeout(released, WAIT_TICK)
                .map(|(guard, _)| guard)
                .unwrap_or_else(|e| e.into_inner().0);
        }
    }

    fn try_acquire(&self) -> bool {
        let mut state = self.lock_state();
        if state.permits > 0 && state.waiters.is_empty() {
            state.permits -= 1;
            true
        } else {
            false
        }
    }

    fn release(&self) {
        let head = {
            let mut state = self.lock_state();
            let head = state.waiters.pop_front();
            if head.is_none() {
                state.permits += 1;
            }
            head
        };
        if let Some(waiter) = head {
            waiter.wake();
        }
    }

    fn available_permits(&self) -> usize {
        self.lock_state().permits
    }

    fn queue_len(&self) -> usize {
        self.lock_state().waiters.len()
    }
}
