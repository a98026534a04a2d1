// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fair semaphore on a lock and per-waiter condition variables

use super::{FairSemaphore, WAIT_TICK};
use crate::cancel::CancelCheck;
use crate::sync::{checkpoint, SyncError};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A queued caller with its own wakeup condition
#[derive(Debug, Default)]
struct Waiter {
    /// Set under the semaphore lock when a permit is handed over
    granted: AtomicBool,
    cond: Condvar,
}

#[derive(Debug)]
struct State {
    permits: usize,
    waiters: VecDeque<Arc<Waiter>>,
}

impl State {
    /// Hand a permit to the head waiter, or bank it if nobody waits
    fn release_one(&mut self) {
        match self.waiters.pop_front() {
            Some(waiter) => {
                waiter.granted.store(true, Ordering::Relaxed);
                waiter.cond.notify_one();
            }
            None => self.permits += 1,
        }
    }
}

#[derive(Debug)]
pub struct FairSemaphoreCo {
    state: Mutex<State>,
}

impl FairSemaphoreCo {
    pub fn new(permits: usize) -> Self {
        Self {
            state: Mutex::new(State {
                permits,
                waiters: VecDeque::new(),
            }),
        }
    }
}

impl FairSemaphore for FairSemaphoreCo {
    fn acquire(&self, cancel: &dyn CancelCheck) -> Result<(), SyncError> {
        checkpoint(cancel)?;

        let mut state = self.state.lock();
        if state.permits > 0 && state.waiters.is_empty() {
            state.permits -= 1;
            return Ok(());
        }

        let waiter = Arc::new(Waiter::default());
        state.waiters.push_back(Arc::clone(&waiter));

        loop {
            if let Err(e) = checkpoint(cancel) {
                if waiter.granted.load(Ordering::Relaxed) {
                    // Handed a permit while giving up; pass it on
                    state.release_one();
                } else {
                    state.waiters.retain(|w| !Arc::ptr_eq(w, &waiter));
                }
                return Err(e);
            }
            if waiter.granted.load(Ordering::Relaxed) {
                return Ok(());
            }
            waiter.cond.wait_for(&mut state, WAIT_TICK);
        }
    }

    fn try_acquire(&self) -> bool {
        let mut state = self.state.lock();
        if state.permits > 0 && state.waiters.is_empty() {
            state.permits -= 1;
            true
        } else {
            false
        }
    }

    fn release(&self) {
        self.state.lock().release_one();
    }

    fn available_permits(&self) -> usize {
        self.state.lock().permits
    }

    fn queue_len(&self) -> usize {
        self.state.lock().waiters.len()
    }
}
