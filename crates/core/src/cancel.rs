// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cooperative cancellation for blocking waits
//!
//! Every wait loop in this crate polls a [`CancelCheck`] between attempts.
//! A [`CancelToken`] carries two flags: a cooperative cancel request and a
//! forced interrupt. Interrupting also unparks the thread bound to the token
//! so parked sleeps return promptly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::Thread;

/// Predicate polled by blocking waits
pub trait CancelCheck {
    /// True once the caller should stop waiting
    fn is_cancelled(&self) -> bool;

    /// True once the caller was forcibly interrupted
    fn is_interrupted(&self) -> bool {
        false
    }
}

impl<F> CancelCheck for F
where
    F: Fn() -> bool,
{
    fn is_cancelled(&self) -> bool {
        self()
    }
}

/// Cancel check that never fires
#[derive(Clone, Copy, Debug, Default)]
pub struct NeverCancel;

impl CancelCheck for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}

#[derive(Debug, Default)]
struct TokenInner {
    cancelled: AtomicBool,
    interrupted: AtomicBool,
    thread: Mutex<Option<Thread>>,
}

/// Shared cancellation flag owned by one being
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    inner: Arc<TokenInner>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the calling thread so `cancel`/`interrupt` can unpark it
    pub fn bind_current_thread(&self) {
        let mut slot = self
            .inner
            .thread
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        *slot = Some(std::thread::current());
    }

    /// Request cooperative cancellation
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::Release);
        self.unpark();
    }

    /// Forcibly interrupt the bound thread
    ///
    /// Implies cancellation.
    pub fn interrupt(&self) {
        self.inner.interrupted.store(true, Ordering::Release);
        self.inner.cancelled.store(true, Ordering::Release);
        self.unpark();
    }

    fn unpark(&self) {
        let slot = self
            .inner
            .thread
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if let Some(thread) = slot.as_ref() {
            thread.unpark();
        }
    }
}

impl CancelCheck for CancelToken {
    fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    fn is_interrupted(&self) -> bool {
        self.inner.interrupted.load(Ordering::Acquire)
    }
}

#[cfg(test)]
#[path = "cancel_tests.rs"]
mod tests;
