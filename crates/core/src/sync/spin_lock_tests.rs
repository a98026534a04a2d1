// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::cancel::{CancelToken, NeverCancel};
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[test]
fn new_lock_is_free() {
    let lock = SpinLock::new();
    assert!(!lock.is_locked());
}

#[test]
fn try_acquire_fails_while_held() {
    let lock = SpinLock::new();
    assert!(lock.try_acquire());
    assert!(lock.is_locked());
    assert!(!lock.try_acquire());
    lock.release().unwrap();
    assert!(lock.try_acquire());
}

#[test]
fn release_without_acquire_is_an_error() {
    let lock = SpinLock::new();
    assert_eq!(lock.release(), Err(SyncError::NotLocked));
}

#[test]
fn release_from_non_owner_is_rejected() {
    let lock = Arc::new(SpinLock::new());
    lock.acquire(&NeverCancel).unwrap();

    let other = Arc::clone(&lock);
    let result = std::thread::spawn(move || other.release()).join().unwrap();
    assert_eq!(result, Err(SyncError::NotOwner));
    assert!(lock.is_locked());

    lock.release().unwrap();
    assert!(!lock.is_locked());
}

#[test]
fn acquire_with_cancel_already_set_is_never_granted() {
    let lock = SpinLock::new();
    let token = CancelToken::new();
    token.cancel();
    assert_eq!(lock.acquire(&token), Err(SyncError::Cancelled));
    assert!(!lock.is_locked());
}

#[test]
fn reacquire_on_owning_thread_spins_until_cancelled() {
    let lock = SpinLock::new();
    lock.acquire(&NeverCancel).unwrap();

    let polls = AtomicUsize::new(0);
    let cancel = || polls.fetch_add(1, Ordering::Relaxed) > 1_000;
    assert_eq!(lock.acquire(&cancel), Err(SyncError::Cancelled));

    // Still held exactly once by the first acquire
    assert!(lock.is_locked());
    lock.release().unwrap();
    assert!(!lock.is_locked());
}

#[test]
fn blocked_acquire_observes_cancellation() {
    let lock = Arc::new(SpinLock::new());
    lock.acquire(&NeverCancel).unwrap();

    let token = CancelToken::new();
    let waiter = {
        let lock = Arc::clone(&lock);
        let token = token.clone();
        std::thread::spawn(move || lock.acquire(&token))
    };

    std::thread::sleep(Duration::from_millis(20));
    token.interrupt();
    assert_eq!(waiter.join().unwrap(), Err(SyncError::Interrupted));
    lock.release().unwrap();
}

#[test]
fn concurrent_acquirers_are_mutually_exclusive() {
    let lock = Arc::new(SpinLock::new());
    let inside = Arc::new(AtomicUsize::new(0));
    let max_inside = Arc::new(AtomicUsize::new(0));
    let deadline = Instant::now() + Duration::from_secs(30);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let lock = Arc::clone(&lock);
            let inside = Arc::clone(&inside);
            let max_inside = Arc::clone(&max_inside);
            std::thread::spawn(move || {
                for _ in 0..500 {
                    lock.acquire(&|| Instant::now() > deadline).unwrap();
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    max_inside.fetch_max(now, Ordering::SeqCst);
                    inside.fetch_sub(1, Ordering::SeqCst);
                    lock.release().unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    assert!(!lock.is_locked());
}
