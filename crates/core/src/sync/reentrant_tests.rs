// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::cancel::{CancelToken, NeverCancel};
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

#[test]
fn nested_acquires_need_matching_releases() {
    let lock = ReentrantSpinLock::new();
    for depth in 1..=3 {
        lock.acquire(&NeverCancel).unwrap();
        assert_eq!(lock.hold_count(), depth);
    }

    lock.release().unwrap();
    lock.release().unwrap();
    assert!(lock.is_locked());
    assert_eq!(lock.hold_count(), 1);

    lock.release().unwrap();
    assert!(!lock.is_locked());
    assert_eq!(lock.hold_count(), 0);
}

#[test]
fn release_from_non_owner_is_rejected() {
    let lock = Arc::new(ReentrantSpinLock::new());
    lock.acquire(&NeverCancel).unwrap();

    let other = Arc::clone(&lock);
    let result = std::thread::spawn(move || other.release()).join().unwrap();
    assert_eq!(result, Err(SyncError::NotOwner));
    assert!(lock.is_held_by_current_thread());
    lock.release().unwrap();
}

#[test]
fn release_when_free_is_rejected() {
    let lock = ReentrantSpinLock::new();
    assert_eq!(lock.release(), Err(SyncError::NotOwner));
}

#[test]
fn other_thread_cannot_try_acquire_while_held() {
    let lock = Arc::new(ReentrantSpinLock::new());
    lock.acquire(&NeverCancel).unwrap();

    let other = Arc::clone(&lock);
    let acquired = std::thread::spawn(move || other.try_acquire())
        .join()
        .unwrap();
    assert!(!acquired);
    assert!(lock.try_acquire());
    assert_eq!(lock.hold_count(), 2);
}

#[test]
fn waiter_is_cancelled_without_taking_ownership() {
    let lock = Arc::new(ReentrantSpinLock::new());
    lock.acquire(&NeverCancel).unwrap();

    let token = CancelToken::new();
    let waiter = {
        let lock = Arc::clone(&lock);
        let token = token.clone();
        std::thread::spawn(move || {
            let result = lock.acquire(&token);
            (result, lock.hold_count())
        })
    };

    std::thread::sleep(Duration::from_millis(20));
    token.cancel();
    let (result, hold_count) = waiter.join().unwrap();
    assert_eq!(result, Err(SyncError::Cancelled));
    assert_eq!(hold_count, 0);
    assert!(lock.is_held_by_current_thread());
}

#[test]
fn lock_passes_between_threads_after_full_release() {
    let lock = Arc::new(ReentrantSpinLock::new());
    lock.acquire(&NeverCancel).unwrap();
    lock.acquire(&NeverCancel).unwrap();

    let waiter = {
        let lock = Arc::clone(&lock);
        std::thread::spawn(move || {
            lock.acquire(&NeverCancel).unwrap();
            let held = lock.is_held_by_current_thread();
            lock.release().unwrap();
            held
        })
    };

    std::thread::sleep(Duration::from_millis(10));
    lock.release().unwrap();
    lock.release().unwrap();
    assert!(waiter.join().unwrap());
    assert!(!lock.is_locked());
}

proptest! {
    #[test]
    fn n_acquires_then_releases_leave_lock_free(depth in 1usize..50, short in 1usize..50) {
        let lock = ReentrantSpinLock::new();
        for _ in 0..depth {
            lock.acquire(&NeverCancel).unwrap();
        }
        prop_assert_eq!(lock.hold_count(), depth);

        let partial = short.min(depth) - 1;
        for _ in 0..partial {
            lock.release().unwrap();
        }
        prop_assert!(lock.is_locked());

        for _ in partial..depth {
            lock.release().unwrap();
        }
        prop_assert!(!lock.is_locked());
        prop_assert_eq!(lock.hold_count(), 0);
    }
}
