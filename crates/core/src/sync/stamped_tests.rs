// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::cancel::{CancelToken, NeverCancel};
use std::sync::Arc;
use std::time::Duration;

#[test]
fn optimistic_read_validates_when_untouched() {
    let lock = StampedLock::new();
    let stamp = lock.try_optimistic_read().unwrap();
    assert_eq!(stamp.mode(), StampMode::Optimistic);
    assert!(lock.validate(stamp));
}

#[test]
fn write_lock_invalidates_optimistic_reads() {
    let lock = StampedLock::new();
    let optimistic = lock.try_optimistic_read().unwrap();

    let write = lock.write_lock(&NeverCancel).unwrap();
    assert!(!lock.validate(optimistic));
    assert!(lock.try_optimistic_read().is_none());

    lock.unlock(write).unwrap();
    assert!(!lock.validate(optimistic));
    assert!(!lock.is_write_locked());
}

#[test]
fn optimistic_stamp_converts_to_write_when_untouched() {
    let lock = StampedLock::new();
    let optimistic = lock.try_optimistic_read().unwrap();
    let write = lock.try_convert_to_write_lock(optimistic).unwrap();
    assert_eq!(write.mode(), StampMode::Write);
    assert!(lock.is_write_locked());
    lock.unlock(write).unwrap();
}

#[test]
fn stale_optimistic_stamp_does_not_convert() {
    let lock = StampedLock::new();
    let optimistic = lock.try_optimistic_read().unwrap();

    let write = lock.write_lock(&NeverCancel).unwrap();
    lock.unlock(write).unwrap();

    assert!(lock.try_convert_to_write_lock(optimistic).is_none());
    assert!(!lock.is_write_locked());
}

#[test]
fn optimistic_stamp_does_not_convert_while_readers_hold() {
    let lock = StampedLock::new();
    let optimistic = lock.try_optimistic_read().unwrap();
    let read = lock.try_read_lock().unwrap();

    assert!(lock.try_convert_to_write_lock(optimistic).is_none());
    // Readers do not invalidate optimistic reads
    assert!(lock.validate(optimistic));
    lock.unlock(read).unwrap();
}

#[test]
fn sole_reader_converts_to_writer() {
    let lock = StampedLock::new();
    let read = lock.read_lock(&NeverCancel).unwrap();
    let write = lock.try_convert_to_write_lock(read).unwrap();
    assert_eq!(lock.reader_count(), 0);
    assert!(lock.is_write_locked());
    lock.unlock(write).unwrap();
}

#[test]
fn readers_share_and_exclude_writers() {
    let lock = StampedLock::new();
    let r1 = lock.try_read_lock().unwrap();
    let r2 = lock.try_read_lock().unwrap();
    assert_eq!(lock.reader_count(), 2);
    assert!(lock.try_write_lock().is_none());
    assert!(lock.try_convert_to_write_lock(r1).is_none());

    lock.unlock(r1).unwrap();
    lock.unlock(r2).unwrap();
    assert!(lock.try_write_lock().is_some());
}

#[test]
fn unlocking_write_twice_is_rejected() {
    let lock = StampedLock::new();
    let write = lock.write_lock(&NeverCancel).unwrap();
    lock.unlock(write).unwrap();
    assert_eq!(
        lock.unlock(write),
        Err(SyncError::InvalidStamp(write.value()))
    );
}

#[test]
fn optimistic_unlock_is_a_no_op() {
    let lock = StampedLock::new();
    let optimistic = lock.try_optimistic_read().unwrap();
    lock.unlock(optimistic).unwrap();
    assert!(lock.validate(optimistic));
}

#[test]
fn blocked_writer_observes_cancellation() {
    let lock = Arc::new(StampedLock::new());
    let held = lock.write_lock(&NeverCancel).unwrap();

    let token = CancelToken::new();
    let waiter = {
        let lock = Arc::clone(&lock);
        let token = token.clone();
        std::thread::spawn(move || lock.write_lock(&token))
    };

    std::thread::sleep(Duration::from_millis(20));
    token.cancel();
    assert_eq!(waiter.join().unwrap(), Err(SyncError::Cancelled));
    lock.unlock(held).unwrap();
    assert!(!lock.is_write_locked());
}
