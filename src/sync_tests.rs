// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tests for the building blocks: spinlock, mutex, and permit.

use crate::{Mutex, NotAvailable, Permit, spinlock::Spinlock};
use std::sync::Arc;

#[cfg(not(target_arch = "wasm32"))]
use r#continue::continuation;
#[cfg(not(target_arch = "wasm32"))]
use std::sync::mpsc;
#[cfg(not(target_arch = "wasm32"))]
use std::thread;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
#[test]
fn test_spinlock_basic() {
    let spinlock = Spinlock::new(42);
    let result = spinlock.with_mut(|data| {
        *data += 1;
        *data
    });
    assert_eq!(result, 43);
}

#[cfg(not(target_arch = "wasm32"))]
#[test]
fn test_spinlock_released_on_panic() {
    let spinlock = Spinlock::new(0);
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        spinlock.with_mut(|data| {
            *data = 1;
            panic!("closure failed");
        })
    }));
    assert!(result.is_err());
    // Would spin forever if the lock had leaked.
    assert_eq!(spinlock.with_mut(|data| *data), 1);
}

#[cfg(not(target_arch = "wasm32"))]
#[test_executors::async_test]
async fn test_spinlock_concurrent_access() {
    let spinlock = Arc::new(Spinlock::new(0));
    let handles: Vec<_> = (0..10)
        .map(|_| {
            let spinlock = Arc::clone(&spinlock);
            let (c, r) = continuation();
            thread::spawn(move || {
                for _ in 0..100 {
                    spinlock.with_mut(|data| *data += 1);
                }
                c.send(());
            });
            r
        })
        .collect();

    for h in handles {
        h.await;
    }
    assert_eq!(spinlock.with_mut(|data| *data), 1000);
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
#[test]
fn test_mutex_try_lock() {
    let mutex = Mutex::new(42);
    let guard = mutex.try_lock().unwrap();
    assert_eq!(*guard, 42);
    assert!(matches!(mutex.try_lock(), Err(NotAvailable)));
    drop(guard);
    assert!(mutex.try_lock().is_ok());
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
#[test]
fn test_mutex_lock_spin() {
    let mutex = Mutex::new(0);
    let mut guard = mutex.lock_spin();
    *guard = 42;
    drop(guard);

    assert_eq!(mutex.with_sync(|n| *n), 42);
}

#[cfg(not(target_arch = "wasm32"))]
#[test]
fn test_mutex_lock_block_waits_for_holder() {
    let mutex = Arc::new(Mutex::new(0));
    let guard = mutex.lock_sync();

    let (tx, rx) = mpsc::channel();
    let mutex_clone = Arc::clone(&mutex);
    thread::spawn(move || {
        mutex_clone.with_mut_sync(|n| *n += 1);
        tx.send(()).unwrap();
    });

    assert!(rx.recv_timeout(Duration::from_millis(20)).is_err());
    drop(guard);
    rx.recv().unwrap();
    assert_eq!(mutex.with_sync(|n| *n), 1);
}

#[cfg(not(target_arch = "wasm32"))]
#[test_executors::async_test]
async fn test_mutex_concurrent_increment() {
    let mutex = Arc::new(Mutex::new(0));
    let handles: Vec<_> = (0..10)
        .map(|_| {
            let mutex = Arc::clone(&mutex);
            let (c, r) = continuation();
            thread::spawn(move || {
                for _ in 0..100 {
                    let mut guard = mutex.lock_block();
                    *guard += 1;
                }
                c.send(());
            });
            r
        })
        .collect();

    for handle in handles {
        handle.await;
    }

    assert_eq!(*mutex.lock_spin(), 1000);
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
#[test]
fn test_permit_is_binary() {
    let permit = Permit::new(false);
    assert_eq!(permit.try_acquire(), Err(NotAvailable));

    // Two releases still leave a single acquisition.
    permit.release();
    permit.release();
    assert_eq!(permit.try_acquire(), Ok(()));
    assert_eq!(permit.try_acquire(), Err(NotAvailable));
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
#[test]
fn test_permit_spin() {
    let permit = Permit::default();
    permit.acquire_spin();
    assert!(!permit.is_available());
    permit.release();
    assert!(permit.is_available());
}

#[cfg(not(target_arch = "wasm32"))]
#[test]
fn test_permit_block_until_released_elsewhere() {
    let permit = Arc::new(Permit::new(true));
    permit.acquire_sync();

    let (tx, rx) = mpsc::channel();
    let permit_clone = Arc::clone(&permit);
    let waiter = thread::spawn(move || {
        permit_clone.acquire_block();
        tx.send(()).unwrap();
        // Hand it back from a thread that did not originally take it.
        permit_clone.release();
    });

    assert!(rx.recv_timeout(Duration::from_millis(20)).is_err());
    permit.release();
    rx.recv().unwrap();
    waiter.join().unwrap();
    assert!(permit.is_available());
}

#[cfg(not(target_arch = "wasm32"))]
#[test_executors::async_test]
async fn test_permit_one_holder_at_a_time() {
    let permit = Arc::new(Permit::new(true));
    let holders = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let permit = Arc::clone(&permit);
            let holders = Arc::clone(&holders);
            let (c, r) = continuation();
            thread::spawn(move || {
                let mut overlaps = 0;
                for _ in 0..100 {
                    permit.acquire_sync();
                    if holders.fetch_add(1, std::sync::atomic::Ordering::SeqCst) != 0 {
                        overlaps += 1;
                    }
                    holders.fetch_sub(1, std::sync::atomic::Ordering::SeqCst);
                    permit.release();
                }
                c.send(overlaps);
            });
            r
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await, 0);
    }
    assert!(permit.is_available());
}
