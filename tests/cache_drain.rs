// SPDX-License-Identifier: MIT OR Apache-2.0
//! One writer fills a cache inside a single write hold while two readers poll it in
//! ascending and descending key order. Readers must only ever see the empty cache or the
//! complete one.
#![cfg(not(target_arch = "wasm32"))]

use r#continue::continuation;
use reentrant_rwlock::cache::SynchronizedCache;
use std::sync::Arc;
use std::thread;

const VEGETABLES: [&str; 17] = [
    "broccoli",
    "cauliflower",
    "carrot",
    "sorrel",
    "baby turnip",
    "beet",
    "brussel sprout",
    "cabbage",
    "plantain",
    "spinach",
    "grape leaves",
    "lime leaves",
    "corn",
    "radish",
    "cucumber",
    "raddichio",
    "lima beans",
];

/// Reads every item under one read hold, in the requested order.
fn snapshot(cache: &SynchronizedCache<usize, String>, descending: bool) -> Vec<String> {
    let _consistent = cache.lock().read().unwrap();
    let items = cache.len().unwrap();
    let keys: Vec<usize> = if descending {
        (1..=items).rev().collect()
    } else {
        (1..=items).collect()
    };
    keys.into_iter()
        .map(|key| cache.read(&key).unwrap().expect("key inside the observed length"))
        .collect()
}

#[test_executors::async_test]
async fn test_readers_never_see_a_partial_batch() {
    let cache = Arc::new(SynchronizedCache::new());

    let readers: Vec<_> = [false, true]
        .into_iter()
        .map(|descending| {
            let cache = Arc::clone(&cache);
            let (c, r) = continuation();
            thread::spawn(move || {
                let mut observed_sizes = Vec::new();
                let items = loop {
                    let items = snapshot(&cache, descending);
                    observed_sizes.push(items.len());
                    if items.len() == VEGETABLES.len() {
                        break items;
                    }
                    thread::yield_now();
                };
                c.send((observed_sizes, items));
            });
            r
        })
        .collect();

    let writer = {
        let cache = Arc::clone(&cache);
        let (c, r) = continuation();
        thread::spawn(move || {
            let batch = cache.lock().write().unwrap();
            for (key, vegetable) in VEGETABLES.iter().enumerate() {
                cache.add(key + 1, vegetable.to_string()).unwrap();
                thread::yield_now();
            }
            drop(batch);
            c.send(());
        });
        r
    };

    writer.await;

    let ascending: Vec<String> = VEGETABLES.iter().map(|v| v.to_string()).collect();
    let descending: Vec<String> = ascending.iter().rev().cloned().collect();
    let mut results = Vec::new();
    for reader in readers {
        results.push(reader.await);
    }

    for (sizes, _) in &results {
        assert!(
            sizes.iter().all(|&n| n == 0 || n == VEGETABLES.len()),
            "observed a partial batch: {sizes:?}"
        );
    }
    assert_eq!(results[0].1, ascending);
    assert_eq!(results[1].1, descending);

    // Swap one entry now that every reader is done.
    cache.lock().with_write(|| {
        assert_eq!(cache.delete(&15).unwrap().as_deref(), Some("cucumber"));
        cache.add(15, "green bean".to_string()).unwrap();
    })
    .unwrap();
    assert_eq!(cache.read(&15).unwrap().as_deref(), Some("green bean"));
    assert_eq!(cache.len().unwrap(), 17);
}
