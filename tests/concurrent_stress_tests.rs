//! Stress Tests for Concurrent Access
//!
//! These tests verify thread safety and counter consistency under high
//! contention. Bounds are checked once all threads have joined.

use generational_cache::config::TwoLayerCacheConfig;
use generational_cache::{CacheRegistry, ConcurrentMap, GenerationalCache};
use scoped_threadpool::Pool;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

const NUM_THREADS: usize = 16;
const OPS_PER_THREAD: usize = 10_000;

fn make_cache(max_item_count: usize, check_cold_cache_size: bool) -> Arc<GenerationalCache<usize, usize>> {
    let config = TwoLayerCacheConfig::new(max_item_count).with_cold_cache_size_check(check_cold_cache_size);
    Arc::new(GenerationalCache::init(config, None).unwrap())
}

/// Test high contention with many threads hammering the same keys
#[test]
fn stress_high_contention() {
    let cache = make_cache(100, false);

    let mut handles = Vec::new();
    for t in 0..NUM_THREADS {
        let cache = Arc::clone(&cache);
        handles.push(thread::spawn(move || {
            for i in 0..OPS_PER_THREAD {
                let key = i % 10; // Only 10 keys for high contention
                if t % 2 == 0 {
                    assert_eq!(cache.get_or_add(key, |k| k * 2), key * 2);
                } else if let Some(value) = cache.try_get_value(&key) {
                    assert_eq!(value, key * 2);
                }
            }
        }));
    }

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    assert!(cache.len_hot() <= 10);
    assert!(cache.len_cold() <= 10);
}

/// Test that the hot layer stays bounded while keys keep rotating
#[test]
fn stress_hot_layer_bounded() {
    let capacity = 100;
    let cache = make_cache(capacity, false);

    let mut handles = Vec::new();
    for t in 0..NUM_THREADS {
        let cache = Arc::clone(&cache);
        handles.push(thread::spawn(move || {
            for i in 0..OPS_PER_THREAD {
                let key = (t * 7919 + i) % 1_000;
                cache.get_or_add(key, |k| *k);
                let _ = cache.try_get_value(&key);
            }
        }));
    }

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    assert!(cache.len_hot() <= capacity + NUM_THREADS);
    assert!(cache.metrics().swap_count > 0);
}

/// Test that the cold size check keeps the cold layer near its bound
#[test]
fn stress_cold_size_check() {
    let capacity = 64;
    let cache = make_cache(capacity, true);

    let mut handles = Vec::new();
    for t in 0..NUM_THREADS {
        let cache = Arc::clone(&cache);
        handles.push(thread::spawn(move || {
            for i in 0..OPS_PER_THREAD {
                cache.try_add(t * OPS_PER_THREAD + i, i);
            }
        }));
    }

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    let metrics = cache.metrics();
    assert_eq!(metrics.items_added, (NUM_THREADS * OPS_PER_THREAD) as u64);
    assert!(metrics.cold_cache_items_count <= capacity + NUM_THREADS);
    assert!(metrics.cold_evictions > 0);
}

/// Every lookup is counted exactly once as a hot hit, cold hit or miss
#[test]
fn stress_lookup_accounting() {
    let cache = make_cache(32, false);

    let mut handles = Vec::new();
    for t in 0..NUM_THREADS {
        let cache = Arc::clone(&cache);
        handles.push(thread::spawn(move || {
            for i in 0..OPS_PER_THREAD {
                let key = (t + i) % 200;
                if i % 3 == 0 {
                    cache.try_add(key, key);
                } else {
                    let _ = cache.try_get_value(&key);
                }
            }
        }));
    }

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    let lookups_per_thread = (0..OPS_PER_THREAD).filter(|i| i % 3 != 0).count();
    let metrics = cache.metrics();
    assert_eq!(
        metrics.hot_cache_hit + metrics.cold_cache_hit + metrics.misses,
        (NUM_THREADS * lookups_per_thread) as u64
    );
}

/// Test that concurrent inserts into the map keep an exact count
#[test]
fn stress_concurrent_map_count() {
    let map: Arc<ConcurrentMap<usize, usize>> = Arc::new(ConcurrentMap::new());

    let mut handles = Vec::new();
    for t in 0..NUM_THREADS {
        let map = Arc::clone(&map);
        handles.push(thread::spawn(move || {
            for i in 0..1_000 {
                assert!(map.try_insert(t * 1_000 + i, i));
            }
            for i in 0..500 {
                assert_eq!(map.remove(&(t * 1_000 + i)), Some(i));
            }
        }));
    }

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    assert_eq!(map.len(), NUM_THREADS * 500);
}

/// Test registry lookups racing to create the same named caches
#[test]
fn stress_registry_creation() {
    let registry = CacheRegistry::new();
    let created = AtomicUsize::new(0);
    let mut pool = Pool::new(8);

    let mut found: Vec<Vec<Arc<GenerationalCache<usize, usize>>>> = vec![Vec::new(); 8];
    pool.scoped(|scope| {
        for slot in found.iter_mut() {
            let registry = &registry;
            let created = &created;
            scope.execute(move || {
                for name in ["alpha", "beta", "gamma"] {
                    let cache = registry
                        .instance_with::<usize, usize, _>(Some(name), |settings| {
                            created.fetch_add(1, Ordering::SeqCst);
                            settings.max_item_count = 8;
                        })
                        .unwrap();
                    slot.push(cache);
                }
            });
        }
    });

    assert_eq!(created.load(Ordering::SeqCst), 3);
    for caches in &found[1..] {
        for (a, b) in caches.iter().zip(&found[0]) {
            assert!(Arc::ptr_eq(a, b));
        }
    }
}
