//! Correctness Tests for the Generational Cache
//!
//! This module validates the hot/cold bookkeeping of the two-layer cache
//! using small, deterministic access patterns.
//!
//! ## Test Strategy
//! - Small capacities (2-5 entries) so every swap is predictable
//! - Single-threaded access only; concurrency lives in the stress tests
//! - Each test checks the metrics snapshot after every relevant step

use generational_cache::config::TwoLayerCacheConfig;
use generational_cache::{CacheError, CacheRegistry, GenerationalCache};
use std::sync::Arc;

// ============================================================================
// HELPER FUNCTIONS FOR CACHE CREATION
// ============================================================================

/// Helper to create a cache with the given hot capacity
fn make_cache<V: Clone>(max_item_count: usize) -> GenerationalCache<String, V> {
    GenerationalCache::new(max_item_count).unwrap()
}

/// Helper to create a cache with the cold size check enabled
fn make_checked_cache(max_item_count: usize) -> GenerationalCache<String, String> {
    let config = TwoLayerCacheConfig::new(max_item_count).with_cold_cache_size_check(true);
    GenerationalCache::init(config, None).unwrap()
}

fn key(i: usize) -> String {
    i.to_string()
}

// ============================================================================
// CAPACITY AND SWAP
// ============================================================================

#[test]
fn test_one_swap_after_touching_capacity_plus_one_keys() {
    let cache = make_cache::<String>(4);
    for i in 0..10 {
        assert!(cache.try_add(key(i), format!("value_{i}")));
    }
    assert_eq!(cache.len_cold(), 10);

    for i in 0..4 {
        assert!(cache.try_get_value(&key(i)).is_some());
        assert_eq!(cache.metrics().swap_count, 0);
    }

    assert!(cache.try_get_value(&key(4)).is_some());

    let metrics = cache.metrics();
    assert_eq!(metrics.swap_count, 1);
    assert_eq!(metrics.hot_cache_items_count, 0);
    assert_eq!(metrics.cold_cache_items_count, 5);
}

#[test]
fn test_hit_and_miss_bookkeeping() {
    let cache = make_cache::<String>(4);
    for i in 1..=10 {
        cache.get_or_add(key(i), |k| format!("value_{k}"));
    }

    for i in 1..=4 {
        cache.try_get_value(&key(i));
    }
    let metrics = cache.metrics();
    assert_eq!(metrics.cold_cache_hit, 4);
    assert_eq!(metrics.hot_cache_hit, 0);
    assert_eq!(metrics.hot_cache_items_count, 4);

    for i in 1..=2 {
        cache.try_get_value(&key(i));
    }
    assert_eq!(cache.metrics().hot_cache_hit, 2);

    cache.try_get_value(&key(5));
    let metrics = cache.metrics();
    assert_eq!(metrics.swap_count, 1);
    assert_eq!(metrics.hot_cache_items_count, 0);
    assert_eq!(metrics.cold_cache_items_count, 5);
}

#[test]
fn test_survivors_of_swap_are_the_touched_keys() {
    let cache = make_cache::<usize>(2);
    for i in 0..6 {
        cache.try_add(key(i), i);
    }
    // 0, 1, 2 promoted; the third promotion swaps.
    for i in 0..3 {
        cache.try_get_value(&key(i));
    }

    for i in 0..3 {
        assert_eq!(cache.try_get_value(&key(i)), Some(i), "key {i} should survive");
    }
    for i in 3..6 {
        assert_eq!(cache.try_get_value(&key(i)), None, "key {i} should be gone");
    }
}

#[test]
fn test_repeated_swaps_keep_hot_bounded() {
    let cache = make_cache::<usize>(3);
    for round in 0..5 {
        for i in 0..4 {
            let k = key(round * 10 + i);
            cache.get_or_add(k.clone(), |_| i);
            cache.try_get_value(&k);
        }
        assert!(cache.len_hot() <= 3);
    }
    assert!(cache.metrics().swap_count >= 4);
}

// ============================================================================
// VALUE IDENTITY
// ============================================================================

#[test]
fn test_get_or_add_then_lookup_returns_same_instance() {
    let cache: GenerationalCache<&str, Arc<String>> = GenerationalCache::new(8).unwrap();

    let created = cache.get_or_add("k", |k| Arc::new(format!("{k}-value")));
    let found = cache.try_get_value(&"k").unwrap();
    assert!(Arc::ptr_eq(&created, &found));

    // Promoted copy in hot is still the same instance.
    let again = cache.try_get_value(&"k").unwrap();
    assert!(Arc::ptr_eq(&created, &again));
}

#[test]
fn test_get_or_add_does_not_replace_existing() {
    let cache = make_cache::<String>(4);
    cache.try_add(key(1), "first".to_string());
    let value = cache.get_or_add(key(1), |_| "second".to_string());
    assert_eq!(value, "first");
    assert_eq!(cache.metrics().items_added, 1);
}

// ============================================================================
// COLD SIZE CHECK
// ============================================================================

#[test]
fn test_cold_size_check_keeps_newest_keys() {
    let cache = make_checked_cache(3);
    for i in 0..8 {
        cache.try_add(key(i), format!("tenant_{i}"));
    }

    let metrics = cache.metrics();
    assert_eq!(metrics.cold_cache_items_count, 3);
    assert_eq!(metrics.cold_evictions, 5);
    for i in 5..8 {
        assert!(cache.try_get_value(&key(i)).is_some());
    }
}

#[test]
fn test_cold_size_check_tolerates_stale_queue_entries() {
    let cache = make_checked_cache(2);
    cache.try_add(key(0), "0".to_string());
    cache.try_add(key(1), "1".to_string());

    // Promote and swap so the queued keys no longer match the cold layer.
    for i in 0..2 {
        cache.try_get_value(&key(i));
    }
    cache.try_add(key(2), "2".to_string());
    cache.try_get_value(&key(2));
    assert_eq!(cache.metrics().swap_count, 1);

    for i in 3..6 {
        cache.try_add(key(i), i.to_string());
    }
    assert!(cache.len_cold() <= 3);
}

#[test]
fn test_without_size_check_cold_is_unbounded() {
    let cache = make_cache::<usize>(2);
    for i in 0..50 {
        cache.try_add(key(i), i);
    }
    assert_eq!(cache.len_cold(), 50);
    assert_eq!(cache.metrics().cold_evictions, 0);
}

// ============================================================================
// CONFIGURATION AND REGISTRY
// ============================================================================

#[test]
fn test_zero_capacity_fails_fast() {
    let err = GenerationalCache::<String, String>::init(TwoLayerCacheConfig::new(0), None).unwrap_err();
    assert!(matches!(err, CacheError::InvalidConfiguration(_)));
    assert!(err.to_string().contains("max_item_count"));
}

#[test]
fn test_registry_reconfiguration_is_ignored() {
    let registry = CacheRegistry::new();
    let cache = registry
        .instance_with::<String, String, _>(Some("reconfigure"), |s| s.max_item_count = 2)
        .unwrap();
    let same = registry
        .instance_with::<String, String, _>(Some("reconfigure"), |s| s.max_item_count = 200)
        .unwrap();

    assert!(Arc::ptr_eq(&cache, &same));
    assert_eq!(same.max_item_count(), 2);
}

#[test]
fn test_registry_named_and_type_singletons_differ() {
    let registry = CacheRegistry::new();
    let singleton = registry.instance::<String, usize>(None).unwrap();
    let named = registry.instance::<String, usize>(Some("named")).unwrap();

    singleton.try_add(key(1), 1);
    assert_eq!(named.try_get_value(&key(1)), None);
    assert_eq!(registry.len(), 2);
}

#[test]
fn test_metrics_snapshot_reports_every_counter() {
    use generational_cache::CacheMetrics;

    let cache = make_cache::<usize>(2);
    cache.get_or_add(key(1), |_| 1);
    cache.try_get_value(&key(1));
    cache.try_get_value(&key(1));

    let metrics = cache.metrics();
    let report = metrics.metrics();
    assert_eq!(report["items_added"], 1.0);
    assert_eq!(report["misses"], 1.0);
    assert_eq!(report["cold_cache_hit"], 1.0);
    assert_eq!(report["hot_cache_hit"], 1.0);
    assert!((report["hit_rate"] - 2.0 / 3.0).abs() < 1e-9);
}
