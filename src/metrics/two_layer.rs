//! Two-Layer Cache Metrics
//!
//! Metrics specific to the generational (hot/cold) cache.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use super::CacheMetrics;

/// Snapshot of the counters of a [`GenerationalCache`](crate::GenerationalCache).
///
/// Returned by value from
/// [`GenerationalCache::metrics`](crate::GenerationalCache::metrics); changing
/// it has no effect on the cache.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TwoLayerCacheMetrics {
    /// Number of entries added to the cold layer.
    pub items_added: u64,
    /// Number of generation swaps (hot layer became the cold layer).
    pub swap_count: u64,
    /// Lookups answered by the hot layer.
    pub hot_cache_hit: u64,
    /// Lookups answered by the cold layer (each one promotes the entry to hot).
    pub cold_cache_hit: u64,
    /// Lookups that found the key in neither layer.
    pub misses: u64,
    /// Entries removed from the cold layer by the FIFO size check.
    pub cold_evictions: u64,
    /// Entries in the hot layer when the snapshot was taken.
    pub hot_cache_items_count: usize,
    /// Entries in the cold layer when the snapshot was taken.
    pub cold_cache_items_count: usize,
}

impl TwoLayerCacheMetrics {
    /// Total number of successful lookups.
    #[inline]
    pub fn hit_count(&self) -> u64 {
        self.hot_cache_hit + self.cold_cache_hit
    }

    /// Fraction of lookups that found a value, or `0.0` without lookups.
    pub fn hit_rate(&self) -> f64 {
        let requests = self.hit_count() + self.misses;
        if requests > 0 {
            self.hit_count() as f64 / requests as f64
        } else {
            0.0
        }
    }

    /// Converts the snapshot to a BTreeMap for reporting.
    pub fn to_btreemap(&self) -> BTreeMap<String, f64> {
        let mut metrics = BTreeMap::new();

        metrics.insert("cold_cache_hit".to_string(), self.cold_cache_hit as f64);
        metrics.insert(
            "cold_cache_items_count".to_string(),
            self.cold_cache_items_count as f64,
        );
        metrics.insert("cold_evictions".to_string(), self.cold_evictions as f64);
        metrics.insert("hit_rate".to_string(), self.hit_rate());
        metrics.insert("hot_cache_hit".to_string(), self.hot_cache_hit as f64);
        metrics.insert(
            "hot_cache_items_count".to_string(),
            self.hot_cache_items_count as f64,
        );
        metrics.insert("items_added".to_string(), self.items_added as f64);
        metrics.insert("misses".to_string(), self.misses as f64);
        metrics.insert("swap_count".to_string(), self.swap_count as f64);

        metrics
    }
}

impl CacheMetrics for TwoLayerCacheMetrics {
    fn metrics(&self) -> BTreeMap<String, f64> {
        self.to_btreemap()
    }

    fn algorithm_name(&self) -> &'static str {
        "TwoLayer"
    }
}

/// Live counters owned by a cache instance.
#[derive(Debug, Default)]
pub(crate) struct MetricsCounters {
    items_added: AtomicU64,
    swap_count: AtomicU64,
    hot_cache_hit: AtomicU64,
    cold_cache_hit: AtomicU64,
    misses: AtomicU64,
    cold_evictions: AtomicU64,
}

impl MetricsCounters {
    #[inline]
    pub(crate) fn record_added(&self) {
        self.items_added.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_swap(&self) -> u64 {
        self.swap_count.fetch_add(1, Ordering::Relaxed) + 1
    }

    #[inline]
    pub(crate) fn record_hot_hit(&self) {
        self.hot_cache_hit.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_cold_hit(&self) {
        self.cold_cache_hit.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_cold_eviction(&self) {
        self.cold_evictions.fetch_add(1, Ordering::Relaxed);
    }

    /// Copies the counters; layer sizes are filled in by the caller.
    pub(crate) fn snapshot(&self) -> TwoLayerCacheMetrics {
        TwoLayerCacheMetrics {
            items_added: self.items_added.load(Ordering::Relaxed),
            swap_count: self.swap_count.load(Ordering::Relaxed),
            hot_cache_hit: self.hot_cache_hit.load(Ordering::Relaxed),
            cold_cache_hit: self.cold_cache_hit.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            cold_evictions: self.cold_evictions.load(Ordering::Relaxed),
            hot_cache_items_count: 0,
            cold_cache_items_count: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_is_a_copy() {
        let counters = MetricsCounters::default();
        counters.record_added();
        counters.record_cold_hit();

        let snapshot = counters.snapshot();
        counters.record_hot_hit();

        assert_eq!(snapshot.items_added, 1);
        assert_eq!(snapshot.cold_cache_hit, 1);
        assert_eq!(snapshot.hot_cache_hit, 0);
        assert_eq!(counters.snapshot().hot_cache_hit, 1);
    }

    #[test]
    fn test_hit_rate() {
        let metrics = TwoLayerCacheMetrics {
            hot_cache_hit: 2,
            cold_cache_hit: 1,
            misses: 1,
            ..Default::default()
        };
        assert_eq!(metrics.hit_count(), 3);
        assert!((metrics.hit_rate() - 0.75).abs() < f64::EPSILON);
        assert_eq!(TwoLayerCacheMetrics::default().hit_rate(), 0.0);
    }

    #[test]
    fn test_btreemap_report() {
        let metrics = TwoLayerCacheMetrics {
            swap_count: 1,
            hot_cache_items_count: 4,
            ..Default::default()
        };
        let report = metrics.metrics();
        assert_eq!(report.get("swap_count"), Some(&1.0));
        assert_eq!(report.get("hot_cache_items_count"), Some(&4.0));
        assert_eq!(metrics.algorithm_name(), "TwoLayer");

        let keys: Vec<_> = report.keys().cloned().collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }
}
