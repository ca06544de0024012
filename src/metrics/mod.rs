//! Cache Metrics System
//!
//! Provides counters for the generational cache and a `BTreeMap`-based
//! reporting interface.
//!
//! # Why BTreeMap over HashMap?
//!
//! BTreeMap is used instead of HashMap for reporting because:
//! - **Deterministic ordering**: Metrics always appear in consistent order
//! - **Reproducible output**: Essential for testing and benchmarking comparisons
//! - **Better debugging**: Consistent output makes logs more readable
//!
//! The performance difference (O(log n) vs O(1)) is negligible with a handful
//! of metric keys.
//!
//! # Snapshots
//!
//! Counters are owned by the cache and updated atomically. Callers only ever
//! receive a copied [`TwoLayerCacheMetrics`] snapshot, so no mutable state
//! leaks out of the cache. Layer sizes in a snapshot are read at call time and
//! are not atomic with the counters.

use std::collections::BTreeMap;

pub mod two_layer;

pub use two_layer::TwoLayerCacheMetrics;
pub(crate) use two_layer::MetricsCounters;

/// Trait implemented by metric snapshots for uniform reporting.
///
/// The trait uses BTreeMap to ensure deterministic ordering of metrics, which
/// is essential for reproducible benchmarks and consistent test results.
pub trait CacheMetrics {
    /// Returns all metrics as key-value pairs in deterministic order.
    ///
    /// Keys are sorted alphabetically for consistent output.
    fn metrics(&self) -> BTreeMap<String, f64>;

    /// Algorithm name for identification (e.g. `"TwoLayer"`).
    fn algorithm_name(&self) -> &'static str;
}
