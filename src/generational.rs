//! Two-Layer Generational Cache Implementation
//!
//! A thread-safe cache that holds a bounded number of recently used items
//! without per-access bookkeeping. It can be used as a drop-in replacement for
//! a concurrent map when memory must be limited.
//!
//! # How It Works
//!
//! The cache is organized in two layers ("generations"), each a
//! [`ConcurrentMap`]:
//!
//! ```text
//!              try_add / get_or_add                try_get_value
//!                      │                                 │
//!                      ▼                                 ▼
//!   ┌──────────────────────────────┐   hit    ┌──────────────────────────────┐
//!   │          COLD layer          │ ───────▶ │          HOT layer           │
//!   │  new and previous-generation │ promote  │  recently touched entries    │
//!   │  entries                     │  (copy)  │  bounded by max_item_count   │
//!   └──────────────────────────────┘          └──────────────┬───────────────┘
//!                  ▲                                         │ |hot| > max
//!                  │        generation swap (under lock)     │
//!                  └─────────── cold := hot; hot := ∅ ◀──────┘
//! ```
//!
//! - Items are always added to the cold layer.
//! - Lookups check hot first, then cold.
//! - A cold hit copies the entry into hot. The cold copy is not removed, so
//!   cold can temporarily hold stale duplicates. This is acceptable because
//!   cold is replaced wholesale on the next swap.
//! - When hot grows past `max_item_count`, the whole hot layer becomes the
//!   new cold layer and an empty hot layer is created.
//!
//! An entry survives a swap only if it was touched since the previous swap.
//! This approximates LRU at generation granularity with O(1) amortized reads
//! and writes. Up to about `2 × max_item_count` entries can be resident.
//!
//! ## Cold Size Check
//!
//! With [`TwoLayerCacheConfig::check_cold_cache_size`] every addition is
//! recorded in a FIFO queue. Once the cold layer exceeds `max_item_count`, the
//! oldest recorded key is removed from cold before the new key is queued.
//! Queued keys that have since left cold (e.g. through a swap) are skipped
//! silently.
//!
//! ## Consistency
//!
//! The generation swap is the only operation taking the cache-wide lock, and
//! only for the double-checked overflow test plus two pointer replacements.
//! Lookups running concurrently with a swap may observe either the old or the
//! new hot/cold pair: there is no snapshot isolation across the two layers.
//!
//! # Example
//!
//! ```
//! use generational_cache::GenerationalCache;
//!
//! let cache: GenerationalCache<String, String> = GenerationalCache::new(4).unwrap();
//!
//! for i in 1..=10 {
//!     cache.get_or_add(i.to_string(), |k| k.clone());
//! }
//! // Touch keys 1-4 again: they move to the hot layer.
//! for i in 1..=4 {
//!     cache.try_get_value(&i.to_string());
//! }
//!
//! let metrics = cache.metrics();
//! assert_eq!(metrics.cold_cache_hit, 4);
//! assert_eq!(metrics.hot_cache_items_count, 4);
//! ```

use core::fmt;
use core::hash::{BuildHasher, Hash};
use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace};

#[cfg(feature = "hashbrown")]
use hashbrown::DefaultHashBuilder;

#[cfg(not(feature = "hashbrown"))]
use std::collections::hash_map::RandomState as DefaultHashBuilder;

use crate::concurrent::{default_segment_count, ConcurrentMap};
use crate::config::TwoLayerCacheConfig;
use crate::error::Result;
use crate::metrics::{MetricsCounters, TwoLayerCacheMetrics};

type Layer<K, V, S> = Arc<ConcurrentMap<K, V, S>>;

/// A bounded, thread-safe cache with hot/cold generational eviction.
///
/// # Type Parameters
///
/// - `K`: Key type. Must implement `Hash + Eq + Clone`.
/// - `V`: Value type. Must implement `Clone`; wrap in `Arc` to share one
///   instance between callers.
/// - `S`: Hash builder type. Defaults to `DefaultHashBuilder`. This is how a
///   custom key comparison is supplied.
///
/// # Example
///
/// ```
/// use generational_cache::GenerationalCache;
/// use std::sync::Arc;
///
/// let cache: GenerationalCache<&str, Arc<String>> = GenerationalCache::new(128).unwrap();
///
/// let first = cache.get_or_add("key", |k| Arc::new(k.to_uppercase()));
/// let again = cache.try_get_value(&"key").unwrap();
/// assert!(Arc::ptr_eq(&first, &again));
/// ```
pub struct GenerationalCache<K, V, S = DefaultHashBuilder> {
    max_item_count: usize,
    check_cold_cache_size: bool,
    segments: usize,
    hash_builder: S,
    hot: RwLock<Layer<K, V, S>>,
    cold: RwLock<Layer<K, V, S>>,
    swap_lock: Mutex<()>,
    keys_queue: Mutex<VecDeque<K>>,
    metrics: MetricsCounters,
}

impl<K, V> GenerationalCache<K, V, DefaultHashBuilder>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Creates a cache from a configuration with an optional hasher.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidConfiguration`](crate::CacheError::InvalidConfiguration)
    /// if `max_item_count` is zero.
    pub fn init(config: TwoLayerCacheConfig, hasher: Option<DefaultHashBuilder>) -> Result<Self> {
        Self::init_with_hasher(config, hasher.unwrap_or_default())
    }

    /// Creates a cache holding up to `max_item_count` hot entries.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidConfiguration`](crate::CacheError::InvalidConfiguration)
    /// if `max_item_count` is zero.
    pub fn new(max_item_count: usize) -> Result<Self> {
        Self::init(TwoLayerCacheConfig::new(max_item_count), None)
    }
}

impl<K, V, S> GenerationalCache<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher + Clone,
{
    /// Creates a cache with a custom hash builder.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidConfiguration`](crate::CacheError::InvalidConfiguration)
    /// if `max_item_count` is zero.
    pub fn init_with_hasher(config: TwoLayerCacheConfig, hash_builder: S) -> Result<Self> {
        config.validate()?;

        let segments = default_segment_count().min(config.max_item_count);
        let hot = Arc::new(Self::create_layer(config.max_item_count, segments, &hash_builder));
        let cold = Arc::new(Self::create_layer(config.max_item_count, segments, &hash_builder));

        Ok(Self {
            max_item_count: config.max_item_count,
            check_cold_cache_size: config.check_cold_cache_size,
            segments,
            hash_builder,
            hot: RwLock::new(hot),
            cold: RwLock::new(cold),
            swap_lock: Mutex::new(()),
            keys_queue: Mutex::new(VecDeque::new()),
            metrics: MetricsCounters::default(),
        })
    }

    fn create_layer(capacity: usize, segments: usize, hash_builder: &S) -> ConcurrentMap<K, V, S> {
        ConcurrentMap::with_capacity_and_hasher(capacity, segments, hash_builder.clone())
    }

    #[inline]
    fn hot(&self) -> Layer<K, V, S> {
        Arc::clone(&self.hot.read())
    }

    #[inline]
    fn cold(&self) -> Layer<K, V, S> {
        Arc::clone(&self.cold.read())
    }

    /// Maximum number of entries in the hot layer.
    #[inline]
    pub fn max_item_count(&self) -> usize {
        self.max_item_count
    }

    /// Whether the cold layer is bounded by the FIFO size check.
    #[inline]
    pub fn checks_cold_cache_size(&self) -> bool {
        self.check_cold_cache_size
    }

    /// Number of entries currently in the hot layer.
    pub fn len_hot(&self) -> usize {
        self.hot.read().len()
    }

    /// Number of entries currently in the cold layer.
    pub fn len_cold(&self) -> usize {
        self.cold.read().len()
    }

    /// Adds `value` to the cold layer if `key` is not already there.
    ///
    /// Returns `true` if the pair was added. A key that lives only in the hot
    /// layer is not detected, matching the add-to-cold-only policy.
    pub fn try_add(&self, key: K, value: V) -> bool {
        let added = self.cold().try_insert(key.clone(), value);
        if added {
            self.on_cold_value_added(key);
        }
        added
    }

    /// Looks up `key`, checking the hot layer first and then the cold layer.
    ///
    /// A cold hit copies the entry into the hot layer and may trigger a
    /// generation swap.
    pub fn try_get_value(&self, key: &K) -> Option<V> {
        if let Some(value) = self.hot().get(key) {
            self.metrics.record_hot_hit();
            return Some(value);
        }

        if let Some(value) = self.cold().get(key) {
            let hot = self.hot();
            // Cold keeps its copy; it is rotated out wholesale on the next swap.
            hot.try_insert(key.clone(), value.clone());

            if hot.len() > self.max_item_count {
                self.swap_generations();
            }

            self.metrics.record_cold_hit();
            return Some(value);
        }

        self.metrics.record_miss();
        None
    }

    /// Returns the cached value for `key`, creating it with `factory` on a miss.
    ///
    /// The new value is added to the cold layer. Factory panics propagate to
    /// the caller and leave the cache unchanged.
    pub fn get_or_add<F>(&self, key: K, factory: F) -> V
    where
        F: FnOnce(&K) -> V,
    {
        if let Some(value) = self.try_get_value(&key) {
            return value;
        }

        let (value, added) = self.cold().get_or_insert_with_flag(key.clone(), factory);
        if added {
            self.on_cold_value_added(key);
        }
        value
    }

    /// Like [`get_or_add`](Self::get_or_add), passing `arg` to the factory
    /// instead of requiring the closure to capture it.
    pub fn get_or_add_with_arg<A, F>(&self, key: K, factory: F, arg: A) -> V
    where
        F: FnOnce(&K, A) -> V,
    {
        self.get_or_add(key, move |k| factory(k, arg))
    }

    /// Returns a snapshot of the cache counters.
    ///
    /// Layer sizes are read at call time, after the counters, and are not
    /// atomic with them.
    pub fn metrics(&self) -> TwoLayerCacheMetrics {
        let mut metrics = self.metrics.snapshot();
        metrics.hot_cache_items_count = self.len_hot();
        metrics.cold_cache_items_count = self.len_cold();
        metrics
    }

    /// Replaces the cold layer with the hot layer and starts a fresh hot layer.
    fn swap_generations(&self) {
        let _guard = self.swap_lock.lock();

        let hot = self.hot();
        if hot.len() <= self.max_item_count {
            // Another thread swapped first.
            return;
        }

        let fresh = Arc::new(Self::create_layer(
            self.max_item_count,
            self.segments,
            &self.hash_builder,
        ));
        *self.cold.write() = hot;
        *self.hot.write() = fresh;

        let swap_count = self.metrics.record_swap();
        debug!(
            max_item_count = self.max_item_count,
            swap_count, "generation swap: hot layer became cold"
        );
    }

    fn on_cold_value_added(&self, key: K) {
        if self.check_cold_cache_size {
            let mut queue = self.keys_queue.lock();
            let cold = self.cold();
            if cold.len() > self.max_item_count {
                if let Some(oldest) = queue.pop_front() {
                    if cold.remove(&oldest).is_some() {
                        self.metrics.record_cold_eviction();
                        trace!(cold_len = cold.len(), "evicted oldest cold entry");
                    } else {
                        trace!("oldest queued key already left the cold layer");
                    }
                }
            }
            queue.push_back(key);
        }

        self.metrics.record_added();
    }
}

impl<K, V, S> fmt::Debug for GenerationalCache<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationalCache")
            .field("max_item_count", &self.max_item_count)
            .field("check_cold_cache_size", &self.check_cold_cache_size)
            .field("hot_len", &self.hot.read().len())
            .field("cold_len", &self.cold.read().len())
            .finish()
    }
}
