#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! # Code Reference
//!
//! ## Which Type Should I Use?
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────────┐
//! │  Need a bounded key/value cache shared between threads?                  │
//! │       └──▶ GenerationalCache                                             │
//! │                                                                          │
//! │  Need one cache per name (or per type) shared across the process?        │
//! │       └──▶ CacheRegistry::instance / instance_with                       │
//! │                                                                          │
//! │  Need an async value recomputed at most once per time-to-live window?    │
//! │       └──▶ PollingCache::get_or_refresh                                  │
//! └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Reference
//!
//! | Type | Description |
//! |------|-------------|
//! | [`GenerationalCache`] | Hot/cold bounded cache, approximately LRU |
//! | [`ConcurrentMap`] | Lock-striped map each cache layer is built from |
//! | [`CacheRegistry`] | Named and per-type shared cache instances |
//! | [`ExpiringValue`] | Memoized factory result with an expiration instant |
//! | [`PollingCache`] | Single-flight, time-to-live async memoization |
//!
//! ## Performance Characteristics
//!
//! | Operation | Cost | Locks taken |
//! |-----------|------|-------------|
//! | `try_get_value` (hot hit) | O(1) | one segment |
//! | `try_get_value` (cold hit) | O(1) | two segments, swap lock on overflow |
//! | `try_add` / `get_or_add` | O(1) | one segment, queue lock with size check |
//! | generation swap | O(1) | swap lock, two pointer writes |
//!
//! ## Hit/Miss Walkthrough
//!
//! ```rust
//! use generational_cache::GenerationalCache;
//!
//! let cache: GenerationalCache<u32, u32> = GenerationalCache::new(4).unwrap();
//! for i in 1..=10 {
//!     cache.get_or_add(i, |k| k * 10);
//! }
//!
//! for i in 1..=4 {
//!     cache.try_get_value(&i); // cold hits, promoted to hot
//! }
//! for i in 1..=2 {
//!     cache.try_get_value(&i); // hot hits
//! }
//! cache.try_get_value(&5); // fifth hot entry: swap
//!
//! let metrics = cache.metrics();
//! assert_eq!(metrics.cold_cache_hit, 5);
//! assert_eq!(metrics.hot_cache_hit, 2);
//! assert_eq!(metrics.swap_count, 1);
//! assert_eq!(metrics.hot_cache_items_count, 0);
//! assert_eq!(metrics.cold_cache_items_count, 5);
//! ```
//!
//! ## Registry
//!
//! ```rust
//! use generational_cache::CacheRegistry;
//!
//! let registry = CacheRegistry::new();
//! let users = registry
//!     .instance_with::<u64, String, _>(Some("users"), |s| {
//!         s.max_item_count = 1024;
//!         s.check_cold_cache_size = true;
//!     })
//!     .unwrap();
//! users.try_add(1, "ada".to_string());
//!
//! let same = registry.instance::<u64, String>(Some("users")).unwrap();
//! assert_eq!(same.try_get_value(&1).as_deref(), Some("ada"));
//! ```
//!
//! ## Modules
//!
//! - [`generational`]: The two-layer cache
//! - [`concurrent`]: Lock-striped concurrent map
//! - [`registry`]: Named cache registry
//! - [`expiring`]: Lazily evaluated value with expiration
//! - [`polling`]: Time-to-live polling cache for async factories
//! - [`config`]: Configuration structures
//! - [`metrics`]: Metrics snapshots and reporting
//! - [`error`]: Error types

/// Error types.
///
/// [`CacheError`] for construction and registry failures, [`FactoryError`] for
/// captured value-factory failures.
pub mod error;

/// Cache configuration structures.
pub mod config;

/// Lock-striped concurrent map.
///
/// Provides the segmented map used for both cache layers and for the
/// registry's own bookkeeping.
pub mod concurrent;

/// Cache metrics system.
///
/// Provides counter snapshots and a common reporting interface.
pub mod metrics;

/// Two-layer (hot/cold) generational cache.
///
/// A bounded cache that evicts whole generations of untouched entries instead
/// of tracking recency per entry.
pub mod generational;

/// Named cache registry.
pub mod registry;

/// Lazily evaluated values with an expiration instant.
pub mod expiring;

/// Time-to-live polling cache.
///
/// Single-flight memoization of async factory results on top of
/// [`GenerationalCache`].
pub mod polling;

// Re-export main types
pub use concurrent::ConcurrentMap;
pub use config::{CacheSettings, TwoLayerCacheConfig};
pub use error::{CacheError, FactoryError};
pub use expiring::ExpiringValue;
pub use generational::GenerationalCache;
pub use metrics::{CacheMetrics, TwoLayerCacheMetrics};
pub use polling::{CacheValue, PollingCache, RefreshOptions};
pub use registry::CacheRegistry;
