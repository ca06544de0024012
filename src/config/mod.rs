//! Cache Configuration Module
//!
//! This module provides the configuration structures for the generational cache
//! and for caches created through the [`CacheRegistry`](crate::CacheRegistry).
//!
//! # Design Philosophy
//!
//! Configuration structs have public fields for simple instantiation:
//!
//! - **Simple**: Just create the struct with all fields set
//! - **Validated on use**: Invalid values are rejected when the cache is built,
//!   never lazily
//! - **No surprises**: Registry settings apply once, at creation time
//!
//! | Config | Used by | Description |
//! |--------|---------|-------------|
//! | `TwoLayerCacheConfig` | [`GenerationalCache`](crate::GenerationalCache) | Hot capacity and cold size check |
//! | `CacheSettings` | [`CacheRegistry`](crate::CacheRegistry) | Named creation settings |
//!
//! # Examples
//!
//! ```
//! use generational_cache::config::TwoLayerCacheConfig;
//! use generational_cache::GenerationalCache;
//!
//! let config = TwoLayerCacheConfig {
//!     max_item_count: 1000,
//!     check_cold_cache_size: false,
//! };
//!
//! let cache: GenerationalCache<String, i32> = GenerationalCache::init(config, None).unwrap();
//! assert_eq!(cache.max_item_count(), 1000);
//! ```

pub mod registry;
pub mod two_layer;

pub use registry::CacheSettings;
pub use two_layer::{TwoLayerCacheConfig, DEFAULT_MAX_ITEM_COUNT};
