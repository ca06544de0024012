//! Settings applied when the [`CacheRegistry`](crate::CacheRegistry) creates a cache.
//!
//! A configure callback receives a mutable [`CacheSettings`] exactly once, when
//! the named (or per-type) cache is first created. Later lookups of the same
//! cache never run their callback, so a cache cannot be reconfigured through
//! the registry after creation.
//!
//! ```
//! use generational_cache::CacheRegistry;
//!
//! let registry = CacheRegistry::new();
//! let first = registry
//!     .instance_with::<String, u32, _>(Some("tenants"), |settings| settings.max_item_count = 8)
//!     .unwrap();
//!
//! // Ignored: "tenants" already exists.
//! let second = registry
//!     .instance_with::<String, u32, _>(Some("tenants"), |settings| settings.max_item_count = 1024)
//!     .unwrap();
//!
//! assert_eq!(second.max_item_count(), 8);
//! assert!(std::sync::Arc::ptr_eq(&first, &second));
//! ```

use core::fmt;

use super::two_layer::{TwoLayerCacheConfig, DEFAULT_MAX_ITEM_COUNT};

/// Cache settings that can be adjusted on cache creation.
#[derive(Clone, PartialEq, Eq)]
pub struct CacheSettings {
    name: String,
    /// Maximum number of entries in the hot layer.
    pub max_item_count: usize,
    /// Whether `max_item_count` is also enforced on the cold layer.
    pub check_cold_cache_size: bool,
}

impl CacheSettings {
    /// Creates default settings for the cache with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_item_count: DEFAULT_MAX_ITEM_COUNT,
            check_cold_cache_size: false,
        }
    }

    /// Name of the cache being created.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Converts the settings into a cache configuration.
    pub fn to_config(&self) -> TwoLayerCacheConfig {
        TwoLayerCacheConfig::new(self.max_item_count)
            .with_cold_cache_size_check(self.check_cold_cache_size)
    }
}

impl fmt::Debug for CacheSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheSettings")
            .field("name", &self.name)
            .field("max_item_count", &self.max_item_count)
            .field("check_cold_cache_size", &self.check_cold_cache_size)
            .finish()
    }
}
