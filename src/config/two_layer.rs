//! Configuration for the two-layer (hot/cold) generational cache.
//!
//! # Sizing Guidelines
//!
//! `max_item_count` bounds the **hot** generation. Because a generation swap
//! turns the full hot layer into the new cold layer, and cold is never pruned
//! on promotion, the cache can transiently hold up to about
//! `2 × max_item_count` entries:
//!
//! ```text
//! resident entries ≤ |hot| + |cold|
//!                  ≤ (max_item_count + 1) + |previous hot|
//!                  ≈ 2 × max_item_count
//! ```
//!
//! Newly added entries land in cold and are only bounded by the swap, unless
//! `check_cold_cache_size` is set. In that mode every insertion is recorded in
//! a FIFO queue and the oldest key is removed from cold once it exceeds
//! `max_item_count`.
//!
//! # Examples
//!
//! ```
//! use generational_cache::config::TwoLayerCacheConfig;
//! use generational_cache::GenerationalCache;
//!
//! // Plain cache, 1000 hot entries
//! let config = TwoLayerCacheConfig {
//!     max_item_count: 1000,
//!     check_cold_cache_size: false,
//! };
//! let cache: GenerationalCache<String, u64> = GenerationalCache::init(config, None).unwrap();
//!
//! // Strictly bounded cold layer
//! let config = TwoLayerCacheConfig::new(64).with_cold_cache_size_check(true);
//! let cache: GenerationalCache<u64, String> = GenerationalCache::init(config, None).unwrap();
//! ```

use core::fmt;

use crate::error::CacheError;

/// Default hot-layer capacity, used when no explicit size is configured.
pub const DEFAULT_MAX_ITEM_COUNT: usize = 256;

/// Configuration for a [`GenerationalCache`](crate::GenerationalCache).
///
/// # Fields
///
/// - `max_item_count`: Maximum number of entries in the hot layer. Exceeding it
///   triggers a generation swap. Must be greater than zero.
/// - `check_cold_cache_size`: Also bound the cold layer by `max_item_count`,
///   evicting the oldest added key first.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TwoLayerCacheConfig {
    /// Maximum number of entries in the hot layer.
    pub max_item_count: usize,
    /// Whether `max_item_count` is also enforced on the cold layer.
    pub check_cold_cache_size: bool,
}

impl TwoLayerCacheConfig {
    /// Creates a configuration with the given hot-layer capacity and no cold size check.
    #[must_use]
    pub fn new(max_item_count: usize) -> Self {
        Self {
            max_item_count,
            check_cold_cache_size: false,
        }
    }

    /// Enables or disables the FIFO size check on the cold layer.
    #[must_use]
    pub fn with_cold_cache_size_check(mut self, enabled: bool) -> Self {
        self.check_cold_cache_size = enabled;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidConfiguration`] if `max_item_count` is zero.
    pub fn validate(&self) -> Result<(), CacheError> {
        if self.max_item_count == 0 {
            return Err(CacheError::invalid_configuration(
                "max_item_count should be a positive number but was 0",
            ));
        }
        Ok(())
    }
}

impl Default for TwoLayerCacheConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ITEM_COUNT)
    }
}

impl fmt::Debug for TwoLayerCacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwoLayerCacheConfig")
            .field("max_item_count", &self.max_item_count)
            .field("check_cold_cache_size", &self.check_cold_cache_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_layer_config_defaults() {
        let config = TwoLayerCacheConfig::default();
        assert_eq!(config.max_item_count, 256);
        assert!(!config.check_cold_cache_size);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_two_layer_config_builder() {
        let config = TwoLayerCacheConfig::new(8).with_cold_cache_size_check(true);
        assert_eq!(config.max_item_count, 8);
        assert!(config.check_cold_cache_size);
    }

    #[test]
    fn test_two_layer_config_rejects_zero() {
        let err = TwoLayerCacheConfig::new(0).validate().unwrap_err();
        assert!(err.to_string().contains("max_item_count"));
    }
}
