//! Named Cache Registry
//!
//! Maps a cache name, or the absence of one, to a single lazily created
//! [`GenerationalCache`] instance per key/value type pair.
//!
//! # Lookup Rules
//!
//! | `name` | Slot | Instance |
//! |--------|------|----------|
//! | `None` | `(K, V)` type pair | one singleton per type pair |
//! | `Some(n)` | `(K, V)` type pair + exact name `n` | one cache per name |
//!
//! Every slot is an initialize-once cell, so concurrent first lookups agree on
//! a single instance and the configure callback runs exactly once, when the
//! cache is created. Callbacks passed to later lookups of an existing cache are
//! **ignored**: a named cache cannot be reconfigured through the registry.
//!
//! # Lifecycle
//!
//! A registry is an ordinary value owned by the composition root and handed to
//! the code that needs it (typically as `Arc<CacheRegistry>`).
//! [`CacheRegistry::global`] offers a process-wide default for code without a
//! composition root, and [`CacheRegistry::clear`] resets a registry, e.g.
//! between tests. Caches already handed out stay usable after a clear; they are
//! simply no longer reachable through the registry.
//!
//! # Example
//!
//! ```
//! use generational_cache::CacheRegistry;
//! use std::sync::Arc;
//!
//! let registry = CacheRegistry::new();
//!
//! let by_type = registry.instance::<u64, String>(None).unwrap();
//! let again = registry.instance::<u64, String>(None).unwrap();
//! assert!(Arc::ptr_eq(&by_type, &again));
//!
//! let named = registry
//!     .instance_with::<u64, String, _>(Some("users"), |s| s.max_item_count = 32)
//!     .unwrap();
//! assert_eq!(named.max_item_count(), 32);
//! assert!(!Arc::ptr_eq(&by_type, &named));
//! ```

use core::any::{type_name, Any, TypeId};
use core::fmt;
use core::hash::Hash;
use std::sync::Arc;

use once_cell::sync::{Lazy, OnceCell};
use tracing::debug;

use crate::concurrent::ConcurrentMap;
use crate::config::CacheSettings;
use crate::error::{CacheError, Result};
use crate::generational::GenerationalCache;

type AnySlot = Arc<dyn Any + Send + Sync>;
type Slot<T> = OnceCell<Arc<T>>;

static GLOBAL: Lazy<Arc<CacheRegistry>> = Lazy::new(|| Arc::new(CacheRegistry::new()));

/// Registry of shared caches, keyed by type pair and optional name.
pub struct CacheRegistry {
    singletons: ConcurrentMap<TypeId, AnySlot>,
    named: ConcurrentMap<(TypeId, String), AnySlot>,
    maps: ConcurrentMap<(TypeId, String), AnySlot>,
}

impl CacheRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            singletons: ConcurrentMap::new(),
            named: ConcurrentMap::new(),
            maps: ConcurrentMap::new(),
        }
    }

    /// Process-wide default registry.
    pub fn global() -> &'static Arc<CacheRegistry> {
        &GLOBAL
    }

    /// Returns the cache for `name`, or the per-type singleton when `name` is `None`,
    /// creating it with default [`CacheSettings`] if needed.
    ///
    /// # Errors
    ///
    /// Propagates [`CacheError::InvalidConfiguration`] from cache creation.
    pub fn instance<K, V>(&self, name: Option<&str>) -> Result<Arc<GenerationalCache<K, V>>>
    where
        K: Hash + Eq + Clone + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        self.instance_with(name, |_| {})
    }

    /// Like [`instance`](Self::instance), running `configure` if this call
    /// creates the cache.
    ///
    /// `configure` is ignored when the cache already exists.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidConfiguration`] if `configure` leaves
    /// `max_item_count` at zero. The cache is not created in that case, so a
    /// later call may create it with valid settings.
    pub fn instance_with<K, V, F>(
        &self,
        name: Option<&str>,
        configure: F,
    ) -> Result<Arc<GenerationalCache<K, V>>>
    where
        K: Hash + Eq + Clone + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
        F: FnOnce(&mut CacheSettings),
    {
        let type_id = TypeId::of::<(K, V)>();
        let (slot, cache_name) = match name {
            None => {
                let cache_name = format!(
                    "GenerationalCache<{},{}>",
                    type_name::<K>(),
                    type_name::<V>()
                );
                let slot = Self::slot::<GenerationalCache<K, V>, _>(&self.singletons, type_id, &cache_name)?;
                (slot, cache_name)
            }
            Some(name) => {
                let slot = Self::slot::<GenerationalCache<K, V>, _>(
                    &self.named,
                    (type_id, name.to_owned()),
                    name,
                )?;
                (slot, name.to_owned())
            }
        };

        let cache = slot.get_or_try_init(|| Self::create_cache(&cache_name, configure))?;
        Ok(Arc::clone(cache))
    }

    /// Returns the unbounded shared map registered under `name`, creating an
    /// empty one if needed.
    pub fn map<K, V>(&self, name: &str) -> Result<Arc<ConcurrentMap<K, V>>>
    where
        K: Hash + Eq + Send + Sync + 'static,
        V: Send + Sync + 'static,
    {
        self.map_with(name, core::iter::empty)
    }

    /// Returns the unbounded shared map registered under `name`, filling it from
    /// `initial_values` if this call creates it.
    ///
    /// Unbounded maps never evict. Prefer [`instance`](Self::instance) for data
    /// that can grow over the process lifetime.
    pub fn map_with<K, V, F, I>(&self, name: &str, initial_values: F) -> Result<Arc<ConcurrentMap<K, V>>>
    where
        K: Hash + Eq + Send + Sync + 'static,
        V: Send + Sync + 'static,
        F: FnOnce() -> I,
        I: IntoIterator<Item = (K, V)>,
    {
        let type_id = TypeId::of::<(K, V)>();
        let slot = Self::slot::<ConcurrentMap<K, V>, _>(&self.maps, (type_id, name.to_owned()), name)?;
        let map = slot.get_or_init(|| {
            debug!(cache = name, "created shared map");
            Arc::new(initial_values().into_iter().collect())
        });
        Ok(Arc::clone(map))
    }

    /// Number of cache and map slots requested from this registry.
    pub fn len(&self) -> usize {
        self.singletons.len() + self.named.len() + self.maps.len()
    }

    /// Returns `true` if no cache has been requested yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forgets every registered cache and map.
    pub fn clear(&self) {
        self.singletons.clear();
        self.named.clear();
        self.maps.clear();
    }

    fn slot<T, Key>(
        slots: &ConcurrentMap<Key, AnySlot>,
        key: Key,
        name: &str,
    ) -> Result<Arc<Slot<T>>>
    where
        T: Send + Sync + 'static,
        Key: Hash + Eq,
    {
        slots
            .get_or_insert_with(key, |_| Arc::new(Slot::<T>::new()) as AnySlot)
            .downcast::<Slot<T>>()
            .map_err(|_| CacheError::TypeMismatch {
                name: name.to_owned(),
            })
    }

    fn create_cache<K, V, F>(name: &str, configure: F) -> Result<Arc<GenerationalCache<K, V>>>
    where
        K: Hash + Eq + Clone,
        V: Clone,
        F: FnOnce(&mut CacheSettings),
    {
        let mut settings = CacheSettings::new(name);
        configure(&mut settings);

        let cache = GenerationalCache::init(settings.to_config(), None)?;
        debug!(
            cache = name,
            max_item_count = settings.max_item_count,
            check_cold_cache_size = settings.check_cold_cache_size,
            "created cache"
        );
        Ok(Arc::new(cache))
    }
}

impl Default for CacheRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CacheRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheRegistry")
            .field("singletons", &self.singletons.len())
            .field("named", &self.named.len())
            .field("maps", &self.maps.len())
            .finish()
    }
}
