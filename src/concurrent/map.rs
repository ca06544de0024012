//! Lock-striped concurrent hash map.
//!
//! See the [module-level documentation](super) for the segment layout.

use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

#[cfg(feature = "hashbrown")]
use hashbrown::{DefaultHashBuilder, HashMap};

#[cfg(not(feature = "hashbrown"))]
use std::collections::{hash_map::RandomState as DefaultHashBuilder, HashMap};

use super::default_segment_count;

/// A thread-safe hash map with segmented storage.
///
/// Keys are partitioned across multiple segments using hash-based sharding.
/// Each segment has its own lock, so operations on keys in different segments
/// never block each other.
///
/// Values are returned by clone; store `Arc<T>` to share large values or to
/// preserve identity across lookups.
///
/// # Example
///
/// ```
/// use generational_cache::ConcurrentMap;
///
/// let map: ConcurrentMap<&str, u32> = ConcurrentMap::new();
/// assert!(map.try_insert("a", 1));
/// assert!(!map.try_insert("a", 2));
/// assert_eq!(map.get(&"a"), Some(1));
/// assert_eq!(map.get_or_insert_with("b", |_| 7), 7);
/// assert_eq!(map.len(), 2);
/// ```
pub struct ConcurrentMap<K, V, S = DefaultHashBuilder> {
    segments: Box<[Mutex<HashMap<K, V, S>>]>,
    hash_builder: S,
    count: AtomicUsize,
}

impl<K, V> ConcurrentMap<K, V, DefaultHashBuilder>
where
    K: Hash + Eq,
{
    /// Creates an empty map with the default segment count.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty map with room for roughly `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, default_segment_count(), DefaultHashBuilder::default())
    }
}

impl<K, V> Default for ConcurrentMap<K, V, DefaultHashBuilder>
where
    K: Hash + Eq,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> ConcurrentMap<K, V, S> {
    /// Returns the number of segments.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Returns the number of entries.
    ///
    /// The counter is updated under the owning segment lock, so it never
    /// underflows; it may lag behind writers still running on other threads.
    #[inline]
    pub fn len(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    /// Returns `true` if the map holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V, S> ConcurrentMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Clone,
{
    /// Creates an empty map with a custom hash builder and segment count.
    ///
    /// `capacity` is the total expected entry count and is spread across the
    /// segments. A `segments` value of zero is treated as one.
    pub fn with_capacity_and_hasher(capacity: usize, segments: usize, hash_builder: S) -> Self {
        let segment_count = segments.max(1);
        let per_segment = capacity.div_ceil(segment_count);

        let segments: Vec<_> = (0..segment_count)
            .map(|_| Mutex::new(HashMap::with_capacity_and_hasher(per_segment, hash_builder.clone())))
            .collect();

        Self {
            segments: segments.into_boxed_slice(),
            hash_builder,
            count: AtomicUsize::new(0),
        }
    }

    /// Returns the segment index for the given key.
    #[inline]
    fn segment_index<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash,
    {
        (self.hash_builder.hash_one(key) as usize) % self.segments.len()
    }

    /// Returns a clone of the value stored for `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        V: Clone,
    {
        let idx = self.segment_index(key);
        self.segments[idx].lock().get(key).cloned()
    }

    /// Applies `f` to the value stored for `key` while holding the segment lock.
    pub fn get_with<Q, F, R>(&self, key: &Q, f: F) -> Option<R>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        F: FnOnce(&V) -> R,
    {
        let idx = self.segment_index(key);
        self.segments[idx].lock().get(key).map(f)
    }

    /// Returns `true` if the map contains `key`.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let idx = self.segment_index(key);
        self.segments[idx].lock().contains_key(key)
    }

    /// Inserts `value` only if `key` is absent.
    ///
    /// Returns `true` if the pair was added.
    pub fn try_insert(&self, key: K, value: V) -> bool {
        let idx = self.segment_index(&key);
        let mut segment = self.segments[idx].lock();
        if segment.contains_key(&key) {
            return false;
        }
        segment.insert(key, value);
        self.count.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Inserts or replaces the value for `key`, returning the previous value.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        let idx = self.segment_index(&key);
        let mut segment = self.segments[idx].lock();
        let previous = segment.insert(key, value);
        if previous.is_none() {
            self.count.fetch_add(1, Ordering::Relaxed);
        }
        previous
    }

    /// Returns the value for `key`, creating it with `factory` if absent.
    ///
    /// The factory runs outside of any lock. If another thread stores a value
    /// for the same key first, that value wins and is returned.
    pub fn get_or_insert_with<F>(&self, key: K, factory: F) -> V
    where
        F: FnOnce(&K) -> V,
        V: Clone,
    {
        self.get_or_insert_with_flag(key, factory).0
    }

    /// Like [`get_or_insert_with`](Self::get_or_insert_with), also reporting
    /// whether this call stored the returned value.
    pub fn get_or_insert_with_flag<F>(&self, key: K, factory: F) -> (V, bool)
    where
        F: FnOnce(&K) -> V,
        V: Clone,
    {
        let idx = self.segment_index(&key);
        if let Some(existing) = self.segments[idx].lock().get(&key) {
            return (existing.clone(), false);
        }

        let created = factory(&key);

        let mut segment = self.segments[idx].lock();
        if let Some(existing) = segment.get(&key) {
            return (existing.clone(), false);
        }
        segment.insert(key, created.clone());
        self.count.fetch_add(1, Ordering::Relaxed);
        (created, true)
    }

    /// Fallible variant of [`get_or_insert_with`](Self::get_or_insert_with).
    ///
    /// Nothing is stored when `factory` fails.
    pub fn get_or_try_insert_with<F, E>(&self, key: K, factory: F) -> Result<V, E>
    where
        F: FnOnce(&K) -> Result<V, E>,
        V: Clone,
    {
        let idx = self.segment_index(&key);
        if let Some(existing) = self.segments[idx].lock().get(&key) {
            return Ok(existing.clone());
        }

        let created = factory(&key)?;

        let mut segment = self.segments[idx].lock();
        if let Some(existing) = segment.get(&key) {
            return Ok(existing.clone());
        }
        segment.insert(key, created.clone());
        self.count.fetch_add(1, Ordering::Relaxed);
        Ok(created)
    }

    /// Removes `key`, returning its value if it was present.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let idx = self.segment_index(key);
        let mut segment = self.segments[idx].lock();
        let removed = segment.remove(key);
        if removed.is_some() {
            self.count.fetch_sub(1, Ordering::Relaxed);
        }
        removed
    }

    /// Removes all entries from all segments.
    ///
    /// Acquires locks on each segment sequentially.
    pub fn clear(&self) {
        for segment in self.segments.iter() {
            let mut segment = segment.lock();
            let removed = segment.len();
            segment.clear();
            self.count.fetch_sub(removed, Ordering::Relaxed);
        }
    }
}

impl<K, V, S> Extend<(K, V)> for ConcurrentMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Clone,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V> FromIterator<(K, V)> for ConcurrentMap<K, V, DefaultHashBuilder>
where
    K: Hash + Eq,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K, V, S> fmt::Debug for ConcurrentMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcurrentMap")
            .field("segment_count", &self.segments.len())
            .field("len", &self.count.load(Ordering::Relaxed))
            .finish()
    }
}
