//! Time-to-Live Polling Cache
//!
//! [`PollingCache`] answers "give me the value for this key, computing it at
//! most once per time-to-live window" for asynchronous factories. It stores one
//! [`ExpiringValue`] per key in a [`GenerationalCache`] obtained from a
//! [`CacheRegistry`], so the number of polled keys stays bounded.
//!
//! # Per-Key Lifecycle
//!
//! ```text
//!   Uncached ──get_or_refresh──▶ Computing ──factory done──▶ Cached
//!                                    ▲                          │
//!                                    └──── reset (expired) ◀────┘
//! ```
//!
//! - **Cached and not expired**: the memoized outcome is returned without
//!   taking the key lock.
//! - **Otherwise**: the caller takes the key's async lock, resets the entry if
//!   it expired, and awaits the shared computation. Only one computation per
//!   key is in flight; later callers reuse its outcome.
//! - The first caller to observe a finished computation under the key lock
//!   runs its `after_factory` hook while still holding that lock. The hook sees the outcome and may
//!   [`reset`](CacheValue::reset) the entry or shorten its lifetime with
//!   [`set_expire_after`](CacheValue::set_expire_after), e.g. to retry sooner
//!   after a failure.
//! - `process_result` maps the outcome to what the caller receives. By default a
//!   factory failure is returned as [`CacheError::Factory`](crate::CacheError::Factory).
//!
//! Factory failures are stored as [`FactoryError`] values, so every caller
//! observing a failed computation receives the same captured error, with its
//! source chain and backtrace intact.
//!
//! # Cancellation
//!
//! Dropping a `get_or_refresh` future does not cancel the computation. When a
//! tokio runtime is available the computation is spawned onto it and finishes
//! on its own, caching its outcome for later readers. Without a runtime it is
//! driven by whichever caller awaits it next.
//!
//! # Example
//!
//! ```
//! use generational_cache::polling::{PollingCache, RefreshOptions};
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> generational_cache::error::Result<()> {
//! let polling = PollingCache::default();
//!
//! let options = RefreshOptions::new()
//!     .time_to_live(Duration::from_secs(30))
//!     .cache_name("tenant-settings");
//! let value = polling
//!     .get_or_refresh("acme".to_string(), |tenant| async move {
//!         Ok::<_, anyhow::Error>(format!("settings for {tenant}"))
//!     }, options)
//!     .await?;
//!
//! assert_eq!(value.as_deref(), Some("settings for acme"));
//! # Ok(())
//! # }
//! ```

use core::any::type_name;
use core::fmt;
use core::future::Future;
use core::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::runtime::Handle;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, trace, warn};

use crate::error::{FactoryError, Result};
use crate::expiring::ExpiringValue;
use crate::generational::GenerationalCache;
use crate::registry::CacheRegistry;

/// A shareable factory computation; every clone resolves to the same outcome.
pub type SharedTask<V> = Shared<BoxFuture<'static, core::result::Result<V, FactoryError>>>;

/// Entry type stored per key by [`PollingCache::get_or_refresh`].
pub type PollingEntry<K, V> = Arc<ExpiringValue<K, PollingTask<V>>>;

type KeyLock = Arc<AsyncMutex<()>>;
type AfterFactory<K, V> = Box<dyn FnOnce(&CacheValue<K, V>) + Send>;
type ProcessResult<K, V> =
    Box<dyn FnOnce(&CacheValue<K, V>) -> core::result::Result<Option<V>, FactoryError> + Send>;

/// Memoizes factory results per key for a time-to-live window.
#[derive(Clone)]
pub struct PollingCache {
    registry: Arc<CacheRegistry>,
    default_time_to_live: Duration,
}

impl PollingCache {
    /// Time-to-live used when [`RefreshOptions`] does not specify one.
    pub const DEFAULT_TIME_TO_LIVE: Duration = Duration::from_secs(10);

    /// Capacity of caches created through [`cache_for`](Self::cache_for)
    /// without an explicit size.
    pub const DEFAULT_MAX_ITEM_COUNT: usize = 16;

    /// Creates a polling cache storing its entries in `registry`.
    pub fn new(registry: Arc<CacheRegistry>) -> Self {
        Self {
            registry,
            default_time_to_live: Self::DEFAULT_TIME_TO_LIVE,
        }
    }

    /// Replaces the default time-to-live.
    pub fn with_default_ttl(mut self, time_to_live: Duration) -> Self {
        self.default_time_to_live = time_to_live;
        self
    }

    /// Registry holding the entry caches.
    pub fn registry(&self) -> &Arc<CacheRegistry> {
        &self.registry
    }

    /// Time-to-live used when none is given per call.
    pub fn default_ttl(&self) -> Duration {
        self.default_time_to_live
    }

    /// Returns the value for `key`, running `factory` if it is missing or expired.
    ///
    /// At most one `factory` call per key is in flight. `factory` is only
    /// used if this call creates the entry; an existing entry keeps the
    /// factory and time-to-live it was created with.
    ///
    /// # Errors
    ///
    /// - [`CacheError::Factory`](crate::CacheError::Factory) if the computation
    ///   failed and no `process_result` hook translated the failure.
    /// - Registry errors if the entry cache cannot be created.
    pub async fn get_or_refresh<K, V, F, Fut>(
        &self,
        key: K,
        factory: F,
        options: RefreshOptions<K, V>,
    ) -> Result<Option<V>>
    where
        K: Hash + Eq + Clone + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
        F: Fn(K) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        let RefreshOptions {
            time_to_live,
            cache_name,
            after_factory,
            process_result,
        } = options;
        let time_to_live = time_to_live.unwrap_or(self.default_time_to_live);

        let entries = self.registry.instance::<K, PollingEntry<K, V>>(cache_name.as_deref())?;
        let entry = entries.get_or_add(key, |key| {
            Arc::new(ExpiringValue::new(
                move |key: &K| PollingTask::spawn(factory(key.clone())),
                key.clone(),
                time_to_live,
            ))
        });

        if !entry.is_expired() {
            if let Some(outcome) = entry.peek().and_then(|task| task.settled_outcome()) {
                trace!("polled value served from cache");
                return finish(CacheValue { entry, outcome }, process_result);
            }
        }

        let locks = self.key_locks::<K, V>(cache_name.as_deref())?;
        let lock = locks.get_or_add(entry.arg().clone(), |_| Arc::new(AsyncMutex::new(())));
        let guard = lock.lock().await;

        if entry.is_expired() {
            debug!("polled value expired, resetting");
            entry.reset();
        }

        if !entry.is_evaluated() {
            debug!(time_to_live = ?entry.time_to_live(), "running polled value factory");
        }
        let task = entry.value();
        let outcome = task.shared.clone().await;
        let value = CacheValue { entry, outcome };

        if task.settle() {
            if let Err(err) = &value.outcome {
                warn!(error = %err, "polled value factory failed");
            }
            if let Some(hook) = after_factory {
                hook(&value);
            }
        }
        drop(guard);

        finish(value, process_result)
    }

    /// Synchronous variant: returns the memoized value for `key`, recomputing
    /// it once it is older than its time-to-live.
    ///
    /// Unlike [`get_or_refresh`](Self::get_or_refresh), concurrent callers
    /// hitting an expired entry may each reset it; the factory is memoized per
    /// reset.
    pub fn get_cached<K, V, F>(
        &self,
        key: K,
        factory: F,
        time_to_live: Option<Duration>,
        cache_name: Option<&str>,
    ) -> Result<V>
    where
        K: Hash + Eq + Clone + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
        F: Fn(&K) -> V + Send + Sync + 'static,
    {
        let time_to_live = time_to_live.unwrap_or(self.default_time_to_live);
        let entries = self.registry.instance::<K, Arc<ExpiringValue<K, V>>>(cache_name)?;
        let entry = entries.get_or_add(key, |key| {
            Arc::new(ExpiringValue::new(factory, key.clone(), time_to_live))
        });

        if entry.is_expired() {
            trace!("cached value expired, resetting");
            entry.reset();
        }
        Ok(entry.value())
    }

    /// Returns the entry cache used by [`get_or_refresh`](Self::get_or_refresh)
    /// for `cache_name`, creating it with `max_item_count` entries (default
    /// [`DEFAULT_MAX_ITEM_COUNT`](Self::DEFAULT_MAX_ITEM_COUNT)) and the cold size
    /// check enabled.
    ///
    /// Call this before the first `get_or_refresh` on that cache name for the
    /// sizing to take effect. Useful for reading metrics. Multi-argument keys
    /// are plain tuples.
    pub fn cache_for<K, V>(
        &self,
        cache_name: Option<&str>,
        max_item_count: Option<usize>,
    ) -> Result<Arc<GenerationalCache<K, PollingEntry<K, V>>>>
    where
        K: Hash + Eq + Clone + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        self.registry.instance_with(cache_name, |settings| {
            settings.max_item_count = max_item_count.unwrap_or(Self::DEFAULT_MAX_ITEM_COUNT);
            settings.check_cold_cache_size = true;
        })
    }

    fn key_locks<K, V>(&self, cache_name: Option<&str>) -> Result<Arc<GenerationalCache<K, KeyLock>>>
    where
        K: Hash + Eq + Clone + Send + Sync + 'static,
    {
        let name = match cache_name {
            Some(name) => format!("{name}::locks"),
            None => format!("PollingCache<{},{}>::locks", type_name::<K>(), type_name::<V>()),
        };
        self.registry.instance(Some(&name))
    }
}

impl Default for PollingCache {
    /// Polling cache backed by [`CacheRegistry::global`].
    fn default() -> Self {
        Self::new(Arc::clone(CacheRegistry::global()))
    }
}

impl fmt::Debug for PollingCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollingCache")
            .field("registry", &self.registry)
            .field("default_time_to_live", &self.default_time_to_live)
            .finish()
    }
}

/// The in-flight or finished factory computation for one key.
///
/// Settling marks the outcome as handed to an `after_factory` hook. Until a
/// caller settles it under the key lock, readers skip the lock-free fast path.
#[derive(Clone)]
pub struct PollingTask<V> {
    shared: SharedTask<V>,
    settled: Arc<AtomicBool>,
}

impl<V> PollingTask<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn spawn<Fut>(future: Fut) -> Self
    where
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        let shared = async move { future.await.map_err(FactoryError::from) }
            .boxed()
            .shared();

        // Detached driver so that abandoned callers do not stall the factory.
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(shared.clone().map(drop));
            }
            Err(_) => trace!("no tokio runtime, polled value factory runs when awaited"),
        }

        Self {
            shared,
            settled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Outcome of the computation, if it has finished.
    pub fn outcome(&self) -> Option<&core::result::Result<V, FactoryError>> {
        self.shared.peek()
    }

    /// Whether a caller has already run its hooks for the finished outcome.
    pub fn is_settled(&self) -> bool {
        self.settled.load(Ordering::Acquire)
    }

    fn settled_outcome(&self) -> Option<core::result::Result<V, FactoryError>> {
        if self.is_settled() {
            self.outcome().cloned()
        } else {
            None
        }
    }

    /// Returns `true` for the first caller only.
    fn settle(&self) -> bool {
        !self.settled.swap(true, Ordering::AcqRel)
    }
}

impl<V: Clone> fmt::Debug for PollingTask<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollingTask")
            .field("finished", &self.shared.peek().is_some())
            .field("settled", &self.settled.load(Ordering::Relaxed))
            .finish()
    }
}

fn finish<K, V>(value: CacheValue<K, V>, process_result: Option<ProcessResult<K, V>>) -> Result<Option<V>>
where
    V: Clone,
{
    match process_result {
        Some(process) => Ok(process(&value)?),
        None => Ok(Some(value.outcome.clone()?)),
    }
}

/// The completed computation for a key, as seen by the refresh hooks.
pub struct CacheValue<K, V> {
    entry: PollingEntry<K, V>,
    outcome: core::result::Result<V, FactoryError>,
}

impl<K, V> CacheValue<K, V> {
    /// Key the value was computed for.
    pub fn key(&self) -> &K {
        self.entry.arg()
    }

    /// Result of the factory run.
    pub fn outcome(&self) -> &core::result::Result<V, FactoryError> {
        &self.outcome
    }

    /// The computed value, if the factory succeeded.
    pub fn value(&self) -> Option<&V> {
        self.outcome.as_ref().ok()
    }

    /// The captured failure, if the factory failed.
    pub fn exception(&self) -> Option<&FactoryError> {
        self.outcome.as_ref().err()
    }

    /// Discards the computed outcome, so the next request that takes the key
    /// lock runs the factory again immediately, whatever the expiration. Also
    /// moves expiration to `now + time_to_live`.
    pub fn reset(&self) {
        self.entry.reset();
    }

    /// Moves the entry's expiration to `now + duration`.
    pub fn set_expire_after(&self, duration: Duration) {
        self.entry.set_expire_after(duration);
    }

    /// Instant at which the entry will be refreshed.
    pub fn absolute_expiration(&self) -> Instant {
        self.entry.absolute_expiration()
    }
}

impl<K, V> fmt::Debug for CacheValue<K, V>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheValue")
            .field("key", self.key())
            .field("outcome", &self.outcome)
            .field("absolute_expiration", &self.absolute_expiration())
            .finish()
    }
}

/// Per-call options for [`PollingCache::get_or_refresh`].
///
/// ```
/// use generational_cache::polling::RefreshOptions;
/// use std::time::Duration;
///
/// let options: RefreshOptions<String, u64> = RefreshOptions::new()
///     .time_to_live(Duration::from_secs(600))
///     .after_factory(|value| {
///         if value.exception().is_some() {
///             value.reset();
///             value.set_expire_after(Duration::from_secs(1));
///         }
///     })
///     .process_result(|value| Ok(value.value().copied()));
/// ```
pub struct RefreshOptions<K, V> {
    time_to_live: Option<Duration>,
    cache_name: Option<String>,
    after_factory: Option<AfterFactory<K, V>>,
    process_result: Option<ProcessResult<K, V>>,
}

impl<K, V> RefreshOptions<K, V> {
    /// Options using the polling cache defaults.
    pub fn new() -> Self {
        Self {
            time_to_live: None,
            cache_name: None,
            after_factory: None,
            process_result: None,
        }
    }

    /// Lifetime of a newly created entry.
    pub fn time_to_live(mut self, time_to_live: Duration) -> Self {
        self.time_to_live = Some(time_to_live);
        self
    }

    /// Name of the registry cache holding the entries.
    pub fn cache_name(mut self, cache_name: impl Into<String>) -> Self {
        self.cache_name = Some(cache_name.into());
        self
    }

    /// Hook run under the key lock by the first caller to observe a finished
    /// computation. Not run if the outcome was already settled by another caller.
    pub fn after_factory<F>(mut self, hook: F) -> Self
    where
        F: FnOnce(&CacheValue<K, V>) + Send + 'static,
    {
        self.after_factory = Some(Box::new(hook));
        self
    }

    /// Maps the computed outcome to the value returned to this caller.
    pub fn process_result<F>(mut self, hook: F) -> Self
    where
        F: FnOnce(&CacheValue<K, V>) -> core::result::Result<Option<V>, FactoryError> + Send + 'static,
    {
        self.process_result = Some(Box::new(hook));
        self
    }
}

impl<K, V> Default for RefreshOptions<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for RefreshOptions<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshOptions")
            .field("time_to_live", &self.time_to_live)
            .field("cache_name", &self.cache_name)
            .field("after_factory", &self.after_factory.is_some())
            .field("process_result", &self.process_result.is_some())
            .finish()
    }
}
