//! Lazily Evaluated Value with Expiration
//!
//! [`ExpiringValue`] pairs a factory and its argument with an absolute
//! expiration instant. The factory runs on the first [`value`](ExpiringValue::value)
//! call after construction or [`reset`](ExpiringValue::reset), and the result is
//! memoized until the next reset.
//!
//! Expiration is advisory: an expired value is still returned as-is. The owner
//! checks [`is_expired`](ExpiringValue::is_expired) and calls `reset` itself,
//! which is what [`PollingCache`](crate::PollingCache) does on every lookup.
//!
//! ```
//! use generational_cache::ExpiringValue;
//! use std::time::Duration;
//!
//! let value = ExpiringValue::new(|n: &u32| n * 2, 21, Duration::from_secs(60));
//! assert_eq!(value.peek(), None);
//! assert_eq!(value.value(), 42);
//! assert_eq!(value.peek(), Some(42));
//!
//! value.reset();
//! assert_eq!(value.peek(), None);
//! ```

use core::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use once_cell::sync::OnceCell;
use parking_lot::RwLock;

type Factory<A, V> = Arc<dyn Fn(&A) -> V + Send + Sync>;

/// Upper bound used when `now + duration` does not fit in an [`Instant`].
const FAR_FUTURE: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 30);

struct State<V> {
    value: Arc<OnceCell<V>>,
    absolute_expiration: Instant,
}

/// A memoized factory result that knows when it should be recomputed.
///
/// `absolute_expiration` is `now + time_to_live` as of the last reset (or
/// construction) unless moved by [`set_expire_after`](Self::set_expire_after).
pub struct ExpiringValue<A, V> {
    arg: A,
    factory: Factory<A, V>,
    time_to_live: Duration,
    state: RwLock<State<V>>,
}

impl<A, V> ExpiringValue<A, V> {
    /// Creates an unevaluated value expiring `time_to_live` from now.
    pub fn new<F>(factory: F, arg: A, time_to_live: Duration) -> Self
    where
        F: Fn(&A) -> V + Send + Sync + 'static,
    {
        Self {
            arg,
            factory: Arc::new(factory),
            time_to_live,
            state: RwLock::new(State {
                value: Arc::new(OnceCell::new()),
                absolute_expiration: deadline(time_to_live),
            }),
        }
    }

    /// Argument passed to the factory.
    pub fn arg(&self) -> &A {
        &self.arg
    }

    /// Lifetime granted by each [`reset`](Self::reset).
    pub fn time_to_live(&self) -> Duration {
        self.time_to_live
    }

    /// Returns the memoized value, running the factory if needed.
    ///
    /// Concurrent first calls block until a single factory run completes. The
    /// factory runs without the state lock held, so it may call back into this
    /// value (except `value` itself).
    pub fn value(&self) -> V
    where
        V: Clone,
    {
        let cell = Arc::clone(&self.state.read().value);
        cell.get_or_init(|| (self.factory)(&self.arg)).clone()
    }

    /// Returns the memoized value without running the factory.
    pub fn peek(&self) -> Option<V>
    where
        V: Clone,
    {
        self.state.read().value.get().cloned()
    }

    /// Whether the factory has produced a value since the last reset.
    pub fn is_evaluated(&self) -> bool {
        self.state.read().value.get().is_some()
    }

    /// Discards the memoized value and extends expiration to `now + time_to_live`.
    ///
    /// A factory run still in progress completes into the discarded slot.
    pub fn reset(&self) {
        let mut state = self.state.write();
        state.value = Arc::new(OnceCell::new());
        state.absolute_expiration = deadline(self.time_to_live);
    }

    /// Moves the expiration to `now + duration`, keeping the memoized value.
    pub fn set_expire_after(&self, duration: Duration) {
        self.state.write().absolute_expiration = deadline(duration);
    }

    /// Instant at which the value is considered stale.
    pub fn absolute_expiration(&self) -> Instant {
        self.state.read().absolute_expiration
    }

    /// Returns `true` once `now >= absolute_expiration`.
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.absolute_expiration()
    }
}

fn deadline(after: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(after)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

impl<A, V> fmt::Debug for ExpiringValue<A, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("ExpiringValue")
            .field("time_to_live", &self.time_to_live)
            .field("absolute_expiration", &state.absolute_expiration)
            .field("evaluated", &state.value.get().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn counting(calls: &Arc<AtomicUsize>) -> impl Fn(&&'static str) -> String + Send + Sync + 'static {
        let calls = Arc::clone(calls);
        move |arg| format!("{arg}-{}", calls.fetch_add(1, Ordering::SeqCst))
    }

    #[test]
    fn test_value_is_lazy_and_memoized() {
        let calls = Arc::new(AtomicUsize::new(0));
        let value = ExpiringValue::new(counting(&calls), "a", Duration::from_secs(60));

        assert!(!value.is_evaluated());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert_eq!(value.value(), "a-0");
        assert_eq!(value.value(), "a-0");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_expired_value_is_still_returned() {
        let calls = Arc::new(AtomicUsize::new(0));
        let value = ExpiringValue::new(counting(&calls), "a", Duration::ZERO);

        assert_eq!(value.value(), "a-0");
        assert!(value.is_expired());
        assert_eq!(value.value(), "a-0");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_reset_rearms_and_extends() {
        let calls = Arc::new(AtomicUsize::new(0));
        let value = ExpiringValue::new(counting(&calls), "a", Duration::from_millis(50));
        value.value();
        let first_expiration = value.absolute_expiration();

        thread::sleep(Duration::from_millis(5));
        value.reset();

        assert!(value.absolute_expiration() > first_expiration);
        assert_eq!(value.peek(), None);
        assert_eq!(value.value(), "a-1");
    }

    #[test]
    fn test_set_expire_after_keeps_value() {
        let calls = Arc::new(AtomicUsize::new(0));
        let value = ExpiringValue::new(counting(&calls), "a", Duration::from_secs(600));
        value.value();

        value.set_expire_after(Duration::ZERO);
        assert!(value.is_expired());
        assert_eq!(value.peek(), Some("a-0".to_string()));
    }

    #[test]
    fn test_huge_time_to_live_does_not_overflow() {
        let value = ExpiringValue::new(|n: &u8| *n, 1, Duration::MAX);
        assert!(!value.is_expired());
    }

    #[test]
    fn test_concurrent_first_access_runs_factory_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let value = Arc::new(ExpiringValue::new(counting(&calls), "x", Duration::from_secs(60)));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let value = Arc::clone(&value);
                thread::spawn(move || value.value())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), "x-0");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
