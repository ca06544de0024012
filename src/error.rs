//! Error types for the generational cache.
//!
//! ## Key Components
//!
//! - [`CacheError`]: Returned when a cache cannot be created or a registry
//!   lookup fails (e.g. zero capacity).
//! - [`FactoryError`]: A captured value-factory failure. It is recorded once,
//!   at the point the factory failed, and then handed unchanged to every caller
//!   that observes the failed computation.
//!
//! ## Example Usage
//!
//! ```
//! use generational_cache::config::TwoLayerCacheConfig;
//! use generational_cache::error::CacheError;
//! use generational_cache::GenerationalCache;
//!
//! let bad = GenerationalCache::<String, i32>::new(0);
//! assert!(matches!(bad, Err(CacheError::InvalidConfiguration(_))));
//!
//! let ok: Result<GenerationalCache<String, i32>, CacheError> =
//!     GenerationalCache::init(TwoLayerCacheConfig::new(16), None);
//! assert!(ok.is_ok());
//! ```

use std::backtrace::Backtrace;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T, E = CacheError> = core::result::Result<T, E>;

/// Errors produced by cache construction and registry lookups.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// Cache configuration parameters are invalid (e.g. zero capacity).
    #[error("invalid cache configuration: {0}")]
    InvalidConfiguration(String),

    /// A registry slot holds an instance of a different type than requested.
    #[error("cache '{name}' is registered with different key/value types")]
    TypeMismatch {
        /// Name of the offending registry slot.
        name: String,
    },

    /// A value factory failed.
    #[error(transparent)]
    Factory(#[from] FactoryError),
}

impl CacheError {
    /// Creates an [`CacheError::InvalidConfiguration`] with the given description.
    #[inline]
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }
}

/// A failure captured from a value factory.
///
/// Cloning is cheap: all clones share the original error, including its
/// message, its `source()` chain and the backtrace taken when the error was
/// created. Callers therefore see the failure exactly as the factory produced
/// it rather than a re-wrapped copy.
#[derive(Clone)]
pub struct FactoryError(Arc<anyhow::Error>);

impl FactoryError {
    /// Returns the underlying error.
    #[inline]
    pub fn inner(&self) -> &anyhow::Error {
        &self.0
    }

    /// Iterates the error and its chain of sources, outermost first.
    pub fn chain(&self) -> anyhow::Chain<'_> {
        self.0.chain()
    }

    /// Returns the innermost error of the source chain.
    pub fn root_cause(&self) -> &(dyn std::error::Error + 'static) {
        self.0.root_cause()
    }

    /// Attempts to downcast the captured error to a concrete type.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        self.0.downcast_ref::<E>()
    }

    /// Backtrace recorded where the factory error was created.
    ///
    /// Empty unless backtraces are enabled (`RUST_BACKTRACE` / `RUST_LIB_BACKTRACE`).
    pub fn backtrace(&self) -> &Backtrace {
        self.0.backtrace()
    }

    /// Returns `true` if both values refer to the same captured failure.
    #[inline]
    pub fn ptr_eq(&self, other: &FactoryError) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl From<anyhow::Error> for FactoryError {
    fn from(err: anyhow::Error) -> Self {
        Self(Arc::new(err))
    }
}

impl fmt::Display for FactoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl fmt::Debug for FactoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl std::error::Error for FactoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}
