//! Concurrent Map Primitive
//!
//! This module provides the thread-safe key/value map that every layer of the
//! generational cache is built from, using the Shared Segment Pattern.
//!
//! # Architecture
//!
//! The map uses segmented storage where:
//! - The key space is partitioned across multiple segments using hash-based sharding
//! - Each segment is a `HashMap` protected by its own `parking_lot::Mutex`
//! - Operations only lock the relevant segment, allowing concurrent access to different segments
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │                      ConcurrentMap (N segments)                    │
//! │                                                                    │
//! │  ┌─────────┐ ┌─────────┐ ┌─────────┐     ┌─────────┐              │
//! │  │Segment 0│ │Segment 1│ │Segment 2│ ... │Seg. N-1 │              │
//! │  │ [Mutex] │ │ [Mutex] │ │ [Mutex] │     │ [Mutex] │              │
//! │  └─────────┘ └─────────┘ └─────────┘     └─────────┘              │
//! │       ▲           ▲           ▲               ▲                   │
//! │  hash(k1)%N  hash(k2)%N  hash(k3)%N      hash(kN)%N               │
//! └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Why Mutex Instead of RwLock?
//!
//! Segments hold a lock only for a single hash-table probe or insert, so the
//! critical sections are tiny. `parking_lot::Mutex` has less bookkeeping than
//! `RwLock` and contention is already spread across segments.
//!
//! ## Factories Run Outside the Lock
//!
//! [`ConcurrentMap::get_or_insert_with`] evaluates its factory without holding
//! any segment lock, then inserts only if the key is still absent. Under a race
//! the factory may therefore run more than once, but every caller receives the
//! single value that ended up stored. A factory may safely access the same map.
//!
//! # Default Segment Count
//!
//! By default maps use the available CPU parallelism, clamped to `4..=64`
//! segments. Use [`ConcurrentMap::with_capacity_and_hasher`] to customize.

mod map;

pub use self::map::ConcurrentMap;

/// Returns the default number of segments based on available parallelism.
///
/// This provides a good balance between parallelism and memory overhead.
#[inline]
pub fn default_segment_count() -> usize {
    std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(16)
        .clamp(4, 64)
}
