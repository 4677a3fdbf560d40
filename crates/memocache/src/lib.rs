//! # memocache
//!
//! Capacity-bounded LRU cache with get-or-generate access.
//!
//! ## Architecture
//! - **Key index**: AHash map from key to slab slot (O(1) lookup)
//! - **Recency list**: doubly-linked list threaded through the slab (O(1)
//!   promotion and eviction)
//! - **Observer**: optional hook receiving lookups, inserts and evictions
//! - **SharedCache**: `RwLock`-guarded handle for multi-threaded callers
//!
//! ## Semantics
//! - Every access promotes the entry to most recently used
//! - `add` on an existing key keeps the first value
//! - `get_or_compute` runs its generator only on a miss
//! - Capacity 0 means unbounded; `reserve` evicts eagerly
//!
//! The crate also carries a few small utilities that share its library
//! surface: package directory lookup, AB magnitude conversion and hash
//! combining for composite keys.

#![warn(missing_docs)]

mod error;
mod lru;
mod observer;
mod shared;
mod stats;

pub mod hash;
pub mod magnitude;
pub mod packaging;

pub use error::{Error, Result};
pub use lru::Cache;
pub use observer::{CacheObserver, RequestLog};
pub use shared::SharedCache;
pub use stats::CacheStats;
