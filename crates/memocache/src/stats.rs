//! Cache statistics tracking

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::observer::CacheObserver;

/// Hit/miss/insert/eviction counters for a [`Cache`](crate::Cache)
///
/// Install it as an observer through an `Arc` and keep a clone to read the
/// counters:
///
/// ```
/// use std::sync::Arc;
/// use memocache::{Cache, CacheStats};
///
/// let stats = Arc::new(CacheStats::new());
/// let mut cache = Cache::new(2).with_observer(Arc::clone(&stats));
///
/// cache.add(1, "one");
/// assert!(cache.contains(&1));
/// assert!(!cache.contains(&2));
///
/// assert_eq!(stats.hits(), 1);
/// assert_eq!(stats.misses(), 2); // the add itself was a miss
/// assert_eq!(stats.inserts(), 1);
/// ```
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    inserts: AtomicU64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl CacheStats {
    /// Zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Lookups that found their key
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Lookups that did not find their key
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Entries dropped to respect capacity
    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    /// Entries created
    pub fn inserts(&self) -> u64 {
        self.inserts.load(Ordering::Relaxed)
    }

    /// Lookups of either outcome
    pub fn requests(&self) -> u64 {
        self.hits() + self.misses()
    }

    /// Fraction of lookups that hit, 0.0 when nothing was looked up
    pub fn hit_ratio(&self) -> f64 {
        match self.requests() {
            0 => 0.0,
            total => self.hits() as f64 / total as f64,
        }
    }

    /// Zero every counter
    pub fn reset(&self) {
        for counter in [&self.hits, &self.misses, &self.evictions, &self.inserts] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl<K> CacheObserver<K> for Arc<CacheStats> {
    fn on_lookup(&mut self, _key: &K, hit: bool) {
        bump(if hit { &self.hits } else { &self.misses });
    }

    fn on_insert(&mut self, _key: &K) {
        bump(&self.inserts);
    }

    fn on_evict(&mut self, _key: &K) {
        bump(&self.evictions);
    }
}
