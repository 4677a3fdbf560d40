//! Replaying a trace through a cache

use memocache::{Cache, CacheStats, RequestLog};
use serde::Serialize;
use std::sync::Arc;

/// Outcome of replaying one trace at one capacity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub capacity: usize,
    pub requests: u64,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub hit_ratio: f64,
    pub size: usize,
    pub most_recent: Vec<String>,
}

/// Replay `requests` through a fresh cache of `capacity` entries
///
/// Each miss caches the position of the request that first asked for the
/// key. `top` limits how many most-recent keys the report lists. When `log`
/// is given, every request is also recorded there.
pub fn replay(
    requests: &[String],
    capacity: usize,
    top: usize,
    log: Option<RequestLog<String>>,
) -> Report {
    let stats = Arc::new(CacheStats::new());
    let mut cache: Cache<String, usize> = Cache::new(capacity);
    match log {
        Some(log) => cache.set_observer((Arc::clone(&stats), log)),
        None => cache.set_observer(Arc::clone(&stats)),
    }

    for (position, key) in requests.iter().enumerate() {
        cache.get_or_compute(key, |_| position);
    }

    Report {
        capacity,
        requests: stats.requests(),
        hits: stats.hits(),
        misses: stats.misses(),
        evictions: stats.evictions(),
        hit_ratio: stats.hit_ratio(),
        size: cache.size(),
        most_recent: cache.keys().into_iter().take(top).collect(),
    }
}
