//! Observer hook for cache instrumentation
//!
//! A [`Cache`](crate::Cache) carries at most one observer and reports every
//! access, insertion and capacity eviction to it. With no observer installed
//! the engine does no bookkeeping at all.
//!
//! Provided observers:
//! - [`CacheStats`](crate::CacheStats) (through `Arc`): atomic counters
//! - [`RequestLog`]: ordered record of requested keys, dumpable to a file
//! - `(A, B)`: forwards every event to both observers

use std::fmt::{Display, Write as _};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

use crate::error::Result;

/// Receives cache events
///
/// All methods default to no-ops. Observers run synchronously inside the
/// cache operation and must not call back into the same cache.
pub trait CacheObserver<K> {
    /// A key was requested; `hit` tells whether it was present
    fn on_lookup(&mut self, _key: &K, _hit: bool) {}

    /// A new entry was created for `key`
    fn on_insert(&mut self, _key: &K) {}

    /// The entry for `key` was evicted to respect capacity
    fn on_evict(&mut self, _key: &K) {}
}

impl<K, A, B> CacheObserver<K> for (A, B)
where
    A: CacheObserver<K>,
    B: CacheObserver<K>,
{
    fn on_lookup(&mut self, key: &K, hit: bool) {
        self.0.on_lookup(key, hit);
        self.1.on_lookup(key, hit);
    }

    fn on_insert(&mut self, key: &K) {
        self.0.on_insert(key);
        self.1.on_insert(key);
    }

    fn on_evict(&mut self, key: &K) {
        self.0.on_evict(key);
        self.1.on_evict(key);
    }
}

#[derive(Debug)]
struct RequestLogInner<K> {
    requests: Vec<K>,
    hits: usize,
}

/// Ordered record of every key requested from a cache
///
/// Cloning yields another handle to the same record, so one clone can be
/// installed on the cache while another is kept for reading.
#[derive(Debug)]
pub struct RequestLog<K> {
    inner: Arc<Mutex<RequestLogInner<K>>>,
}

impl<K> Clone for RequestLog<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K> Default for RequestLog<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> RequestLog<K> {
    /// Create an empty log
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(RequestLogInner {
                requests: Vec::new(),
                hits: 0,
            })),
        }
    }

    /// Number of requests that hit
    pub fn hits(&self) -> usize {
        self.inner.lock().hits
    }

    /// Number of requests recorded
    pub fn total(&self) -> usize {
        self.inner.lock().requests.len()
    }

    /// Forget everything recorded so far
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.requests.clear();
        inner.hits = 0;
    }
}

impl<K: Clone> RequestLog<K> {
    /// Snapshot of the requested keys, oldest first
    pub fn requests(&self) -> Vec<K> {
        self.inner.lock().requests.clone()
    }
}

impl<K: Display> RequestLog<K> {
    /// Write the requested keys to `path`, one per line
    ///
    /// The record is rendered under the lock, which is released before the
    /// file is touched.
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let (rendered, total, hits) = {
            let inner = self.inner.lock();
            let mut rendered = String::new();
            for key in &inner.requests {
                let _ = writeln!(rendered, "{}", key);
            }
            (rendered, inner.requests.len(), inner.hits)
        };

        let mut out = BufWriter::new(File::create(path)?);
        out.write_all(rendered.as_bytes())?;
        out.flush()?;

        info!(
            "Wrote {} cache requests to {:?}: {}/{} hits",
            total, path, hits, total
        );
        Ok(())
    }
}

impl<K: Clone> CacheObserver<K> for RequestLog<K> {
    fn on_lookup(&mut self, key: &K, hit: bool) {
        let mut inner = self.inner.lock();
        inner.requests.push(key.clone());
        if hit {
            inner.hits += 1;
        }
    }
}
