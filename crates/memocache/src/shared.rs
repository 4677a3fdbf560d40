//! SharedCache: a lock-guarded [`Cache`] handle for multi-threaded callers

use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

use ahash::RandomState;
use parking_lot::RwLock;

use crate::error::Result;
use crate::lru::Cache;

/// Cloneable, thread-safe handle to a [`Cache`]
///
/// Every promoting operation takes the write lock, since even lookups reorder
/// the recency list. `size`, `capacity`, `keys` and `is_empty` take the read
/// lock.
///
/// [`get_or_compute`](Self::get_or_compute) runs the generator with no lock
/// held. Two threads missing the same key at the same time may both run
/// their generator; the first value stored wins and both callers get it.
/// Use [`with_cache`](Self::with_cache) to run the generator under the lock
/// instead.
pub struct SharedCache<K, V, S = RandomState> {
    inner: Arc<RwLock<Cache<K, V, S>>>,
}

impl<K, V, S> Clone for SharedCache<K, V, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> SharedCache<K, V, RandomState>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Create a shared cache holding at most `capacity` entries (0 = unbounded)
    pub fn new(capacity: usize) -> Self {
        Self::from_cache(Cache::new(capacity))
    }
}

impl<K, V, S> From<Cache<K, V, S>> for SharedCache<K, V, S> {
    fn from(cache: Cache<K, V, S>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(cache)),
        }
    }
}

impl<K, V, S> SharedCache<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher,
{
    /// Wrap an existing cache (observer included)
    pub fn from_cache(cache: Cache<K, V, S>) -> Self {
        Self::from(cache)
    }

    /// See [`Cache::lookup`]
    pub fn lookup(&self, key: &K) -> Result<V>
    where
        K: fmt::Debug,
    {
        self.inner.write().lookup(key)
    }

    /// See [`Cache::try_get`]
    pub fn try_get(&self, key: &K) -> Option<V> {
        self.inner.write().try_get(key)
    }

    /// See [`Cache::contains`]
    pub fn contains(&self, key: &K) -> bool {
        self.inner.write().contains(key)
    }

    /// See [`Cache::add`]
    pub fn add(&self, key: K, value: V) {
        self.inner.write().add(key, value);
    }

    /// Look up a value, generating it outside the lock on a miss
    pub fn get_or_compute<F>(&self, key: &K, generator: F) -> V
    where
        F: FnOnce(&K) -> V,
    {
        if let Some(value) = self.inner.write().try_get(key) {
            return value;
        }

        let value = generator(key);
        self.inner.write().settle(key, value)
    }

    /// Fallible form of [`get_or_compute`](Self::get_or_compute)
    pub fn try_get_or_compute<F, E>(&self, key: &K, generator: F) -> std::result::Result<V, E>
    where
        F: FnOnce(&K) -> std::result::Result<V, E>,
    {
        if let Some(value) = self.inner.write().try_get(key) {
            return Ok(value);
        }

        let value = generator(key)?;
        Ok(self.inner.write().settle(key, value))
    }

    /// See [`Cache::size`]
    pub fn size(&self) -> usize {
        self.inner.read().size()
    }

    /// See [`Cache::is_empty`]
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// See [`Cache::keys`]
    pub fn keys(&self) -> Vec<K> {
        self.inner.read().keys()
    }

    /// See [`Cache::capacity`]
    pub fn capacity(&self) -> usize {
        self.inner.read().capacity()
    }

    /// See [`Cache::reserve`]
    pub fn reserve(&self, capacity: usize) {
        self.inner.write().reserve(capacity);
    }

    /// See [`Cache::flush`]
    pub fn flush(&self) {
        self.inner.write().flush();
    }

    /// Run `f` with exclusive access to the cache
    ///
    /// Everything inside `f` is one critical section; a generator called from
    /// here blocks all other users of the cache until it returns.
    pub fn with_cache<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut Cache<K, V, S>) -> R,
    {
        f(&mut self.inner.write())
    }
}
