//! LRU (Least Recently Used) cache engine
//!
//! Two views of the same entry set are kept in step:
//! - a doubly-linked recency list stored in a slab (`nodes`), head = most
//!   recently used, tail = least recently used
//! - a hash index from key to the entry's slot in the slab
//!
//! Every mutation goes through one of the private helpers (`touch`,
//! `insert_new`, `evict_tail`, `flush`) which update both views together.

use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::hash::{BuildHasher, Hash};

use ahash::RandomState;

use crate::error::{Error, Result};
use crate::observer::CacheObserver;

/// Node in the LRU doubly-linked list
struct Node<K, V> {
    key: K,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

type BoxedObserver<K> = Box<dyn CacheObserver<K> + Send + Sync>;

/// Upper bound on the slots reserved up front; larger caches grow on demand
const PREALLOC_LIMIT: usize = 1024;

/// Cache of most recently used values
///
/// Holds up to `capacity` entries; a capacity of zero means the cache grows
/// without limit. Every access (`lookup`, `try_get`, `contains`, `add`,
/// `get_or_compute`) promotes the entry to most recently used, so there are
/// no read-only accessors apart from `size`, `capacity` and `keys`.
///
/// `add` keeps the *first* value stored for a key: adding an existing key only
/// promotes it and discards the new value.
///
/// ```
/// use memocache::Cache;
///
/// let mut cache = Cache::new(2);
/// cache.add("a", 1);
/// cache.add("b", 2);
/// cache.add("a", 100); // promotes "a", value stays 1
/// cache.add("c", 3); // evicts "b"
///
/// assert_eq!(cache.keys(), vec!["c", "a"]);
/// assert_eq!(cache.try_get(&"a"), Some(1));
/// assert!(cache.lookup(&"b").is_err());
/// ```
///
/// The engine is not synchronized. Wrap it in a lock (see
/// [`SharedCache`](crate::SharedCache)) and treat every method as a writer.
pub struct Cache<K, V, S = RandomState> {
    map: HashMap<K, usize, S>,
    nodes: Vec<Option<Node<K, V>>>,
    head: Option<usize>,
    tail: Option<usize>,
    free_list: Vec<usize>,
    capacity: usize,
    observer: Option<BoxedObserver<K>>,
}

impl<K, V> Cache<K, V, RandomState>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Create a cache holding at most `capacity` entries (0 = unbounded)
    pub fn new(capacity: usize) -> Self {
        Self::with_hasher(capacity, RandomState::new())
    }

    /// Create a cache with no capacity limit
    pub fn unbounded() -> Self {
        Self::new(0)
    }
}

impl<K, V, S> Default for Cache<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::with_hasher(0, S::default())
    }
}

impl<K, V, S> Cache<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher,
{
    /// Create a cache using `hasher` for the key index
    pub fn with_hasher(capacity: usize, hasher: S) -> Self {
        let prealloc = capacity.min(PREALLOC_LIMIT);
        Self {
            map: HashMap::with_capacity_and_hasher(prealloc, hasher),
            nodes: Vec::with_capacity(prealloc),
            head: None,
            tail: None,
            free_list: Vec::new(),
            capacity,
            observer: None,
        }
    }

    /// Install `observer`, replacing any previous one
    pub fn with_observer<O>(mut self, observer: O) -> Self
    where
        O: CacheObserver<K> + Send + Sync + 'static,
    {
        self.set_observer(observer);
        self
    }

    /// Install `observer`, replacing any previous one
    pub fn set_observer<O>(&mut self, observer: O)
    where
        O: CacheObserver<K> + Send + Sync + 'static,
    {
        self.observer = Some(Box::new(observer));
    }

    /// Remove and return the installed observer
    pub fn take_observer(&mut self) -> Option<Box<dyn CacheObserver<K> + Send + Sync>> {
        self.observer.take()
    }

    /// Look up a value, failing with [`Error::KeyNotFound`] if absent
    ///
    /// A hit promotes the entry to most recently used.
    pub fn lookup(&mut self, key: &K) -> Result<V>
    where
        K: fmt::Debug,
    {
        match self.find(key) {
            Some(value) => Ok(value.clone()),
            None => Err(Error::KeyNotFound(format!("{:?}", key))),
        }
    }

    /// Look up a value, returning `None` if absent
    pub fn try_get(&mut self, key: &K) -> Option<V> {
        self.find(key).cloned()
    }

    /// Does the cache contain the key?
    ///
    /// Counts as an access: a present key is promoted.
    pub fn contains(&mut self, key: &K) -> bool {
        self.find(key).is_some()
    }

    /// Add a value to the cache
    ///
    /// If the key is already cached it is promoted and `value` is dropped;
    /// the stored value is not replaced.
    pub fn add(&mut self, key: K, value: V) {
        if self.find(&key).is_none() {
            self.insert_new(key, value);
        }
    }

    /// Look up a value, generating and caching it on a miss
    ///
    /// `generator` runs only when the key is absent, exactly once per call.
    /// It must not use this cache.
    pub fn get_or_compute<F>(&mut self, key: &K, generator: F) -> V
    where
        F: FnOnce(&K) -> V,
    {
        match self.try_get_or_compute(key, |k| Ok::<V, Infallible>(generator(k))) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Like [`get_or_compute`](Self::get_or_compute) for a fallible generator
    ///
    /// A generator error is returned unchanged and nothing is inserted.
    pub fn try_get_or_compute<F, E>(&mut self, key: &K, generator: F) -> std::result::Result<V, E>
    where
        F: FnOnce(&K) -> std::result::Result<V, E>,
    {
        if let Some(value) = self.find(key) {
            return Ok(value.clone());
        }

        let value = generator(key)?;
        self.insert_new(key.clone(), value.clone());
        Ok(value)
    }

    /// Number of cached entries
    pub fn size(&self) -> usize {
        self.map.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// All cached keys, most recently used first
    ///
    /// Does not change the recency order.
    pub fn keys(&self) -> Vec<K> {
        let mut keys = Vec::with_capacity(self.size());
        keys.extend(self.iter_nodes().map(|node| node.key.clone()));
        keys
    }

    /// Maximum number of entries (0 = unbounded)
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the capacity, evicting least recently used entries to fit
    pub fn reserve(&mut self, capacity: usize) {
        self.capacity = capacity;
        self.trim();
    }

    /// Remove every entry; the capacity is unchanged
    pub fn flush(&mut self) {
        self.map.clear();
        self.nodes.clear();
        self.free_list.clear();
        self.head = None;
        self.tail = None;
    }

    // Store a value generated without the cache borrowed. A value stored for
    // the key in the meantime wins and is returned instead. Not reported to
    // the observer as a lookup; the caller already reported the miss.
    pub(crate) fn settle(&mut self, key: &K, value: V) -> V {
        match self.map.get(key).copied() {
            Some(idx) => {
                self.touch(idx);
                self.nodes[idx]
                    .as_ref()
                    .map_or(value, |node| node.value.clone())
            }
            None => {
                self.insert_new(key.clone(), value.clone());
                value
            }
        }
    }

    /// Verify that the index and the recency list describe the same entries
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        let mut prev = None;
        let mut cursor = self.head;
        let mut visited = 0;

        while let Some(idx) = cursor {
            if visited > self.nodes.len() {
                return Err("recency list contains a cycle".to_string());
            }
            let node = self
                .nodes
                .get(idx)
                .and_then(Option::as_ref)
                .ok_or_else(|| format!("list links to empty slot {}", idx))?;
            if node.prev != prev {
                return Err(format!("slot {} has a stale back link", idx));
            }
            if self.map.get(&node.key) != Some(&idx) {
                return Err(format!("slot {} is not indexed under its key", idx));
            }
            visited += 1;
            prev = Some(idx);
            cursor = node.next;
        }

        if prev != self.tail {
            return Err("tail does not terminate the recency list".to_string());
        }
        if visited != self.map.len() {
            return Err(format!(
                "index holds {} keys but the list holds {} entries",
                self.map.len(),
                visited
            ));
        }
        if visited + self.free_list.len() != self.nodes.len() {
            return Err("slab slots leaked".to_string());
        }
        if self.capacity > 0 && visited > self.capacity {
            return Err(format!(
                "{} entries exceed capacity {}",
                visited, self.capacity
            ));
        }
        Ok(())
    }

    // Look up a key and promote it when found
    fn find(&mut self, key: &K) -> Option<&V> {
        let idx = self.map.get(key).copied();
        if let Some(observer) = self.observer.as_mut() {
            observer.on_lookup(key, idx.is_some());
        }

        let idx = idx?;
        self.touch(idx);
        self.nodes[idx].as_ref().map(|node| &node.value)
    }

    // Link a key known to be absent at the head, then trim
    fn insert_new(&mut self, key: K, value: V) {
        let idx = self.alloc_node();
        self.map.insert(key.clone(), idx);
        self.nodes[idx] = Some(Node {
            key,
            value,
            prev: None,
            next: self.head,
        });

        if let Some(head_idx) = self.head {
            if let Some(head) = &mut self.nodes[head_idx] {
                head.prev = Some(idx);
            }
        }

        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }

        if let (Some(observer), Some(node)) = (self.observer.as_mut(), &self.nodes[idx]) {
            observer.on_insert(&node.key);
        }

        self.trim();
    }

    fn trim(&mut self) {
        if self.capacity == 0 {
            return;
        }
        while self.map.len() > self.capacity {
            self.evict_tail();
        }
    }

    fn touch(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return;
        }

        self.unlink(idx);

        if let Some(node) = &mut self.nodes[idx] {
            node.prev = None;
            node.next = self.head;
        }

        if let Some(head_idx) = self.head {
            if let Some(head) = &mut self.nodes[head_idx] {
                head.prev = Some(idx);
            }
        }

        self.head = Some(idx);
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = match &self.nodes[idx] {
            Some(node) => (node.prev, node.next),
            None => return,
        };

        match prev {
            Some(prev_idx) => {
                if let Some(prev_node) = &mut self.nodes[prev_idx] {
                    prev_node.next = next;
                }
            }
            None => self.head = next,
        }

        match next {
            Some(next_idx) => {
                if let Some(next_node) = &mut self.nodes[next_idx] {
                    next_node.prev = prev;
                }
            }
            None => self.tail = prev,
        }
    }

    fn evict_tail(&mut self) {
        let Some(tail_idx) = self.tail else {
            return;
        };

        self.unlink(tail_idx);
        if let Some(node) = self.nodes[tail_idx].take() {
            self.map.remove(&node.key);
            self.free_list.push(tail_idx);
            if let Some(observer) = self.observer.as_mut() {
                observer.on_evict(&node.key);
            }
        }
    }

    fn alloc_node(&mut self) -> usize {
        if let Some(idx) = self.free_list.pop() {
            idx
        } else {
            let idx = self.nodes.len();
            self.nodes.push(None);
            idx
        }
    }

    fn iter_nodes(&self) -> impl Iterator<Item = &Node<K, V>> + '_ {
        std::iter::successors(self.node_at(self.head), move |node| self.node_at(node.next))
    }

    fn node_at(&self, idx: Option<usize>) -> Option<&Node<K, V>> {
        idx.and_then(|idx| self.nodes[idx].as_ref())
    }
}

impl<K, V, S> fmt::Debug for Cache<K, V, S>
where
    K: Hash + Eq + Clone + fmt::Debug,
    V: Clone,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("capacity", &self.capacity)
            .field("size", &self.size())
            .field("keys", &self.keys())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    #[test]
    fn test_lru_basic() {
        let mut cache = Cache::new(2);

        cache.add(1, "a");
        cache.add(2, "b");

        assert_eq!(cache.lookup(&1).unwrap(), "a");
        assert_eq!(cache.lookup(&2).unwrap(), "b");
        assert_eq!(cache.size(), 2);
        assert_eq!(cache.capacity(), 2);
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache = Cache::new(2);

        cache.add(1, "a");
        cache.add(2, "b");
        cache.add(3, "c"); // Should evict 1

        assert_eq!(cache.try_get(&1), None);
        assert_eq!(cache.try_get(&2), Some("b"));
        assert_eq!(cache.try_get(&3), Some("c"));
    }

    #[test]
    fn test_lru_promotion() {
        let mut cache = Cache::new(2);

        cache.add(1, "a");
        cache.add(2, "b");
        cache.lookup(&1).unwrap(); // Move 1 to front
        cache.add(3, "c"); // Should evict 2

        assert_eq!(cache.keys(), vec![3, 1]);
        assert!(!cache.contains(&2));
    }

    #[test]
    fn test_lru_add_keeps_first_value() {
        let mut cache = Cache::new(2);

        cache.add(1, "a");
        cache.add(1, "b");

        assert_eq!(cache.lookup(&1).unwrap(), "a");
        assert_eq!(cache.size(), 1);
    }

    #[test]
    fn test_lru_add_existing_promotes() {
        let mut cache = Cache::new(3);

        cache.add(1, "a");
        cache.add(2, "b");
        cache.add(3, "c");
        cache.add(1, "ignored");

        assert_eq!(cache.keys(), vec![1, 3, 2]);
    }

    #[test]
    fn test_lru_lookup_missing() {
        let mut cache: Cache<&str, u32> = Cache::new(2);

        let err = cache.lookup(&"ghost").unwrap_err();
        assert!(matches!(err, Error::KeyNotFound(ref key) if key == "\"ghost\""));
        assert!(err.is_not_found());
        assert_eq!(cache.try_get(&"ghost"), None);
        assert!(!cache.contains(&"ghost"));
    }

    #[test]
    fn test_lru_contains_promotes() {
        let mut cache = Cache::new(2);

        cache.add("a", 1);
        cache.add("b", 2);
        assert!(cache.contains(&"a"));
        cache.add("c", 3);

        assert_eq!(cache.keys(), vec!["c", "a"]);
    }

    #[test]
    fn test_lru_get_or_compute_runs_once() {
        let mut cache = Cache::new(4);
        let mut calls = 0;

        let first = cache.get_or_compute(&7, |k| {
            calls += 1;
            k * 2
        });
        let second = cache.get_or_compute(&7, |_| {
            calls += 1;
            0
        });

        assert_eq!(first, 14);
        assert_eq!(second, 14);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_lru_try_get_or_compute_error_adds_nothing() {
        let mut cache: Cache<u32, String> = Cache::new(2);
        cache.add(1, "one".to_string());

        let result = cache.try_get_or_compute(&2, |_| Err::<String, _>("boom"));

        assert_eq!(result, Err("boom"));
        assert_eq!(cache.size(), 1);
        assert_eq!(cache.keys(), vec![1]);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_lru_get_or_compute_evicts() {
        let mut cache = Cache::new(2);

        for key in 0..5u64 {
            cache.get_or_compute(&key, |k| k.to_string());
        }

        assert_eq!(cache.keys(), vec![4, 3]);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_lru_unbounded() {
        let mut cache = Cache::unbounded();

        for key in 0..1000 {
            cache.add(key, key);
        }

        assert_eq!(cache.size(), 1000);
        assert_eq!(cache.capacity(), 0);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_lru_reserve_shrink_and_grow() {
        let mut cache = Cache::new(4);
        for key in ["d", "c", "b", "a"] {
            cache.add(key, key.len());
        }
        assert_eq!(cache.keys(), vec!["a", "b", "c", "d"]);

        cache.reserve(2);
        assert_eq!(cache.keys(), vec!["a", "b"]);
        assert_eq!(cache.capacity(), 2);

        cache.reserve(0);
        cache.add("e", 1);
        cache.add("f", 1);
        assert_eq!(cache.size(), 4);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_lru_flush() {
        let mut cache = Cache::new(3);

        cache.add(1, "a");
        cache.add(2, "b");
        cache.flush();

        assert_eq!(cache.size(), 0);
        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), 3);
        assert!(cache.lookup(&1).is_err());

        cache.add(3, "c");
        assert_eq!(cache.keys(), vec![3]);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_lru_capacity_one() {
        let mut cache = Cache::new(1);

        cache.add(1, "a");
        cache.add(2, "b");

        assert_eq!(cache.keys(), vec![2]);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_lru_slots_are_reused() {
        let mut cache = Cache::new(3);

        for key in 0..100 {
            cache.add(key, key);
        }

        assert!(cache.nodes.len() <= 4);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_lru_debug_lists_keys() {
        let mut cache = Cache::new(2);
        cache.add(1, ());
        cache.add(2, ());

        let rendered = format!("{:?}", cache);
        assert!(rendered.contains("capacity: 2"));
        assert!(rendered.contains("keys: [2, 1]"));
    }

    #[test]
    fn test_lru_take_observer() {
        let mut cache: Cache<i32, i32> = Cache::new(2).with_observer(crate::RequestLog::new());
        cache.add(1, 1);

        assert!(cache.take_observer().is_some());
        assert!(cache.take_observer().is_none());
    }

    #[test]
    fn test_lru_huge_capacity() {
        let mut cache: Cache<u64, u64> = Cache::new(usize::MAX);

        cache.add(1, 10);
        cache.add(2, 20);

        assert_eq!(cache.size(), 2);
        assert_eq!(cache.capacity(), usize::MAX);
        assert!(cache.nodes.capacity() <= PREALLOC_LIMIT);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_lru_generator_panic_leaves_cache_unchanged() {
        let mut cache = Cache::new(2);
        cache.add(1, "one");
        cache.add(2, "two");

        let result = catch_unwind(AssertUnwindSafe(|| {
            cache.get_or_compute(&3, |_| panic!("generator failed"))
        }));

        assert!(result.is_err());
        assert_eq!(cache.keys(), vec![2, 1]);
        assert_eq!(cache.try_get(&3), None);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_lru_lookup_error_renders_debug_key() {
        let mut cache: Cache<&str, u32> = Cache::new(2);

        let err = cache.lookup(&"ghost").unwrap_err();
        assert_eq!(err.to_string(), "Unable to find key: \"ghost\"");

        let mut numbers: Cache<u32, u32> = Cache::new(2);
        let err = numbers.lookup(&7).unwrap_err();
        assert_eq!(err.to_string(), "Unable to find key: 7");
    }
}
