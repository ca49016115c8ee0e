//! Keyed content caches, typically consulted from [`Work::on_bind`] to
//! complete a task without running it.
//!
//! [`Work::on_bind`]: crate::Work::on_bind
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

use crate::utils::lock;

/// A cache of content values by key.
pub trait ContentCache<K, C>: Send + Sync {
    fn insert(&self, key: K, value: C);

    fn get(&self, key: &K) -> Option<C>;

    fn remove(&self, key: &K) -> Option<C>;

    /// Removes every entry.
    fn purge(&self);
}

impl<K, C, T> ContentCache<K, C> for Arc<T>
where
    T: ContentCache<K, C> + ?Sized,
{
    fn insert(&self, key: K, value: C) {
        (**self).insert(key, value)
    }

    fn get(&self, key: &K) -> Option<C> {
        (**self).get(key)
    }

    fn remove(&self, key: &K) -> Option<C> {
        (**self).remove(key)
    }

    fn purge(&self) {
        (**self).purge()
    }
}

/// Unbounded in-memory cache.
#[derive(Debug)]
pub struct MemoryCache<K, C> {
    map: Mutex<HashMap<K, C>>,
}

impl<K, C> MemoryCache<K, C> {
    pub fn new() -> Self {
        Self {
            map: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.map).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.map).is_empty()
    }
}

impl<K, C> Default for MemoryCache<K, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, C> ContentCache<K, C> for MemoryCache<K, C>
where
    K: Eq + Hash + Send,
    C: Clone + Send,
{
    fn insert(&self, key: K, value: C) {
        lock(&self.map).insert(key, value);
    }

    fn get(&self, key: &K) -> Option<C> {
        lock(&self.map).get(key).cloned()
    }

    fn remove(&self, key: &K) -> Option<C> {
        lock(&self.map).remove(key)
    }

    fn purge(&self) {
        lock(&self.map).clear();
    }
}

/// Cache which stores nothing. Stands in for a real cache to turn caching
/// off without touching the code using it.
#[derive(Debug, Default, Clone, Copy)]
pub struct StubCache;

impl<K, C> ContentCache<K, C> for StubCache {
    fn insert(&self, _: K, _: C) {}

    fn get(&self, _: &K) -> Option<C> {
        None
    }

    fn remove(&self, _: &K) -> Option<C> {
        None
    }

    fn purge(&self) {}
}

/// A "folder" inside another cache: every key is prefixed before it reaches
/// the inner cache. Purging purges the inner cache as a whole.
#[derive(Debug, Clone)]
pub struct Prefixed<X> {
    prefix: String,
    cache: X,
}

impl<X> Prefixed<X> {
    pub fn new(prefix: impl Into<String>, cache: X) -> Self {
        Self {
            prefix: prefix.into(),
            cache,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn full(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

impl<C, X> ContentCache<String, C> for Prefixed<X>
where
    X: ContentCache<String, C>,
{
    fn insert(&self, key: String, value: C) {
        self.cache.insert(self.full(&key), value)
    }

    fn get(&self, key: &String) -> Option<C> {
        self.cache.get(&self.full(key))
    }

    fn remove(&self, key: &String) -> Option<C> {
        self.cache.remove(&self.full(key))
    }

    fn purge(&self) {
        self.cache.purge()
    }
}
