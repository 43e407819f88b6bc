//! Time-to-live cache shared by the discovery engine and the façade.
//!
//! A thin wrapper over [`moka::sync::Cache`] built with `time_to_live`:
//! an entry older than the TTL is never served, and inserting a key again
//! replaces the value and restarts its TTL.

use moka::sync::Cache;
use std::borrow::Borrow;
use std::hash::Hash;
use std::time::Duration;

pub struct TtlCache<K, V> {
    cache: Cache<K, V>,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(ttl: Duration) -> Self {
        let cache = Cache::builder().time_to_live(ttl).build();
        Self { cache, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.cache.get(key)
    }

    pub fn insert(&self, key: K, value: V) {
        self.cache.insert(key, value);
    }

    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.cache.remove(key)
    }

    pub fn clear(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks();
    }

    /// Number of live entries; expired and invalidated ones are not counted
    pub fn len(&self) -> usize {
        self.cache.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
