//! Per-node document cache.
//!
//! The cache sits in front of a node's [`DocumentStore`](crate::store::DocumentStore)
//! and bounds how many documents are held hot. Eviction is strict
//! least-recently-used.

pub mod lru;

pub use lru::LruCache;

/// What a [`LruCache::put`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PutOutcome<K> {
    /// New key stored without displacing anything.
    Inserted,
    /// Existing key got a new value and was promoted.
    Updated,
    /// New key stored after the carried key was evicted.
    InsertedWithEviction(K),
}

impl<K> PutOutcome<K> {
    /// Key evicted by this put, if any.
    pub fn evicted(&self) -> Option<&K> {
        match self {
            PutOutcome::InsertedWithEviction(key) => Some(key),
            _ => None,
        }
    }

    pub fn into_evicted(self) -> Option<K> {
        match self {
            PutOutcome::InsertedWithEviction(key) => Some(key),
            _ => None,
        }
    }
}

/// Running cache counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub insertions: u64,
    pub updates: u64,
    pub evictions: u64,
    pub removals: u64,
}

impl CacheStats {
    /// Hit rate in `[0.0, 1.0]`; zero before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
