//! Bounded LRU cache with O(1) get, put and remove.
//!
//! Entries live in an arena of slots addressed by stable handles. The key
//! index maps a key to its handle, and the recency order is a doubly linked
//! list threaded through the slots (head = most recent, tail = least recent).
//! Both views describe the same entries: every key in the index owns exactly
//! one linked slot and every linked slot is indexed by its key.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::num::NonZeroUsize;

use tracing::trace;

use crate::cache::{CacheStats, PutOutcome};
use crate::error::Result;

/// Null link.
const NIL: usize = usize::MAX;

struct Slot<K, V> {
    key: K,
    value: V,
    prev: usize,
    next: usize,
}

/// Fixed-capacity least-recently-used cache.
pub struct LruCache<K, V> {
    capacity: NonZeroUsize,
    index: HashMap<K, usize>,
    slots: Vec<Option<Slot<K, V>>>,
    free: Vec<usize>,
    head: usize,
    tail: usize,
    stats: CacheStats,
}

impl<K, V> fmt::Debug for LruCache<K, V>
where
    K: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("capacity", &self.capacity)
            .field("len", &self.index.len())
            .field("stats", &self.stats)
            .finish()
    }
}

impl<K: Hash + Eq + Clone, V> LruCache<K, V> {
    /// Creates an empty cache holding at most `capacity` entries.
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            capacity,
            index: HashMap::new(),
            slots: Vec::new(),
            free: Vec::new(),
            head: NIL,
            tail: NIL,
            stats: CacheStats::default(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// True iff the entry count equals the configured capacity.
    pub fn is_full(&self) -> bool {
        self.index.len() == self.capacity.get()
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Returns the value for `key` and promotes it to most-recently used.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(&handle) = self.index.get(key) else {
            self.stats.misses += 1;
            return None;
        };
        self.stats.hits += 1;
        self.promote(handle);
        self.slots[handle].as_ref().map(|slot| &slot.value)
    }

    /// Returns the value for `key` without changing recency.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let handle = *self.index.get(key)?;
        self.slots[handle].as_ref().map(|slot| &slot.value)
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }

    /// Inserts or updates `key`, leaving it as the most-recently used entry.
    ///
    /// A new key arriving at a full cache first evicts the least-recently
    /// used entry. Room in the index and arena is reserved before either is
    /// touched, so an `Err` leaves the cache exactly as it was.
    pub fn put(&mut self, key: K, value: V) -> Result<PutOutcome<K>> {
        if let Some(&handle) = self.index.get(&key) {
            if let Some(slot) = self.slots[handle].as_mut() {
                slot.value = value;
            }
            self.promote(handle);
            self.stats.updates += 1;
            return Ok(PutOutcome::Updated);
        }

        self.index.try_reserve(1)?;
        if self.free.is_empty() {
            self.slots.try_reserve(1)?;
        }

        let evicted = if self.is_full() {
            self.evict_lru()
        } else {
            None
        };

        let slot = Slot {
            key: key.clone(),
            value,
            prev: NIL,
            next: NIL,
        };
        let handle = match self.free.pop() {
            Some(handle) => {
                self.slots[handle] = Some(slot);
                handle
            }
            None => {
                self.slots.push(Some(slot));
                self.slots.len() - 1
            }
        };
        self.push_front(handle);
        self.index.insert(key, handle);
        self.stats.insertions += 1;

        Ok(match evicted {
            Some(evicted) => PutOutcome::InsertedWithEviction(evicted),
            None => PutOutcome::Inserted,
        })
    }

    /// Removes `key` from both the index and the recency order.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let handle = self.index.remove(key)?;
        let slot = self.release(handle)?;
        self.stats.removals += 1;
        Some(slot.value)
    }

    /// Keys from most- to least-recently used.
    pub fn keys_mru(&self) -> KeysMru<'_, K, V> {
        KeysMru {
            slots: &self.slots,
            cursor: self.head,
        }
    }

    /// Key of the entry that the next eviction would drop.
    pub fn lru_key(&self) -> Option<&K> {
        self.slots
            .get(self.tail)
            .and_then(|slot| slot.as_ref())
            .map(|slot| &slot.key)
    }

    pub fn clear(&mut self) {
        self.index.clear();
        self.slots.clear();
        self.free.clear();
        self.head = NIL;
        self.tail = NIL;
    }

    fn evict_lru(&mut self) -> Option<K> {
        let tail = self.tail;
        let slot = self.release(tail)?;
        self.index.remove(&slot.key);
        self.stats.evictions += 1;
        trace!(handle = tail, "evicted least-recently used entry");
        Some(slot.key)
    }

    /// Unlinks a slot, frees its handle and hands back its contents.
    fn release(&mut self, handle: usize) -> Option<Slot<K, V>> {
        self.unlink(handle);
        let slot = self.slots.get_mut(handle)?.take()?;
        self.free.push(handle);
        Some(slot)
    }

    fn promote(&mut self, handle: usize) {
        if self.head == handle {
            return;
        }
        self.unlink(handle);
        self.push_front(handle);
    }

    fn unlink(&mut self, handle: usize) {
        let Some((prev, next)) = self
            .slots
            .get(handle)
            .and_then(|slot| slot.as_ref())
            .map(|slot| (slot.prev, slot.next))
        else {
            return;
        };
        if prev == NIL {
            self.head = next;
        } else if let Some(p) = self.slots[prev].as_mut() {
            p.next = next;
        }
        if next == NIL {
            self.tail = prev;
        } else if let Some(n) = self.slots[next].as_mut() {
            n.prev = prev;
        }
        if let Some(slot) = self.slots[handle].as_mut() {
            slot.prev = NIL;
            slot.next = NIL;
        }
    }

    fn push_front(&mut self, handle: usize) {
        let old_head = self.head;
        if let Some(slot) = self.slots[handle].as_mut() {
            slot.prev = NIL;
            slot.next = old_head;
        }
        if old_head == NIL {
            self.tail = handle;
        } else if let Some(h) = self.slots[old_head].as_mut() {
            h.prev = handle;
        }
        self.head = handle;
    }
}

/// Iterator over cache keys in recency order, newest first.
pub struct KeysMru<'a, K, V> {
    slots: &'a [Option<Slot<K, V>>],
    cursor: usize,
}

impl<'a, K, V> Iterator for KeysMru<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.slots.get(self.cursor)?.as_ref()?;
        self.cursor = slot.next;
        Some(&slot.key)
    }
}
