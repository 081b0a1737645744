//! Model-based checks for the LRU cache.

use std::num::NonZeroUsize;

use corelib::cache::LruCache;
use corelib::PutOutcome;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum CacheOp {
    Put(u8, u32),
    Get(u8),
    Remove(u8),
}

fn cache_op() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (0u8..16, any::<u32>()).prop_map(|(k, v)| CacheOp::Put(k, v)),
        (0u8..16).prop_map(CacheOp::Get),
        (0u8..16).prop_map(CacheOp::Remove),
    ]
}

/// Recency list with the most-recently used entry first.
#[derive(Default)]
struct Model {
    entries: Vec<(u8, u32)>,
}

impl Model {
    fn touch(&mut self, key: u8) -> Option<u32> {
        let pos = self.entries.iter().position(|(k, _)| *k == key)?;
        let entry = self.entries.remove(pos);
        self.entries.insert(0, entry);
        Some(entry.1)
    }

    fn put(&mut self, key: u8, value: u32, capacity: usize) -> Option<u8> {
        if self.touch(key).is_some() {
            self.entries[0].1 = value;
            return None;
        }
        let evicted = if self.entries.len() == capacity {
            self.entries.pop().map(|(k, _)| k)
        } else {
            None
        };
        self.entries.insert(0, (key, value));
        evicted
    }

    fn remove(&mut self, key: u8) -> Option<u32> {
        let pos = self.entries.iter().position(|(k, _)| *k == key)?;
        Some(self.entries.remove(pos).1)
    }
}

proptest! {
    #[test]
    fn prop_matches_recency_model(
        capacity in 1usize..6,
        ops in prop::collection::vec(cache_op(), 0..200),
    ) {
        let mut cache = LruCache::new(NonZeroUsize::new(capacity).unwrap());
        let mut model = Model::default();

        for op in ops {
            match op {
                CacheOp::Put(k, v) => {
                    let outcome = cache.put(k, v).unwrap();
                    let expected = model.put(k, v, capacity);
                    prop_assert_eq!(outcome.evicted().copied(), expected);
                    if expected.is_none() && outcome != PutOutcome::Updated {
                        prop_assert_eq!(outcome, PutOutcome::Inserted);
                    }
                }
                CacheOp::Get(k) => {
                    prop_assert_eq!(cache.get(&k).copied(), model.touch(k));
                }
                CacheOp::Remove(k) => {
                    prop_assert_eq!(cache.remove(&k), model.remove(k));
                }
            }

            prop_assert!(cache.len() <= capacity);
            prop_assert_eq!(cache.len(), model.entries.len());
            let keys: Vec<u8> = cache.keys_mru().copied().collect();
            let expected: Vec<u8> = model.entries.iter().map(|(k, _)| *k).collect();
            prop_assert_eq!(keys, expected);
        }
    }
}

#[test]
fn test_hit_rate_tracks_lookups() {
    let mut cache = LruCache::new(NonZeroUsize::new(2).unwrap());
    cache.put("a", 1).unwrap();
    assert_eq!(cache.stats().hit_rate(), 0.0);

    assert!(cache.get("a").is_some());
    assert!(cache.get("b").is_none());
    assert_eq!(cache.stats().hits, 1);
    assert_eq!(cache.stats().misses, 1);
    assert_eq!(cache.stats().hit_rate(), 0.5);
}
