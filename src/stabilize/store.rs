//! Per-key state with last-seen bookkeeping.

use std::collections::HashMap;

use crate::tracker::ObjectKey;

#[derive(Debug, Clone)]
struct Slot<V> {
    value: V,
    last_seen: u64,
}

/// Map from [`ObjectKey`] to state, remembering the frame each key was last
/// observed in so stale keys can be reclaimed.
#[derive(Debug, Clone)]
pub struct KeyedStore<V> {
    slots: HashMap<ObjectKey, Slot<V>>,
}

impl<V> Default for KeyedStore<V> {
    fn default() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }
}

impl<V> KeyedStore<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, key: &ObjectKey) -> bool {
        self.slots.contains_key(key)
    }

    pub fn get(&self, key: &ObjectKey) -> Option<&V> {
        self.slots.get(key).map(|slot| &slot.value)
    }

    pub fn last_seen(&self, key: &ObjectKey) -> Option<u64> {
        self.slots.get(key).map(|slot| slot.last_seen)
    }

    /// Mutable access to the state of `key`, creating it with `init` on first
    /// sight. Marks the key as seen at `frame`.
    pub fn touch_with<F>(&mut self, key: ObjectKey, frame: u64, init: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        let slot = self.slots.entry(key).or_insert_with(|| Slot {
            value: init(),
            last_seen: frame,
        });
        slot.last_seen = slot.last_seen.max(frame);
        &mut slot.value
    }

    pub fn remove(&mut self, key: &ObjectKey) -> Option<V> {
        self.slots.remove(key).map(|slot| slot.value)
    }

    /// Drop keys unseen for more than `ttl` frames. `keep` is never dropped.
    ///
    /// Returns the number of removed keys.
    pub fn sweep(&mut self, now: u64, ttl: u64, keep: Option<ObjectKey>) -> usize {
        let before = self.slots.len();
        self.slots
            .retain(|key, slot| Some(*key) == keep || now.saturating_sub(slot.last_seen) <= ttl);
        before - self.slots.len()
    }

    /// Evict least recently seen keys until at most `max_keys` remain.
    /// `keep` is never evicted.
    pub fn evict_to(&mut self, max_keys: usize, keep: Option<ObjectKey>) -> usize {
        let mut evicted = 0;
        while self.slots.len() > max_keys {
            let oldest = self
                .slots
                .iter()
                .filter(|(key, _)| Some(**key) != keep)
                .min_by_key(|(key, slot)| (slot.last_seen, **key))
                .map(|(key, _)| *key);
            match oldest {
                Some(key) => {
                    self.slots.remove(&key);
                    evicted += 1;
                }
                None => break,
            }
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(id: u64) -> ObjectKey {
        ObjectKey::Track(id)
    }

    #[test]
    fn test_touch_creates_once() {
        let mut store = KeyedStore::new();
        *store.touch_with(key(1), 0, || 0) += 1;
        *store.touch_with(key(1), 3, || 100) += 1;
        assert_eq!(store.get(&key(1)), Some(&2));
        assert_eq!(store.last_seen(&key(1)), Some(3));
    }

    #[test]
    fn test_sweep_respects_ttl_and_keep() {
        let mut store = KeyedStore::new();
        store.touch_with(key(1), 0, || ());
        store.touch_with(key(2), 0, || ());
        store.touch_with(key(3), 8, || ());

        let removed = store.sweep(10, 5, Some(key(2)));
        assert_eq!(removed, 1);
        assert!(!store.contains(&key(1)));
        assert!(store.contains(&key(2)));
        assert!(store.contains(&key(3)));
    }

    #[test]
    fn test_evict_oldest_first() {
        let mut store = KeyedStore::new();
        for id in 0..5 {
            store.touch_with(key(id), id, || ());
        }
        let evicted = store.evict_to(2, Some(key(0)));
        assert_eq!(evicted, 3);
        assert!(store.contains(&key(0)));
        assert!(store.contains(&key(4)));
        assert_eq!(store.len(), 2);
    }
}
