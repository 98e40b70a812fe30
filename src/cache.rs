//! Bounded LRU cache of transform instances keyed by (source, target).

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::transform::Transform;

type Key = (String, String);

struct Entries {
    map: HashMap<Key, Arc<Transform>>,
    /// Least recently used at the front.
    order: VecDeque<Key>,
}

pub struct TransformCache {
    capacity: usize,
    entries: Mutex<Entries>,
}

impl TransformCache {
    /// `capacity` is clamped to at least one entry.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(Entries {
                map: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, source: &str, target: &str) -> Option<Arc<Transform>> {
        let mut entries = self.entries.lock();
        let key = (source.to_string(), target.to_string());
        let found = entries.map.get(&key).cloned()?;
        entries.touch(&key);
        Some(found)
    }

    /// Insert `transform` unless another thread got there first, in which case the
    /// existing instance is kept and returned.
    pub fn insert(&self, transform: Transform) -> Arc<Transform> {
        let key = (transform.source().to_string(), transform.target().to_string());
        let mut entries = self.entries.lock();
        if let Some(existing) = entries.map.get(&key).cloned() {
            entries.touch(&key);
            return existing;
        }

        let transform = Arc::new(transform);
        entries.map.insert(key.clone(), Arc::clone(&transform));
        entries.order.push_back(key);

        while entries.map.len() > self.capacity {
            let Some(victim) = entries.order.pop_front() else {
                break;
            };
            debug!(source = %victim.0, target = %victim.1, "evicting cached transform");
            entries.map.remove(&victim);
        }
        transform
    }

    pub fn clear(&self) {
        let mut entries = self.entries.lock();
        entries.map.clear();
        entries.order.clear();
    }
}

impl Entries {
    /// O(capacity) scan of the recency queue.
    fn touch(&mut self, key: &Key) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            if let Some(k) = self.order.remove(pos) {
                self.order.push_back(k);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(source: &str, target: &str) -> Transform {
        Transform::new(source, target, source, target).unwrap()
    }

    fn eqc(lat_ts: usize) -> String {
        format!("+proj=eqc +ellps=GRS80 +lat_ts={lat_ts} +units=m")
    }

    #[test]
    fn test_hit_returns_same_instance() {
        let cache = TransformCache::new(4);
        let first = cache.insert(build("EPSG:4326", "EPSG:3857"));
        let again = cache.get("EPSG:4326", "EPSG:3857").unwrap();
        assert!(Arc::ptr_eq(&first, &again));
    }

    #[test]
    fn test_duplicate_insert_keeps_existing() {
        let cache = TransformCache::new(4);
        let first = cache.insert(build("EPSG:4326", "EPSG:3857"));
        let second = cache.insert(build("EPSG:4326", "EPSG:3857"));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_bounded_by_capacity() {
        let cache = TransformCache::new(3);
        for i in 0..10 {
            cache.insert(build("EPSG:4326", &eqc(i)));
        }
        assert_eq!(cache.len(), 3);
        assert!(cache.get("EPSG:4326", &eqc(0)).is_none());
        assert!(cache.get("EPSG:4326", &eqc(9)).is_some());
    }

    #[test]
    fn test_recently_used_survives() {
        let cache = TransformCache::new(2);
        cache.insert(build("EPSG:4326", &eqc(0)));
        cache.insert(build("EPSG:4326", &eqc(1)));
        assert!(cache.get("EPSG:4326", &eqc(0)).is_some());
        cache.insert(build("EPSG:4326", &eqc(2)));
        assert!(cache.get("EPSG:4326", &eqc(0)).is_some());
        assert!(cache.get("EPSG:4326", &eqc(1)).is_none());
    }

    #[test]
    fn test_clear() {
        let cache = TransformCache::new(2);
        cache.insert(build("EPSG:4326", "EPSG:3857"));
        cache.clear();
        assert!(cache.is_empty());
    }
}
