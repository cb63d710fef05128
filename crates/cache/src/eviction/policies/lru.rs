//! LRU (Least Recently Used) eviction policy implementation

use crate::eviction::traits::EvictionPolicy;
use crate::types::RequestType;
use lru::LruCache;
use parking_lot::Mutex;
use std::time::Instant;

/// LRU (Least Recently Used) eviction policy
///
/// Access order lives in an unbounded `LruCache` used purely as an ordered
/// set, so add, access and remove are O(1) and a key is never tracked twice.
pub struct LruPolicy {
    /// Access order tracking, most recent at the front
    order: Mutex<LruCache<RequestType, ()>>,
}

impl LruPolicy {
    pub fn new() -> Self {
        Self {
            order: Mutex::new(LruCache::unbounded()),
        }
    }
}

impl Default for LruPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl EvictionPolicy for LruPolicy {
    fn name(&self) -> &'static str {
        "lru"
    }

    fn on_add(&self, key: &RequestType, _expires_at: Instant) {
        // put() on an existing key moves it to the most recent position
        self.order.lock().put(key.clone(), ());
    }

    fn on_access(&self, key: &RequestType) {
        self.order.lock().promote(key);
    }

    fn on_remove(&self, key: &RequestType) {
        self.order.lock().pop(key);
    }

    fn key_to_evict(&self, is_present: &dyn Fn(&RequestType) -> bool) -> Option<RequestType> {
        let order = self.order.lock();
        order
            .iter()
            .rev()
            .map(|(key, _)| key)
            .find(|key| is_present(key))
            .cloned()
    }

    fn retain(&self, is_present: &dyn Fn(&RequestType) -> bool) {
        let mut order = self.order.lock();
        let stale: Vec<RequestType> = order
            .iter()
            .filter(|(key, _)| !is_present(key))
            .map(|(key, _)| key.clone())
            .collect();
        for key in stale {
            order.pop(&key);
        }
    }

    fn contains(&self, key: &RequestType) -> bool {
        self.order.lock().contains(key)
    }

    fn tracked_len(&self) -> usize {
        self.order.lock().len()
    }

    fn clear(&self) {
        self.order.lock().clear();
    }
}
