//! TTL eviction policy: evict the entry closest to expiry

use crate::eviction::traits::EvictionPolicy;
use crate::types::RequestType;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Earliest-deadline-first eviction policy
///
/// Access does not extend an entry's life, so it does not affect ordering.
pub struct TtlPolicy {
    deadlines: DashMap<RequestType, (Instant, u64)>,
    next_sequence: AtomicU64,
}

impl TtlPolicy {
    pub fn new() -> Self {
        Self {
            deadlines: DashMap::new(),
            next_sequence: AtomicU64::new(0),
        }
    }
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl EvictionPolicy for TtlPolicy {
    fn name(&self) -> &'static str {
        "ttl"
    }

    fn on_add(&self, key: &RequestType, expires_at: Instant) {
        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        self.deadlines.insert(key.clone(), (expires_at, sequence));
    }

    fn on_access(&self, _key: &RequestType) {}

    fn on_remove(&self, key: &RequestType) {
        self.deadlines.remove(key);
    }

    fn key_to_evict(&self, is_present: &dyn Fn(&RequestType) -> bool) -> Option<RequestType> {
        let tracked: Vec<(RequestType, (Instant, u64))> = self
            .deadlines
            .iter()
            .map(|r| (r.key().clone(), *r.value()))
            .collect();

        tracked
            .into_iter()
            .filter(|(key, _)| is_present(key))
            .min_by_key(|(_, deadline)| *deadline)
            .map(|(key, _)| key)
    }

    fn retain(&self, is_present: &dyn Fn(&RequestType) -> bool) {
        self.deadlines.retain(|key, _| is_present(key));
    }

    fn contains(&self, key: &RequestType) -> bool {
        self.deadlines.contains_key(key)
    }

    fn tracked_len(&self) -> usize {
        self.deadlines.len()
    }

    fn clear(&self) {
        self.deadlines.clear();
    }
}
