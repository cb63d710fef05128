//! LFU (Least Frequently Used) eviction policy implementation

use crate::eviction::traits::EvictionPolicy;
use crate::types::RequestType;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

#[derive(Debug, Clone, Copy)]
struct Usage {
    frequency: u64,
    /// Insertion sequence, breaks frequency ties oldest-first
    sequence: u64,
}

/// LFU (Least Frequently Used) eviction policy
pub struct LfuPolicy {
    /// Frequency counts per key
    usage: DashMap<RequestType, Usage>,
    next_sequence: AtomicU64,
}

impl LfuPolicy {
    pub fn new() -> Self {
        Self {
            usage: DashMap::new(),
            next_sequence: AtomicU64::new(0),
        }
    }
}

impl Default for LfuPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl EvictionPolicy for LfuPolicy {
    fn name(&self) -> &'static str {
        "lfu"
    }

    fn on_add(&self, key: &RequestType, _expires_at: Instant) {
        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        self.usage.insert(
            key.clone(),
            Usage {
                frequency: 1,
                sequence,
            },
        );
    }

    fn on_access(&self, key: &RequestType) {
        if let Some(mut usage) = self.usage.get_mut(key) {
            usage.frequency = usage.frequency.saturating_add(1);
        }
    }

    fn on_remove(&self, key: &RequestType) {
        self.usage.remove(key);
    }

    fn key_to_evict(&self, is_present: &dyn Fn(&RequestType) -> bool) -> Option<RequestType> {
        // O(n) scan; snapshot first so no shard lock is held while probing the cache
        let tracked: Vec<(RequestType, Usage)> = self
            .usage
            .iter()
            .map(|r| (r.key().clone(), *r.value()))
            .collect();

        tracked
            .into_iter()
            .filter(|(key, _)| is_present(key))
            .min_by_key(|(_, usage)| (usage.frequency, usage.sequence))
            .map(|(key, _)| key)
    }

    fn retain(&self, is_present: &dyn Fn(&RequestType) -> bool) {
        self.usage.retain(|key, _| is_present(key));
    }

    fn contains(&self, key: &RequestType) -> bool {
        self.usage.contains_key(key)
    }

    fn tracked_len(&self) -> usize {
        self.usage.len()
    }

    fn clear(&self) {
        self.usage.clear();
    }
}
