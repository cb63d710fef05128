//! Bounded recommendation cache with per-entry expiry
//!
//! Entries live in a sharded `DashMap`, so unrelated request types never
//! contend on one lock. The eviction policy is consulted whenever an insert
//! would exceed capacity. Lock order is always policy before map: the map is
//! never held while calling into the policy.

mod entry;
mod stats;

pub use entry::{CacheEntry, CacheEntryInfo};
pub use stats::CacheStats;

use self::stats::CacheStatistics;
use crate::errors::{AdvisorError, Result};
use crate::eviction::{create_eviction_policy, EvictionKind, EvictionPolicy};
use crate::types::{OptimizationRecommendation, RequestType};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

enum Lookup {
    Hit(Arc<OptimizationRecommendation>),
    Expired,
    Missing,
}

/// Bounded key to recommendation store
pub struct RecommendationCache {
    entries: DashMap<RequestType, CacheEntry>,
    policy: Box<dyn EvictionPolicy>,
    capacity: usize,
    stats: CacheStatistics,
}

impl RecommendationCache {
    /// Create a cache holding at most `capacity` entries
    pub fn new(capacity: usize, policy: Box<dyn EvictionPolicy>) -> Result<Self> {
        if capacity == 0 {
            warn!("rejected recommendation cache with zero capacity");
            return Err(AdvisorError::invalid_configuration(
                "cache_capacity",
                "capacity must be at least 1",
            ));
        }

        Ok(Self {
            entries: DashMap::with_capacity(capacity),
            policy,
            capacity,
            stats: CacheStatistics::default(),
        })
    }

    pub fn with_policy(capacity: usize, kind: EvictionKind) -> Result<Self> {
        Self::new(capacity, create_eviction_policy(kind))
    }

    /// Look up a live recommendation.
    ///
    /// Expired entries are never returned; one found here is removed on the
    /// spot unless a concurrent `put` already replaced it.
    pub fn get(&self, key: &RequestType) -> Option<Arc<OptimizationRecommendation>> {
        let now = Instant::now();
        let lookup = match self.entries.get(key) {
            Some(entry) if entry.is_live(now) => {
                entry.record_access(now);
                Lookup::Hit(entry.recommendation())
            }
            Some(_) => Lookup::Expired,
            None => Lookup::Missing,
        };

        match lookup {
            Lookup::Hit(recommendation) => {
                self.policy.on_access(key);
                self.stats.record_hit();
                trace!(request_type = %key, "recommendation cache hit");
                Some(recommendation)
            }
            Lookup::Expired => {
                self.stats.record_miss();
                self.remove_if_expired(key, now);
                None
            }
            Lookup::Missing => {
                self.stats.record_miss();
                None
            }
        }
    }

    /// Insert or overwrite the recommendation for `key`, expiring after `ttl`
    pub fn put(
        &self,
        key: RequestType,
        recommendation: OptimizationRecommendation,
        ttl: Duration,
    ) -> Result<()> {
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .filter(|_| !ttl.is_zero())
            .ok_or(AdvisorError::InvalidTtl { ttl })?;

        if !self.entries.contains_key(&key) {
            self.evict_until(self.capacity - 1, &key);
        }

        self.entries.insert(
            key.clone(),
            CacheEntry::new(Arc::new(recommendation), now, expires_at),
        );
        self.policy.on_add(&key, expires_at);
        self.stats.record_insertion();

        // Concurrent inserts of other new keys can overshoot; settle here
        self.evict_until(self.capacity, &key);
        Ok(())
    }

    /// Remove an entry unconditionally. Returns whether an entry was present.
    pub fn invalidate(&self, key: &RequestType) -> bool {
        let removed = self.entries.remove(key).is_some();
        self.policy.on_remove(key);
        if removed {
            self.stats.record_invalidation();
            debug!(request_type = %key, "invalidated cached recommendation");
        }
        removed
    }

    /// Remove every expired entry, returning how many were removed.
    ///
    /// Keys are snapshotted first; each removal re-checks expiry atomically so
    /// an entry refreshed mid-sweep survives.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let expired: Vec<RequestType> = self
            .entries
            .iter()
            .filter(|entry| !entry.value().is_live(now))
            .map(|entry| entry.key().clone())
            .collect();

        let mut removed = 0;
        for key in &expired {
            if self.remove_if_expired(key, now) {
                removed += 1;
            }
        }
        removed
    }

    /// Bring policy tracking back in line with the map.
    ///
    /// A removal racing a re-insert of the same key can leave tracking for an
    /// absent key, or a present key untracked. The first is dropped; the second
    /// is re-added as most recent so it stays evictable.
    pub fn reconcile_tracking(&self) {
        self.policy.retain(&|key| self.entries.contains_key(key));

        let present: Vec<(RequestType, Instant)> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().expires_at()))
            .collect();
        for (key, expires_at) in present {
            if !self.policy.contains(&key) {
                self.policy.on_add(&key, expires_at);
            }
        }
    }

    /// Point-in-time copy of an entry's metadata, live or not
    pub fn entry_info(&self, key: &RequestType) -> Option<CacheEntryInfo> {
        self.entries.get(key).map(|entry| entry.snapshot())
    }

    /// Whether a live entry exists, without counting as an access
    pub fn contains_key(&self, key: &RequestType) -> bool {
        let now = Instant::now();
        self.entries
            .get(key)
            .is_some_and(|entry| entry.is_live(now))
    }

    pub fn keys(&self) -> Vec<RequestType> {
        self.entries.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    pub fn tracked_len(&self) -> usize {
        self.policy.tracked_len()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.entries.len(), self.capacity)
    }

    pub fn clear(&self) {
        self.entries.clear();
        self.policy.clear();
    }

    fn remove_if_expired(&self, key: &RequestType, now: Instant) -> bool {
        let removed = self
            .entries
            .remove_if(key, |_, entry| !entry.is_live(now))
            .is_some();
        if removed {
            self.policy.on_remove(key);
            self.stats.record_expiration();
            trace!(request_type = %key, "expired cached recommendation");
        }
        removed
    }

    fn evict_until(&self, limit: usize, incoming: &RequestType) {
        while self.entries.len() > limit {
            let victim = self
                .policy
                .key_to_evict(&|key| key != incoming && self.entries.contains_key(key));

            let Some(victim) = victim else {
                // Remaining entries are not tracked yet; their writers settle them
                break;
            };

            if self.entries.remove(&victim).is_some() {
                self.policy.on_remove(&victim);
                self.stats.record_eviction();
                debug!(
                    request_type = %victim,
                    policy = self.policy.name(),
                    "evicted cached recommendation"
                );
            }
        }
    }
}

impl std::fmt::Debug for RecommendationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecommendationCache")
            .field("capacity", &self.capacity)
            .field("policy", &self.policy.name())
            .field("entry_count", &self.entries.len())
            .finish()
    }
}
