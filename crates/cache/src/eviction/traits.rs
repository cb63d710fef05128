//! Core eviction policy trait definition

use crate::types::RequestType;
use std::time::Instant;

/// Eviction policy trait
///
/// Implementations are internally synchronized and may be shared across
/// threads. `is_present` reports whether the cache currently holds a key;
/// implementations must not return keys for which it is false.
pub trait EvictionPolicy: Send + Sync {
    /// Short policy name used in logs
    fn name(&self) -> &'static str;

    /// Record insertion of a key. Re-adding a tracked key resets its position.
    fn on_add(&self, key: &RequestType, expires_at: Instant);

    /// Record access to a key. Untracked keys are ignored.
    fn on_access(&self, key: &RequestType);

    /// Record removal of a key. Untracked keys are ignored.
    fn on_remove(&self, key: &RequestType);

    /// Get next key to evict among the keys still present in the cache
    fn key_to_evict(&self, is_present: &dyn Fn(&RequestType) -> bool) -> Option<RequestType>;

    /// Drop tracking for keys the cache no longer holds
    fn retain(&self, is_present: &dyn Fn(&RequestType) -> bool);

    /// Whether the key is currently tracked
    fn contains(&self, key: &RequestType) -> bool;

    /// Number of tracked keys
    fn tracked_len(&self) -> usize;

    /// Clear all tracking data
    fn clear(&self);
}
