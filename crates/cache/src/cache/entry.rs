//! Cache entry lifecycle metadata

use crate::types::OptimizationRecommendation;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One cached recommendation plus its lifecycle metadata.
///
/// Invariant: `expires_at > created_at`. Access bookkeeping is atomic so hits
/// only need a shared reference to the entry.
#[derive(Debug)]
pub struct CacheEntry {
    recommendation: Arc<OptimizationRecommendation>,
    created_at: Instant,
    expires_at: Instant,
    access_count: AtomicU64,
    /// Nanoseconds after `created_at`
    last_accessed: AtomicU64,
}

impl CacheEntry {
    pub(crate) fn new(
        recommendation: Arc<OptimizationRecommendation>,
        created_at: Instant,
        expires_at: Instant,
    ) -> Self {
        debug_assert!(expires_at > created_at);
        Self {
            recommendation,
            created_at,
            expires_at,
            access_count: AtomicU64::new(0),
            last_accessed: AtomicU64::new(0),
        }
    }

    pub fn recommendation(&self) -> Arc<OptimizationRecommendation> {
        Arc::clone(&self.recommendation)
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    pub fn access_count(&self) -> u64 {
        self.access_count.load(Ordering::Acquire)
    }

    pub fn last_accessed_at(&self) -> Instant {
        self.created_at + Duration::from_nanos(self.last_accessed.load(Ordering::Acquire))
    }

    /// Live iff `now < expires_at`
    pub fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }

    pub(crate) fn record_access(&self, now: Instant) {
        self.access_count.fetch_add(1, Ordering::AcqRel);
        let offset = now.saturating_duration_since(self.created_at).as_nanos();
        let offset = u64::try_from(offset).unwrap_or(u64::MAX);
        self.last_accessed.fetch_max(offset, Ordering::AcqRel);
    }

    pub(crate) fn snapshot(&self) -> CacheEntryInfo {
        CacheEntryInfo {
            recommendation: self.recommendation(),
            created_at: self.created_at,
            expires_at: self.expires_at,
            access_count: self.access_count(),
            last_accessed_at: self.last_accessed_at(),
        }
    }
}

/// Point-in-time copy of a cache entry
#[derive(Debug, Clone)]
pub struct CacheEntryInfo {
    pub recommendation: Arc<OptimizationRecommendation>,
    pub created_at: Instant,
    pub expires_at: Instant,
    pub access_count: u64,
    pub last_accessed_at: Instant,
}

impl CacheEntryInfo {
    pub fn time_to_live(&self, now: Instant) -> Duration {
        self.expires_at.saturating_duration_since(now)
    }
}
